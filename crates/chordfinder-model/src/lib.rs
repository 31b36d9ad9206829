pub mod query;
pub mod outcome;
pub mod report;

pub use query::*;
pub use outcome::*;
pub use report::*;
