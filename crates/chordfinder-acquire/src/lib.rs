//! Chord sheet acquisition from tab sites.
//!
//! [`Resolver`] asks Ultimate Guitar, LaCuerda.net and Cifra Club in turn
//! and returns the first chord sheet found, or a failure message.

pub mod error;
pub mod http;
pub mod html;
pub mod normalize;
pub mod source;
pub mod ultimate_guitar;
pub mod lacuerda;
pub mod cifraclub;
pub mod resolver;
pub mod output;

#[cfg(test)]
mod testing;

pub use error::{FetchError, SourceError};
pub use http::{FetchConfig, FetchRequest, FetchResult, Fetcher, HttpFetcher};
pub use resolver::{default_sources, source_for, Resolver};
pub use source::{Candidate, Source};
