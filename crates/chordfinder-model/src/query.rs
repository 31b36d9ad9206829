use serde::{Deserialize, Serialize};
use std::fmt;

/// A free-text song lookup, typically "title artist".
///
/// The text is never split into title and artist; each source receives it
/// verbatim, percent-encoded into its search URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Query(String);

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Percent-encoded form for interpolation into a query string.
    /// Spaces become `%20`, never `+`.
    pub fn url_encoded(&self) -> String {
        urlencoding::encode(&self.0).into_owned()
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Query {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Query {
    fn from(s: String) -> Self {
        Self(s)
    }
}
