use serde::{Deserialize, Serialize};
use std::fmt;

/// The tab sites chordfinder knows how to query, in default priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    /// ultimate-guitar.com: JSON embedded in the HTML page.
    UltimateGuitar,
    /// lacuerda.net: HTML results table, ISO-8859-1 song pages.
    LaCuerda,
    /// cifraclub.com: HTML song pages, search may redirect straight to one.
    CifraClub,
}

impl SourceId {
    /// All sources in resolution priority order.
    pub const PRIORITY: [SourceId; 3] = [Self::UltimateGuitar, Self::LaCuerda, Self::CifraClub];

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::UltimateGuitar => "Ultimate Guitar",
            Self::LaCuerda => "LaCuerda.net",
            Self::CifraClub => "Cifra Club",
        }
    }

    pub fn site(&self) -> &'static str {
        match self {
            Self::UltimateGuitar => "ultimate-guitar.com",
            Self::LaCuerda => "lacuerda.net",
            Self::CifraClub => "cifraclub.com",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Normalized chord/lyric text extracted from one source page.
///
/// Construction trims surrounding whitespace; the adapters are responsible
/// for having removed markup and site noise before handing the text over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedText {
    pub source: SourceId,
    /// Page the text was extracted from (after redirects).
    pub url: String,
    pub text: String,
}

impl ExtractedText {
    pub fn new(source: SourceId, url: impl Into<String>, text: &str) -> Self {
        Self {
            source,
            url: url.into(),
            text: text.trim().to_string(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl fmt::Display for ExtractedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Result of asking one source for a song.
///
/// `NotFound` and `Error` both let resolution continue with the next source;
/// they differ only in how they are logged and reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    Found(ExtractedText),
    /// The site answered sensibly but had nothing usable.
    NotFound(String),
    /// Network, HTTP status, or page-structure failure.
    Error(String),
}

impl SourceOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// The failure reason, if this outcome is a failure.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Found(_) => None,
            Self::NotFound(reason) | Self::Error(reason) => Some(reason),
        }
    }

    pub fn status(&self) -> AttemptStatus {
        match self {
            Self::Found(_) => AttemptStatus::Found,
            Self::NotFound(_) => AttemptStatus::NotFound,
            Self::Error(_) => AttemptStatus::Error,
        }
    }
}

/// Serializable tag of a [`SourceOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Found,
    NotFound,
    Error,
}
