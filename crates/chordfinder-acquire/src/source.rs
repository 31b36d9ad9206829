//! The interface every tab site implements.

use crate::error::SourceError;
use crate::http::{FetchResult, Fetcher};
use async_trait::async_trait;
use chordfinder_model::{ExtractedText, Query, SourceId, SourceOutcome};

/// What a search turned up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    /// A song page that still has to be fetched.
    Link(String),
    /// The search already landed on the song page.
    Page(FetchResult),
}

/// One tab site.
///
/// Implementors only provide `search` and `extract`; `lookup` runs the two
/// and folds every failure into a [`SourceOutcome`], so a source can never
/// abort resolution by returning an error.
#[async_trait]
pub trait Source: Send + Sync {
    fn id(&self) -> SourceId;

    /// The search page URL for `query`.
    fn search_url(&self, query: &Query) -> String;

    async fn search(&self, query: &Query, fetcher: &dyn Fetcher) -> Result<Candidate, SourceError>;

    async fn extract(
        &self,
        candidate: Candidate,
        fetcher: &dyn Fetcher,
    ) -> Result<ExtractedText, SourceError>;

    async fn lookup(&self, query: &Query, fetcher: &dyn Fetcher) -> SourceOutcome {
        let result = match self.search(query, fetcher).await {
            Ok(candidate) => self.extract(candidate, fetcher).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(text) => SourceOutcome::Found(text),
            Err(SourceError::NotFound(reason)) => {
                SourceOutcome::NotFound(format!("{}: {reason}", self.id()))
            }
            Err(err) => SourceOutcome::Error(format!("{}: {err}", self.id())),
        }
    }
}
