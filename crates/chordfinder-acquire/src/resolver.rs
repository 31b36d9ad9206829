//! Fallback resolution across tab sites.
//!
//! Sources are asked one after another in priority order until one finds
//! the song. Whatever goes wrong inside a source only moves resolution on
//! to the next one.

use crate::cifraclub::CifraClub;
use crate::http::Fetcher;
use crate::lacuerda::LaCuerda;
use crate::source::Source;
use crate::ultimate_guitar::UltimateGuitar;
use chordfinder_model::{Query, ResolveReport, SourceAttempt, SourceId, SourceOutcome};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

/// The adapter for one site, pointed at the live site.
pub fn source_for(id: SourceId) -> Box<dyn Source> {
    match id {
        SourceId::UltimateGuitar => Box::new(UltimateGuitar::new()),
        SourceId::LaCuerda => Box::new(LaCuerda::new()),
        SourceId::CifraClub => Box::new(CifraClub::new()),
    }
}

/// All adapters in priority order.
pub fn default_sources() -> Vec<Box<dyn Source>> {
    SourceId::PRIORITY.into_iter().map(source_for).collect()
}

/// Holds only read-only state, so one resolver can serve concurrent
/// lookups.
pub struct Resolver {
    fetcher: Arc<dyn Fetcher>,
    sources: Vec<Box<dyn Source>>,
}

impl Resolver {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self::with_sources(fetcher, default_sources())
    }

    /// Resolve against `sources` only, tried in the given order.
    pub fn with_sources(fetcher: Arc<dyn Fetcher>, sources: Vec<Box<dyn Source>>) -> Self {
        Self { fetcher, sources }
    }

    pub fn source_ids(&self) -> Vec<SourceId> {
        self.sources.iter().map(|s| s.id()).collect()
    }

    /// Look up chords for `query`, returning either the chord text or a
    /// human-readable failure message.
    pub async fn resolve(&self, query: &str) -> String {
        self.resolve_report(&Query::new(query)).await.message()
    }

    #[instrument(skip_all, fields(query = %query, sources = self.sources.len()))]
    pub async fn resolve_report(&self, query: &Query) -> ResolveReport {
        let mut report = ResolveReport::new(query.clone());

        for source in &self.sources {
            let id = source.id();
            info!(source = %id, "Trying source");

            let start = Instant::now();
            let outcome = AssertUnwindSafe(source.lookup(query, self.fetcher.as_ref()))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| {
                    SourceOutcome::Error(format!("{id}: internal error: {}", panic_message(&*panic)))
                });
            let duration = start.elapsed();

            report.attempts.push(SourceAttempt::new(
                id,
                &outcome,
                u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            ));

            match outcome {
                SourceOutcome::Found(text) => {
                    info!(
                        source = %id,
                        url = %text.url,
                        lines = text.as_str().lines().count(),
                        duration = ?duration,
                        "Source succeeded"
                    );
                    report.found = Some(text);
                    return report;
                }
                SourceOutcome::NotFound(reason) => {
                    info!(source = %id, reason = %reason, duration = ?duration, "Not found on source");
                }
                SourceOutcome::Error(reason) => {
                    warn!(source = %id, error = %reason, duration = ?duration, "Source failed");
                }
            }
        }

        warn!(attempts = report.attempts.len(), "All sources failed");
        report
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "panic".to_string()
    }
}
