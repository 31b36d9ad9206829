use crate::outcome::{AttemptStatus, ExtractedText, SourceId, SourceOutcome};
use crate::query::Query;
use serde::{Deserialize, Serialize};

/// Record of asking a single source during one resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceAttempt {
    pub source: SourceId,
    pub status: AttemptStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub duration_ms: u64,
}

impl SourceAttempt {
    pub fn new(source: SourceId, outcome: &SourceOutcome, duration_ms: u64) -> Self {
        Self {
            source,
            status: outcome.status(),
            reason: outcome.reason().map(str::to_string),
            duration_ms,
        }
    }
}

/// Everything one `resolve` call learned: the sources tried, in order, and
/// the text from the first one that had it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveReport {
    pub query: Query,
    pub attempts: Vec<SourceAttempt>,
    pub found: Option<ExtractedText>,
    pub resolved_at: String,
}

impl ResolveReport {
    pub fn new(query: Query) -> Self {
        Self {
            query,
            attempts: Vec::new(),
            found: None,
            resolved_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn is_found(&self) -> bool {
        self.found.is_some()
    }

    /// The failure reason from the highest-priority source that gave one.
    pub fn primary_reason(&self) -> Option<&str> {
        self.attempts.iter().find_map(|a| a.reason.as_deref())
    }

    /// The user-facing result: the found text, or one failure message.
    pub fn message(&self) -> String {
        if let Some(found) = &self.found {
            return found.text.clone();
        }
        match self.primary_reason() {
            Some(reason) => format!("Chords not found for '{}': {reason}", self.query),
            None => format!(
                "Chords not found for '{}' on {}, {}, or {}.",
                self.query,
                SourceId::UltimateGuitar,
                SourceId::LaCuerda,
                SourceId::CifraClub,
            ),
        }
    }

    /// Generate a source.md provenance file.
    pub fn source_md(&self) -> String {
        let mut md = format!(
            "# Source\n\n\
             - **Query:** {}\n\
             - **Resolved:** {}\n",
            self.query, self.resolved_at,
        );
        if let Some(found) = &self.found {
            md.push_str(&format!(
                "- **Site:** {}\n\
                 - **URL:** {}\n\
                 - **Lines:** {}\n",
                found.source.site(),
                found.url,
                found.text.lines().count(),
            ));
        }
        md.push_str("\n## Attempts\n\n");
        for attempt in &self.attempts {
            let status = match attempt.status {
                AttemptStatus::Found => "found",
                AttemptStatus::NotFound => "not found",
                AttemptStatus::Error => "error",
            };
            md.push_str(&format!("- {} ({} ms): {status}", attempt.source, attempt.duration_ms));
            if let Some(reason) = &attempt.reason {
                md.push_str(&format!(" ({reason})"));
            }
            md.push('\n');
        }
        md
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(source: SourceId, outcome: SourceOutcome) -> SourceAttempt {
        SourceAttempt::new(source, &outcome, 5)
    }

    #[test]
    fn test_message_found() {
        let mut report = ResolveReport::new(Query::new("Wonderwall Oasis"));
        report.found = Some(ExtractedText::new(SourceId::UltimateGuitar, "u", "Em G D A7sus4"));
        assert_eq!(report.message(), "Em G D A7sus4");
    }

    #[test]
    fn test_message_uses_first_reason() {
        let mut report = ResolveReport::new(Query::new("x"));
        report.attempts.push(attempt(
            SourceId::UltimateGuitar,
            SourceOutcome::NotFound("no 'Chords' tab on Ultimate Guitar".into()),
        ));
        report.attempts.push(attempt(
            SourceId::LaCuerda,
            SourceOutcome::Error("LaCuerda.net: request timed out".into()),
        ));
        assert_eq!(
            report.message(),
            "Chords not found for 'x': no 'Chords' tab on Ultimate Guitar"
        );
    }

    #[test]
    fn test_message_generic_without_attempts() {
        let report = ResolveReport::new(Query::new("Nothing Here"));
        assert_eq!(
            report.message(),
            "Chords not found for 'Nothing Here' on Ultimate Guitar, LaCuerda.net, or Cifra Club."
        );
    }

    #[test]
    fn test_source_md_lists_attempts() {
        let mut report = ResolveReport::new(Query::new("De Musica Ligera Soda Stereo"));
        report.attempts.push(attempt(SourceId::UltimateGuitar, SourceOutcome::Error("HTTP 503".into())));
        let found = ExtractedText::new(SourceId::LaCuerda, "https://lacuerda.net/tabs/s/soda_stereo/de_musica_ligera", "Am\nline");
        report.attempts.push(attempt(SourceId::LaCuerda, SourceOutcome::Found(found.clone())));
        report.found = Some(found);

        let md = report.source_md();
        assert!(md.contains("- **Site:** lacuerda.net"));
        assert!(md.contains("- **Lines:** 2"));
        assert!(md.contains("- Ultimate Guitar (5 ms): error (HTTP 503)"));
        assert!(md.contains("- LaCuerda.net (5 ms): found"));
    }

    #[test]
    fn test_report_serializes() {
        let mut report = ResolveReport::new(Query::new("q"));
        report.attempts.push(attempt(SourceId::CifraClub, SourceOutcome::NotFound("short".into())));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["query"], "q");
        assert_eq!(json["attempts"][0]["source"], "cifra_club");
        assert_eq!(json["attempts"][0]["status"], "not_found");
        assert!(json["found"].is_null());
    }
}
