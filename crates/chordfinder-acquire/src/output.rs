use anyhow::{Context, Result};
use chordfinder_model::ResolveReport;
use std::fs;
use std::path::Path;

/// Write the outcome of one resolution to the given directory.
///
/// Creates the directory if it doesn't exist, then writes:
/// - `chords.txt`: the chord text, or the failure message
/// - `report.json`: the full resolve report
/// - `source.md`: provenance info
pub fn write_report(report: &ResolveReport, output_dir: &str) -> Result<()> {
    let dir = Path::new(output_dir);
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let text = report.message();
    let path = dir.join("chords.txt");
    fs::write(&path, format!("{text}\n"))?;
    tracing::info!(path = %path.display(), lines = text.lines().count(), "Wrote chord text");

    let json = serde_json::to_string_pretty(report)?;
    let path = dir.join("report.json");
    fs::write(&path, &json)?;
    tracing::info!(path = %path.display(), attempts = report.attempts.len(), "Wrote resolve report");

    let path = dir.join("source.md");
    fs::write(&path, report.source_md())?;
    tracing::info!(path = %path.display(), "Wrote source provenance");

    Ok(())
}
