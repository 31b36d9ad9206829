use anyhow::{Context, Result};
use chordfinder_acquire::{output, source_for, FetchConfig, HttpFetcher, Resolver};
use chordfinder_model::{Query, SourceId};
use clap::{Parser, Subcommand};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "chordfinder")]
#[command(about = "Look up chords and lyrics for a song across guitar tab sites")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BUILD_HASH"), ")"))]
struct Cli {
    /// Log level: error, warn, info, debug, trace
    #[arg(long, global = true, default_value = "warn", value_enum)]
    log_level: LogLevel,

    /// Use UTC timestamps instead of local time
    #[arg(long, global = true)]
    utc: bool,

    /// Proxy URL for all outbound requests (overrides hosting environment detection)
    #[arg(long, global = true, env = "CHORDFINDER_PROXY")]
    proxy: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Subcommand)]
enum Commands {
    /// Find chords for a song, trying each site until one has it
    Resolve {
        /// Song title and artist (e.g., "Wonderwall Oasis")
        query: Vec<String>,

        /// Only ask these sites, in the order given (repeatable)
        #[arg(short, long, value_enum)]
        source: Vec<SourceArg>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Also write chords.txt, report.json and source.md to this directory
        #[arg(short = 'O', long)]
        output_dir: Option<String>,
    },

    /// List the sites in the order they are tried
    Sources,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum SourceArg {
    /// ultimate-guitar.com (JSON embedded in the page)
    UltimateGuitar,
    /// lacuerda.net (results table, Latin-1 song pages)
    Lacuerda,
    /// cifraclub.com (song page, search may redirect straight to it)
    CifraClub,
}

impl From<SourceArg> for SourceId {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::UltimateGuitar => SourceId::UltimateGuitar,
            SourceArg::Lacuerda => SourceId::LaCuerda,
            SourceArg::CifraClub => SourceId::CifraClub,
        }
    }
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    /// The chord sheet, or the failure message
    Text,
    /// The full resolve report as JSON
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Map log level, suppressing noisy HTML-parsing crates at debug/trace
    let level = match cli.log_level {
        LogLevel::Error => "error",
        LogLevel::Warn  => "warn",
        LogLevel::Info  => "info",
        LogLevel::Debug => "debug,selectors=warn,html5ever=warn",
        LogLevel::Trace => "trace,selectors=warn,html5ever=warn",
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    // Timestamp format: 2026-02-14 19:44:09.123 -08:00
    let time_format = "%Y-%m-%d %H:%M:%S%.3f %:z";

    // Logs go to stderr; stdout carries only the result.
    if cli.utc {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_timer(tracing_subscriber::fmt::time::ChronoUtc::new(time_format.to_string()))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_timer(tracing_subscriber::fmt::time::ChronoLocal::new(time_format.to_string()))
            .init();
    }

    match cli.command {
        Commands::Resolve {
            query,
            source,
            format,
            output_dir,
        } => {
            let query = Query::new(query.join(" "));
            anyhow::ensure!(!query.is_blank(), "Please enter a song title and artist.");

            let config = FetchConfig::from_env().with_proxy(cli.proxy);
            let fetcher = HttpFetcher::new(&config).context("Failed to set up HTTP client")?;

            let resolver = if source.is_empty() {
                Resolver::new(Arc::new(fetcher))
            } else {
                let sources = source
                    .into_iter()
                    .map(|arg| source_for(arg.into()))
                    .collect();
                Resolver::with_sources(Arc::new(fetcher), sources)
            };

            tracing::info!(query = %query, sources = ?resolver.source_ids(), "Resolving");
            let report = resolver.resolve_report(&query).await;

            match format {
                OutputFormat::Text => println!("{}", report.message()),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            }

            if let Some(dir) = output_dir {
                output::write_report(&report, &dir)?;
            }
        }

        Commands::Sources => {
            let placeholder = Query::new("QUERY");
            for (rank, id) in SourceId::PRIORITY.into_iter().enumerate() {
                println!(
                    "{}. {:<16} {}",
                    rank + 1,
                    id.display_name(),
                    source_for(id).search_url(&placeholder)
                );
            }
        }
    }

    Ok(())
}
