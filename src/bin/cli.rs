//! mediatally CLI
//!
//! Cron-driven ingestion plus ad-hoc playcount queries. Query results are
//! printed as JSON.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use mediatally::{
    config::Config,
    error::{AppError, Result},
    graph::{CommonsGraph, Walker},
    ingest::{IngestSummary, Ingestor, LogFetcher},
    query::{Aggregator, Bounds, SnapshotResolver, Span, yesterday},
    store::{self, Counters},
};

/// mediatally - media playcount ingestion and aggregation
#[derive(Parser, Debug)]
#[command(
    name = "mediatally",
    version,
    about = "Ingests mediacounts logs and answers playcount queries"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "mediatally.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest one day or an inclusive date range (default: yesterday)
    Ingest {
        /// First date to ingest (YYYY-MM-DD or YYYYMMDD)
        date: Option<String>,

        /// Last date of the range, inclusive
        end: Option<String>,
    },

    /// Ingest every day from the configured epoch through yesterday
    Backfill,

    /// Remove one date's counts from every playable-media counter
    Purge {
        /// Date to purge (YYYY-MM-DD or YYYYMMDD)
        date: String,
    },

    /// Playcounts for a single file
    File {
        /// Filename without the "File:" prefix
        filename: String,

        #[command(flatten)]
        bounds: BoundsArgs,
    },

    /// Playcounts for a category of files, with recursion
    Category {
        /// Category without the "Category:" prefix
        category: String,

        /// Subcategory recursion depth
        #[arg(long, default_value_t = 9)]
        depth: u32,

        #[command(flatten)]
        bounds: BoundsArgs,
    },

    /// Image view counts for a single file
    ImageFile {
        filename: String,

        #[command(flatten)]
        bounds: BoundsArgs,
    },

    /// Image view counts for a category of files, with recursion
    ImageCategory {
        category: String,

        #[arg(long, default_value_t = 9)]
        depth: u32,

        #[command(flatten)]
        bounds: BoundsArgs,
    },

    /// Externally hosted view counts for a file's paired video
    Youtube {
        filename: String,

        /// Report one reading per day instead of the newest one
        #[arg(long)]
        history: bool,

        #[command(flatten)]
        bounds: BoundsArgs,
    },

    /// Validate the configuration file
    Validate,
}

/// Date bound flags shared by the query commands.
#[derive(Args, Debug)]
struct BoundsArgs {
    /// Start date, inclusive
    #[arg(long)]
    from: Option<String>,

    /// End date, inclusive (defaults to yesterday)
    #[arg(long)]
    to: Option<String>,

    /// Window of N days ending yesterday
    #[arg(long)]
    last: Option<u32>,

    /// Every recorded date
    #[arg(long)]
    all_time: bool,
}

impl BoundsArgs {
    fn bounds(&self) -> Result<Bounds> {
        if self.all_time {
            if self.from.is_some() || self.to.is_some() || self.last.is_some() {
                return Err(AppError::date_range(
                    "--all-time cannot be combined with other date bounds",
                ));
            }
            return Ok(Bounds::AllTime);
        }

        let span = Span {
            start: parse_date_opt(self.from.as_deref())?,
            end: parse_date_opt(self.to.as_deref())?,
            last: self.last,
        };
        if let (Some(start), Some(end)) = (span.start, span.end) {
            if start > end {
                return Err(AppError::date_range(format!(
                    "start {start} is after end {end}"
                )));
            }
        }
        Ok(Bounds::Span(span))
    }
}

fn parse_date(token: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(token, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(token, "%Y%m%d"))
        .map_err(|_| AppError::date_range(format!("invalid date: {token}")))
}

fn parse_date_opt(token: Option<&str>) -> Result<Option<NaiveDate>> {
    token.map(parse_date).transpose()
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

async fn counters(config: &Config) -> Result<Arc<Counters>> {
    let plays = store::connect(&config.stores.plays).await?;
    let images = store::connect(&config.stores.images).await?;
    Ok(Arc::new(Counters::new(plays, images)))
}

async fn aggregator(config: &Config) -> Result<Aggregator> {
    let counters = counters(config).await?;
    let graph = Arc::new(CommonsGraph::connect(&config.graph.database_url).await?);
    let walker = Walker::new(graph, config.graph.max_concurrent);
    Ok(Aggregator::new(counters, walker))
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn report_summary(summary: &IngestSummary) -> Result<()> {
    for stats in &summary.completed {
        log::info!(
            "{}: stored {} playable and {} image records",
            stats.date,
            stats.playable,
            stats.images
        );
    }
    if !summary.all_ok() {
        let failed: Vec<String> = summary.failed.iter().map(|(d, _)| d.to_string()).collect();
        return Err(AppError::Ingest(failed.join(", ")));
    }
    Ok(())
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);
    config.validate()?;

    match cli.command {
        Command::Ingest { date, end } => {
            // Reject bad tokens and inverted ranges before any I/O
            let start = match date.as_deref() {
                Some(token) => parse_date(token)?,
                None => yesterday(),
            };
            let end = match end.as_deref() {
                Some(token) => parse_date(token)?,
                None => start,
            };
            if start > end {
                return Err(AppError::date_range(format!(
                    "start {start} is after end {end}"
                )));
            }

            let counters = counters(&config).await?;
            let ingestor = Ingestor::new(LogFetcher::new(&config.fetch)?, counters);
            report_summary(&ingestor.run_span(start, end).await)?;
        }

        Command::Backfill => {
            let counters = counters(&config).await?;
            let ingestor = Ingestor::new(LogFetcher::new(&config.fetch)?, counters);
            let summary = ingestor
                .run_span(config.fetch.backfill_start, yesterday())
                .await;
            report_summary(&summary)?;
        }

        Command::Purge { date } => {
            let date = parse_date(&date)?;
            let counters = counters(&config).await?;
            let removed = counters.purge_date(date).await?;
            log::info!("Removed {date} from {removed} playable-media counters");
        }

        Command::File { filename, bounds } => {
            let bounds = bounds.bounds()?;
            let aggregator = aggregator(&config).await?;
            print_json(&aggregator.file_total(&filename, bounds).await?)?;
        }

        Command::Category {
            category,
            depth,
            bounds,
        } => {
            let bounds = bounds.bounds()?;
            let aggregator = aggregator(&config).await?;
            print_json(&aggregator.category_total(&category, depth, bounds).await?)?;
        }

        Command::ImageFile { filename, bounds } => {
            let bounds = bounds.bounds()?;
            let aggregator = aggregator(&config).await?;
            print_json(&aggregator.image_file_total(&filename, bounds).await?)?;
        }

        Command::ImageCategory {
            category,
            depth,
            bounds,
        } => {
            let bounds = bounds.bounds()?;
            let aggregator = aggregator(&config).await?;
            print_json(
                &aggregator
                    .image_category_total(&category, depth, bounds)
                    .await?,
            )?;
        }

        Command::Youtube {
            filename,
            history,
            bounds,
        } => {
            let resolver = SnapshotResolver::new(counters(&config).await?);
            if history {
                let Bounds::Span(span) = bounds.bounds()? else {
                    return Err(AppError::date_range(
                        "--history takes a day window, not --all-time",
                    ));
                };
                print_json(&resolver.history(&filename, span).await?)?;
            } else {
                print_json(&resolver.current(&filename).await?)?;
            }
        }

        Command::Validate => {
            log::info!("Configuration OK");
            log::info!("  dumps: {}", config.fetch.base_url);
            log::info!("  plays store: {}", config.stores.plays.url);
            log::info!("  images store: {}", config.stores.images.url);
            log::info!("  graph: {}", config.graph.database_url);
        }
    }

    Ok(())
}
