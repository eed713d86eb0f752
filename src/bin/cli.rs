//! Hotelscope CLI
//!
//! Fetch reviews for a hotel from several platforms and analyze them.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};

use hotelscope::{
    error::{AppError, Result},
    models::{AnalysisResult, Config, Language, Review, Source},
    pipeline::{self, AnalyzeOptions, FetchOutcome, FetchRequest},
    utils::fs::write_json_atomic,
};

/// Hotelscope - Hotel Review Analyzer
#[derive(Parser, Debug)]
#[command(
    name = "hotelscope",
    version,
    about = "Multi-platform hotel review collector and analyzer"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Write JSON results to this file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch reviews for a hotel from the selected sources
    Fetch(FetchArgs),

    /// Analyze reviews from a file written by `fetch`
    Analyze {
        /// JSON file holding a review list or a fetch result
        input: PathBuf,

        #[command(flatten)]
        stages: StageArgs,
    },

    /// Show each source and whether it runs live or on demo data
    Sources,

    /// Validate the configuration file
    Validate,
}

#[derive(Args, Debug)]
struct FetchArgs {
    /// Hotel name to search for
    hotel_name: String,

    /// Comma-separated sources (default: all)
    #[arg(short, long, value_delimiter = ',')]
    sources: Vec<Source>,

    /// Narrow the hotel search by location
    #[arg(long)]
    location: Option<String>,

    /// Earliest review date (YYYY-MM-DD)
    #[arg(long)]
    start_date: Option<NaiveDate>,

    /// Latest review date (YYYY-MM-DD), inclusive
    #[arg(long)]
    end_date: Option<NaiveDate>,

    /// Maximum reviews per source (default: fetch.default_limit)
    #[arg(short, long)]
    limit: Option<usize>,

    /// Comma-separated review languages
    #[arg(long, value_delimiter = ',')]
    languages: Vec<Language>,

    /// Analyze the fetched reviews as well
    #[arg(long)]
    analyze: bool,

    #[command(flatten)]
    stages: StageArgs,
}

#[derive(Args, Debug)]
struct StageArgs {
    /// Skip sentiment scoring
    #[arg(long)]
    no_sentiment: bool,

    /// Skip keyword extraction
    #[arg(long)]
    no_keywords: bool,

    /// Number of overall keywords (default: analysis.keyword_limit)
    #[arg(long)]
    keyword_limit: Option<usize>,
}

impl StageArgs {
    fn options(&self, config: &Config) -> AnalyzeOptions {
        let defaults = AnalyzeOptions::from_config(&config.analysis);
        AnalyzeOptions {
            include_sentiment: !self.no_sentiment,
            include_keywords: !self.no_keywords,
            keyword_limit: self.keyword_limit.unwrap_or(defaults.keyword_limit),
            ..defaults
        }
    }
}

/// Accepts a bare review list or a saved fetch result.
#[derive(Deserialize)]
#[serde(untagged)]
enum ReviewFile {
    Bare(Vec<Review>),
    Wrapped { reviews: Vec<Review> },
}

#[derive(Serialize)]
struct FetchReport<'a> {
    #[serde(flatten)]
    fetch: &'a FetchOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    analysis: Option<&'a AnalysisResult>,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn day_end(date: NaiveDate) -> DateTime<Utc> {
    let end = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
    date.and_time(end).and_utc()
}

async fn emit<T: Serialize>(output: Option<&Path>, value: &T) -> Result<()> {
    match output {
        Some(path) => {
            write_json_atomic(path, value).await?;
            log::info!("Results saved to {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);
    config.apply_env();
    log::debug!("Loaded configuration from {}", cli.config.display());

    let output = cli.output.as_deref();

    match cli.command {
        Command::Fetch(args) => {
            let sources = if args.sources.is_empty() {
                Source::all().to_vec()
            } else {
                args.sources
            };

            let mut request = FetchRequest::from_config(&config, &args.hotel_name, sources);
            request.location = args.location;
            request.start_date = args.start_date.map(day_start);
            request.end_date = args.end_date.map(day_end);
            if let Some(limit) = args.limit {
                request.limit_per_source = limit;
            }
            if !args.languages.is_empty() {
                request.languages = Some(args.languages);
            }

            let mut outcome = pipeline::fetch_reviews(&config, &request).await?;
            for report in &outcome.per_source {
                match &report.error {
                    None => log::info!("  {:<8} {:>4} reviews", report.source, report.count),
                    Some(e) => log::warn!("  {:<8} failed: {}", report.source, e),
                }
            }

            let analysis = if args.analyze && !outcome.reviews.is_empty() {
                let options = args.stages.options(&config);
                Some(pipeline::analyze(&mut outcome.reviews, &options)?)
            } else {
                None
            };

            let report = FetchReport {
                fetch: &outcome,
                analysis: analysis.as_ref(),
            };
            emit(output, &report).await?;

            if !outcome.success {
                return Err(AppError::review_fetch("all sources", outcome.message));
            }
        }

        Command::Analyze { input, stages } => {
            let content = tokio::fs::read_to_string(&input).await?;
            let mut reviews = match serde_json::from_str::<ReviewFile>(&content)? {
                ReviewFile::Bare(reviews) | ReviewFile::Wrapped { reviews } => reviews,
            };
            log::info!("Loaded {} reviews from {}", reviews.len(), input.display());

            let result = pipeline::analyze(&mut reviews, &stages.options(&config))?;
            emit(output, &result).await?;
        }

        Command::Sources => {
            for source in Source::all() {
                let settings = config.source_settings(source);
                let mode = match source {
                    Source::Rakuten if settings.enabled => "scrape",
                    Source::Rakuten => "disabled",
                    Source::Jalan => "demo",
                    _ if settings.enabled => "live",
                    _ => "demo",
                };
                log::info!(
                    "{:<8} {:<14} {:<8} {}",
                    source,
                    source.display_name(),
                    mode,
                    settings.endpoint.as_deref().unwrap_or("-")
                );
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");
        }
    }

    Ok(())
}
