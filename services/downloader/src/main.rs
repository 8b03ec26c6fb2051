//! helio-fetch: search and download solar irradiance data files.
//!
//! - `search` resolves a query into a table of remote files
//! - `fetch` downloads them with resumption, retry and persisted state
//! - `clients` lists the data clients and the attribute values they accept

mod config;
mod fetch;
mod path;
mod state;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use dataretriever::{Fido, UnifiedResponse};
use helio_common::{Query, QueryOr, TimeRange};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use config::FetchConfig;
use fetch::{FetchContext, FetchManager, HttpFetcher};
use path::PathTemplate;
use state::FetchState;

#[derive(Parser, Debug)]
#[command(name = "helio-fetch")]
#[command(about = "Search and download GOES XRS irradiance files")]
struct Args {
    /// YAML configuration file (mirrors, download settings)
    #[arg(long, env = "HELIO_FETCH_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a query and print the matching files
    Search {
        #[command(flatten)]
        query: QueryArgs,

        /// Comma-separated columns to show, in order
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,

        /// Print rows as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Resolve a query and download the matching files
    Fetch {
        #[command(flatten)]
        query: QueryArgs,

        /// Local path template below the output directory
        #[arg(long = "path")]
        path_template: Option<String>,

        /// Directory for downloaded files
        #[arg(long, env = "HELIO_FETCH_OUTPUT_DIR")]
        output_dir: Option<PathBuf>,

        /// Maximum concurrent downloads
        #[arg(long)]
        max_concurrent: Option<usize>,

        /// Maximum retry attempts per file
        #[arg(long)]
        max_retries: Option<u32>,

        /// Directory for the fetch state database
        #[arg(long, env = "HELIO_FETCH_STATE_DIR", default_value = ".helio-fetch")]
        state_dir: PathBuf,
    },
    /// List registered data clients
    Clients,
}

#[derive(ClapArgs, Debug)]
struct QueryArgs {
    /// Start of the time range, e.g. "2012-10-04" or "2012/10/04 12:00"
    #[arg(long)]
    start: String,

    /// End of the time range (inclusive)
    #[arg(long)]
    end: String,

    #[arg(long, default_value = "XRS")]
    instrument: String,

    /// GOES satellite number; repeat to search several satellites
    #[arg(long)]
    satellite: Vec<u8>,

    /// Cadence token: flx1s or avg1m
    #[arg(long)]
    resolution: Option<String>,

    /// Data provider: NOAA or SDAC
    #[arg(long)]
    provider: Option<String>,
}

impl QueryArgs {
    /// One branch per requested satellite, or a single branch without one.
    fn to_query(&self) -> Result<QueryOr> {
        let range = TimeRange::parse(&self.start, &self.end)
            .with_context(|| format!("Invalid time range {} - {}", self.start, self.end))?;

        let mut base = Query::new().time(range).instrument(self.instrument.as_str());
        if let Some(res) = &self.resolution {
            base = base.resolution(res.as_str());
        }
        if let Some(provider) = &self.provider {
            base = base.provider(provider.as_str());
        }

        if self.satellite.is_empty() {
            return Ok(QueryOr::from(base));
        }
        Ok(self
            .satellite
            .iter()
            .map(|sat| base.clone().satellite(*sat))
            .collect())
    }
}

fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn print_search(unified: &UnifiedResponse, columns: &[String], json: bool) -> Result<()> {
    if json {
        let rows: Vec<_> = unified.rows().collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if columns.is_empty() {
        print!("{}", unified);
        return Ok(());
    }

    let names: Vec<&str> = columns.iter().map(String::as_str).collect();
    for response in unified {
        println!("{} Results from the {}:", response.len(), response.client());
        print!("{}", response.show(&names)?);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args.log_level, args.log_json)?;

    let config = FetchConfig::load_or_default(args.config.as_deref())?;
    let fido = Fido::with_default_clients(config.mirrors.clone());

    match args.command {
        Command::Search {
            query,
            columns,
            json,
        } => {
            let query = query.to_query()?;
            let unified = fido.search_any(&query)?;
            print_search(&unified, &columns, json)?;
        }
        Command::Fetch {
            query,
            path_template,
            output_dir,
            max_concurrent,
            max_retries,
            state_dir,
        } => {
            let mut settings = config.download.clone();
            if let Some(template) = path_template {
                settings.path_template = template;
            }
            if let Some(dir) = output_dir {
                settings.output_dir = dir;
            }
            if let Some(n) = max_concurrent {
                settings.max_concurrent = n;
            }
            if let Some(n) = max_retries {
                settings.max_retries = n;
            }

            let query = query.to_query()?;
            let unified = fido.search_any(&query)?;
            info!(files = unified.file_num(), query = %query, "Starting fetch");

            let template = PathTemplate::new(settings.path_template.as_str())?;
            template.check_keys(&unified.path_format_keys())?;
            let state = Arc::new(FetchState::open(&state_dir.join("fetches.db")).await?);
            let context = FetchContext::new(settings.clone())?;
            let fetcher = Arc::new(HttpFetcher::new(&context));
            let manager = FetchManager::new(fetcher, state.clone(), context.settings().clone());

            let requests = manager.plan(unified.rows(), &template)?;
            let results = manager.fetch_all(requests).await;

            for path in results.paths() {
                println!("{}", path.display());
            }
            for failure in &results.errors {
                match state.get(&failure.url).await? {
                    Some(record) => warn!(
                        url = %record.url,
                        status = ?record.status,
                        retries = record.retry_count,
                        error = ?record.error_message,
                        "Not fetched"
                    ),
                    None => warn!(url = %failure.url, error = %failure.error, "Not fetched"),
                }
            }

            let stats = state.get_stats().await?;
            info!(
                completed = stats.completed,
                failed = stats.failed,
                pending = stats.pending,
                in_progress = stats.in_progress,
                total_bytes = stats.total_bytes,
                "Fetch session complete"
            );

            if !results.errors.is_empty() {
                bail!(
                    "{} of {} files failed to download",
                    results.errors.len(),
                    unified.file_num()
                );
            }
        }
        Command::Clients => {
            for client in fido.clients() {
                println!("{}", client.describe());
            }
        }
    }

    Ok(())
}
