//! Proxy-Harvest main entry point
//!
//! This is the command-line interface for harvesting and subpage probing.

use clap::Parser;
use proxy_harvest::config::{load_config_with_hash, Config};
use proxy_harvest::storage::{open_storage, CheckpointStore};
use proxy_harvest::{HttpProbe, SearchHarvester, SubpageProber};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Proxy-Harvest: discovery of proxy-wrapped URLs
///
/// Proxy-Harvest pages through a web-scan search API into a deduplicated
/// SQLite store, resuming from saved cursors, and probes path-less resolved
/// URLs for reachable subpages.
#[derive(Parser, Debug)]
#[command(name = "proxy-harvest")]
#[command(version = "1.0.0")]
#[command(about = "Harvest proxy-wrapped URLs and probe their subpages", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Harvest a single query, resuming from its checkpoint
    #[arg(long, value_name = "Q", conflicts_with_all = ["probe", "stats", "dry_run"])]
    query: Option<String>,

    /// Discard the saved checkpoint before harvesting --query
    #[arg(long, requires = "query")]
    fresh: bool,

    /// Run a subpage probing pass over the store
    #[arg(long, conflicts_with_all = ["stats", "dry_run"])]
    probe: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,

    /// Validate config and show the resolved settings without making requests
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.probe {
        handle_probe(&config).await?;
    } else if let Some(query) = cli.query.as_deref() {
        handle_query(&config, query, cli.fresh).await?;
    } else {
        handle_daily(&config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("proxy_harvest=info,warn"),
            1 => EnvFilter::new("proxy_harvest=debug,info"),
            2 => EnvFilter::new("proxy_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: prints the resolved configuration
fn handle_dry_run(config: &Config) {
    let search = &config.search;
    let probe = &config.probe;

    println!("=== Proxy-Harvest Dry Run ===\n");

    println!("Search:");
    println!("  API URL: {}", search.api_url);
    println!("  API keys: {}", search.api_keys.iter().filter(|k| !k.trim().is_empty()).count());
    println!("  Query: {}", search.query);
    println!(
        "  Proxy type: {}",
        search.proxy_type.as_deref().unwrap_or("(classified by host)")
    );
    println!("  Page size: {}", search.page_size);
    println!("  Max pages: {}", search.max_pages);
    println!("  Empty-page streak: {}", search.empty_page_streak);
    println!("  Backoff: {}s", search.backoff_secs);
    println!("  Page delay: {}ms", search.page_delay_ms);
    println!("  UTC offset: {:+}h", search.utc_offset_hours);

    println!("\nProbe:");
    println!("  Window: {}", probe.window);
    println!("  Workers: {}", probe.workers);
    println!("  Timeout: {}s", probe.timeout_secs);
    println!("  User agent: {}", probe.user_agent);
    println!("  Dry run: {}", probe.dry_run);
    match probe.limit {
        Some(limit) => println!("  Limit: newest {} records", limit),
        None => println!("  Limit: none"),
    }

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use proxy_harvest::output::{load_statistics, print_statistics};

    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --probe mode: one subpage probing pass
async fn handle_probe(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut storage = open_storage(Path::new(&config.output.database_path))?;
    let probe = HttpProbe::from_config(&config.probe)?;
    let mut prober = SubpageProber::new(probe, &config.probe);

    let summary = prober.run(&mut storage).await?;
    println!("{}", summary);

    Ok(())
}

/// Handles the --query mode: one resumable harvest
async fn handle_query(
    config: &Config,
    query: &str,
    fresh: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut storage = open_storage(Path::new(&config.output.database_path))?;
    if fresh {
        tracing::info!("Clearing checkpoint for {:?}", query);
        storage.clear_checkpoint(query)?;
    }

    let mut harvester = SearchHarvester::from_config(&config.search)?;
    match harvester
        .harvest(&mut storage, query, config.search.max_pages, config.search.page_size)
        .await
    {
        Ok(report) => {
            tracing::info!(
                "Harvest finished: {} new records over {} page(s), stopped by {}",
                report.inserted,
                report.pages,
                report.stop
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}

/// Handles the default mode: daily collection down to the newest stored date
async fn handle_daily(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use proxy_harvest::output::print_daily_reports;

    let mut storage = open_storage(Path::new(&config.output.database_path))?;
    let mut harvester = SearchHarvester::from_config(&config.search)?;

    match harvester.harvest_daily(&mut storage).await {
        Ok(reports) => {
            print_daily_reports(&reports);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Daily collection aborted: {}", e);
            Err(e.into())
        }
    }
}
