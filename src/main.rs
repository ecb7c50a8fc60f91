//! Disco Crawl main entry point
//!
//! This is the command-line interface for the Disco Crawl crawler node and
//! its frontier expansion step.

use anyhow::Context;
use clap::{Parser, Subcommand};
use disco_crawl::config::{load_config_with_hash, validate, Config};
use disco_crawl::crawler::crawl_domain;
use disco_crawl::output::{publish_records, read_results, JsonLinesSink, ResultSink, StdoutSink};
use disco_crawl::registry::{expand_frontier, FileDomainQueue, SqliteDomainRegistry};
use disco_crawl::storage::FsObjectStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Disco Crawl: a polite single-domain crawler
///
/// Crawls one domain at a time while respecting robots.txt and politeness
/// delays, stores page bodies by content hash and publishes one Record per
/// page.
#[derive(Parser, Debug)]
#[command(name = "disco-crawl")]
#[command(version)]
#[command(about = "A polite single-domain crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl one domain and publish its Records
    Crawl {
        /// Bare domain name, e.g. www.example.com
        domain: String,

        /// Append result messages to this JSON-lines file instead of stdout
        #[arg(long, value_name = "FILE")]
        results: Option<PathBuf>,
    },

    /// Enqueue the unseen external domains found in a results file
    Expand {
        /// JSON-lines results file written by `crawl --results`
        results: PathBuf,

        /// SQLite database of domains already enqueued
        #[arg(long, value_name = "DB")]
        registry: PathBuf,

        /// File the new domains are appended to, one per line
        #[arg(long, value_name = "FILE")]
        queue: PathBuf,
    },

    /// Validate the configuration and print the effective settings
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load(cli.config.as_deref())?;

    match cli.command {
        Command::Crawl { domain, results } => handle_crawl(&config, &domain, results).await,
        Command::Expand {
            results,
            registry,
            queue,
        } => handle_expand(&results, &registry, &queue),
        Command::CheckConfig => {
            handle_check_config(&config);
            Ok(())
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("disco_crawl=info,warn"),
            1 => EnvFilter::new("disco_crawl=debug,info"),
            2 => EnvFilter::new("disco_crawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // Logs go to stderr so stdout stays clean for published results
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the configuration file, or the defaults when none is given
fn load(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        let config = Config::default();
        validate(&config)?;
        return Ok(config);
    };

    tracing::info!("Loading configuration from: {}", path.display());
    match load_config_with_hash(path) {
        Ok((config, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Ok(config)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            Err(e.into())
        }
    }
}

/// Handles the crawl command: one session, then publishing
async fn handle_crawl(
    config: &Config,
    domain: &str,
    results: Option<PathBuf>,
) -> anyhow::Result<()> {
    let store = Arc::new(FsObjectStore::new(&config.output.storage_dir));

    let report = match crawl_domain(config, domain, store).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Crawl of {} aborted: {}", domain, e);
            return Err(e.into());
        }
    };

    let sink: Box<dyn ResultSink> = match results {
        Some(path) => Box::new(JsonLinesSink::new(path)),
        None => Box::new(StdoutSink),
    };

    let published = publish_records(
        sink.as_ref(),
        &report.records,
        config.output.chunk_size,
        config.output.max_message_bytes,
    )
    .await?;

    tracing::info!(
        "Published {} records for {} in {} messages ({} failed)",
        report.records.len(),
        report.domain,
        published.sent,
        published.failed
    );

    if !published.is_complete() {
        anyhow::bail!(
            "{} of {} result messages for {} were not delivered",
            published.failed,
            published.sent + published.failed,
            report.domain
        );
    }
    Ok(())
}

/// Handles the expand command: feeds external domains to the request queue
fn handle_expand(results: &Path, registry: &Path, queue: &Path) -> anyhow::Result<()> {
    let records = read_results(results)
        .with_context(|| format!("reading results from {}", results.display()))?;
    let mut registry = SqliteDomainRegistry::new(registry)
        .with_context(|| format!("opening registry {}", registry.display()))?;
    let mut queue = FileDomainQueue::new(queue);

    let report = expand_frontier(&records, &mut registry, &mut queue)?;
    println!(
        "{} external domains, {} enqueued, {} already known",
        report.considered, report.enqueued, report.known
    );
    Ok(())
}

/// Handles the check-config command: prints the effective settings
fn handle_check_config(config: &Config) {
    println!("=== Disco Crawl Configuration ===\n");

    println!("Crawler:");
    println!("  Workers: {}", config.crawler.worker_count);
    println!("  Pipeline capacity: {}", config.crawler.pipeline_capacity);
    println!(
        "  Timeouts: connect {}ms, request {}ms",
        config.crawler.connect_timeout_ms, config.crawler.request_timeout_ms
    );
    println!("  Max body: {} bytes", config.crawler.max_body_bytes);

    println!("\nPoliteness:");
    println!(
        "  Delay: default {}ms, floor {}ms, ceiling {}s",
        config.politeness.default_delay_ms,
        config.politeness.min_delay_ms,
        config.politeness.max_delay_secs
    );
    println!(
        "  Jitter: {}-{}ms",
        config.politeness.jitter_min_ms, config.politeness.jitter_max_ms
    );
    println!("  Robots timeout: {}ms", config.politeness.robots_timeout_ms);

    println!("\nPolicy:");
    println!(
        "  Page cap: {} (government: {})",
        config.policy.page_cap, config.policy.government_page_cap
    );
    println!(
        "  Government domains: {}",
        config.policy.government_domains.join(", ")
    );
    println!("  Max errors: {}", config.policy.max_errors);
    println!(
        "  Blocked extensions: {}",
        config.policy.blocked_extensions.join(" ")
    );

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Storage: {}", config.output.storage_dir);
    println!(
        "  Chunks: {} records when over {} bytes",
        config.output.chunk_size, config.output.max_message_bytes
    );

    println!("\n✓ Configuration is valid");
}
