use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cinescrape_core::metrics::encode_metrics;
use cinescrape_core::{
    init_engines, load_config, validate_config, Config, ConfigError, Engine, EngineRegistry,
    Movie, ScrapeReport, SearchResult,
};

#[derive(Parser)]
#[command(name = "cinescrape", version, about = "Scrape movie download sites")]
struct Cli {
    /// Configuration file (missing file means defaults)
    #[arg(long, env = "CINESCRAPE_CONFIG", default_value = "cinescrape.toml")]
    config: PathBuf,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Dump Prometheus metrics to stderr once the command finishes
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List registered engines
    Engines,
    /// Search an engine
    Search {
        engine: String,
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Show one page of an engine's catalog
    List {
        engine: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// List according to an engine-specific mode and resolve download links
    Scrape {
        engine: String,
        /// e.g. "movies", "series:2"
        mode: String,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Logs go to stderr so stdout stays parseable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(ConfigError::FileNotFound(path)) => {
            info!("No configuration at {}, using defaults", path);
            Config::default()
        }
        Err(e) => {
            return Err(anyhow::Error::new(e)
                .context(format!("Failed to load config from {:?}", cli.config)))
        }
    };
    validate_config(&config).context("Configuration validation failed")?;

    let registry = init_engines(&config).context("Failed to build engine registry")?;

    let dump_metrics = cli.metrics;
    let outcome = execute(registry, cli.command, cli.json).await;

    if dump_metrics {
        let text = encode_metrics().context("Failed to encode metrics")?;
        eprint!("{}", text);
    }
    outcome
}

async fn execute(registry: &EngineRegistry, command: Command, json: bool) -> Result<()> {
    match command {
        Command::Engines => print_engines(registry, json),
        Command::Search { engine, query } => {
            let engine = registry.require(&engine)?;
            let query = query.join(" ");
            let result = engine
                .search(&query)
                .await
                .with_context(|| format!("{} search for {:?} failed", engine, query))?;
            print_result(&result, json)
        }
        Command::List { engine, page } => {
            let engine = registry.require(&engine)?;
            let result = engine
                .list(page)
                .await
                .with_context(|| format!("{} listing page {} failed", engine, page))?;
            print_result(&result, json)
        }
        Command::Scrape { engine, mode } => {
            let engine = registry.require(&engine)?;
            let report = scrape(engine, &mode).await?;
            print_report(&report, json)
        }
    }
}

async fn scrape(engine: Arc<dyn Engine>, mode: &str) -> Result<ScrapeReport> {
    let report = engine
        .scrape(mode)
        .await
        .with_context(|| format!("{} scrape {:?} failed", engine, mode))?;
    info!(
        engine = %engine,
        mode,
        scraped = report.movies.len(),
        failed = report.failures.len(),
        "Scrape finished"
    );
    Ok(report)
}

fn print_engines(registry: &EngineRegistry, json: bool) -> Result<()> {
    if json {
        let props: Vec<_> = registry.engines().values().map(|e| e.props()).collect();
        println!("{}", serde_json::to_string_pretty(&props)?);
        return Ok(());
    }

    for engine in registry.engines().values() {
        let props = engine.props();
        println!("{:<12} {} ({})", props.name, props.description, props.base_url);
    }
    Ok(())
}

fn print_result(result: &SearchResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    if result.is_empty() {
        println!("No results");
        return Ok(());
    }
    for movie in &result.movies {
        println!("{:>3}  {}", movie.index, movie);
    }
    Ok(())
}

fn print_report(report: &ScrapeReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    for movie in &report.movies {
        print_movie(movie);
    }
    for (index, reason) in &report.failures {
        println!("{:>3}  FAILED: {}", index, reason);
    }
    Ok(())
}

fn print_movie(movie: &Movie) {
    let size = if movie.size.is_empty() {
        String::new()
    } else {
        format!(" [{}]", movie.size)
    };
    println!("{:>3}  {}{}", movie.index, movie, size);

    if let Some(link) = &movie.download_link {
        println!("       {}", link);
    }
    for (part, link) in movie.series_download_links.iter().enumerate() {
        println!("       {:>2}. {}", part + 1, link);
    }
}
