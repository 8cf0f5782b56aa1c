//! Stratus CLI
//!
//! Runs the cache-aside weather API and offers one-off lookups and cache checks.

use std::net::SocketAddr;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use stratus_api::{ApiConfig, ApiServer, AppState};
use stratus_cache::RedisCacheStore;
use stratus_core::traits::CacheStore;

/// Stratus - cached weather lookups
#[derive(Parser)]
#[command(name = "stratus")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the API server
    Serve {
        /// Port to listen on (overrides PORT)
        #[arg(short, long)]
        port: Option<u16>,
        /// Bind address (overrides BIND_ADDR)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Look up one city through the cache, as the API would
    Lookup {
        /// City name, used verbatim
        city: String,
        /// Pretty-print the JSON document
        #[arg(long)]
        pretty: bool,
    },

    /// Check that the Redis cache is reachable
    PingCache {
        /// Redis connection URL
        #[arg(long, env = "REDIS_URL")]
        redis_url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "stratus=debug,tower_http=debug,info"
    } else {
        "stratus=info,warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Serve { port, bind } => cmd_serve(port, bind).await,
        Commands::Lookup { city, pretty } => cmd_lookup(&city, pretty).await,
        Commands::PingCache { redis_url } => cmd_ping_cache(&redis_url).await,
    }
}

/// Run API server
async fn cmd_serve(port: Option<u16>, bind: Option<String>) -> Result<()> {
    let mut config = ApiConfig::from_env().context("Invalid configuration")?;
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(bind) = bind {
        config.bind_addr = bind;
    }

    let addr: SocketAddr = format!("{}:{}", config.bind_addr, config.port)
        .parse()
        .context("Invalid bind address")?;

    println!("{}", "🌤  Starting Stratus API server...".cyan().bold());

    let state = AppState::connect(config)
        .await
        .context("Failed to initialize the weather service")?;

    println!("   {} {}", "Cache:".dimmed(), state.service.cache_backend());
    println!("   {} http://{}", "Listening on:".green(), addr);
    println!("   {} http://{}/weather/London", "Try:".dimmed(), addr);
    println!("\n   Press Ctrl+C to stop.\n");

    ApiServer::new(state).run(addr).await?;

    info!("Server stopped");
    Ok(())
}

/// Run a single lookup
async fn cmd_lookup(city: &str, pretty: bool) -> Result<()> {
    let config = ApiConfig::from_env().context("Invalid configuration")?;
    let state = AppState::connect(config)
        .await
        .context("Failed to initialize the weather service")?;

    let start = Instant::now();
    let lookup = state
        .service
        .lookup(city)
        .await
        .with_context(|| format!("Lookup failed for '{}'", city))?;

    eprintln!(
        "{} {} ({}, {:?})",
        "✅ Weather for".green().bold(),
        city,
        serde_json::to_string(&lookup.source)?.trim_matches('"'),
        start.elapsed()
    );

    if pretty {
        let value: serde_json::Value = serde_json::from_str(lookup.payload.as_str())?;
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{}", lookup.payload);
    }

    Ok(())
}

/// Check cache connectivity
async fn cmd_ping_cache(redis_url: &str) -> Result<()> {
    println!("{}", "🔌 Pinging cache...".cyan().bold());

    let start = Instant::now();
    let store = RedisCacheStore::connect(redis_url)
        .await
        .context("Cache is unreachable")?;
    store.ping().await.context("PING failed")?;

    println!(
        "   {} {} in {:?}",
        "✅ Reachable:".green(),
        store.url(),
        start.elapsed()
    );
    Ok(())
}
