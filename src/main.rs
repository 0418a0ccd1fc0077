use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use buildfeed::config::Config;
use buildfeed::publish::{FeedVariant, Publisher};
use buildfeed::server::{self, AppState};

/// Get the default config path (~/.config/buildfeed/config.toml)
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("buildfeed")
        .join("config.toml"))
}

#[derive(Parser, Debug)]
#[command(name = "buildfeed", about = "Publish build changelogs as RSS and HTML")]
struct Args {
    /// Config file (defaults to ~/.config/buildfeed/config.toml)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the feeds over HTTP
    Serve {
        /// Listen address, overrides `bind` from the config file
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },
    /// Publish one feed variant to stdout
    Publish {
        /// rss10, rss20 or html
        variant: FeedVariant,
        /// Artifact link base, overrides `base_url` from the config file
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,
    },
    /// Delete cached feeds so the next request rebuilds them
    ClearCache {
        /// Only this variant; all variants when omitted
        variant: Option<FeedVariant>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing for debug logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    config.validate().context("Invalid configuration")?;

    let publisher = Publisher::from_config(&config).context("Failed to create publisher")?;

    match args.command {
        Command::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.bind.clone());
            let state = Arc::new(AppState {
                publisher,
                base_url: config.base_url.clone(),
            });

            let listener = tokio::net::TcpListener::bind(&bind)
                .await
                .with_context(|| format!("Failed to bind {bind}"))?;
            tracing::info!(addr = %bind, listing = %config.listing_url, "Serving build feeds");
            axum::serve(listener, server::router(state))
                .await
                .context("HTTP server failed")?;
        }
        Command::Publish { variant, base_url } => {
            if let Some(url) = &base_url {
                buildfeed::util::validate_url(url).context("Invalid --base-url")?;
            }
            let base_url = base_url.unwrap_or_else(|| config.base_url.clone());
            let bytes = publisher
                .publish(variant, &base_url)
                .await
                .with_context(|| format!("Failed to publish {variant} feed"))?;

            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes).context("Failed to write feed to stdout")?;
            stdout.flush().context("Failed to flush stdout")?;
        }
        Command::ClearCache { variant } => {
            let cache = publisher.cache();
            let removed = match variant {
                Some(variant) => usize::from(cache.clear(variant).await?),
                None => cache.clear_all().await?,
            };
            println!(
                "Removed {} cached feed(s) from {}",
                removed,
                cache.dir().display()
            );
        }
    }

    Ok(())
}
