//! # meta_digest
//!
//! Command-line host for the digest pipeline. Prints (or writes) one digest
//! as JSON, or keeps rebuilding it on an interval with `--every`, sharing one
//! description cache for the life of the process.
//!
//! ## Usage
//!
//! ```sh
//! meta_digest --pretty
//! meta_digest -c meta_digest.yaml -o ./public/news.json --every 600
//! ```

use clap::Parser;
use meta_digest::outputs::json;
use meta_digest::{DescriptionCache, DigestConfig, HttpNewsDigest, NewsResponse};
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;

use cli::Cli;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init (stderr, stdout carries the JSON) ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let mut config = match &args.config {
        Some(path) => DigestConfig::load(path).await?,
        None => DigestConfig::default(),
    };
    args.apply(&mut config);
    config.validate()?;
    info!(
        feed_url = %config.feed_url,
        limit = config.limit,
        extractor = ?config.extractor,
        "meta_digest starting up"
    );

    // One cache for the whole process.
    let cache = Arc::new(DescriptionCache::new(config.description_ttl()));
    let digest = HttpNewsDigest::from_config(&config, Arc::clone(&cache))?;

    match args.every {
        None => {
            let response = digest.latest().await?;
            emit(&args, &response).await
        }
        Some(secs) => {
            let mut ticker = interval(Duration::from_secs(secs));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                run_once(&args, &digest, &cache).await;
            }
        }
    }
}

/// One refresh in `--every` mode. Failures are logged and the loop goes on.
#[instrument(level = "info", skip_all)]
async fn run_once(args: &Cli, digest: &HttpNewsDigest, cache: &DescriptionCache) {
    let start_time = std::time::Instant::now();
    let response = match digest.latest().await {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, "Feed acquisition failed; will retry next tick");
            return;
        }
    };

    if let Err(e) = emit(args, &response).await {
        error!(error = %e, "Failed to emit digest");
    }

    let purged = cache.purge_expired();
    let elapsed = start_time.elapsed();
    info!(
        items = response.items.len(),
        cached = cache.len(),
        purged,
        millis = elapsed.as_millis() as u64,
        "Digest refreshed"
    );
}

async fn emit(args: &Cli, response: &NewsResponse) -> Result<(), Box<dyn Error>> {
    match &args.output {
        Some(path) => json::write_digest(response, path, args.pretty).await,
        None => json::print_digest(response, args.pretty).await,
    }
}
