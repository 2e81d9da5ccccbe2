//! Snapcache - command-line access to a file-persisted cache
//!
//! # Usage
//! - `snapcache get <key>`
//! - `snapcache put <key> <json> [ttl-seconds]`
//! - `snapcache del <key>`
//! - `snapcache stats`
//!
//! The backing file and capacity come from `SNAPCACHE_DATA_FILE` and
//! `SNAPCACHE_CAPACITY`.

use std::process::ExitCode;

use anyhow::{bail, Context};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use snapcache::{CacheError, Config, KvCache, Ttl};

const USAGE: &str = "usage: snapcache <get KEY | put KEY JSON [TTL] | del KEY | stats>";

fn main() -> anyhow::Result<ExitCode> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "snapcache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    let config = Config::from_env();
    info!(
        "Configuration loaded: data_file={}, capacity={} bytes",
        config.data_file.display(),
        config.capacity
    );

    let cache = KvCache::from_config(&config)
        .with_context(|| format!("failed to open {}", config.data_file.display()))?;

    let code = run(&cache, &args)?;

    cache.close().context("failed to close store")?;
    Ok(code)
}

fn run(cache: &KvCache, args: &[String]) -> anyhow::Result<ExitCode> {
    let errors = match args {
        [cmd, key] if cmd == "get" => {
            return match cache.get(key) {
                Some(value) => {
                    println!("{}", value);
                    Ok(ExitCode::SUCCESS)
                }
                None => {
                    eprintln!("key '{}' not found", key);
                    Ok(ExitCode::FAILURE)
                }
            };
        }
        [cmd, key, raw] if cmd == "put" => cache.put(key, raw, Ttl::Never),
        [cmd, key, raw, ttl] if cmd == "put" => {
            let secs: i64 = ttl
                .parse()
                .with_context(|| format!("invalid ttl '{}'", ttl))?;
            cache.put(key, raw, Ttl::from_secs(secs))
        }
        [cmd, key] if cmd == "del" => cache.delete(key),
        [cmd] if cmd == "stats" => {
            println!("{}", serde_json::to_string_pretty(&cache.stats())?);
            return Ok(ExitCode::SUCCESS);
        }
        _ => bail!(USAGE),
    };

    report(&errors)
}

fn report(errors: &[CacheError]) -> anyhow::Result<ExitCode> {
    if errors.is_empty() {
        return Ok(ExitCode::SUCCESS);
    }
    for err in errors {
        eprintln!("{}", serde_json::to_string(err)?);
    }
    Ok(ExitCode::FAILURE)
}
