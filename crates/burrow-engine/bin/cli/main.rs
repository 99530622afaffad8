mod cli;

use std::time::Duration;

use crate::cli::{CacheBackendArg, Command, LogFormatArg, StorageBackendArg, CLI};
use anyhow::Context;
use burrow_cache::{ExistenceFilterConfig, MokaLinkCache, RedisLinkCache};
use burrow_engine::{EngineConfig, EngineError, LinkCache, LinkStore, ResolutionEngine};
use burrow_storage::{InMemoryStore, MySqlStore};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();
    init_tracing(config.log_format);

    info!(
        storage_backend = %config.storage,
        cache_backend = %config.cache,
        "starting burrow"
    );

    match config.storage {
        StorageBackendArg::InMemory => with_cache(InMemoryStore::new(), &config).await,
        StorageBackendArg::Mysql => {
            let dsn = config
                .mysql_dsn
                .as_deref()
                .context("mysql dsn is required when storage backend is mysql")?;
            let store = MySqlStore::connect(dsn)
                .await
                .context("failed to connect to mysql")?;
            store
                .ensure_schema()
                .await
                .context("failed to apply links schema")?;
            with_cache(store, &config).await
        }
    }
}

/// Logs go to stderr so stdout only carries command output.
fn init_tracing(format: LogFormatArg) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormatArg::Text => subscriber.init(),
        LogFormatArg::Json => subscriber.json().init(),
    }
}

fn engine_config(config: &CLI) -> EngineConfig {
    EngineConfig::builder()
        .positive_ttl(Duration::from_secs(config.positive_ttl_secs))
        .negative_ttl(Duration::from_secs(config.negative_ttl_secs))
        .warm_batch_size(config.warm_batch_size)
        .filter(
            ExistenceFilterConfig::builder()
                .expected_items(config.filter_expected_items)
                .false_positive_rate(config.filter_fp_rate)
                .build(),
        )
        .build()
}

async fn with_cache<S: LinkStore>(store: S, config: &CLI) -> anyhow::Result<()> {
    let engine_config = engine_config(config);

    match config.cache {
        CacheBackendArg::Moka => {
            let engine = ResolutionEngine::new(store, MokaLinkCache::new(), engine_config)?;
            run(engine, &config.command).await
        }
        CacheBackendArg::Redis => {
            let redis_url = config
                .redis_url
                .as_deref()
                .context("redis url is required when cache backend is redis")?;
            let cache = RedisLinkCache::connect(redis_url, config.key_prefix.clone())
                .await
                .context("failed to connect to redis")?;
            let engine = ResolutionEngine::new(store, cache, engine_config)?;
            run(engine, &config.command).await
        }
    }
}

async fn run<S: LinkStore, C: LinkCache>(
    engine: ResolutionEngine<S, C>,
    command: &Command,
) -> anyhow::Result<()> {
    let loaded = engine.warm().await.context("failed to warm existence filter")?;
    info!(loaded, "existence filter ready");

    match command {
        Command::Shorten { url } => {
            let token = engine.create(url).await?;
            println!("{token}");
        }
        Command::Resolve { tokens } => {
            for token in tokens {
                match engine.resolve(token).await {
                    Ok(url) => println!("{token} -> {url}"),
                    Err(EngineError::NotFound) => println!("{token}: not found"),
                    Err(e) => return Err(e.into()),
                }
            }
        }
    }

    Ok(())
}
