use burrow_cache::{DEFAULT_EXPECTED_ITEMS, DEFAULT_FALSE_POSITIVE_RATE, DEFAULT_KEY_PREFIX};
use burrow_engine::config::{DEFAULT_NEGATIVE_TTL, DEFAULT_POSITIVE_TTL, DEFAULT_WARM_BATCH_SIZE};
use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::{Display, Formatter};

pub const STORAGE_BACKEND_ENV: &str = "BURROW_STORAGE_BACKEND";
pub const MYSQL_DSN_ENV: &str = "BURROW_MYSQL_DSN";
pub const CACHE_BACKEND_ENV: &str = "BURROW_CACHE_BACKEND";
pub const REDIS_URL_ENV: &str = "BURROW_REDIS_URL";
pub const KEY_PREFIX_ENV: &str = "BURROW_KEY_PREFIX";
pub const POSITIVE_TTL_SECS_ENV: &str = "BURROW_POSITIVE_TTL_SECS";
pub const NEGATIVE_TTL_SECS_ENV: &str = "BURROW_NEGATIVE_TTL_SECS";
pub const WARM_BATCH_SIZE_ENV: &str = "BURROW_WARM_BATCH_SIZE";
pub const FILTER_EXPECTED_ITEMS_ENV: &str = "BURROW_FILTER_EXPECTED_ITEMS";
pub const FILTER_FP_RATE_ENV: &str = "BURROW_FILTER_FP_RATE";
pub const LOG_FORMAT_ENV: &str = "BURROW_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "mysql")]
    Mysql,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Mysql => write!(f, "mysql"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CacheBackendArg {
    #[value(name = "moka")]
    Moka,
    #[value(name = "redis")]
    Redis,
}

impl Display for CacheBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBackendArg::Moka => write!(f, "moka"),
            CacheBackendArg::Redis => write!(f, "redis"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    #[value(name = "text")]
    Text,
    #[value(name = "json")]
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Allocate a token for a URL and print it.
    Shorten { url: String },
    /// Resolve one or more tokens.
    Resolve {
        #[arg(required = true)]
        tokens: Vec<String>,
    },
}

#[derive(Debug, Parser)]
#[command(name = "burrow", about = "Allocate and resolve short link tokens")]
pub struct CLI {
    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = MYSQL_DSN_ENV, required_if_eq("storage", "mysql"))]
    pub mysql_dsn: Option<String>,

    #[arg(
        long,
        env = CACHE_BACKEND_ENV,
        value_enum,
        default_value_t = CacheBackendArg::Moka
    )]
    pub cache: CacheBackendArg,

    #[arg(long, env = REDIS_URL_ENV, required_if_eq("cache", "redis"))]
    pub redis_url: Option<String>,

    #[arg(long, env = KEY_PREFIX_ENV, default_value = DEFAULT_KEY_PREFIX)]
    pub key_prefix: String,

    #[arg(long, env = POSITIVE_TTL_SECS_ENV, default_value_t = DEFAULT_POSITIVE_TTL.as_secs())]
    pub positive_ttl_secs: u64,

    #[arg(long, env = NEGATIVE_TTL_SECS_ENV, default_value_t = DEFAULT_NEGATIVE_TTL.as_secs())]
    pub negative_ttl_secs: u64,

    #[arg(
        long,
        env = WARM_BATCH_SIZE_ENV,
        default_value_t = DEFAULT_WARM_BATCH_SIZE,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub warm_batch_size: u64,

    #[arg(long, env = FILTER_EXPECTED_ITEMS_ENV, default_value_t = DEFAULT_EXPECTED_ITEMS)]
    pub filter_expected_items: usize,

    #[arg(long, env = FILTER_FP_RATE_ENV, default_value_t = DEFAULT_FALSE_POSITIVE_RATE)]
    pub filter_fp_rate: f64,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormatArg::Text)]
    pub log_format: LogFormatArg,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply() {
        let cli = CLI::try_parse_from(["burrow", "shorten", "https://example.com"]).unwrap();

        assert_eq!(cli.storage, StorageBackendArg::InMemory);
        assert_eq!(cli.cache, CacheBackendArg::Moka);
        assert_eq!(cli.key_prefix, "short:");
        assert_eq!(cli.warm_batch_size, 1_000);
        assert!(matches!(cli.command, Command::Shorten { ref url } if url == "https://example.com"));
    }

    #[test]
    fn key_prefix_flag_overrides_default() {
        let cli = CLI::try_parse_from([
            "burrow",
            "--cache",
            "redis",
            "--redis-url",
            "redis://127.0.0.1:6379",
            "--key-prefix",
            "tenant:short:",
            "resolve",
            "eDRh",
        ])
        .unwrap();

        assert_eq!(cli.cache, CacheBackendArg::Redis);
        assert_eq!(cli.key_prefix, "tenant:short:");
    }

    #[test]
    fn mysql_requires_dsn() {
        let result = CLI::try_parse_from(["burrow", "--storage", "mysql", "resolve", "eDRh"]);
        assert!(result.is_err());
    }

    #[test]
    fn redis_requires_url() {
        let result = CLI::try_parse_from(["burrow", "--cache", "redis", "resolve", "eDRh"]);
        assert!(result.is_err());
    }

    #[test]
    fn resolve_takes_many_tokens() {
        let cli = CLI::try_parse_from(["burrow", "resolve", "eDRh", "eDRi"]).unwrap();
        match cli.command {
            Command::Resolve { tokens } => assert_eq!(tokens, vec!["eDRh", "eDRi"]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn resolve_requires_a_token() {
        assert!(CLI::try_parse_from(["burrow", "resolve"]).is_err());
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let result = CLI::try_parse_from(["burrow", "--warm-batch-size", "0", "resolve", "eDRh"]);
        assert!(result.is_err());
    }
}
