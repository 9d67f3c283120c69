use secrecy::Secret;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_COLLECTOR_QUEUE_SIZE: usize = 256;
const DEFAULT_COLLECTOR_TIMEOUT_SECS: u64 = 5;
const DEFAULT_COLLECTOR_DRAIN_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, Deserialize)]
pub struct PlanetConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub mongodb: MongoConfig,
    pub collector: CollectorConfig,
    pub web: WebConfig,
    /// Environment name reported by `/os`. Omitted from the response when unset.
    pub environment: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    /// Missing URI is not a configuration error: startup takes the
    /// connection-failure path and keeps serving.
    pub uri: Option<String>,
    pub username: Option<String>,
    pub password: Option<Secret<String>>,
    /// Overrides the database named in the URI.
    pub database: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectorConfig {
    /// When unset the side-channel logger is a no-op.
    pub url: Option<String>,
    pub queue_size: usize,
    /// Upper bound on a single POST to the collector, connection included.
    pub request_timeout: Duration,
    /// How long shutdown waits for queued entries before abandoning them.
    pub drain_timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    pub root: PathBuf,
}

impl WebConfig {
    pub fn index_file(&self) -> PathBuf {
        self.root.join("index.html")
    }
}

impl PlanetConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        Ok(PlanetConfig {
            common: common_config,
            mongodb: MongoConfig {
                uri: optional_env("MONGO_URI"),
                username: optional_env("MONGO_USERNAME"),
                password: optional_env("MONGO_PASSWORD").map(Secret::new),
                database: optional_env("MONGO_DATABASE"),
            },
            collector: CollectorConfig {
                url: optional_env("CRIBL_URL"),
                queue_size: parse_env("CRIBL_QUEUE_SIZE", DEFAULT_COLLECTOR_QUEUE_SIZE)?,
                request_timeout: Duration::from_secs(parse_env(
                    "CRIBL_TIMEOUT_SECS",
                    DEFAULT_COLLECTOR_TIMEOUT_SECS,
                )?),
                drain_timeout: Duration::from_secs(parse_env(
                    "CRIBL_DRAIN_TIMEOUT_SECS",
                    DEFAULT_COLLECTOR_DRAIN_TIMEOUT_SECS,
                )?),
            },
            web: WebConfig {
                root: optional_env("WEB_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or_else(default_web_root),
            },
            environment: optional_env("ENVIRONMENT"),
        })
    }

    /// Presence of the database settings, for the startup log line.
    pub fn describe_mongo_env(&self) -> [(&'static str, &'static str); 3] {
        let set = |present: bool| if present { "SET" } else { "NOT SET" };
        [
            ("MONGO_URI", set(self.mongodb.uri.is_some())),
            ("MONGO_USERNAME", set(self.mongodb.username.is_some())),
            ("MONGO_PASSWORD", set(self.mongodb.password.is_some())),
        ]
    }
}

/// Unset and blank variables are treated alike.
fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: Display,
{
    match optional_env(key) {
        Some(raw) => raw.trim().parse().map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!(
                "{} must be a non-negative integer, got '{}': {}",
                key,
                raw,
                e
            ))
        }),
        None => Ok(default),
    }
}

/// `public/` next to the manifest, whether started from the workspace root or
/// from inside `planet-service`.
fn default_web_root() -> PathBuf {
    match env::current_dir() {
        Ok(dir) if dir.ends_with("planet-service") => dir.join("public"),
        Ok(dir) => dir.join("planet-service").join("public"),
        Err(_) => PathBuf::from("planet-service/public"),
    }
}
