//! Process configuration read from the environment.
//!
//! | Variable           | Default       |
//! |--------------------|---------------|
//! | `DATABASE_URL`     | `./data.sql`  |
//! | `DATABASE_DRIVER`  | `sqlite3`     |
//! | `CACHE_BACKEND`    | `redis`       |
//! | `REDIS_HOST`       | `localhost`   |
//! | `REDIS_PORT`       | `6379`        |
//! | `CACHE_TTL_SECS`   | `600`         |
//! | `GIT_PROGRAM`      | `git`         |
//! | `GIT_TIMEOUT_SECS` | `30`          |

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unsupported database driver '{0}', only sqlite3 is available")]
    UnsupportedDriver(String),

    #[error("unknown cache backend '{0}', expected 'redis' or 'memory'")]
    UnknownCacheBackend(String),

    #[error("{name} must be a non-negative integer, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheConfig {
    Redis { host: String, port: u16 },
    Memory,
}

impl CacheConfig {
    pub fn redis_url(host: &str, port: u16) -> String {
        format!("redis://{}:{}", host, port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitConfig {
    pub program: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub cache_ttl: Duration,
    pub git: GitConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from any variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str, default: &str| {
            lookup(name)
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let driver = var("DATABASE_DRIVER", "sqlite3");
        if !matches!(driver.as_str(), "sqlite3" | "sqlite") {
            return Err(ConfigError::UnsupportedDriver(driver));
        }

        let cache = match var("CACHE_BACKEND", "redis").as_str() {
            "redis" => CacheConfig::Redis {
                host: var("REDIS_HOST", "localhost"),
                port: parse_number("REDIS_PORT", &var("REDIS_PORT", "6379"))?,
            },
            "memory" => CacheConfig::Memory,
            other => return Err(ConfigError::UnknownCacheBackend(other.to_string())),
        };

        Ok(Self {
            database: DatabaseConfig {
                url: var("DATABASE_URL", "./data.sql"),
            },
            cache,
            cache_ttl: Duration::from_secs(parse_number("CACHE_TTL_SECS", &var("CACHE_TTL_SECS", "600"))?),
            git: GitConfig {
                program: var("GIT_PROGRAM", "git"),
                timeout: Duration::from_secs(parse_positive(
                    "GIT_TIMEOUT_SECS",
                    &var("GIT_TIMEOUT_SECS", "30"),
                )?),
            },
        })
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidNumber {
        name,
        value: value.to_string(),
    })
}

/// A zero timeout would fail every remote lookup before it starts.
fn parse_positive(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    match parse_number(name, value)? {
        0 => Err(ConfigError::InvalidNumber {
            name,
            value: value.to_string(),
        }),
        n => Ok(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config(&[]).unwrap();

        assert_eq!(config.database.url, "./data.sql");
        assert_eq!(
            config.cache,
            CacheConfig::Redis {
                host: "localhost".into(),
                port: 6379
            }
        );
        assert_eq!(config.cache_ttl, Duration::from_secs(600));
        assert_eq!(config.git.program, "git");
        assert_eq!(config.git.timeout, Duration::from_secs(30));
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = config(&[
            ("DATABASE_URL", "/var/lib/catalog.sql"),
            ("REDIS_HOST", "cache"),
            ("REDIS_PORT", "6380"),
            ("GIT_TIMEOUT_SECS", "5"),
        ])
        .unwrap();

        assert_eq!(config.database.url, "/var/lib/catalog.sql");
        assert_eq!(
            config.cache,
            CacheConfig::Redis {
                host: "cache".into(),
                port: 6380
            }
        );
        assert_eq!(config.git.timeout, Duration::from_secs(5));
    }

    #[test]
    fn empty_values_fall_back_to_defaults() {
        let config = config(&[("REDIS_HOST", ""), ("DATABASE_URL", "")]).unwrap();
        assert_eq!(config.database.url, "./data.sql");
    }

    #[test]
    fn memory_cache_backend() {
        let config = config(&[("CACHE_BACKEND", "memory")]).unwrap();
        assert_eq!(config.cache, CacheConfig::Memory);
    }

    #[test]
    fn rejects_unsupported_driver() {
        assert_eq!(
            config(&[("DATABASE_DRIVER", "postgres")]).unwrap_err(),
            ConfigError::UnsupportedDriver("postgres".into())
        );
    }

    #[test]
    fn rejects_bad_port() {
        assert!(matches!(
            config(&[("REDIS_PORT", "sixty")]),
            Err(ConfigError::InvalidNumber { name: "REDIS_PORT", .. })
        ));
    }

    #[test]
    fn rejects_zero_git_timeout() {
        assert!(matches!(
            config(&[("GIT_TIMEOUT_SECS", "0")]),
            Err(ConfigError::InvalidNumber { name: "GIT_TIMEOUT_SECS", ref value }) if value == "0"
        ));
        assert_eq!(
            config(&[("GIT_TIMEOUT_SECS", "1")]).unwrap().git.timeout,
            Duration::from_secs(1)
        );
    }
}
