//! Environment configuration
//!
//! Read once at startup. A malformed value is fatal: main logs it and
//! exits non-zero rather than running with a silently-wrong limit.

use std::path::PathBuf;

use crate::{DEFAULT_RATE_LIMIT_PER_MINUTE, DEFAULT_SESSION_TTL_MINUTES};

const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name}={value:?} is not valid: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime configuration, all from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// ARIFOS_API_KEY: guards the HTTP surface and doubles as the
    /// SOVEREIGN authority token. Absent means the guard is off.
    pub api_key: Option<String>,
    /// PORT (default 8000)
    pub port: u16,
    /// SESSION_TTL_MINUTES (default 30)
    pub session_ttl_minutes: u64,
    /// RATE_LIMIT_PER_MINUTE (default 60)
    pub rate_limit_per_minute: u32,
    /// LEDGER_PATH: absent means the ledger is in-memory only
    pub ledger_path: Option<PathBuf>,
    /// EXTERNAL_KV_URL: absent means in-process sessions only
    pub external_kv_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            port: DEFAULT_PORT,
            session_ttl_minutes: DEFAULT_SESSION_TTL_MINUTES,
            rate_limit_per_minute: DEFAULT_RATE_LIMIT_PER_MINUTE,
            ledger_path: None,
            external_kv_url: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Testable core: resolve configuration from any name -> value map
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = parse_or("PORT", lookup("PORT"), DEFAULT_PORT)?;
        let session_ttl_minutes = parse_or(
            "SESSION_TTL_MINUTES",
            lookup("SESSION_TTL_MINUTES"),
            DEFAULT_SESSION_TTL_MINUTES,
        )?;
        let rate_limit_per_minute = parse_or(
            "RATE_LIMIT_PER_MINUTE",
            lookup("RATE_LIMIT_PER_MINUTE"),
            DEFAULT_RATE_LIMIT_PER_MINUTE,
        )?;
        if rate_limit_per_minute == 0 {
            return Err(ConfigError::Invalid {
                name: "RATE_LIMIT_PER_MINUTE",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            api_key: lookup("ARIFOS_API_KEY").filter(|v| !v.is_empty()),
            port,
            session_ttl_minutes,
            rate_limit_per_minute,
            ledger_path: lookup("LEDGER_PATH")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            external_kv_url: lookup("EXTERNAL_KV_URL").filter(|v| !v.is_empty()),
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(s) if s.is_empty() => Ok(default),
        Some(s) => s.parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            value: s,
            reason: e.to_string(),
        }),
    }
}

// =============================================================================
// TESTS
// =============================================================================
