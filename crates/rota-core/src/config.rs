//! Typed configuration from environment variables.
//!
//! Loaded once at startup; invalid values fail fast.
//!
//! | variable             | default                | meaning                              |
//! |----------------------|------------------------|--------------------------------------|
//! | `ROTA_INTERVAL_SECS` | `120`                  | seconds between reassignment passes  |
//! | `ROTA_ELIGIBILITY`   | `current-and-previous` | `current-and-previous` or `served`   |
//! | `ROTA_COMPLETION`    | `covers-pool`          | `covers-pool` or `history-size`      |
//! | `ROTA_SEED`          | unset                  | seed for a reproducible chooser      |
//! | `LOG_LEVEL`          | `info`                 | default tracing filter               |

use std::time::Duration;

use thiserror::Error;

use crate::domain::{CompletionRule, EligibilityRule, ParsePolicyError, RotationPolicy};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name}: {source}")]
    Policy {
        name: &'static str,
        #[source]
        source: ParsePolicyError,
    },

    #[error("{name} must be {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotaConfig {
    pub interval: Duration,
    pub policy: RotationPolicy,
    pub seed: Option<u64>,
    pub log_level: String,
}

impl Default for RotaConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            policy: RotationPolicy::default(),
            seed: None,
            log_level: "info".to_string(),
        }
    }
}

impl RotaConfig {
    /// Load configuration from the process environment.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary lookup (tests use a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let interval = match lookup("ROTA_INTERVAL_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "ROTA_INTERVAL_SECS",
                        expected: "a positive number of seconds",
                        value: raw,
                    });
                }
            },
            None => defaults.interval,
        };

        let eligibility = match lookup("ROTA_ELIGIBILITY") {
            Some(raw) => raw
                .parse::<EligibilityRule>()
                .map_err(|source| ConfigError::Policy {
                    name: "ROTA_ELIGIBILITY",
                    source,
                })?,
            None => EligibilityRule::default(),
        };

        let completion = match lookup("ROTA_COMPLETION") {
            Some(raw) => raw
                .parse::<CompletionRule>()
                .map_err(|source| ConfigError::Policy {
                    name: "ROTA_COMPLETION",
                    source,
                })?,
            None => CompletionRule::default(),
        };

        let seed = match lookup("ROTA_SEED") {
            Some(raw) => Some(raw.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
                name: "ROTA_SEED",
                expected: "an unsigned 64-bit integer",
                value: raw.clone(),
            })?),
            None => None,
        };

        Ok(Self {
            interval,
            policy: RotationPolicy::new(eligibility, completion),
            seed,
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
        })
    }
}
