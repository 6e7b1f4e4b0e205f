//! Cache configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use invoker_core::constants::{
    DEFAULT_TIME_TO_LIVE_MS, ENV_KEY_POLICY, ENV_TIME_TO_LIVE_MS, TIME_TO_LIVE_FIELD,
};
use invoker_core::error::{InvokerError, Result};

/// Which invocations are eligible for caching.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyPolicy {
    /// Every invocation is cached, keyed on its full parameter set.
    #[default]
    Parameters,
    /// Only invocations whose parameters are all null (or absent) are cached.
    /// Anything carrying real input always reaches the target.
    NoInputOnly,
}

impl KeyPolicy {
    /// Returns the configuration spelling of this policy.
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyPolicy::Parameters => "parameters",
            KeyPolicy::NoInputOnly => "no-input-only",
        }
    }
}

impl fmt::Display for KeyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyPolicy {
    type Err = InvokerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "parameters" => Ok(KeyPolicy::Parameters),
            "no-input-only" => Ok(KeyPolicy::NoInputOnly),
            other => Err(InvokerError::ConfigParse(format!(
                "unknown key policy '{other}', expected 'parameters' or 'no-input-only'"
            ))),
        }
    }
}

/// Cache configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Time-to-live of a cached response in milliseconds
    pub time_to_live_ms: i64,
    /// Which invocations are cached
    pub key_policy: KeyPolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            time_to_live_ms: DEFAULT_TIME_TO_LIVE_MS,
            key_policy: KeyPolicy::default(),
        }
    }
}

impl CacheConfig {
    /// Creates a configuration with the given time-to-live and default policy.
    pub fn with_time_to_live_ms(time_to_live_ms: i64) -> Self {
        Self {
            time_to_live_ms,
            ..Self::default()
        }
    }

    /// Sets the key policy.
    pub fn key_policy(mut self, key_policy: KeyPolicy) -> Self {
        self.key_policy = key_policy;
        self
    }

    /// Checks that the time-to-live is strictly positive.
    pub fn validate(&self) -> Result<()> {
        self.time_to_live().map(|_| ())
    }

    /// Returns the time-to-live as a duration.
    ///
    /// # Errors
    /// `InvalidConfiguration` if the configured value is zero or negative.
    pub fn time_to_live(&self) -> Result<Duration> {
        time_to_live_from_millis(self.time_to_live_ms)
    }

    /// Parses and validates a JSON configuration document.
    ///
    /// Missing fields take their default values.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads the configuration from the environment (and `.env` if present).
    ///
    /// Unset or unparsable variables fall back to defaults. The result is
    /// not validated; constructing an invoker from it does that.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_vars(|name| std::env::var(name).ok())
    }

    fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let time_to_live_ms = match lookup(ENV_TIME_TO_LIVE_MS) {
            Some(raw) => raw.trim().parse::<i64>().unwrap_or_else(|_| {
                warn!(var = ENV_TIME_TO_LIVE_MS, value = %raw, "Unparsable time-to-live, using default");
                defaults.time_to_live_ms
            }),
            None => defaults.time_to_live_ms,
        };

        let key_policy = match lookup(ENV_KEY_POLICY) {
            Some(raw) => raw.parse::<KeyPolicy>().unwrap_or_else(|err| {
                warn!(var = ENV_KEY_POLICY, error = %err, "Unknown key policy, using default");
                defaults.key_policy
            }),
            None => defaults.key_policy,
        };

        Self {
            time_to_live_ms,
            key_policy,
        }
    }
}

/// Converts a millisecond time-to-live, rejecting non-positive values.
pub(crate) fn time_to_live_from_millis(time_to_live_ms: i64) -> Result<Duration> {
    if time_to_live_ms <= 0 {
        return Err(invalid_time_to_live(format!("{time_to_live_ms}ms")));
    }
    Ok(Duration::from_millis(time_to_live_ms as u64))
}

/// Whole milliseconds of `duration` for log fields, saturating at `u64::MAX`.
pub(crate) fn millis_for_log(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

pub(crate) fn invalid_time_to_live(value: impl fmt::Display) -> InvokerError {
    InvokerError::invalid_configuration(
        TIME_TO_LIVE_FIELD,
        format!("must be strictly positive, got {value}"),
    )
}
