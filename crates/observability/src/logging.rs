//! Logging configuration and subscriber installation.
//!
//! JSON lines by default; `RUST_LOG` wins over the configured filter when set.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

pub const ENV_LOG_FORMAT: &str = "RENTDESK_LOG_FORMAT";
pub const ENV_LOG_FILTER: &str = "RENTDESK_LOG_FILTER";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    /// Human-readable single-line output for local runs.
    Compact,
}

impl core::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "compact" | "text" => Ok(LogFormat::Compact),
            other => anyhow::bail!("unknown log format '{other}' (expected json or compact)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    pub format: LogFormat,
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Json,
            filter: "info".to_string(),
        }
    }
}

impl LogConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup (unset keys keep their defaults).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_LOG_FORMAT) {
            config.format = raw
                .parse()
                .with_context(|| format!("invalid {ENV_LOG_FORMAT}"))?;
        }

        if let Some(raw) = lookup(ENV_LOG_FILTER) {
            EnvFilter::try_new(raw.trim())
                .with_context(|| format!("invalid {ENV_LOG_FILTER} '{raw}'"))?;
            config.filter = raw.trim().to_string();
        }

        Ok(config)
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.filter))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Install the global subscriber described by `config`.
///
/// Returns `false` when a subscriber was already installed (the call is then
/// a no-op).
pub fn init_with(config: &LogConfig) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(config.env_filter())
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false);

    let installed = match config.format {
        LogFormat::Json => builder.json().try_init().is_ok(),
        LogFormat::Compact => builder.compact().try_init().is_ok(),
    };

    if installed {
        tracing::debug!(format = ?config.format, filter = %config.filter, "logging initialised");
    }
    installed
}
