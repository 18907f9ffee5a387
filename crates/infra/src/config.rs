//! Hook configuration.
//!
//! Values come from the environment (`RENTDESK_*`), falling back to the
//! defaults the host ships with.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use rentdesk_stock::StockEntryType;

pub const ENV_STOCK_ENTRY_TYPE: &str = "RENTDESK_STOCK_ENTRY_TYPE";
pub const ENV_STOCK_ENTRY_SERIES: &str = "RENTDESK_STOCK_ENTRY_SERIES";
pub const ENV_MIRROR_ON_SUBMIT: &str = "RENTDESK_MIRROR_ON_SUBMIT";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookConfig {
    /// Stock entry type used for mirrors.
    pub stock_entry_type: StockEntryType,
    /// Naming series prefix for mirror names.
    pub stock_entry_series: String,
    /// Create a stock mirror when a settling invoice is submitted.
    pub mirror_on_submit: bool,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            stock_entry_type: StockEntryType::MaterialTransfer,
            stock_entry_series: "MAT-STE-".to_string(),
            mirror_on_submit: true,
        }
    }
}

impl HookConfig {
    /// Load from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup (unset keys keep their defaults).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_STOCK_ENTRY_TYPE) {
            config.stock_entry_type = raw
                .parse()
                .with_context(|| format!("invalid {ENV_STOCK_ENTRY_TYPE}"))?;
        }

        if let Some(raw) = lookup(ENV_STOCK_ENTRY_SERIES) {
            let series = raw.trim();
            if series.is_empty() {
                anyhow::bail!("{ENV_STOCK_ENTRY_SERIES} cannot be empty");
            }
            config.stock_entry_series = series.to_string();
        }

        if let Some(raw) = lookup(ENV_MIRROR_ON_SUBMIT) {
            config.mirror_on_submit = parse_flag(&raw)
                .with_context(|| format!("invalid {ENV_MIRROR_ON_SUBMIT}"))?;
        }

        Ok(config)
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("expected a boolean, got '{other}'"),
    }
}
