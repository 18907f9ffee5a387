//! Tracing/logging setup shared by hosts embedding the rental hooks.

pub mod logging;

pub use logging::{LogConfig, LogFormat, init_with};

/// Initialize process-wide logging from `RENTDESK_LOG_*` and `RUST_LOG`.
///
/// This is safe to call multiple times; subsequent calls become no-ops. A
/// malformed configuration falls back to the defaults.
pub fn init() {
    match LogConfig::from_env() {
        Ok(config) => {
            init_with(&config);
        }
        Err(err) => {
            init_with(&LogConfig::default());
            tracing::warn!(error = %format!("{err:#}"), "invalid logging configuration, using defaults");
        }
    }
}
