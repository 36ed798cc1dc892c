//! Logging setup and the per-component logging context.
//!
//! The `log` facade is initialised once at startup from [`LogConfig`]. Components
//! never pick their own log target: they are handed a [`LogContext`] when they are
//! constructed and log through `log::*!(target: ctx.target(), ...)`, so filters such
//! as `LOG_LEVEL=info,todo_api::store=debug` address exactly one component.

use std::io::Write;

use chrono::Utc;
use serde_json::json;

use crate::config::{LogConfig, LogFormat};

/// Log target handed to a component at construction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogContext {
    target: String,
}

impl LogContext {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Context for a sub-component, e.g. `todo_api` -> `todo_api::store`.
    pub fn child(&self, name: &str) -> Self {
        Self::new(format!("{}::{}", self.target, name))
    }
}

impl Default for LogContext {
    fn default() -> Self {
        Self::new(env!("CARGO_CRATE_NAME"))
    }
}

/// Installs the global `env_logger` backend. Fails if a logger is already set.
pub fn init(config: &LogConfig) -> Result<(), log::SetLoggerError> {
    let mut builder = env_logger::Builder::new();
    builder.parse_filters(&config.level);

    if config.format == LogFormat::Json {
        builder.format(|buf, record| {
            writeln!(
                buf,
                "{}",
                json!({
                    "ts": Utc::now().to_rfc3339(),
                    "level": record.level().as_str(),
                    "component": record.target(),
                    "message": record.args().to_string(),
                })
            )
        });
    }

    builder.try_init()
}
