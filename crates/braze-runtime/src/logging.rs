//! Logging setup using `tracing` and `tracing-subscriber`.
//!
//! # Example
//!
//! ```rust,ignore
//! use braze_runtime::{config, logging};
//!
//! let cfg = config::load_config()?;
//! logging::init_from_config(&cfg.logging);
//! ```

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

/// Initializes the global subscriber from a [`LoggingConfig`].
///
/// The configured level is the default directive; a `RUST_LOG` environment
/// variable overrides it. Uses `try_init` so a second initialization (e.g.
/// in tests) is harmless.
pub fn init_from_config(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let _ = match config.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
}
