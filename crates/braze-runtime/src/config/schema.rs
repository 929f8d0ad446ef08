//! Configuration schema definitions.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BrazeConfig {
    /// Gateway authentication token. Required; [`App`](crate::App)
    /// construction fails without it, before any connection attempt.
    #[serde(default)]
    pub token: Option<String>,

    /// Handler discovery settings.
    #[serde(default)]
    pub handlers: HandlerConfig,

    /// Dispatcher settings.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Channel directory persistence.
    #[serde(default)]
    pub directory: DirectoryConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Handler discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerConfig {
    /// Root directory scanned for handler definition files.
    #[serde(default = "default_handler_root")]
    pub root: PathBuf,

    /// File-name suffix a definition file must carry.
    #[serde(default = "default_handler_suffix")]
    pub suffix: String,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            root: default_handler_root(),
            suffix: default_handler_suffix(),
        }
    }
}

fn default_handler_root() -> PathBuf {
    PathBuf::from("handlers")
}

fn default_handler_suffix() -> String {
    ".handler.toml".to_string()
}

/// Dispatcher settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DispatchConfig {
    /// When set, command tokens are extracted from a bounded window of
    /// `max_command_length + 1` characters instead of scanning to the first
    /// space. Only needed as a defense against pathologically long
    /// single-token messages.
    #[serde(default)]
    pub max_command_length: Option<usize>,

    /// Reserved token that replies with the registered command names when it
    /// matches no command. Disabled when unset.
    #[serde(default)]
    pub list_command: Option<String>,
}

/// Channel directory persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DirectoryConfig {
    /// JSON file the directory is persisted to. In-memory only when unset.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Compact single-line output.
    #[default]
    Compact,
    /// Multi-line human-readable output.
    Pretty,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log level directive (trace, debug, info, warn, error).
    /// `RUST_LOG` overrides it when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = BrazeConfig::default();
        assert!(cfg.token.is_none());
        assert_eq!(cfg.handlers.root, PathBuf::from("handlers"));
        assert_eq!(cfg.handlers.suffix, ".handler.toml");
        assert!(cfg.dispatch.max_command_length.is_none());
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.logging.format, LogFormat::Compact);
    }
}
