//! Configuration loader using figment.
//!
//! Later sources override earlier ones: built-in defaults, then `braze.toml`
//! (or an explicitly supplied file), then `BRAZE_`-prefixed environment
//! variables with `__` as the nesting separator.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use thiserror::Error;
use tracing::debug;

use super::schema::BrazeConfig;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Extraction or merging failed.
    #[error("failed to load configuration: {0}")]
    Figment(#[from] figment::Error),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Loads configuration from the default locations.
///
/// Equivalent to `ConfigLoader::new().load()`.
pub fn load_config() -> ConfigResult<BrazeConfig> {
    ConfigLoader::new().load()
}

/// Builder for layered configuration loading.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    with_env: bool,
}

impl ConfigLoader {
    /// Creates a loader with the default file (`braze.toml`, if present) and
    /// environment overrides enabled.
    pub fn new() -> Self {
        Self {
            file: None,
            with_env: true,
        }
    }

    /// Loads from a specific file instead of `braze.toml`.
    pub fn file(mut self, path: impl AsRef<Path>) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Disables the `BRAZE_*` environment layer.
    pub fn without_env(mut self) -> Self {
        self.with_env = false;
        self
    }

    /// Extracts the merged configuration.
    pub fn load(self) -> ConfigResult<BrazeConfig> {
        let mut figment = Figment::from(Serialized::defaults(BrazeConfig::default()));

        let path = self.file.unwrap_or_else(|| PathBuf::from("braze.toml"));
        if path.exists() {
            debug!(path = %path.display(), "loading config file");
            figment = figment.merge(Toml::file(&path));
        }

        if self.with_env {
            figment = figment.merge(Env::prefixed("BRAZE_").split("__"));
        }

        Ok(figment.extract()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = ConfigLoader::new()
            .file("/nonexistent/braze.toml")
            .without_env()
            .load()
            .unwrap();
        assert!(cfg.token.is_none());
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("braze.toml");
        std::fs::write(
            &path,
            r#"
token = "secret"

[dispatch]
list_command = "!commands"

[logging]
level = "debug"
format = "pretty"
"#,
        )
        .unwrap();

        let cfg = ConfigLoader::new().file(&path).without_env().load().unwrap();
        assert_eq!(cfg.token.as_deref(), Some("secret"));
        assert_eq!(cfg.dispatch.list_command.as_deref(), Some("!commands"));
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.logging.format, super::super::LogFormat::Pretty);
    }
}
