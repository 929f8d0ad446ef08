//! Configuration system for the Braze runtime.
//!
//! Configuration is layered (lowest to highest priority):
//!
//! 1. Built-in defaults
//! 2. `braze.toml` in the current directory (or an explicit file)
//! 3. Environment variables (`BRAZE_` prefix, `__` separator)
//!
//! # Environment Variable Mapping
//!
//! - `BRAZE_TOKEN=xxx` → `token = "xxx"`
//! - `BRAZE_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//! - `BRAZE_DISPATCH__LIST_COMMAND=!commands` → `dispatch.list_command`

mod loader;
mod schema;

pub use loader::{ConfigError, ConfigLoader, ConfigResult, load_config};
pub use schema::{
    BrazeConfig, DirectoryConfig, DispatchConfig, HandlerConfig, LogFormat, LoggingConfig,
};
