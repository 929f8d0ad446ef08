//! # Braze Runtime
//!
//! Runtime orchestration for the Braze bot framework: configuration loading,
//! logging setup, handler-definition discovery, channel-directory
//! persistence, and the [`App`] wiring layer that ties a gateway client and
//! an event stream to the core dispatcher.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use braze_runtime::{App, StaticSource, config, logging};
//!
//! let cfg = config::load_config()?;
//! logging::init_from_config(&cfg.logging);
//!
//! let app = App::builder()
//!     .config(cfg)
//!     .client(client)
//!     .source(StaticSource::new(definitions))
//!     .build()?;
//! app.run(events).await;
//! ```

pub mod app;
pub mod config;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod store;

pub use app::{App, AppBuilder};
pub use config::{BrazeConfig, ConfigError, ConfigResult, load_config};
pub use discovery::{FsHandlerSource, HandlerSource, StaticSource};
pub use error::{RuntimeError, RuntimeResult};
pub use store::JsonFileStore;
