//! Framework layer - Event processing and routing.
//!
//! This module contains the framework's dispatch pipeline:
//! - Handler definitions and the registry built from them
//! - The central dispatcher with prefix extraction and chain execution
//! - The scheduled-job runner sharing the context machinery

pub mod dispatcher;
pub mod jobs;
pub mod registry;

pub use dispatcher::{Dispatcher, TokenPolicy};
pub use jobs::{JobRunner, ScheduledJob};
pub use registry::{CommandHandler, Definition, HandlerRegistry, RegistryError, handler};
