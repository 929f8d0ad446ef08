//! # Braze Core
//!
//! The core dispatch engine of the Braze bot framework.
//!
//! Braze routes a continuous stream of inbound gateway events to handler
//! chains keyed by a command prefix, lets handlers cooperatively yield to the
//! next handler in their chain, and keeps an in-memory directory mapping
//! channel names to platform channel identifiers so handlers can address
//! channels without manual ID lookups.
//!
//! ## Architecture Layers
//!
//! Braze Core is organized into three architectural layers:
//!
//! ### Foundation Layer
//!
//! Core abstractions and type system:
//! - **Event Model**: Gateway events and channel metadata ([`GatewayEvent`], [`MessageEvent`])
//! - **Channel Directory**: The name-to-identifier cache ([`ChannelDirectory`])
//! - **Context Management**: Per-dispatch state and the continue signal ([`Context`])
//!
//! ### Framework Layer
//!
//! Event processing and routing:
//! - **Handler Registry**: Command, job, and adapter definitions ([`HandlerRegistry`], [`Definition`])
//! - **Dispatcher**: Prefix extraction and chain execution ([`Dispatcher`])
//! - **Scheduled Jobs**: Cron-driven handlers sharing the context machinery ([`JobRunner`])
//!
//! ### Integration Layer
//!
//! External system interfaces:
//! - **Gateway Client**: The opaque connected-client capability ([`ChatClient`])
//! - **Event Adapter**: Typed emitter for adapter-bound handlers ([`EventAdapter`])
//!
//! ## Event Flow
//!
//! All gateway events flow through the central [`Dispatcher`]:
//!
//! ```text
//! ┌─────────────┐     ┌────────────┐     ┌───────────┐
//! │   Gateway   │────▶│ Dispatcher │────▶│  Handler  │
//! │   Client    │     │   (Core)   │────▶│  Handler  │
//! └─────────────┘     └────────────┘────▶│  Handler  │
//!                                        └───────────┘
//! ```
//!
//! Channel lifecycle events take a side path: they trigger a full rebuild of
//! the [`ChannelDirectory`] from the client's live channel enumeration.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use braze_core::{Definition, Dispatcher, HandlerRegistry, handler};
//!
//! let definitions = vec![Definition::command(
//!     "!ping",
//!     vec![handler(|ctx| async move { ctx.reply("pong").await })],
//! )];
//!
//! let registry = HandlerRegistry::load(definitions, client.clone(), directory.clone(), |name| {
//!     println!("registered {name}");
//! })?;
//!
//! let dispatcher = Dispatcher::new(client, directory, Arc::new(registry));
//! while let Some(event) = events.recv().await {
//!     dispatcher.handle(event).await;
//! }
//! ```

// Architectural layers
pub mod foundation;
pub mod framework;
pub mod integration;

// Re-export foundation types
pub use foundation::{
    AdapterContext, Author, ChannelChange, ChannelDirectory, ChannelInfo, ChannelKind, Context,
    DirectoryStore, GatewayError, GatewayEvent, GatewayResult, HandlerError, HandlerResult,
    MessageEvent, SendError, StoreError, StoreResult,
};

// Re-export framework types
pub use framework::{
    CommandHandler, Definition, Dispatcher, HandlerRegistry, JobRunner, RegistryError,
    ScheduledJob, TokenPolicy, handler,
};

// Re-export integration types
pub use integration::{BoxedClient, ChatClient, EventAdapter};

/// Prelude for common imports.
pub mod prelude {
    pub use super::foundation::*;
    pub use super::framework::{
        CommandHandler, Definition, Dispatcher, HandlerRegistry, JobRunner, TokenPolicy, handler,
    };
    pub use super::integration::{BoxedClient, ChatClient, EventAdapter};
}
