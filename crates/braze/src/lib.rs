//! # Braze
//!
//! A command-dispatch bot framework with cooperative handler chaining.
//!
//! ## Overview
//!
//! Braze sits on top of a chat-platform gateway connection. Inbound events
//! are routed to handler chains keyed by the leading word of each message;
//! handlers can explicitly yield to the next handler in their chain before
//! finishing their own work. A shared channel directory resolves channel
//! names to platform identifiers, and a cron-driven job runner reuses the
//! same context machinery for timer-triggered handlers.
//!
//! ```text
//! ┌─────────────┐     ┌────────────┐     ┌───────────┐
//! │   Gateway   │────▶│ Dispatcher │────▶│  Handler  │──▶ next() ──┐
//! │   Client    │     │            │     │  Handler  │◀───────────┘
//! └─────────────┘     └────────────┘     └───────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use braze::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let cfg = braze::runtime::load_config()?;
//!     braze::runtime::logging::init_from_config(&cfg.logging);
//!
//!     let definitions = vec![Definition::command(
//!         "!ping",
//!         vec![handler(|ctx| async move {
//!             ctx.reply("pong").await?;
//!             Ok(())
//!         })],
//!     )];
//!
//!     let app = App::builder()
//!         .config(cfg)
//!         .client(my_gateway_client)
//!         .source(StaticSource::new(definitions))
//!         .build()?;
//!     app.run(gateway_events).await?;
//!     Ok(())
//! }
//! ```

pub use braze_core as core;
pub use braze_runtime as runtime;

/// Prelude module for convenient imports.
pub mod prelude {
    // App orchestration - main entry point
    pub use braze_runtime::{App, AppBuilder, BrazeConfig, FsHandlerSource, StaticSource};

    // Handler definitions and dispatch
    pub use braze_core::{
        Context, Definition, Dispatcher, GatewayEvent, HandlerError, HandlerRegistry,
        HandlerResult, TokenPolicy, handler,
    };

    // Channel directory and gateway seams
    pub use braze_core::{
        Author, ChannelDirectory, ChannelInfo, ChannelKind, ChatClient, EventAdapter,
        MessageEvent,
    };
}
