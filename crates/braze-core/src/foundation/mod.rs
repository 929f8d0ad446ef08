//! Foundation layer - Core abstractions and type system.
//!
//! This module contains the fundamental building blocks of the Braze framework:
//! - Gateway event model and channel metadata
//! - The channel name directory and its persistence seam
//! - Per-dispatch context with the yield-to-next continue signal
//! - Unified error types

pub mod context;
pub mod directory;
pub mod error;
pub mod event;

pub use context::{AdapterContext, Context};
pub use directory::{ChannelDirectory, DirectoryStore};
pub use error::{
    GatewayError, GatewayResult, HandlerError, HandlerResult, SendError, StoreError, StoreResult,
};
pub use event::{Author, ChannelChange, ChannelInfo, ChannelKind, GatewayEvent, MessageEvent};
