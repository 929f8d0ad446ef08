//! Integration layer - External system interfaces.
//!
//! This module contains the seams to external collaborators:
//! - The connected gateway client capability
//! - The typed event adapter for adapter-bound handlers

pub mod adapter;
pub mod client;

pub use adapter::EventAdapter;
pub use client::{BoxedClient, ChatClient};
