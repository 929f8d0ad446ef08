//! Execution context for the Braze framework.
//!
//! This module provides [`Context`], the per-dispatch object handed to every
//! handler, and [`AdapterContext`], the typed-payload variant used by
//! adapter-bound handlers.

use std::ops::Deref;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Notify;

use crate::foundation::directory::ChannelDirectory;
use crate::foundation::error::{GatewayError, GatewayResult, SendError};
use crate::foundation::event::MessageEvent;
use crate::integration::client::BoxedClient;

/// The context object passed to handlers during dispatch.
///
/// A `Context` is created fresh per dispatch round - one per inbound message,
/// one per job tick - and discarded after the chain completes or fails. It
/// exposes the connected client, the shared channel directory, and (for
/// message-triggered dispatches) the triggering event, the matched command,
/// and the remaining text.
///
/// # The continue signal
///
/// [`next`](Self::next) raises the single-shot continue signal the dispatcher
/// races against the current handler's completion: a handler that calls
/// `next()` lets the rest of its chain begin while it keeps running in the
/// background. A handler that neither completes nor calls `next()` stalls its
/// chain indefinitely - no timeout is enforced.
pub struct Context {
    /// The connected gateway client.
    client: BoxedClient,
    /// The shared channel directory.
    directory: Arc<ChannelDirectory>,
    /// The triggering message, for message dispatches.
    trigger: Option<MessageEvent>,
    /// The matched command token.
    command: Option<String>,
    /// Message text with the command token removed and trimmed.
    content: Option<String>,
    /// The yield-to-next continue signal.
    next: Notify,
}

impl Context {
    /// Creates a context for a message-triggered dispatch.
    pub fn for_message(
        client: BoxedClient,
        directory: Arc<ChannelDirectory>,
        trigger: MessageEvent,
        command: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            client,
            directory,
            trigger: Some(trigger),
            command: Some(command.into()),
            content: Some(content.into()),
            next: Notify::new(),
        }
    }

    /// Creates a context for a scheduled job or adapter-bound handler.
    ///
    /// Job contexts carry no triggering event; reply operations fail with
    /// [`GatewayError::NotConnected`]-style errors, but
    /// [`send_to`](Self::send_to) works against the live directory.
    pub fn for_job(client: BoxedClient, directory: Arc<ChannelDirectory>) -> Self {
        Self {
            client,
            directory,
            trigger: None,
            command: None,
            content: None,
            next: Notify::new(),
        }
    }

    /// Returns the connected gateway client.
    pub fn client(&self) -> &BoxedClient {
        &self.client
    }

    /// Returns the shared channel directory.
    pub fn directory(&self) -> &ChannelDirectory {
        &self.directory
    }

    /// Returns the triggering message event, if any.
    pub fn event(&self) -> Option<&MessageEvent> {
        self.trigger.as_ref()
    }

    /// Returns the matched command token, if any.
    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    /// Returns the message text after the command token, trimmed.
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// Signals the dispatcher that the next handler in the chain may begin.
    ///
    /// The current handler keeps running; its eventual failure (if any) is
    /// logged but no longer aborts the chain.
    pub fn next(&self) {
        self.next.notify_one();
    }

    /// Resolves when [`next`](Self::next) fires. One permit per call.
    pub(crate) async fn advance(&self) {
        self.next.notified().await;
    }

    fn trigger(&self) -> GatewayResult<&MessageEvent> {
        self.trigger
            .as_ref()
            .ok_or_else(|| GatewayError::Other("context has no triggering event".into()))
    }

    /// Replies to the triggering event with text.
    pub async fn reply(&self, text: &str) -> GatewayResult<()> {
        let event = self.trigger()?;
        self.client.reply(event, text).await
    }

    /// Replies to the triggering event with a file attachment.
    pub async fn reply_file(&self, filename: &str, bytes: &[u8]) -> GatewayResult<()> {
        let event = self.trigger()?;
        self.client.reply_file(event, filename, bytes).await
    }

    /// Sends a typing indicator to the triggering event's channel.
    pub async fn typing(&self) -> GatewayResult<()> {
        let event = self.trigger()?;
        self.client.send_typing(&event.channel_id).await
    }

    /// Sends text to a channel addressed by name.
    ///
    /// The name is resolved through the channel directory; an unresolved name
    /// surfaces as [`SendError::ChannelNotFound`], letting the handler decide
    /// the user-facing behavior.
    pub async fn send_to(&self, channel_name: &str, text: &str) -> Result<(), SendError> {
        let id = self
            .directory
            .lookup(channel_name)
            .ok_or_else(|| SendError::ChannelNotFound {
                name: channel_name.to_string(),
            })?;
        self.client.send_text(&id, text).await?;
        Ok(())
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("command", &self.command)
            .field("has_trigger", &self.trigger.is_some())
            .finish()
    }
}

// ============================================================================
// Adapter Context
// ============================================================================

/// Context variant for adapter-bound handlers.
///
/// Instead of a raw gateway event, an `AdapterContext` carries a typed
/// payload slot filled by the [`EventAdapter`](crate::integration::EventAdapter)
/// subscription before each invocation. All regular [`Context`] operations
/// are available through `Deref`.
pub struct AdapterContext<T> {
    inner: Arc<Context>,
    payload: RwLock<Option<T>>,
}

impl<T> AdapterContext<T> {
    /// Creates an adapter context wrapping a shared base context.
    pub fn new(inner: Arc<Context>) -> Self {
        Self {
            inner,
            payload: RwLock::new(None),
        }
    }

    /// Places the emitted payload for the upcoming invocation.
    pub fn set_payload(&self, data: T) {
        *self.payload.write() = Some(data);
    }
}

impl<T: Clone> AdapterContext<T> {
    /// Returns a copy of the current payload, if one is set.
    pub fn payload(&self) -> Option<T> {
        self.payload.read().clone()
    }
}

impl<T> Deref for AdapterContext<T> {
    type Target = Context;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
