//! Gateway client trait.
//!
//! This module defines the [`ChatClient`] trait, the opaque "connected
//! client" capability the core consumes. The transport collaborator owns the
//! connection lifecycle (login, reconnect, heartbeats) and hands the core an
//! implementation of this trait together with a stream of
//! [`GatewayEvent`](crate::foundation::GatewayEvent)s.

use std::sync::Arc;

use async_trait::async_trait;

use crate::foundation::error::GatewayResult;
use crate::foundation::event::{ChannelInfo, MessageEvent};

/// The connected-client capability.
///
/// All operations the core (and handlers, through the
/// [`Context`](crate::foundation::Context)) may issue against the platform.
/// Braze never interprets platform payloads beyond "send text to a channel"
/// and "reply to a received event".
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Returns our own user identifier on the platform.
    fn bot_id(&self) -> &str;

    /// Returns the full enumeration of currently known channels.
    async fn list_channels(&self) -> GatewayResult<Vec<ChannelInfo>>;

    /// Replies to a received message with text.
    async fn reply(&self, event: &MessageEvent, text: &str) -> GatewayResult<()>;

    /// Replies to a received message with a file attachment.
    async fn reply_file(
        &self,
        event: &MessageEvent,
        filename: &str,
        bytes: &[u8],
    ) -> GatewayResult<()>;

    /// Sends a typing indicator to a channel.
    async fn send_typing(&self, channel_id: &str) -> GatewayResult<()>;

    /// Sends text to a channel by identifier.
    async fn send_text(&self, channel_id: &str, text: &str) -> GatewayResult<()>;
}

/// A shared, type-erased gateway client.
pub type BoxedClient = Arc<dyn ChatClient>;

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::foundation::error::GatewayError;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Recording client used by unit tests across the crate.
    #[derive(Default)]
    pub struct RecordingClient {
        pub channels: Mutex<Vec<ChannelInfo>>,
        pub replies: Mutex<Vec<String>>,
        pub sent: Mutex<Vec<(String, String)>>,
        pub typing: Mutex<Vec<String>>,
        pub files: Mutex<Vec<String>>,
        pub fail_reply: AtomicBool,
        pub fail_fetch: AtomicBool,
    }

    impl RecordingClient {
        pub fn arc() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub fn with_channels(channels: Vec<ChannelInfo>) -> Arc<Self> {
            let client = Self::default();
            *client.channels.lock() = channels;
            Arc::new(client)
        }

        pub fn replies(&self) -> Vec<String> {
            self.replies.lock().clone()
        }

        pub fn sent(&self) -> Vec<(String, String)> {
            self.sent.lock().clone()
        }
    }

    #[async_trait]
    impl ChatClient for RecordingClient {
        fn bot_id(&self) -> &str {
            "braze-bot"
        }

        async fn list_channels(&self) -> GatewayResult<Vec<ChannelInfo>> {
            if self.fail_fetch.load(Ordering::SeqCst) {
                return Err(GatewayError::FetchFailed("offline".into()));
            }
            Ok(self.channels.lock().clone())
        }

        async fn reply(&self, _event: &MessageEvent, text: &str) -> GatewayResult<()> {
            if self.fail_reply.load(Ordering::SeqCst) {
                return Err(GatewayError::SendFailed("reply rejected".into()));
            }
            self.replies.lock().push(text.to_string());
            Ok(())
        }

        async fn reply_file(
            &self,
            _event: &MessageEvent,
            filename: &str,
            _bytes: &[u8],
        ) -> GatewayResult<()> {
            self.files.lock().push(filename.to_string());
            Ok(())
        }

        async fn send_typing(&self, channel_id: &str) -> GatewayResult<()> {
            self.typing.lock().push(channel_id.to_string());
            Ok(())
        }

        async fn send_text(&self, channel_id: &str, text: &str) -> GatewayResult<()> {
            self.sent
                .lock()
                .push((channel_id.to_string(), text.to_string()));
            Ok(())
        }
    }
}
