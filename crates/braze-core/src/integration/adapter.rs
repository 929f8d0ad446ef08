//! Typed event adapter.
//!
//! An [`EventAdapter`] lets application code feed non-gateway events into the
//! handler machinery: an adapter-bound handler definition subscribes to the
//! adapter at load time, and every emitted value is delivered to the handler
//! through an [`AdapterContext`](crate::foundation::AdapterContext) payload
//! slot instead of a raw gateway event.

use tokio::sync::broadcast;

/// A typed, clonable emitter for adapter-bound handlers.
///
/// Backed by a broadcast channel: every subscriber sees every emission.
/// Emitting with no live subscribers is a no-op, not an error.
pub struct EventAdapter<T> {
    tx: broadcast::Sender<T>,
}

impl<T: Clone + Send + 'static> EventAdapter<T> {
    /// Creates an adapter buffering up to `capacity` pending emissions
    /// per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emits a value to all current subscribers.
    ///
    /// Returns the number of subscribers that received the value.
    pub fn emit(&self, data: T) -> usize {
        self.tx.send(data).unwrap_or(0)
    }

    /// Subscribes to future emissions.
    pub fn subscribe(&self) -> broadcast::Receiver<T> {
        self.tx.subscribe()
    }
}

impl<T: Clone + Send + 'static> Default for EventAdapter<T> {
    fn default() -> Self {
        Self::new(16)
    }
}

impl<T> Clone for EventAdapter<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> std::fmt::Debug for EventAdapter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventAdapter")
            .field("subscribers", &self.tx.receiver_count())
            .finish()
    }
}
