//! Subscriber registry and fan-out broadcaster.
//!
//! [`SubscriberRegistry`] is the only shared mutable state in the service.
//! It is shared as `Arc<SubscriberRegistry>` between the stream handler,
//! the webhook handler and the heartbeat task.
//!
//! Each subscriber owns an unbounded frame queue drained by its HTTP
//! response body. Enqueueing never blocks, so a fan-out pass holds the lock
//! for its whole iteration: a subscriber added or removed concurrently is
//! either fully in or fully out of that pass.

use std::collections::HashMap;
use std::fmt;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;
use tipline_core::message::BroadcastMessage;
use tipline_core::types::Timestamp;
use tokio::sync::mpsc;

use crate::frame::{encode_message, ping_frame};

/// Sending half of a subscriber's frame queue.
pub type FrameSender = mpsc::UnboundedSender<Bytes>;

// ---------------------------------------------------------------------------
// SubscriberId / DeliveryReport
// ---------------------------------------------------------------------------

/// Process-unique subscriber identity. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Outcome of one fan-out pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Subscribers the frame was queued for.
    pub delivered: usize,
    /// Subscribers whose stream had already closed; they were removed.
    pub failed: usize,
}

struct Subscriber {
    sender: FrameSender,
    connected_at: Timestamp,
}

// ---------------------------------------------------------------------------
// SubscriberRegistry
// ---------------------------------------------------------------------------

/// Tracks live push-stream subscribers and fans frames out to them.
pub struct SubscriberRegistry {
    subscribers: Mutex<HashMap<SubscriberId, Subscriber>>,
    next_id: AtomicU64,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SubscriberId, Subscriber>> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new subscriber.
    ///
    /// The initial ping is queued before the subscriber becomes visible to
    /// broadcasts, so it is always the first frame on the stream. Dropping
    /// the returned [`Subscription`] unregisters it.
    pub fn subscribe(self: &Arc<Self>) -> Subscription {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (sender, receiver) = mpsc::unbounded_channel();
        // The receiver is alive right here, so this cannot fail.
        let _ = sender.send(ping_frame());

        let count = {
            let mut subscribers = self.lock();
            subscribers.insert(
                id,
                Subscriber {
                    sender,
                    connected_at: chrono::Utc::now(),
                },
            );
            subscribers.len()
        };
        tracing::info!(subscriber_id = %id, count, "Stream subscriber connected");

        Subscription {
            id,
            receiver,
            registry: Arc::clone(self),
        }
    }

    /// Remove a subscriber. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let removed = {
            let mut subscribers = self.lock();
            subscribers
                .remove(&id)
                .map(|subscriber| (subscriber, subscribers.len()))
        };

        match removed {
            Some((subscriber, count)) => {
                let connected_secs = (chrono::Utc::now() - subscriber.connected_at).num_seconds();
                tracing::info!(
                    subscriber_id = %id,
                    connected_secs,
                    count,
                    "Stream subscriber disconnected"
                );
                true
            }
            None => false,
        }
    }

    /// Encode `message` once and queue it for every current subscriber.
    ///
    /// Never fails: an encoding error is logged and delivers nothing, and a
    /// closed subscriber is dropped without affecting the others.
    pub fn broadcast(&self, message: &BroadcastMessage) -> DeliveryReport {
        let frame = match encode_message(message) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(error = %e, kind = message.kind(), "Failed to encode broadcast");
                return DeliveryReport::default();
            }
        };
        self.send_frame(frame)
    }

    /// Queue a liveness frame for every current subscriber.
    pub fn ping_all(&self) -> DeliveryReport {
        self.send_frame(ping_frame())
    }

    /// Queue an already-encoded frame for every current subscriber.
    pub fn send_frame(&self, frame: Bytes) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        let mut subscribers = self.lock();

        subscribers.retain(|id, subscriber| match subscriber.sender.send(frame.clone()) {
            Ok(()) => {
                report.delivered += 1;
                true
            }
            Err(_) => {
                report.failed += 1;
                tracing::debug!(subscriber_id = %id, "Subscriber stream closed, removing");
                false
            }
        });

        report
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    /// Drop every subscriber queue so each open stream ends.
    ///
    /// Used during graceful shutdown; long-lived responses would otherwise
    /// keep the server from draining.
    pub fn shutdown_all(&self) -> usize {
        let mut subscribers = self.lock();
        let count = subscribers.len();
        subscribers.clear();
        tracing::info!(count, "Closed all stream subscribers");
        count
    }
}

#[cfg(test)]
impl SubscriberRegistry {
    /// Register an entry whose stream has already gone away without
    /// unsubscribing, as happens when a transport dies mid-write.
    pub(crate) fn insert_closed_subscriber(&self) -> SubscriberId {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (sender, receiver) = mpsc::unbounded_channel();
        drop(receiver);
        self.lock().insert(
            id,
            Subscriber {
                sender,
                connected_at: chrono::Utc::now(),
            },
        );
        id
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// Receiving end of one subscriber: a [`Stream`] of encoded frames.
///
/// The stream ends when the registry drops the subscriber (shutdown).
/// Dropping the subscription (the transport closed) unregisters it.
pub struct Subscription {
    id: SubscriberId,
    receiver: mpsc::UnboundedReceiver<Bytes>,
    registry: Arc<SubscriberRegistry>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Wait for the next frame.
    pub async fn recv(&mut self) -> Option<Bytes> {
        self.receiver.recv().await
    }

    /// Take a frame if one is already queued.
    pub fn try_recv(&mut self) -> Option<Bytes> {
        self.receiver.try_recv().ok()
    }
}

impl Stream for Subscription {
    type Item = Bytes;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().receiver.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry.unsubscribe(self.id);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
