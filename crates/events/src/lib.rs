//! Tipline push-stream infrastructure.
//!
//! - [`SubscriberRegistry`] - live subscribers and best-effort fan-out.
//! - [`Subscription`] - one subscriber's frame stream; unregisters on drop.
//! - [`frame`] - `text/event-stream` frame encoding.
//! - [`HeartbeatScheduler`] - periodic liveness pings.

pub mod frame;
pub mod heartbeat;
pub mod registry;

pub use heartbeat::{HeartbeatScheduler, DEFAULT_HEARTBEAT_INTERVAL};
pub use registry::{DeliveryReport, SubscriberId, SubscriberRegistry, Subscription};
