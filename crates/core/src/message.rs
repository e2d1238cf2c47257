//! Messages pushed to stream subscribers.
//!
//! The overlay client keys on these exact field names, so this enum is the
//! single definition of the subscriber wire schema:
//!
//! ```text
//! {"t":"donation","message":"Thanks!"}
//! ```

use serde::{Deserialize, Serialize};

/// A notification fanned out to every connected subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum BroadcastMessage {
    /// A payment completed; `message` is the donor's annotation.
    Donation { message: String },
}

impl BroadcastMessage {
    pub fn donation(message: impl Into<String>) -> Self {
        Self::Donation {
            message: message.into(),
        }
    }

    /// Value of the `t` discriminator.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Donation { .. } => "donation",
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Donation { message } => message,
        }
    }
}
