//! Authenticated processor events.
//!
//! A [`VerifiedEvent`] can only be obtained from
//! [`WebhookVerifier::verify`](crate::signature::WebhookVerifier::verify);
//! there is no public constructor, so untrusted bytes cannot be turned into
//! an event without passing the signature check first.

use serde::Deserialize;

use crate::error::VerificationError;
use crate::types::UnixSeconds;

/// Processor event type for a completed hosted checkout.
pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";

// ---------------------------------------------------------------------------
// EventKind
// ---------------------------------------------------------------------------

/// The event kinds this service distinguishes.
///
/// Everything the processor sends that is not listed here is carried as
/// [`EventKind::Other`] with its original type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    CheckoutSessionCompleted,
    Other(String),
}

impl EventKind {
    /// Map a processor type string onto the closed set.
    pub fn from_type(name: &str) -> Self {
        match name {
            CHECKOUT_SESSION_COMPLETED => Self::CheckoutSessionCompleted,
            other => Self::Other(other.to_string()),
        }
    }

    /// The processor's type string for this kind.
    pub fn as_str(&self) -> &str {
        match self {
            Self::CheckoutSessionCompleted => CHECKOUT_SESSION_COMPLETED,
            Self::Other(name) => name,
        }
    }
}

// ---------------------------------------------------------------------------
// VerifiedEvent
// ---------------------------------------------------------------------------

/// A processor notification whose signature has been checked.
#[derive(Debug, Clone)]
pub struct VerifiedEvent {
    id: String,
    kind: EventKind,
    payload: serde_json::Value,
    created: Option<UnixSeconds>,
}

#[derive(Deserialize)]
struct RawEvent {
    #[serde(default)]
    id: String,
    #[serde(rename = "type")]
    kind: String,
    data: RawEventData,
    #[serde(default)]
    created: Option<UnixSeconds>,
}

#[derive(Deserialize)]
struct RawEventData {
    object: serde_json::Value,
}

impl VerifiedEvent {
    /// Decode an already-authenticated body.
    pub(crate) fn from_verified_body(raw_body: &[u8]) -> Result<Self, VerificationError> {
        let raw: RawEvent = serde_json::from_slice(raw_body)
            .map_err(|e| VerificationError::MalformedPayload(e.to_string()))?;

        Ok(Self {
            id: raw.id,
            kind: EventKind::from_type(&raw.kind),
            payload: raw.data.object,
            created: raw.created,
        })
    }

    /// Processor-assigned event id (e.g. `evt_...`).
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    /// The event's `data.object`, shaped by the processor's schema.
    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    pub fn created(&self) -> Option<UnixSeconds> {
        self.created
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
