//! Translate verified processor events into subscriber messages.

use crate::event::{EventKind, VerifiedEvent};
use crate::message::BroadcastMessage;

/// Annotation used when the donor left none.
pub const DEFAULT_DONATION_MESSAGE: &str = "Ďakujeme za podporu!";

/// Metadata key under which checkout stores the donor's annotation.
pub const MESSAGE_METADATA_KEY: &str = "message";

/// Map a verified event to a broadcast, or `None` for kinds we ignore.
///
/// The annotation was sanitized when the checkout session was created, so
/// it is passed through as-is. An absent, non-string or empty annotation
/// falls back to [`DEFAULT_DONATION_MESSAGE`].
pub fn translate(event: &VerifiedEvent) -> Option<BroadcastMessage> {
    match event.kind() {
        EventKind::CheckoutSessionCompleted => {
            let message = event
                .payload()
                .get("metadata")
                .and_then(|metadata| metadata.get(MESSAGE_METADATA_KEY))
                .and_then(serde_json::Value::as_str)
                .filter(|text| !text.is_empty())
                .unwrap_or(DEFAULT_DONATION_MESSAGE);

            Some(BroadcastMessage::donation(message))
        }
        EventKind::Other(_) => None,
    }
}
