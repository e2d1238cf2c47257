//! Push-stream frame encoding.
//!
//! Frames follow the `text/event-stream` format: one or more `field: value`
//! lines terminated by a blank line. Encoded frames are [`Bytes`], so one
//! encoding is shared by reference across every subscriber queue.

use bytes::Bytes;
use tipline_core::message::BroadcastMessage;

/// Liveness frame: reserved `ping` event with a constant data line.
pub const PING_FRAME: &[u8] = b"event: ping\ndata: ok\n\n";

/// Encode a message as `data: <json>\n\n`.
///
/// `serde_json` never emits raw newlines, so the payload always fits on a
/// single `data:` line.
pub fn encode_message(message: &BroadcastMessage) -> Result<Bytes, serde_json::Error> {
    let json = serde_json::to_string(message)?;
    let mut frame = String::with_capacity(json.len() + 8);
    frame.push_str("data: ");
    frame.push_str(&json);
    frame.push_str("\n\n");
    Ok(Bytes::from(frame))
}

pub fn ping_frame() -> Bytes {
    Bytes::from_static(PING_FRAME)
}
