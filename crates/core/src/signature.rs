//! Webhook signature verification (HMAC-SHA256 over `"{t}.{body}"`).
//!
//! The processor sends a header of the form
//! `t=1700000000,v1=5257a869...,v1=...`. Each `v1` entry is a hex
//! HMAC-SHA256 of the timestamp, a literal `.`, and the exact request body
//! bytes, keyed with the endpoint's signing secret. Any one matching `v1`
//! is enough; `v0` and unknown schemes are ignored.

use std::time::Duration;

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::VerificationError;
use crate::event::VerifiedEvent;
use crate::types::UnixSeconds;

type HmacSha256 = Hmac<Sha256>;

/// HTTP header carrying the signature.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Signature scheme accepted by this verifier.
const SIGNATURE_SCHEME: &str = "v1";

/// Default allowed skew between the header timestamp and local time.
pub const DEFAULT_TOLERANCE: Duration = Duration::from_secs(300);

// ---------------------------------------------------------------------------
// WebhookVerifier
// ---------------------------------------------------------------------------

/// Checks inbound notifications against a shared signing secret.
///
/// Verification is a pure function of its inputs and the clock; nothing is
/// recorded on either the success or the failure path.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: String,
    tolerance: Duration,
}

impl WebhookVerifier {
    /// A zero `tolerance` disables the timestamp check.
    pub fn new(secret: impl Into<String>, tolerance: Duration) -> Self {
        Self {
            secret: secret.into(),
            tolerance,
        }
    }

    pub fn tolerance(&self) -> Duration {
        self.tolerance
    }

    /// Verify `raw_body` against `header` using the current time.
    ///
    /// `raw_body` must be the bytes exactly as received; re-encoded JSON
    /// will not verify.
    pub fn verify(&self, raw_body: &[u8], header: &str) -> Result<VerifiedEvent, VerificationError> {
        self.verify_at(raw_body, header, chrono::Utc::now().timestamp())
    }

    /// Verify as of `now` (Unix seconds).
    pub fn verify_at(
        &self,
        raw_body: &[u8],
        header: &str,
        now: UnixSeconds,
    ) -> Result<VerifiedEvent, VerificationError> {
        if self.secret.is_empty() {
            return Err(VerificationError::MissingSecret);
        }
        if header.trim().is_empty() {
            return Err(VerificationError::MissingHeader);
        }

        let parsed = SignatureHeader::parse(header)?;

        let mac = signed_payload_mac(&self.secret, parsed.timestamp, raw_body);
        let matched = parsed.signatures.iter().any(|candidate| {
            hex::decode(candidate)
                .map(|bytes| mac.clone().verify_slice(&bytes).is_ok())
                .unwrap_or(false)
        });
        if !matched {
            return Err(VerificationError::NoMatchingSignature);
        }

        let tolerance_secs = i64::try_from(self.tolerance.as_secs()).unwrap_or(i64::MAX);
        let age_secs = now.saturating_sub(parsed.timestamp);
        if tolerance_secs > 0 && age_secs.saturating_abs() > tolerance_secs {
            return Err(VerificationError::TimestampOutsideTolerance {
                age_secs,
                tolerance_secs,
            });
        }

        VerifiedEvent::from_verified_body(raw_body)
    }
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("secret", &"<redacted>")
            .field("tolerance", &self.tolerance)
            .finish()
    }
}

/// Verify with the default tolerance.
pub fn verify(
    raw_body: &[u8],
    signature_header: &str,
    secret: &str,
) -> Result<VerifiedEvent, VerificationError> {
    WebhookVerifier::new(secret, DEFAULT_TOLERANCE).verify(raw_body, signature_header)
}

/// Produce a header value signing `body` at `timestamp`.
///
/// Matches what the processor sends, so it can drive local tests and
/// replay tooling.
pub fn sign_payload(secret: &str, timestamp: UnixSeconds, body: &[u8]) -> String {
    let mac = signed_payload_mac(secret, timestamp, body);
    format!(
        "t={timestamp},{SIGNATURE_SCHEME}={}",
        hex::encode(mac.finalize().into_bytes())
    )
}

fn signed_payload_mac(secret: &str, timestamp: UnixSeconds, body: &[u8]) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(body);
    mac
}

// ---------------------------------------------------------------------------
// Header parsing
// ---------------------------------------------------------------------------

struct SignatureHeader<'a> {
    timestamp: UnixSeconds,
    signatures: Vec<&'a str>,
}

impl<'a> SignatureHeader<'a> {
    fn parse(header: &'a str) -> Result<Self, VerificationError> {
        let mut timestamp = None;
        let mut signatures = Vec::new();

        for item in header.split(',') {
            let Some((key, value)) = item.split_once('=') else {
                continue;
            };
            match key.trim() {
                "t" => timestamp = value.trim().parse::<UnixSeconds>().ok(),
                SIGNATURE_SCHEME => signatures.push(value.trim()),
                _ => {}
            }
        }

        match timestamp {
            Some(timestamp) if !signatures.is_empty() => Ok(Self {
                timestamp,
                signatures,
            }),
            _ => Err(VerificationError::MalformedHeader),
        }
    }
}

// ---------------------------------------------------------------------------
// hex helpers (no extra dep)
// ---------------------------------------------------------------------------

mod hex {
    /// Encode bytes as a lowercase hex string.
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Decode a hex string; `None` on odd length or a non-hex digit.
    pub fn decode(text: &str) -> Option<Vec<u8>> {
        if text.len() % 2 != 0 {
            return None;
        }
        text.as_bytes()
            .chunks(2)
            .map(|pair| {
                let hi = (pair[0] as char).to_digit(16)?;
                let lo = (pair[1] as char).to_digit(16)?;
                Some((hi * 16 + lo) as u8)
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
