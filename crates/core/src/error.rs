/// Why an inbound processor notification was rejected.
///
/// Display strings are safe to return to the caller: they describe the
/// cause but never include the signing secret or the expected signature.
#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("Webhook signing secret is not configured")]
    MissingSecret,

    #[error("No signature header value was provided")]
    MissingHeader,

    #[error("Unable to extract timestamp and signatures from header")]
    MalformedHeader,

    #[error("No signatures found matching the expected signature for payload")]
    NoMatchingSignature,

    #[error("Timestamp outside the tolerance zone ({age_secs}s, allowed {tolerance_secs}s)")]
    TimestampOutsideTolerance { age_secs: i64, tolerance_secs: i64 },

    #[error("Webhook payload is not a valid event: {0}")]
    MalformedPayload(String),
}

/// Failure to open a checkout session with the payment processor.
///
/// Carries the detailed cause for server-side logging only; HTTP callers
/// receive an opaque failure.
#[derive(Debug, thiserror::Error)]
pub enum SessionCreationError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("Payment processor request failed: {0}")]
    Transport(String),

    /// The processor answered with a non-2xx status.
    #[error("Payment processor rejected the session ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// The processor answered 2xx but the body was not a usable session.
    #[error("Payment processor returned an unusable session: {0}")]
    InvalidResponse(String),
}
