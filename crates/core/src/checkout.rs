//! Outbound checkout session requests.
//!
//! Amount, currency and product are fixed here and never taken from the
//! caller; the only user-controlled field is the sanitized annotation.

use async_trait::async_trait;
use serde::Deserialize;

use crate::donation::MESSAGE_METADATA_KEY;
use crate::error::SessionCreationError;
use crate::sanitize::sanitize_annotation;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Donation amount in minor currency units (10.00 EUR).
pub const DONATION_AMOUNT_MINOR: i64 = 1000;

/// ISO 4217 currency code, lowercase as the processor expects.
pub const DONATION_CURRENCY: &str = "eur";

/// Product name shown on the hosted checkout page.
pub const DONATION_PRODUCT_NAME: &str = "Podpora streamu (donation)";

/// Payment methods offered on the hosted checkout page.
pub const PAYMENT_METHOD_TYPES: [&str; 2] = ["card", "link"];

/// Checkout mode: a one-off payment.
pub const CHECKOUT_MODE: &str = "payment";

/// Query appended to the public origin after a successful payment.
pub const SUCCESS_PATH: &str = "/?paid=1";

/// Query appended to the public origin when the donor backs out.
pub const CANCEL_PATH: &str = "/?canceled=1";

// ---------------------------------------------------------------------------
// SessionRequest
// ---------------------------------------------------------------------------

/// A fully-specified checkout session, ready to send to the processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    pub mode: &'static str,
    pub payment_method_types: Vec<&'static str>,
    pub currency: &'static str,
    pub line_items: Vec<LineItem>,
    pub success_url: String,
    pub cancel_url: String,
    /// Sanitized donor annotation.
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub quantity: u32,
    pub currency: &'static str,
    pub product_name: &'static str,
    pub unit_amount: i64,
}

impl SessionRequest {
    /// Metadata pairs attached to the session and echoed back in the
    /// completion webhook.
    pub fn metadata(&self) -> [(&'static str, &str); 1] {
        [(MESSAGE_METADATA_KEY, self.message.as_str())]
    }
}

/// The processor's answer: where to send the donor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

// ---------------------------------------------------------------------------
// CheckoutRequestBuilder
// ---------------------------------------------------------------------------

/// Builds [`SessionRequest`]s against a fixed public origin.
#[derive(Debug, Clone)]
pub struct CheckoutRequestBuilder {
    public_origin: String,
}

impl CheckoutRequestBuilder {
    pub fn new(public_origin: impl Into<String>) -> Self {
        let public_origin: String = public_origin.into();
        Self {
            public_origin: public_origin.trim_end_matches('/').to_string(),
        }
    }

    /// Sanitize `raw_annotation` and wrap it in the fixed donation session.
    pub fn build(&self, raw_annotation: &str) -> SessionRequest {
        SessionRequest {
            mode: CHECKOUT_MODE,
            payment_method_types: PAYMENT_METHOD_TYPES.to_vec(),
            currency: DONATION_CURRENCY,
            line_items: vec![LineItem {
                quantity: 1,
                currency: DONATION_CURRENCY,
                product_name: DONATION_PRODUCT_NAME,
                unit_amount: DONATION_AMOUNT_MINOR,
            }],
            success_url: format!("{}{SUCCESS_PATH}", self.public_origin),
            cancel_url: format!("{}{CANCEL_PATH}", self.public_origin),
            message: sanitize_annotation(raw_annotation),
        }
    }
}

// ---------------------------------------------------------------------------
// CheckoutGateway
// ---------------------------------------------------------------------------

/// Port to the payment processor's session API.
#[async_trait]
pub trait CheckoutGateway: Send + Sync {
    async fn create_session(
        &self,
        request: &SessionRequest,
    ) -> Result<CheckoutSession, SessionCreationError>;
}
