//! Payment processor client.
//!
//! [`StripeClient`] implements the
//! [`CheckoutGateway`](tipline_core::checkout::CheckoutGateway) port over the
//! processor's REST API.

pub mod client;

pub use client::{session_form, StripeApiError, StripeClient, API_VERSION, DEFAULT_API_BASE};
