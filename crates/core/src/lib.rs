//! Tipline domain core.
//!
//! Pure building blocks shared by the HTTP server and the processor client:
//!
//! - [`signature`] - webhook signature verification.
//! - [`event`] - the authenticated [`VerifiedEvent`](event::VerifiedEvent).
//! - [`donation`] - event → [`BroadcastMessage`](message::BroadcastMessage).
//! - [`sanitize`] - donor annotation policy.
//! - [`checkout`] - fixed checkout session requests and the gateway port.

pub mod checkout;
pub mod donation;
pub mod error;
pub mod event;
pub mod message;
pub mod sanitize;
pub mod signature;
pub mod types;
