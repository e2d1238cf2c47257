//! Request handlers for the `/api` routes.

pub mod checkout;
pub mod stream;
pub mod webhook;
