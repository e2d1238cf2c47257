//! REST client for the processor's Checkout Sessions endpoint.
//!
//! Requests are `application/x-www-form-urlencoded` with bracketed keys for
//! nested fields (`line_items[0][price_data][currency]=eur`), authenticated
//! with the secret key as a bearer token and pinned to [`API_VERSION`].

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tipline_core::checkout::{CheckoutGateway, CheckoutSession, SessionRequest};
use tipline_core::error::SessionCreationError;

/// Production API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";

/// API version every request is pinned to.
pub const API_VERSION: &str = "2024-06-20";

/// HTTP timeout for a single session request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors from the processor REST layer.
#[derive(Debug, thiserror::Error)]
pub enum StripeApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The processor returned a non-2xx status code.
    #[error("Stripe API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// A 2xx session without a redirect URL.
    #[error("Checkout session {0} has no url")]
    MissingUrl(String),
}

impl From<StripeApiError> for SessionCreationError {
    fn from(err: StripeApiError) -> Self {
        match err {
            StripeApiError::Request(e) if e.is_decode() => Self::InvalidResponse(e.to_string()),
            StripeApiError::Request(e) => Self::Transport(e.to_string()),
            StripeApiError::Api { status, message } => Self::Rejected {
                status,
                body: message,
            },
            StripeApiError::MissingUrl(id) => {
                Self::InvalidResponse(format!("checkout session {id} has no url"))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// StripeClient
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SessionResponse {
    id: String,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// HTTP client for the processor API.
#[derive(Clone)]
pub struct StripeClient {
    client: reqwest::Client,
    api_base: String,
    secret_key: String,
}

impl StripeClient {
    /// Create a client with its own connection pool.
    ///
    /// * `api_base` - e.g. [`DEFAULT_API_BASE`]; a trailing `/` is ignored.
    pub fn new(secret_key: impl Into<String>, api_base: impl Into<String>) -> Result<Self, StripeApiError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self::with_client(client, secret_key, api_base))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        secret_key: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        let api_base: String = api_base.into();
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
        }
    }

    /// Create a hosted checkout session.
    ///
    /// Sends `POST /v1/checkout/sessions` and returns the session id and the
    /// URL to redirect the donor to.
    pub async fn create_checkout_session(
        &self,
        request: &SessionRequest,
    ) -> Result<CheckoutSession, StripeApiError> {
        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(&self.secret_key)
            .header("Stripe-Version", API_VERSION)
            .form(&session_form(request))
            .send()
            .await?;

        let session: SessionResponse = Self::ensure_success(response).await?.json().await?;
        let url = session
            .url
            .ok_or_else(|| StripeApiError::MissingUrl(session.id.clone()))?;

        tracing::debug!(session_id = %session.id, "Checkout session created");
        Ok(CheckoutSession {
            id: session.id,
            url,
        })
    }

    // ---- private helpers ----

    /// Pass 2xx responses through; turn anything else into
    /// [`StripeApiError::Api`] with the processor's error message.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, StripeApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .ok()
            .and_then(|envelope| envelope.error.message)
            .unwrap_or(body);

        Err(StripeApiError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("api_base", &self.api_base)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl CheckoutGateway for StripeClient {
    async fn create_session(
        &self,
        request: &SessionRequest,
    ) -> Result<CheckoutSession, SessionCreationError> {
        Ok(self.create_checkout_session(request).await?)
    }
}

// ---------------------------------------------------------------------------
// Form encoding
// ---------------------------------------------------------------------------

/// Flatten a [`SessionRequest`] into the processor's bracketed form fields.
pub fn session_form(request: &SessionRequest) -> Vec<(String, String)> {
    let mut form = vec![
        ("mode".to_string(), request.mode.to_string()),
        ("currency".to_string(), request.currency.to_string()),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
    ];

    for (i, method) in request.payment_method_types.iter().enumerate() {
        form.push((format!("payment_method_types[{i}]"), method.to_string()));
    }

    for (i, item) in request.line_items.iter().enumerate() {
        let prefix = format!("line_items[{i}]");
        form.push((format!("{prefix}[quantity]"), item.quantity.to_string()));
        form.push((
            format!("{prefix}[price_data][currency]"),
            item.currency.to_string(),
        ));
        form.push((
            format!("{prefix}[price_data][product_data][name]"),
            item.product_name.to_string(),
        ));
        form.push((
            format!("{prefix}[price_data][unit_amount]"),
            item.unit_amount.to_string(),
        ));
    }

    for (key, value) in request.metadata() {
        form.push((format!("metadata[{key}]"), value.to_string()));
    }

    form
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
