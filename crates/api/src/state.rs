use std::sync::Arc;

use tipline_core::checkout::{CheckoutGateway, CheckoutRequestBuilder};
use tipline_core::signature::WebhookVerifier;
use tipline_events::SubscriberRegistry;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Live push-stream subscribers.
    pub registry: Arc<SubscriberRegistry>,
    /// Webhook signature verifier.
    pub verifier: Arc<WebhookVerifier>,
    /// Fixed donation session builder.
    pub checkout: Arc<CheckoutRequestBuilder>,
    /// Payment processor session API.
    pub gateway: Arc<dyn CheckoutGateway>,
}

impl AppState {
    /// Wire state from configuration.
    ///
    /// Without a webhook secret the verifier is built with an empty one and
    /// rejects every notification.
    pub fn new(
        config: ServerConfig,
        registry: Arc<SubscriberRegistry>,
        gateway: Arc<dyn CheckoutGateway>,
    ) -> Self {
        let verifier = WebhookVerifier::new(
            config.stripe_webhook_secret.clone().unwrap_or_default(),
            config.webhook_tolerance(),
        );
        let checkout = CheckoutRequestBuilder::new(config.public_origin.clone());

        Self {
            config: Arc::new(config),
            registry,
            verifier: Arc::new(verifier),
            checkout: Arc::new(checkout),
            gateway,
        }
    }
}
