use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

use axum::http::HeaderValue;
use tipline_events::DEFAULT_HEARTBEAT_INTERVAL;

/// Startup configuration problems. Any of these aborts the process.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Server configuration loaded from environment variables.
///
/// Everything except the processor secret has a default suitable for
/// local development.
#[derive(Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: IpAddr,
    /// Bind port (default: `8080`).
    pub port: u16,
    /// Public site origin used to build checkout redirect URLs.
    pub public_origin: String,
    /// The single origin allowed to call the API cross-origin.
    pub cors_origin: String,
    /// Processor secret API key.
    pub stripe_secret: String,
    /// Webhook signing secret. Without it every webhook is rejected.
    pub stripe_webhook_secret: Option<String>,
    /// Processor API base URL.
    pub stripe_api_base: String,
    /// Allowed signature timestamp skew in seconds (`0` disables the check).
    pub webhook_tolerance_secs: u64,
    /// Seconds between heartbeat pings.
    pub heartbeat_interval_secs: u64,
    /// Seconds allowed to produce response headers.
    pub request_timeout_secs: u64,
    /// Seconds allowed for the processor to open a checkout session.
    /// Always shorter than `request_timeout_secs`.
    pub checkout_timeout_secs: u64,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                  | Default                   |
    /// |--------------------------|---------------------------|
    /// | `HOST`                   | `0.0.0.0`                 |
    /// | `PORT`                   | `8080`                    |
    /// | `PUBLIC_ORIGIN`          | `http://localhost:8080`   |
    /// | `CORS_ORIGIN`            | `PUBLIC_ORIGIN`           |
    /// | `STRIPE_SECRET`          | required                  |
    /// | `STRIPE_WEBHOOK_SECRET`  | unset                     |
    /// | `STRIPE_API_BASE`        | `https://api.stripe.com`  |
    /// | `WEBHOOK_TOLERANCE_SECS` | `300`                     |
    /// | `HEARTBEAT_INTERVAL_SECS`| `25`                      |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`                      |
    /// | `CHECKOUT_TIMEOUT_SECS`  | `20`                      |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let stripe_secret = get("STRIPE_SECRET").ok_or(ConfigError::Missing("STRIPE_SECRET"))?;

        let public_origin = get("PUBLIC_ORIGIN").unwrap_or_else(|| "http://localhost:8080".into());
        let cors_origin = get("CORS_ORIGIN").unwrap_or_else(|| public_origin.clone());
        HeaderValue::from_str(&cors_origin).map_err(|e| ConfigError::Invalid {
            key: "CORS_ORIGIN",
            reason: e.to_string(),
        })?;

        let heartbeat_interval_secs = parse_or(
            &get,
            "HEARTBEAT_INTERVAL_SECS",
            DEFAULT_HEARTBEAT_INTERVAL.as_secs(),
        )?;
        if heartbeat_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "HEARTBEAT_INTERVAL_SECS",
                reason: "must be greater than zero".into(),
            });
        }

        let request_timeout_secs = parse_or(&get, "REQUEST_TIMEOUT_SECS", 30)?;
        let checkout_timeout_secs = parse_or(&get, "CHECKOUT_TIMEOUT_SECS", 20)?;
        if checkout_timeout_secs == 0 || checkout_timeout_secs >= request_timeout_secs {
            return Err(ConfigError::Invalid {
                key: "CHECKOUT_TIMEOUT_SECS",
                reason: format!(
                    "must be greater than zero and less than REQUEST_TIMEOUT_SECS ({request_timeout_secs})"
                ),
            });
        }

        Ok(Self {
            host: parse_or(&get, "HOST", IpAddr::from([0, 0, 0, 0]))?,
            port: parse_or(&get, "PORT", 8080)?,
            public_origin,
            cors_origin,
            stripe_secret,
            stripe_webhook_secret: get("STRIPE_WEBHOOK_SECRET"),
            stripe_api_base: get("STRIPE_API_BASE")
                .unwrap_or_else(|| tipline_stripe::DEFAULT_API_BASE.into()),
            webhook_tolerance_secs: parse_or(&get, "WEBHOOK_TOLERANCE_SECS", 300)?,
            heartbeat_interval_secs,
            request_timeout_secs,
            checkout_timeout_secs,
        })
    }

    pub fn webhook_tolerance(&self) -> Duration {
        Duration::from_secs(self.webhook_tolerance_secs)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn checkout_timeout(&self) -> Duration {
        Duration::from_secs(self.checkout_timeout_secs)
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("public_origin", &self.public_origin)
            .field("cors_origin", &self.cors_origin)
            .field("stripe_secret", &"<redacted>")
            .field(
                "stripe_webhook_secret",
                &self.stripe_webhook_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("stripe_api_base", &self.stripe_api_base)
            .field("webhook_tolerance_secs", &self.webhook_tolerance_secs)
            .field("heartbeat_interval_secs", &self.heartbeat_interval_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("checkout_timeout_secs", &self.checkout_timeout_secs)
            .finish()
    }
}

fn parse_or<T>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match get(key) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: format!("{raw:?}: {e}"),
        }),
        None => Ok(default),
    }
}
