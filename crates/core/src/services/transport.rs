//! Web Push transport seam.
//!
//! The engine talks to the push service through [`PushTransport`], so the
//! dispatcher can be exercised against a scripted transport in tests and
//! the `web-push` crate stays an implementation detail of
//! [`WebPushTransport`].

use async_trait::async_trait;
use thiserror::Error;
use web_push::{
    ContentEncoding, IsahcWebPushClient, SubscriptionInfo, VapidSignatureBuilder, WebPushClient,
    WebPushError, WebPushMessageBuilder,
};

use lunary_common::{AppError, AppResult};

/// Push message time-to-live at the push service, in seconds.
const PUSH_TTL: u32 = 86_400;

/// VAPID (Voluntary Application Server Identification) configuration.
///
/// Built once at startup and handed to the transport; never mutated
/// afterwards.
#[derive(Debug, Clone)]
pub struct VapidConfig {
    /// Public key (base64 URL-safe encoded)
    pub public_key: String,
    /// Private key (base64 URL-safe encoded)
    pub private_key: String,
    /// Subject claim (typically a mailto: or https: URL)
    pub subject: String,
}

impl VapidConfig {
    /// Validate the key material, naming every missing value.
    pub fn validate(&self) -> AppResult<()> {
        let mut missing = Vec::new();
        if self.public_key.trim().is_empty() {
            missing.push("VAPID_PUBLIC_KEY");
        }
        if self.private_key.trim().is_empty() {
            missing.push("VAPID_PRIVATE_KEY");
        }
        if !missing.is_empty() {
            return Err(AppError::Config(format!(
                "VAPID keys not configured. Missing: {}",
                missing.join(", ")
            )));
        }
        if self.public_key.len() < 80 {
            tracing::warn!(
                length = self.public_key.len(),
                "VAPID public key appears invalid (expected 80+ characters)"
            );
        }
        Ok(())
    }
}

/// Crypto keys identifying one push endpoint.
#[derive(Debug, Clone)]
pub struct WebPushKeys {
    /// Endpoint URL
    pub endpoint: String,
    /// P256DH public key
    pub p256dh: String,
    /// Auth secret
    pub auth: String,
}

/// A classified push delivery failure.
#[derive(Debug, Error)]
pub enum PushError {
    /// The endpoint is permanently gone; the subscription should be
    /// deactivated.
    #[error("push endpoint gone ({status:?}): {message}")]
    Gone {
        /// HTTP status reported by the push service, when known
        status: Option<u16>,
        /// Underlying error text
        message: String,
    },
    /// Transient or unclassified failure; the subscription stays active.
    #[error("push delivery failed: {message}")]
    Delivery {
        /// HTTP status reported by the push service, when known
        status: Option<u16>,
        /// Underlying error text
        message: String,
    },
}

impl PushError {
    /// Whether the endpoint is permanently gone.
    #[must_use]
    pub const fn is_gone(&self) -> bool {
        matches!(self, Self::Gone { .. })
    }
}

/// Abstraction over the push delivery mechanism.
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Deliver a JSON payload to one endpoint.
    async fn send(&self, keys: &WebPushKeys, payload: &str) -> Result<(), PushError>;
}

/// Web Push transport backed by the `web-push` crate.
pub struct WebPushTransport {
    vapid: VapidConfig,
    client: IsahcWebPushClient,
}

impl WebPushTransport {
    /// Create a transport, validating the VAPID configuration up front.
    ///
    /// Missing key material is a hard configuration error: nothing else
    /// in the engine should run without a working transport.
    pub fn new(vapid: VapidConfig) -> AppResult<Self> {
        vapid.validate()?;
        let client = IsahcWebPushClient::new()
            .map_err(|e| AppError::Config(format!("Failed to initialize push client: {e}")))?;
        Ok(Self { vapid, client })
    }
}

#[async_trait]
impl PushTransport for WebPushTransport {
    async fn send(&self, keys: &WebPushKeys, payload: &str) -> Result<(), PushError> {
        let subscription = SubscriptionInfo::new(
            keys.endpoint.clone(),
            keys.p256dh.clone(),
            keys.auth.clone(),
        );

        let mut signature = VapidSignatureBuilder::from_base64(
            &self.vapid.private_key,
            web_push::URL_SAFE_NO_PAD,
            &subscription,
        )
        .map_err(|e| PushError::Delivery {
            status: None,
            message: format!("invalid VAPID key material: {e}"),
        })?;
        signature.add_claim("sub", self.vapid.subject.as_str());
        let signature = signature.build().map_err(|e| PushError::Delivery {
            status: None,
            message: format!("failed to build VAPID signature: {e}"),
        })?;

        let mut message = WebPushMessageBuilder::new(&subscription);
        message.set_payload(ContentEncoding::Aes128Gcm, payload.as_bytes());
        message.set_vapid_signature(signature);
        message.set_ttl(PUSH_TTL);
        let message = message.build().map_err(|e| PushError::Delivery {
            status: None,
            message: format!("failed to build push message: {e}"),
        })?;

        self.client.send(message).await.map_err(classify)
    }
}

/// Classify a `web-push` error into gone vs transient.
fn classify(err: WebPushError) -> PushError {
    match err {
        WebPushError::EndpointNotFound | WebPushError::EndpointNotValid => {
            PushError::Gone {
                status: None,
                message: err.to_string(),
            }
        }
        other => {
            let message = other.to_string();
            if message_indicates_gone(&message) {
                PushError::Gone {
                    status: None,
                    message,
                }
            } else {
                PushError::Delivery {
                    status: None,
                    message,
                }
            }
        }
    }
}

/// Some push services report expiry only in the message text.
fn message_indicates_gone(message: &str) -> bool {
    const MARKERS: [&str; 7] = [
        "410",
        "404",
        "invalid",
        "expired",
        "unsubscribed",
        "Gone",
        "Not Found",
    ];
    MARKERS.iter().any(|marker| message.contains(marker))
}
