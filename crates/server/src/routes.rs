//! HTTP surface for the cron trigger.
//!
//! The astronomy scheduler calls in over HTTP with the events it computed
//! for the day; everything else about scheduling lives outside this
//! service.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, header},
    routing::{get, post},
};
use serde::Deserialize;

use lunary_common::{AppError, AppResult};
use lunary_core::{
    CosmicContext, NotificationEvent, NotificationResult, NotificationService, SendCadence,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The notification orchestrator.
    pub notifications: NotificationService,
    /// Bearer token required on cron endpoints.
    pub cron_secret: String,
}

/// Request to send one cosmic event.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendNotificationRequest {
    /// The event to deliver
    pub event: NotificationEvent,
    /// Optional astronomy context for body enrichment
    #[serde(default)]
    pub cosmic_context: Option<CosmicContext>,
    /// Triggering cadence, defaults to daily
    #[serde(default)]
    pub sent_by: SendCadence,
}

/// Trigger one notification send.
async fn send_notification(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SendNotificationRequest>,
) -> AppResult<Json<NotificationResult>> {
    verify_cron_secret(&headers, &state.cron_secret)?;

    let result = state
        .notifications
        .send_notification(
            &request.event,
            request.cosmic_context.as_ref(),
            request.sent_by,
        )
        .await?;

    Ok(Json(result))
}

/// Liveness probe.
async fn health() -> &'static str {
    "ok"
}

fn verify_cron_secret(headers: &HeaderMap, secret: &str) -> AppResult<()> {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| token == secret);

    if authorized {
        Ok(())
    } else {
        Err(AppError::Unauthorized)
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/cron/notifications", post(send_notification))
        .route("/health", get(health))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(auth: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(auth) = auth {
            headers.insert(header::AUTHORIZATION, HeaderValue::from_str(auth).unwrap());
        }
        headers
    }

    #[test]
    fn test_cron_secret_is_required() {
        assert!(verify_cron_secret(&headers_with(None), "s3cret").is_err());
        assert!(verify_cron_secret(&headers_with(Some("Bearer wrong")), "s3cret").is_err());
        assert!(verify_cron_secret(&headers_with(Some("s3cret")), "s3cret").is_err());
        assert!(verify_cron_secret(&headers_with(Some("Bearer s3cret")), "s3cret").is_ok());
    }

    #[test]
    fn test_request_deserializes_with_defaults() {
        let json = r#"{
            "event": { "type": "moon", "name": "Full Moon", "priority": 5 },
            "cosmicContext": { "moonSign": "Pisces" }
        }"#;
        let request: SendNotificationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.sent_by, SendCadence::Daily);
        assert_eq!(
            request.cosmic_context.unwrap().moon_sign.as_deref(),
            Some("Pisces")
        );
    }
}
