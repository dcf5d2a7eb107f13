//! Notification orchestrator.
//!
//! The single entry point wiring validation, deduplication, templating
//! and fan-out into one call. Invoked by an external scheduler that has
//! already decided which cosmic events occurred today.

use chrono::Utc;
use serde::Serialize;

use crate::events::{CosmicContext, NotificationEvent, SendCadence};
use crate::services::dedup::EventDeduplicator;
use crate::services::dispatch::DeliveryDispatcher;
use lunary_common::AppResult;

/// Structured result of one send attempt.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResult {
    /// Whether the send is considered successful. At least one recipient
    /// succeeded, or there was legitimately nobody to notify.
    pub success: bool,
    /// Subscriptions the event was dispatched to
    pub recipient_count: usize,
    /// Deliveries accepted by the push service
    pub successful: usize,
    /// Deliveries that failed
    pub failed: usize,
    /// The event's idempotency key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_key: Option<String>,
    /// Validation error, when the event was rejected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NotificationResult {
    fn skipped(event_key: String) -> Self {
        Self {
            success: true,
            recipient_count: 0,
            successful: 0,
            failed: 0,
            event_key: Some(event_key),
            error: None,
        }
    }

    fn invalid(error: String) -> Self {
        Self {
            success: false,
            recipient_count: 0,
            successful: 0,
            failed: 0,
            event_key: None,
            error: Some(error),
        }
    }
}

/// Orchestrates one notification send end to end.
#[derive(Clone)]
pub struct NotificationService {
    deduplicator: EventDeduplicator,
    dispatcher: DeliveryDispatcher,
}

impl NotificationService {
    /// Create a new notification service.
    ///
    /// Transport credentials were already validated when the dispatcher's
    /// transport was constructed; a misconfigured deployment fails at
    /// startup, before any event reaches this service.
    #[must_use]
    pub const fn new(deduplicator: EventDeduplicator, dispatcher: DeliveryDispatcher) -> Self {
        Self {
            deduplicator,
            dispatcher,
        }
    }

    /// Send one cosmic event to every eligible subscriber.
    ///
    /// At most one dispatch happens per event fingerprint per UTC day; a
    /// duplicate returns a successful zero-recipient result without
    /// touching the transport. Validation failures are reported in the
    /// result, not raised. Store failures before the fan-out begins are
    /// the only errors that propagate.
    pub async fn send_notification(
        &self,
        event: &NotificationEvent,
        context: Option<&CosmicContext>,
        sent_by: SendCadence,
    ) -> AppResult<NotificationResult> {
        if let Err(e) = event.validate() {
            tracing::error!(
                event_type = event.kind.as_str(),
                error = %e,
                "Rejecting invalid notification event"
            );
            return Ok(NotificationResult::invalid(e.to_string()));
        }

        let today = Utc::now().date_naive();
        let event_key = event.fingerprint();

        self.deduplicator.cleanup_old(today).await?;

        if !self.deduplicator.claim(today, event, sent_by).await? {
            tracing::info!(
                event_key = %event_key,
                "Event already sent today, skipping duplicate"
            );
            return Ok(NotificationResult::skipped(event_key));
        }

        let outcome = self.dispatcher.dispatch(event, context).await?;

        tracing::info!(
            event_key = %event_key,
            sent_by = %sent_by,
            recipients = outcome.recipient_count,
            successful = outcome.successful,
            failed = outcome.failed,
            "Notification dispatch complete"
        );

        Ok(NotificationResult {
            success: outcome.successful > 0 || outcome.recipient_count == 0,
            recipient_count: outcome.recipient_count,
            successful: outcome.successful,
            failed: outcome.failed,
            event_key: Some(event_key),
            error: None,
        })
    }
}
