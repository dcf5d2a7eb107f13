//! Notification delivery dispatcher.
//!
//! Fans a single rendered notification out to every eligible subscription,
//! personalizing per recipient, and reconciles subscription liveness from
//! the delivery outcomes. A dead endpoint among thousands must never
//! abort delivery to the rest: every send is awaited independently and
//! only the aggregate counts surface.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;

use crate::events::{CosmicContext, NotificationEvent};
use crate::services::content;
use crate::services::personalization::{
    ProfileResolver, personalize_body, personalize_title, should_personalize,
};
use crate::services::transport::{PushTransport, WebPushKeys};
use lunary_common::AppResult;
use lunary_db::entities::push_subscription;
use lunary_db::repositories::PushSubscriptionRepository;

/// Aggregate result of one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Subscriptions the event was dispatched to
    pub recipient_count: usize,
    /// Deliveries accepted by the push service
    pub successful: usize,
    /// Deliveries that failed (transient or gone)
    pub failed: usize,
}

/// Dispatches notifications to eligible push subscriptions.
#[derive(Clone)]
pub struct DeliveryDispatcher {
    subscriptions: PushSubscriptionRepository,
    profiles: ProfileResolver,
    transport: Arc<dyn PushTransport>,
    concurrency: usize,
}

impl DeliveryDispatcher {
    /// Create a new dispatcher.
    ///
    /// `concurrency` caps simultaneous in-flight push requests so large
    /// subscriber counts do not turn into unbounded socket fan-out.
    #[must_use]
    pub fn new(
        subscriptions: PushSubscriptionRepository,
        profiles: ProfileResolver,
        transport: Arc<dyn PushTransport>,
        concurrency: usize,
    ) -> Self {
        Self {
            subscriptions,
            profiles,
            transport,
            concurrency: concurrency.max(1),
        }
    }

    /// Fan `event` out to every eligible subscription.
    ///
    /// Eligibility is `is_active` plus the category's preference flag,
    /// when the category maps to one. Individual delivery failures are
    /// classified and counted, never propagated; the only errors that
    /// surface are setup-phase store failures before the fan-out begins.
    pub async fn dispatch(
        &self,
        event: &NotificationEvent,
        context: Option<&CosmicContext>,
    ) -> AppResult<DispatchOutcome> {
        let preference_key = event.kind.preference_key();
        let subscriptions = self
            .subscriptions
            .find_active_for_event(preference_key)
            .await?;

        if subscriptions.is_empty() {
            tracing::info!(
                event_type = event.kind.as_str(),
                "No active subscriptions found for event category"
            );
            return Ok(DispatchOutcome::default());
        }

        tracing::info!(
            event_type = event.kind.as_str(),
            recipients = subscriptions.len(),
            "Sending notification to subscribers"
        );

        // One batched profile resolution for every distinct signed-in
        // subscriber; anonymous subscriptions skip straight to the base
        // payload.
        let user_ids: Vec<String> = subscriptions
            .iter()
            .filter_map(|sub| sub.user_id.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let profile_map = self.profiles.batch_get_profiles(&user_ids).await;

        let base_payload = content::build_payload(event, context);

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let deliveries = subscriptions.iter().map(|sub| {
            let semaphore = Arc::clone(&semaphore);

            let payload = sub
                .user_id
                .as_deref()
                .and_then(|user_id| profile_map.get(user_id))
                .filter(|profile| should_personalize(profile, &event.kind))
                .map_or_else(
                    || base_payload.clone(),
                    |profile| {
                        let mut payload = base_payload.clone();
                        payload.title = personalize_title(&payload.title, profile);
                        payload.body = personalize_body(&payload.body, profile);
                        payload
                    },
                );

            async move {
                let _permit = semaphore.acquire_owned().await.ok();
                self.deliver(sub, &payload).await
            }
        });

        let outcomes = join_all(deliveries).await;
        let successful = outcomes.iter().filter(|delivered| **delivered).count();
        let failed = outcomes.len() - successful;

        Ok(DispatchOutcome {
            recipient_count: subscriptions.len(),
            successful,
            failed,
        })
    }

    /// Deliver one payload to one subscription and reconcile its state.
    async fn deliver(
        &self,
        sub: &push_subscription::Model,
        payload: &content::NotificationPayload,
    ) -> bool {
        let json = match serde_json::to_string(payload) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize notification payload");
                return false;
            }
        };

        let keys = WebPushKeys {
            endpoint: sub.endpoint.clone(),
            p256dh: sub.p256dh.clone(),
            auth: sub.auth.clone(),
        };

        match self.transport.send(&keys, &json).await {
            Ok(()) => {
                if let Err(e) = self
                    .subscriptions
                    .mark_notification_sent(&sub.endpoint)
                    .await
                {
                    // The push went out; a bookkeeping failure does not
                    // change the delivery outcome.
                    tracing::warn!(error = %e, "Failed to update last_notification_sent");
                }
                true
            }
            Err(err) => {
                tracing::warn!(
                    endpoint = mask_endpoint(&sub.endpoint),
                    user_id = sub.user_id.as_deref().unwrap_or("anonymous"),
                    error = %err,
                    "Failed to send push notification"
                );

                if err.is_gone() {
                    tracing::info!(
                        endpoint = mask_endpoint(&sub.endpoint),
                        "Marking subscription as inactive, endpoint is gone"
                    );
                    if let Err(e) = self
                        .subscriptions
                        .deactivate_by_endpoint(&sub.endpoint)
                        .await
                    {
                        tracing::warn!(error = %e, "Failed to deactivate subscription");
                    }
                }
                false
            }
        }
    }
}

/// Endpoints carry capability tokens; only log a prefix.
fn mask_endpoint(endpoint: &str) -> &str {
    endpoint.get(..50).unwrap_or(endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use crate::services::transport::PushError;
    use async_trait::async_trait;
    use chrono::Utc;
    use lunary_db::repositories::ProfileRepository;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Mutex;

    /// Transport that records every send and fails scripted endpoints.
    struct MockTransport {
        sent: Mutex<Vec<String>>,
        gone_endpoints: Vec<String>,
    }

    impl MockTransport {
        fn new(gone_endpoints: Vec<String>) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                gone_endpoints,
            }
        }

        fn sent_count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }

        fn payload_for(&self, endpoint: &str) -> Option<String> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .find(|entry| entry.starts_with(endpoint))
                .map(|entry| entry[endpoint.len() + 1..].to_string())
        }
    }

    #[async_trait]
    impl PushTransport for MockTransport {
        async fn send(&self, keys: &WebPushKeys, payload: &str) -> Result<(), PushError> {
            self.sent
                .lock()
                .unwrap()
                .push(format!("{} {payload}", keys.endpoint));
            if self.gone_endpoints.contains(&keys.endpoint) {
                return Err(PushError::Gone {
                    status: Some(410),
                    message: "Gone".to_string(),
                });
            }
            Ok(())
        }
    }

    fn subscription(
        endpoint: &str,
        user_id: Option<&str>,
        preferences: serde_json::Value,
    ) -> push_subscription::Model {
        push_subscription::Model {
            id: format!("sub-{endpoint}"),
            endpoint: endpoint.to_string(),
            p256dh: "p256dh-key".to_string(),
            auth: "auth-key".to_string(),
            user_id: user_id.map(String::from),
            preferences,
            is_active: true,
            last_notification_sent: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn moon_event() -> NotificationEvent {
        NotificationEvent {
            name: "Full Moon".to_string(),
            priority: 5,
            kind: EventKind::Moon,
        }
    }

    fn dispatcher(
        db: Arc<sea_orm::DatabaseConnection>,
        transport: Arc<MockTransport>,
    ) -> DeliveryDispatcher {
        DeliveryDispatcher::new(
            PushSubscriptionRepository::new(db.clone()),
            ProfileResolver::new(ProfileRepository::new(db)),
            transport,
            8,
        )
    }

    #[tokio::test]
    async fn test_partial_failure_is_isolated() {
        let total = 100;
        let gone = 10;

        let subs: Vec<push_subscription::Model> = (0..total)
            .map(|i| {
                subscription(
                    &format!("https://push.example/{i}"),
                    None,
                    serde_json::json!({ "moonPhases": true }),
                )
            })
            .collect();
        let gone_endpoints: Vec<String> = (0..gone)
            .map(|i| format!("https://push.example/{i}"))
            .collect();

        // One exec per successful send (last_notification_sent) and one
        // per gone endpoint (deactivation).
        let exec_results: Vec<MockExecResult> = (0..total)
            .map(|_| MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            })
            .collect();

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([subs])
                .append_exec_results(exec_results)
                .into_connection(),
        );

        let transport = Arc::new(MockTransport::new(gone_endpoints));
        let dispatcher = dispatcher(Arc::clone(&db), transport.clone());

        let outcome = dispatcher.dispatch(&moon_event(), None).await.unwrap();

        assert_eq!(outcome.recipient_count, 100);
        assert_eq!(outcome.successful, 90);
        assert_eq!(outcome.failed, 10);
        assert_eq!(transport.sent_count(), 100);

        // Exactly the gone endpoints were deactivated
        drop(dispatcher);
        let log = format!("{:?}", Arc::into_inner(db).unwrap().into_transaction_log()).replace('\\', "");
        let deactivations = log
            .matches(r#"UPDATE "push_subscription" SET "is_active""#)
            .count();
        assert_eq!(deactivations, 10);
    }

    #[tokio::test]
    async fn test_preference_flag_gates_eligibility() {
        let ingress = NotificationEvent {
            name: "Venus Enters Leo".to_string(),
            priority: 4,
            kind: EventKind::Ingress {
                planet: Some("Venus".to_string()),
                sign: Some("Leo".to_string()),
            },
        };

        // Only the subscription with planetaryTransits=true is eligible;
        // false and absent flags are both excluded.
        let subs = vec![
            subscription(
                "https://push.example/opted-in",
                None,
                serde_json::json!({ "planetaryTransits": true }),
            ),
            subscription(
                "https://push.example/opted-out",
                None,
                serde_json::json!({ "planetaryTransits": false }),
            ),
            subscription(
                "https://push.example/no-flag",
                None,
                serde_json::json!({ "moonPhases": true }),
            ),
        ];

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([subs])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let transport = Arc::new(MockTransport::new(Vec::new()));
        let dispatcher = dispatcher(db, transport.clone());

        let outcome = dispatcher.dispatch(&ingress, None).await.unwrap();

        assert_eq!(outcome.recipient_count, 1);
        assert_eq!(transport.sent_count(), 1);
        assert!(transport.payload_for("https://push.example/opted-in").is_some());
        assert!(transport.payload_for("https://push.example/opted-out").is_none());
        assert!(transport.payload_for("https://push.example/no-flag").is_none());
    }

    #[tokio::test]
    async fn test_zero_subscriptions_is_a_quiet_success() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<push_subscription::Model>::new()])
                .into_connection(),
        );
        let transport = Arc::new(MockTransport::new(Vec::new()));
        let dispatcher = dispatcher(db, transport.clone());

        let outcome = dispatcher.dispatch(&moon_event(), None).await.unwrap();

        assert_eq!(outcome, DispatchOutcome::default());
        assert_eq!(transport.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_paid_subscriber_gets_personalized_body() {
        use lunary_db::entities::{billing_subscription, birth_chart, user_profile};
        use lunary_db::entities::billing_subscription::BillingStatus;

        let subs = vec![
            subscription(
                "https://push.example/ada",
                Some("u1"),
                serde_json::json!({ "moonPhases": true }),
            ),
            subscription(
                "https://push.example/anon",
                None,
                serde_json::json!({ "moonPhases": true }),
            ),
        ];

        let profile = user_profile::Model {
            user_id: "u1".to_string(),
            name: Some("Ada Lovelace".to_string()),
            birthday: chrono::NaiveDate::from_ymd_opt(1990, 12, 10),
            timezone: None,
            preferences: None,
            created_at: Utc::now().into(),
            updated_at: None,
        };
        let billing = billing_subscription::Model {
            user_id: "u1".to_string(),
            status: BillingStatus::Active,
            plan: None,
            updated_at: None,
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([subs])
                .append_query_results([vec![profile]])
                .append_query_results([Vec::<birth_chart::Model>::new()])
                .append_query_results([vec![billing]])
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                ])
                .into_connection(),
        );

        let transport = Arc::new(MockTransport::new(Vec::new()));
        let dispatcher = dispatcher(db, transport.clone());

        let outcome = dispatcher.dispatch(&moon_event(), None).await.unwrap();
        assert_eq!(outcome.successful, 2);

        let ada_payload = transport.payload_for("https://push.example/ada").unwrap();
        let anon_payload = transport.payload_for("https://push.example/anon").unwrap();
        assert!(ada_payload.contains("Ada, peak illumination"));
        assert!(!anon_payload.contains("Ada"));
    }
}
