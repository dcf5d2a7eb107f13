//! Daily event deduplication.
//!
//! Guarantees at most one dispatch attempt per event fingerprint per UTC
//! calendar day. The gate is a unique-constraint insert on the backing
//! ledger, so two racing invocations resolve safely: exactly one of them
//! claims the event.

use std::collections::HashSet;

use chrono::{Days, NaiveDate};

use crate::events::{NotificationEvent, SendCadence};
use lunary_common::AppResult;
use lunary_db::repositories::SentNotificationRepository;

/// Deduplicator over the daily sent-event ledger.
#[derive(Clone)]
pub struct EventDeduplicator {
    repo: SentNotificationRepository,
    retention_days: u32,
}

impl EventDeduplicator {
    /// Create a new deduplicator with the given ledger retention window.
    #[must_use]
    pub const fn new(repo: SentNotificationRepository, retention_days: u32) -> Self {
        Self {
            repo,
            retention_days,
        }
    }

    /// Claim the delivery obligation for `event` on `day`.
    ///
    /// Returns `false` when the event was already claimed today; the
    /// caller must then skip without side effects. A claim is made before
    /// dispatch and is never released: an event whose deliveries all fail
    /// stays claimed, so transient per-subscriber failures cannot cause
    /// an event-wide resend storm within the same day.
    pub async fn claim(
        &self,
        day: NaiveDate,
        event: &NotificationEvent,
        sent_by: SendCadence,
    ) -> AppResult<bool> {
        self.repo
            .try_claim(
                day,
                &event.fingerprint(),
                event.kind.as_str(),
                &event.name,
                event.priority,
                &sent_by.to_string(),
            )
            .await
    }

    /// Fingerprints already claimed on `day`.
    pub async fn sent_events(&self, day: NaiveDate) -> AppResult<HashSet<String>> {
        let rows = self.repo.find_by_day(day).await?;
        Ok(rows.into_iter().map(|row| row.event_key).collect())
    }

    /// Drop ledger days older than the retention window.
    pub async fn cleanup_old(&self, today: NaiveDate) -> AppResult<u64> {
        let cutoff = today
            .checked_sub_days(Days::new(u64::from(self.retention_days)))
            .unwrap_or(today);
        self.repo.cleanup_before(cutoff).await
    }
}
