//! Sent notification ledger entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One delivery obligation claimed for a calendar day.
///
/// The composite primary key `(day, event_key)` is the deduplication gate:
/// a second insert for the same fingerprint on the same day conflicts and
/// the event is skipped.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sent_notification")]
pub struct Model {
    /// Calendar day (UTC) the event was claimed for
    #[sea_orm(primary_key, auto_increment = false)]
    pub day: Date,

    /// Event fingerprint (`type-name-priority`)
    #[sea_orm(primary_key, auto_increment = false)]
    pub event_key: String,

    /// Event category
    pub event_type: String,

    /// Human event label
    pub event_name: String,

    /// Event priority (audit only)
    pub priority: i32,

    /// Triggering cadence (`daily` or `4-hourly`)
    pub sent_by: String,

    /// Timestamp when the claim was made
    pub sent_at: DateTimeWithTimeZone,
}

/// Relations for sent notification.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
