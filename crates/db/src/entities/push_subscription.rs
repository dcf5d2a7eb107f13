//! Push subscription entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Push subscription entity for Web Push notifications.
///
/// One row per browser/device endpoint. Anonymous subscriptions (no
/// `user_id`) are allowed; they receive un-personalized notifications.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "push_subscription")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Push subscription endpoint URL (unique transport address)
    #[sea_orm(column_type = "Text", unique)]
    pub endpoint: String,

    /// P256DH key for push encryption
    pub p256dh: String,

    /// Auth key for push encryption
    pub auth: String,

    /// Owning user, if the subscriber is signed in
    #[sea_orm(nullable, indexed)]
    pub user_id: Option<String>,

    /// Per-category boolean preference flags (JSON object)
    #[sea_orm(column_type = "JsonBinary")]
    pub preferences: Json,

    /// Whether the subscription is active
    #[sea_orm(default_value = true)]
    pub is_active: bool,

    /// Last successful delivery timestamp
    #[sea_orm(nullable)]
    pub last_notification_sent: Option<DateTimeWithTimeZone>,

    /// Timestamp when the subscription was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the subscription was last updated
    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

/// Relations for push subscription.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
