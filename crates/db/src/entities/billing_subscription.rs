//! Billing subscription entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Billing status of a subscriber.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum BillingStatus {
    /// Paying subscriber in good standing
    #[sea_orm(string_value = "active")]
    Active,
    /// In a trial period
    #[sea_orm(string_value = "trial")]
    Trial,
    /// Payment failed, access retained
    #[sea_orm(string_value = "past_due")]
    PastDue,
    /// Free tier
    #[sea_orm(string_value = "free")]
    Free,
}

impl BillingStatus {
    /// Whether this status grants paid features.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        *self != Self::Free
    }
}

/// Billing record for one user.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "billing_subscription")]
pub struct Model {
    /// Owning user
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,

    /// Billing status
    pub status: BillingStatus,

    /// Plan identifier
    #[sea_orm(nullable)]
    pub plan: Option<String>,

    /// Timestamp when the record was last updated
    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

/// Relations for billing subscription.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
