//! User profile entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Subscriber profile: name, birthday and notification preferences.
///
/// The `preferences` JSON blob may carry a cached `birthChart` object; the
/// dedicated [`super::birth_chart`] table is the primary chart location.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_profile")]
pub struct Model {
    /// Owning user
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,

    /// Display name
    #[sea_orm(nullable)]
    pub name: Option<String>,

    /// Birthday, required for chart-aware personalization
    #[sea_orm(nullable)]
    pub birthday: Option<Date>,

    /// IANA timezone name
    #[sea_orm(nullable)]
    pub timezone: Option<String>,

    /// Preference blob (may embed a cached birth chart)
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub preferences: Option<Json>,

    /// Timestamp when the profile was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the profile was last updated
    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

/// Relations for user profile.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
