//! Birth chart entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Pre-computed natal placements for one user.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "birth_chart")]
pub struct Model {
    /// Owning user
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,

    /// Sun sign
    #[sea_orm(nullable)]
    pub sun: Option<String>,

    /// Moon sign
    #[sea_orm(nullable)]
    pub moon: Option<String>,

    /// Rising sign
    #[sea_orm(nullable)]
    pub rising: Option<String>,

    /// Timestamp the chart was computed
    pub computed_at: DateTimeWithTimeZone,
}

/// Relations for birth chart.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
