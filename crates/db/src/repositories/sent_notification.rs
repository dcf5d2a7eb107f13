//! Sent notification ledger repository.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set};

use crate::entities::sent_notification::{ActiveModel, Column, Entity, Model};
use lunary_common::{AppError, AppResult};

/// Repository for the daily sent-event ledger.
#[derive(Clone)]
pub struct SentNotificationRepository {
    db: Arc<DatabaseConnection>,
}

impl SentNotificationRepository {
    /// Create a new sent notification repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Claim a delivery obligation for `day`.
    ///
    /// Returns `true` when this call inserted the claim and `false` when
    /// the `(day, event_key)` row already existed. The unique constraint
    /// is the dedup gate, so two racing claims resolve safely: exactly
    /// one caller sees `true`.
    pub async fn try_claim(
        &self,
        day: NaiveDate,
        event_key: &str,
        event_type: &str,
        event_name: &str,
        priority: i32,
        sent_by: &str,
    ) -> AppResult<bool> {
        let claim = ActiveModel {
            day: Set(day),
            event_key: Set(event_key.to_string()),
            event_type: Set(event_type.to_string()),
            event_name: Set(event_name.to_string()),
            priority: Set(priority),
            sent_by: Set(sent_by.to_string()),
            sent_at: Set(Utc::now().into()),
        };

        let result = Entity::insert(claim)
            .on_conflict(
                OnConflict::columns([Column::Day, Column::EventKey])
                    .do_nothing()
                    .to_owned(),
            )
            .exec(self.db.as_ref())
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(DbErr::RecordNotInserted) => Ok(false),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    /// All events claimed on `day`.
    pub async fn find_by_day(&self, day: NaiveDate) -> AppResult<Vec<Model>> {
        Entity::find()
            .filter(Column::Day.eq(day))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete ledger rows for days before `cutoff`.
    pub async fn cleanup_before(&self, cutoff: NaiveDate) -> AppResult<u64> {
        let result = Entity::delete_many()
            .filter(Column::Day.lt(cutoff))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }
}
