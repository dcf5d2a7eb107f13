//! Push subscription repository.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::entities::push_subscription::{Column, Entity, Model};
use lunary_common::{AppError, AppResult};

/// Repository for push subscription operations.
#[derive(Clone)]
pub struct PushSubscriptionRepository {
    db: Arc<DatabaseConnection>,
}

impl PushSubscriptionRepository {
    /// Create a new push subscription repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find active subscriptions eligible for an event category.
    ///
    /// When `preference_key` is `Some`, only subscriptions whose
    /// preference flag for that key is `true` are returned. A category
    /// with no mapped preference matches every active subscription.
    pub async fn find_active_for_event(
        &self,
        preference_key: Option<&str>,
    ) -> AppResult<Vec<Model>> {
        let subscriptions = Entity::find()
            .filter(Column::IsActive.eq(true))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let Some(key) = preference_key else {
            return Ok(subscriptions);
        };

        let filtered = subscriptions
            .into_iter()
            .filter(|sub| {
                sub.preferences
                    .get(key)
                    .and_then(serde_json::Value::as_bool)
                    .unwrap_or(false)
            })
            .collect();

        Ok(filtered)
    }

    /// Record a successful delivery to an endpoint.
    pub async fn mark_notification_sent(&self, endpoint: &str) -> AppResult<u64> {
        let result = Entity::update_many()
            .col_expr(Column::LastNotificationSent, Expr::value(Utc::now()))
            .filter(Column::Endpoint.eq(endpoint))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Deactivate a subscription whose endpoint is permanently gone.
    ///
    /// The row is kept for audit; it is never hard-deleted here.
    pub async fn deactivate_by_endpoint(&self, endpoint: &str) -> AppResult<u64> {
        let result = Entity::update_many()
            .col_expr(Column::IsActive, Expr::value(false))
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(Column::Endpoint.eq(endpoint))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }
}
