//! Profile, birth chart and billing repository.

use std::sync::Arc;

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::entities::{billing_subscription, birth_chart, user_profile};
use lunary_common::{AppError, AppResult};

/// Joined read access to the profile, chart and billing stores.
///
/// Every method takes a batch of user ids and issues exactly one query,
/// regardless of batch size. Callers fan out to thousands of subscribers;
/// a per-user query here would be an N+1 storm.
#[derive(Clone)]
pub struct ProfileRepository {
    db: Arc<DatabaseConnection>,
}

impl ProfileRepository {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Fetch profiles for a set of users in one query.
    pub async fn find_profiles(&self, user_ids: &[String]) -> AppResult<Vec<user_profile::Model>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        user_profile::Entity::find()
            .filter(user_profile::Column::UserId.is_in(user_ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Fetch pre-computed birth charts for a set of users in one query.
    pub async fn find_charts(&self, user_ids: &[String]) -> AppResult<Vec<birth_chart::Model>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        birth_chart::Entity::find()
            .filter(birth_chart::Column::UserId.is_in(user_ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Fetch billing records for a set of users in one query.
    pub async fn find_billing(
        &self,
        user_ids: &[String],
    ) -> AppResult<Vec<billing_subscription::Model>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        billing_subscription::Entity::find()
            .filter(billing_subscription::Column::UserId.is_in(user_ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
