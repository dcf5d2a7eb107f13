//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250601_000001_create_push_subscription_table;
mod m20250601_000002_create_sent_notification_table;
mod m20250601_000003_create_user_profile_table;
mod m20250601_000004_create_birth_chart_table;
mod m20250601_000005_create_billing_subscription_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_push_subscription_table::Migration),
            Box::new(m20250601_000002_create_sent_notification_table::Migration),
            Box::new(m20250601_000003_create_user_profile_table::Migration),
            Box::new(m20250601_000004_create_birth_chart_table::Migration),
            Box::new(m20250601_000005_create_billing_subscription_table::Migration),
        ]
    }
}
