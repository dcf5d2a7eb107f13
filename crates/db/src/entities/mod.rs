//! Database entities.

pub mod billing_subscription;
pub mod birth_chart;
pub mod push_subscription;
pub mod sent_notification;
pub mod user_profile;
