//! Data access repositories.

pub mod profile;
pub mod push_subscription;
pub mod sent_notification;

pub use profile::ProfileRepository;
pub use push_subscription::PushSubscriptionRepository;
pub use sent_notification::SentNotificationRepository;
