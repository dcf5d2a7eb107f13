//! Business logic services.

pub mod content;
pub mod dedup;
pub mod dispatch;
pub mod notification;
pub mod personalization;
pub mod transport;

pub use content::{
    NotificationAction, NotificationPayload, PayloadData, add_contextual_info, build_body,
    build_payload, build_title, variant_body,
};
pub use dedup::EventDeduplicator;
pub use dispatch::{DeliveryDispatcher, DispatchOutcome};
pub use notification::{NotificationResult, NotificationService};
pub use personalization::{
    BirthChart, PersonalizationLevel, ProfileResolver, SubscriberProfile, personalization_level,
    personalize_body, personalize_title, should_personalize,
};
pub use transport::{PushError, PushTransport, VapidConfig, WebPushKeys, WebPushTransport};
