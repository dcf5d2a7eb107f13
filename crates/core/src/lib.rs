//! Core business logic for lunary-notify: the cosmic push-notification
//! fan-out engine.

pub mod events;
pub mod services;

pub use events::{CosmicContext, EventKind, NotificationEvent, SendCadence};
pub use services::*;
