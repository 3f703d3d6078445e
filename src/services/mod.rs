pub mod access_guard;
pub mod auth;
pub mod events;
pub mod notifications;
pub mod notifier;
pub mod polls;
pub mod push;
pub mod reminders;
pub mod rsvps;
pub mod user_context;
pub mod validation;
pub mod visibility;

pub use access_guard::{Access, AccessGuard};
pub use events::EventService;
pub use notifications::NotificationService;
pub use notifier::NotificationFanout;
pub use polls::PollService;
pub use push::PushClient;
pub use reminders::{ReminderReport, ReminderScheduler};
pub use rsvps::RsvpService;
pub use user_context::UserContext;
pub use visibility::VisibilityService;
