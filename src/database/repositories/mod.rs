pub mod band;
pub mod event;
pub mod notification;
pub mod poll_vote;
pub mod preferences;
pub mod push_subscription;
pub mod rsvp;
pub mod visibility;

// Re-export all repositories for easy importing
pub use band::BandRepository;
pub use event::EventRepository;
pub use notification::NotificationRepository;
pub use poll_vote::PollVoteRepository;
pub use preferences::PreferencesRepository;
pub use push_subscription::PushSubscriptionRepository;
pub use rsvp::RsvpRepository;
pub use visibility::VisibilityRepository;
