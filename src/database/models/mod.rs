pub mod band;
pub mod event;
pub(crate) mod macros;
pub mod notification;
pub mod poll;
pub mod push;
pub mod rsvp;

// Re-export all models for easy importing
pub use band::*;
pub use event::*;
pub use notification::*;
pub use poll::*;
pub use push::*;
pub use rsvp::*;
