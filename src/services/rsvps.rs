use uuid::Uuid;

use crate::database::{
    models::{Event, EventRsvp, EventRsvpWithUser, EventStatus, RsvpStatus, SetRsvpInput},
    repositories::RsvpRepository,
};
use crate::error::AppError;
use crate::services::{
    access_guard::{Access, AccessGuard},
    validation::{parse_field, validate_note},
};

/// RSVPs are taken on open events with a settled time.
pub fn ensure_accepting_rsvps(event: &Event) -> Result<(), AppError> {
    if event.status != EventStatus::Open {
        return Err(AppError::InvalidState(format!(
            "Cannot RSVP to a {} event",
            event.status
        )));
    }
    if !event.has_fixed_time() {
        return Err(AppError::InvalidState(
            "Cannot RSVP before the poll is resolved".to_string(),
        ));
    }
    Ok(())
}

#[derive(Clone)]
pub struct RsvpService {
    guard: AccessGuard,
    rsvps: RsvpRepository,
}

impl RsvpService {
    pub fn new(guard: AccessGuard, rsvps: RsvpRepository) -> Self {
        Self { guard, rsvps }
    }

    pub async fn set_rsvp(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        input: SetRsvpInput,
    ) -> Result<EventRsvp, AppError> {
        let status: RsvpStatus = parse_field("status", &input.status)?;
        let note = validate_note(input.note)?;

        let authorized = self
            .guard
            .authorize_event(event_id, user_id, Access::View)
            .await?;
        ensure_accepting_rsvps(&authorized.event)?;

        let rsvp = self
            .rsvps
            .upsert(event_id, user_id, status, note.as_deref())
            .await?;
        log::debug!("User {} RSVPed {} to event {}", user_id, status, event_id);

        Ok(rsvp)
    }

    pub async fn get_user_rsvp(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<EventRsvp>, AppError> {
        self.guard
            .authorize_event(event_id, user_id, Access::View)
            .await?;

        Ok(self.rsvps.find(event_id, user_id).await?)
    }

    pub async fn get_event_rsvps(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<EventRsvpWithUser>, AppError> {
        self.guard
            .authorize_event(event_id, user_id, Access::View)
            .await?;

        Ok(self.rsvps.list_with_users(event_id).await?)
    }

    pub async fn remove_rsvp(&self, event_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        self.guard
            .authorize_event(event_id, user_id, Access::View)
            .await?;

        if !self.rsvps.delete(event_id, user_id).await? {
            return Err(AppError::NotFound("RSVP not found".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{
        EventMode,
        event::fixtures::{event, poll_event},
    };
    use chrono::Utc;

    #[test]
    fn fixed_events_and_resolved_polls_take_rsvps() {
        assert!(ensure_accepting_rsvps(&event(EventMode::Fixed)).is_ok());

        let mut poll = poll_event();
        assert!(matches!(
            ensure_accepting_rsvps(&poll),
            Err(AppError::InvalidState(_))
        ));

        poll.resolve("slot1", Utc::now()).unwrap();
        assert!(ensure_accepting_rsvps(&poll).is_ok());
    }

    #[test]
    fn cancelled_events_take_no_rsvps() {
        let mut fixed = event(EventMode::Fixed);
        fixed.cancel().unwrap();
        assert!(ensure_accepting_rsvps(&fixed).is_err());
    }
}
