use uuid::Uuid;

use crate::database::{
    models::{BandMember, Event},
    repositories::{BandRepository, EventRepository, VisibilityRepository},
};
use crate::error::AppError;
use crate::services::visibility::is_visible;

/// What the caller wants to do with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Read, vote, RSVP. Any member who can see the event.
    View,
    /// Update, delete, cancel, close, resolve, edit visibility. The creator or a band admin.
    Manage,
}

/// An event the caller passed the guard for, with the facts the guard looked up.
#[derive(Debug, Clone)]
pub struct AuthorizedEvent {
    pub event: Event,
    pub membership: BandMember,
    pub visible_user_ids: Vec<Uuid>,
}

pub fn check_event_access(
    event: &Event,
    visible_user_ids: &[Uuid],
    user_id: Uuid,
    membership: Option<&BandMember>,
    access: Access,
) -> Result<(), AppError> {
    let Some(membership) = membership else {
        return Err(AppError::Forbidden("Not a member of this band".to_string()));
    };

    match access {
        Access::Manage => {
            if event.created_by == user_id || membership.is_admin() {
                Ok(())
            } else {
                Err(AppError::Forbidden(
                    "Only the event creator or a band admin can do this".to_string(),
                ))
            }
        }
        Access::View => {
            // Private events the caller cannot see are not disclosed.
            if is_visible(event, visible_user_ids, user_id) {
                Ok(())
            } else {
                Err(AppError::NotFound("Event not found".to_string()))
            }
        }
    }
}

#[derive(Clone)]
pub struct AccessGuard {
    bands: BandRepository,
    events: EventRepository,
    visibility: VisibilityRepository,
}

impl AccessGuard {
    pub fn new(
        bands: BandRepository,
        events: EventRepository,
        visibility: VisibilityRepository,
    ) -> Self {
        Self {
            bands,
            events,
            visibility,
        }
    }

    pub async fn authorize_band(&self, band_id: Uuid, user_id: Uuid) -> Result<BandMember, AppError> {
        if let Some(member) = self.bands.find_membership(band_id, user_id).await? {
            return Ok(member);
        }

        if self.bands.band_exists(band_id).await? {
            Err(AppError::Forbidden("Not a member of this band".to_string()))
        } else {
            Err(AppError::NotFound("Band not found".to_string()))
        }
    }

    pub async fn authorize_event(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        access: Access,
    ) -> Result<AuthorizedEvent, AppError> {
        let event = self
            .events
            .find_by_id(event_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

        let membership = self.bands.find_membership(event.band_id, user_id).await?;
        let visible_user_ids = if event.is_private() {
            self.visibility.list(event.id).await?
        } else {
            Vec::new()
        };

        check_event_access(
            &event,
            &visible_user_ids,
            user_id,
            membership.as_ref(),
            access,
        )?;

        let Some(membership) = membership else {
            return Err(AppError::Forbidden("Not a member of this band".to_string()));
        };

        Ok(AuthorizedEvent {
            event,
            membership,
            visible_user_ids,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{BandRole, EventMode, EventVisibility, event::fixtures::event};
    use chrono::Utc;

    fn member(event: &Event, user_id: Uuid, role: BandRole) -> BandMember {
        BandMember {
            band_id: event.band_id,
            user_id,
            role,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn non_members_are_forbidden() {
        let event = event(EventMode::Fixed);
        let err = check_event_access(&event, &[], Uuid::new_v4(), None, Access::View).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn manage_needs_creator_or_admin() {
        let event = event(EventMode::Fixed);
        let stranger = Uuid::new_v4();

        let plain = member(&event, stranger, BandRole::Member);
        assert!(matches!(
            check_event_access(&event, &[], stranger, Some(&plain), Access::Manage),
            Err(AppError::Forbidden(_))
        ));

        let admin = member(&event, stranger, BandRole::Admin);
        assert!(check_event_access(&event, &[], stranger, Some(&admin), Access::Manage).is_ok());

        let creator = member(&event, event.created_by, BandRole::Member);
        assert!(
            check_event_access(&event, &[], event.created_by, Some(&creator), Access::Manage)
                .is_ok()
        );
    }

    #[test]
    fn hidden_private_events_read_as_missing() {
        let mut event = event(EventMode::Fixed);
        event.visibility = EventVisibility::Private;
        let insider = Uuid::new_v4();
        let outsider = Uuid::new_v4();

        let outsider_member = member(&event, outsider, BandRole::Member);
        assert!(matches!(
            check_event_access(&event, &[insider], outsider, Some(&outsider_member), Access::View),
            Err(AppError::NotFound(_))
        ));

        let insider_member = member(&event, insider, BandRole::Member);
        assert!(
            check_event_access(&event, &[insider], insider, Some(&insider_member), Access::View)
                .is_ok()
        );
    }
}
