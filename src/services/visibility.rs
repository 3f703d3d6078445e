use std::collections::HashSet;

use uuid::Uuid;

use crate::database::{
    models::{Event, EventWithAudience},
    repositories::{BandRepository, VisibilityRepository},
};
use crate::error::AppError;
use crate::services::access_guard::{Access, AccessGuard};

/// Band events are visible to every member; private ones to the creator and the listed users.
pub fn is_visible(event: &Event, visible_user_ids: &[Uuid], user_id: Uuid) -> bool {
    !event.is_private() || event.created_by == user_id || visible_user_ids.contains(&user_id)
}

/// Keeps the events `user_id` may see and drops the visibility lists.
pub fn filter_visible(events: Vec<EventWithAudience>, user_id: Uuid) -> Vec<Event> {
    events
        .into_iter()
        .filter(|e| is_visible(&e.event, &e.visible_user_ids, user_id))
        .map(|e| e.event)
        .collect()
}

#[derive(Clone)]
pub struct VisibilityService {
    guard: AccessGuard,
    bands: BandRepository,
    visibility: VisibilityRepository,
}

impl VisibilityService {
    pub fn new(guard: AccessGuard, bands: BandRepository, visibility: VisibilityRepository) -> Self {
        Self {
            guard,
            bands,
            visibility,
        }
    }

    /// Attaches visibility lists to `events` and keeps the visible ones.
    pub async fn visible_to(&self, events: Vec<Event>, user_id: Uuid) -> Result<Vec<Event>, AppError> {
        let private_ids: Vec<Uuid> = events
            .iter()
            .filter(|e| e.is_private())
            .map(|e| e.id)
            .collect();
        let mut sets = self.visibility.list_for_events(&private_ids).await?;

        let with_audience = events
            .into_iter()
            .map(|event| EventWithAudience {
                visible_user_ids: sets.remove(&event.id).unwrap_or_default(),
                event,
            })
            .collect();

        Ok(filter_visible(with_audience, user_id))
    }

    pub async fn get_event_visibility(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<Uuid>, AppError> {
        let authorized = self
            .guard
            .authorize_event(event_id, user_id, Access::Manage)
            .await?;
        Ok(authorized.visible_user_ids)
    }

    pub async fn set_event_visibility(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        user_ids: Vec<Uuid>,
    ) -> Result<Vec<Uuid>, AppError> {
        let authorized = self
            .guard
            .authorize_event(event_id, user_id, Access::Manage)
            .await?;
        let user_ids = self.members_only(&authorized.event, user_ids).await?;

        self.visibility.replace(event_id, &user_ids).await?;
        log::info!(
            "Visibility of event {} replaced with {} users by {}",
            event_id,
            user_ids.len(),
            user_id
        );

        Ok(self.visibility.list(event_id).await?)
    }

    pub async fn add_visible_users(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        user_ids: Vec<Uuid>,
    ) -> Result<Vec<Uuid>, AppError> {
        let authorized = self
            .guard
            .authorize_event(event_id, user_id, Access::Manage)
            .await?;
        let user_ids = self.members_only(&authorized.event, user_ids).await?;

        self.visibility.add(event_id, &user_ids).await?;

        Ok(self.visibility.list(event_id).await?)
    }

    pub async fn remove_visible_users(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        user_ids: Vec<Uuid>,
    ) -> Result<Vec<Uuid>, AppError> {
        self.guard
            .authorize_event(event_id, user_id, Access::Manage)
            .await?;

        let removed = self.visibility.remove(event_id, &user_ids).await?;
        log::debug!("Removed {} users from event {} visibility", removed, event_id);

        Ok(self.visibility.list(event_id).await?)
    }

    /// Rejects lists for non-private events and ids that are not band members.
    async fn members_only(&self, event: &Event, user_ids: Vec<Uuid>) -> Result<Vec<Uuid>, AppError> {
        if !event.is_private() {
            return Err(AppError::validation(
                "Visibility lists only apply to private events",
            ));
        }

        let mut seen = HashSet::new();
        let user_ids: Vec<Uuid> = user_ids.into_iter().filter(|id| seen.insert(*id)).collect();
        if user_ids.is_empty() {
            return Ok(user_ids);
        }

        let members: HashSet<Uuid> = self
            .bands
            .filter_members(event.band_id, &user_ids)
            .await?
            .into_iter()
            .collect();
        if let Some(outsider) = user_ids.iter().find(|id| !members.contains(*id)) {
            return Err(AppError::validation(format!(
                "User {} is not a member of this band",
                outsider
            )));
        }

        Ok(user_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{EventMode, EventVisibility, event::fixtures::event};
    use pretty_assertions::assert_eq;

    fn private_event() -> Event {
        let mut event = event(EventMode::Fixed);
        event.visibility = EventVisibility::Private;
        event
    }

    #[test]
    fn band_events_are_visible_to_everyone() {
        let event = event(EventMode::Fixed);
        assert!(is_visible(&event, &[], Uuid::new_v4()));
    }

    #[test]
    fn private_events_need_creator_or_listed_user() {
        let event = private_event();
        let listed = Uuid::new_v4();

        assert!(is_visible(&event, &[listed], listed));
        assert!(is_visible(&event, &[listed], event.created_by));
        assert!(is_visible(&event, &[], event.created_by));
        assert!(!is_visible(&event, &[listed], Uuid::new_v4()));
    }

    #[test]
    fn filtering_keeps_order_and_drops_hidden_events() {
        let viewer = Uuid::new_v4();
        let open = event(EventMode::Fixed);
        let hidden = private_event();
        let shared = private_event();

        let visible = filter_visible(
            vec![
                EventWithAudience {
                    event: open.clone(),
                    visible_user_ids: vec![],
                },
                EventWithAudience {
                    event: hidden,
                    visible_user_ids: vec![Uuid::new_v4()],
                },
                EventWithAudience {
                    event: shared.clone(),
                    visible_user_ids: vec![viewer],
                },
            ],
            viewer,
        );

        let ids: Vec<Uuid> = visible.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![open.id, shared.id]);
    }
}
