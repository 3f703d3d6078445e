use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{
    models::{
        CreateEventInput, Event, EventModeKind, EventQuery, EventStatus, EventVisibility,
        NotificationType, UpdateEventInput,
    },
    repositories::{BandRepository, EventRepository, VisibilityRepository, event, visibility},
    transaction::DatabaseTransaction,
};
use crate::error::AppError;
use crate::services::{
    access_guard::{Access, AccessGuard},
    notifier::{FanoutRequest, NotificationFanout},
    validation::{
        apply_event_update, check_update_input, parse_field, validate_new_event, validate_slot_key,
    },
    visibility::VisibilityService,
};

pub const DEFAULT_UPCOMING_LIMIT: i64 = 20;
pub const MAX_UPCOMING_LIMIT: i64 = 100;

#[derive(Clone)]
pub struct EventService {
    pool: PgPool,
    guard: AccessGuard,
    bands: BandRepository,
    events: EventRepository,
    visibility: VisibilityRepository,
    visibility_filter: VisibilityService,
    fanout: NotificationFanout,
}

impl EventService {
    pub fn new(
        pool: PgPool,
        guard: AccessGuard,
        visibility_filter: VisibilityService,
        fanout: NotificationFanout,
    ) -> Self {
        Self {
            bands: BandRepository::new(pool.clone()),
            events: EventRepository::new(pool.clone()),
            visibility: VisibilityRepository::new(pool.clone()),
            pool,
            guard,
            visibility_filter,
            fanout,
        }
    }

    pub async fn create_event(
        &self,
        user_id: Uuid,
        input: CreateEventInput,
    ) -> Result<Event, AppError> {
        let new_event = validate_new_event(input, user_id)?;
        self.guard.authorize_band(new_event.band_id, user_id).await?;

        if !new_event.visible_user_ids.is_empty() {
            let members = self
                .bands
                .filter_members(new_event.band_id, &new_event.visible_user_ids)
                .await?;
            if members.len() != new_event.visible_user_ids.len() {
                return Err(AppError::validation(
                    "visibleUserIds must all be members of the band",
                ));
            }
        }

        let visible_user_ids = new_event.visible_user_ids.clone();
        // Event and visibility list commit together so a private event is never unrestricted.
        let created = DatabaseTransaction::run(&self.pool, move |tx| {
            Box::pin(async move {
                let created = event::insert(tx, &new_event).await?;
                if created.visibility == EventVisibility::Private {
                    visibility::insert(tx, created.id, &new_event.visible_user_ids).await?;
                }
                Ok(created)
            })
        })
        .await?;

        log::info!(
            "Event {} ({}) created in band {} by {}",
            created.id,
            created.mode_kind(),
            created.band_id,
            user_id
        );
        self.fan_out(&created, &visible_user_ids, NotificationType::EventCreated, user_id)
            .await;

        Ok(created)
    }

    pub async fn update_event(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        input: UpdateEventInput,
    ) -> Result<Event, AppError> {
        check_update_input(&input)?;
        let authorized = self
            .guard
            .authorize_event(event_id, user_id, Access::Manage)
            .await?;

        let mut changed = authorized.event.clone();
        let effects = apply_event_update(&mut changed, input)?;
        let updated = self.events.update(&changed).await?;

        if effects.visibility_changed && updated.visibility == EventVisibility::Band {
            self.visibility.replace(updated.id, &[]).await?;
        }
        log::info!("Event {} updated by {}", updated.id, user_id);

        if effects.schedule_changed && updated.status == EventStatus::Open {
            let visible_user_ids = self.visibility.list(updated.id).await?;
            self.fan_out(&updated, &visible_user_ids, NotificationType::EventUpdated, user_id)
                .await;
        }

        Ok(updated)
    }

    pub async fn delete_event(&self, event_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        self.guard
            .authorize_event(event_id, user_id, Access::Manage)
            .await?;

        if !self.events.delete(event_id).await? {
            return Err(AppError::NotFound("Event not found".to_string()));
        }
        log::info!("Event {} deleted by {}", event_id, user_id);

        Ok(())
    }

    pub async fn cancel_event(&self, event_id: Uuid, user_id: Uuid) -> Result<Event, AppError> {
        let authorized = self
            .guard
            .authorize_event(event_id, user_id, Access::Manage)
            .await?;

        let mut target = authorized.event;
        target.cancel()?;
        let cancelled = self
            .events
            .transition_status(event_id, EventStatus::Open, target.status)
            .await?
            .ok_or_else(concurrent_change)?;

        log::info!("Event {} cancelled by {}", event_id, user_id);
        self.fan_out(
            &cancelled,
            &authorized.visible_user_ids,
            NotificationType::EventCancelled,
            user_id,
        )
        .await;

        Ok(cancelled)
    }

    pub async fn close_event(&self, event_id: Uuid, user_id: Uuid) -> Result<Event, AppError> {
        let authorized = self
            .guard
            .authorize_event(event_id, user_id, Access::Manage)
            .await?;

        let mut target = authorized.event;
        target.close()?;
        let closed = self
            .events
            .transition_status(event_id, EventStatus::Open, target.status)
            .await?
            .ok_or_else(concurrent_change)?;

        log::info!("Event {} closed by {}", event_id, user_id);

        Ok(closed)
    }

    pub async fn resolve_poll(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        slot_key: &str,
    ) -> Result<Event, AppError> {
        validate_slot_key(slot_key)?;
        let authorized = self
            .guard
            .authorize_event(event_id, user_id, Access::Manage)
            .await?;

        let mut target = authorized.event;
        let previous_resolved_at = target.poll().and_then(|p| p.resolved_at);
        target.resolve(slot_key, Utc::now())?;

        // Compare-and-set on the resolution we read; a concurrent resolver wins.
        let resolved = self
            .events
            .save_resolution(&target, previous_resolved_at)
            .await?
            .ok_or_else(concurrent_change)?;

        log::info!(
            "Poll {} resolved to slot {} by {}",
            event_id,
            slot_key,
            user_id
        );
        self.fan_out(
            &resolved,
            &authorized.visible_user_ids,
            NotificationType::PollResolved,
            user_id,
        )
        .await;

        Ok(resolved)
    }

    pub async fn get_event(&self, event_id: Uuid, user_id: Uuid) -> Result<Event, AppError> {
        let authorized = self
            .guard
            .authorize_event(event_id, user_id, Access::View)
            .await?;
        Ok(authorized.event)
    }

    pub async fn get_band_events(
        &self,
        band_id: Uuid,
        user_id: Uuid,
        query: EventQuery,
    ) -> Result<Vec<Event>, AppError> {
        let status = query
            .status
            .as_deref()
            .map(|s| parse_field::<EventStatus>("status", s))
            .transpose()?;
        let mode = query
            .mode
            .as_deref()
            .map(|m| parse_field::<EventModeKind>("mode", m))
            .transpose()?;
        if let (Some(from), Some(to)) = (query.from, query.to) {
            if to < from {
                return Err(AppError::validation("'to' must not be before 'from'"));
            }
        }

        self.guard.authorize_band(band_id, user_id).await?;

        let events = self
            .events
            .find_by_band(band_id, status, mode, query.from, query.to)
            .await?;
        self.visibility_filter.visible_to(events, user_id).await
    }

    pub async fn get_visible_events(
        &self,
        band_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<Event>, AppError> {
        self.get_band_events(band_id, user_id, EventQuery::default())
            .await
    }

    pub async fn get_upcoming_events(
        &self,
        user_id: Uuid,
        limit: Option<i64>,
    ) -> Result<Vec<Event>, AppError> {
        let limit = limit.unwrap_or(DEFAULT_UPCOMING_LIMIT);
        if !(1..=MAX_UPCOMING_LIMIT).contains(&limit) {
            return Err(AppError::validation(format!(
                "limit must be between 1 and {}",
                MAX_UPCOMING_LIMIT
            )));
        }

        let band_ids = self.bands.band_ids_for_user(user_id).await?;
        if band_ids.is_empty() {
            return Ok(Vec::new());
        }

        let events = self.events.find_upcoming(&band_ids, Utc::now()).await?;
        let mut visible = self.visibility_filter.visible_to(events, user_id).await?;
        visible.truncate(limit as usize);

        Ok(visible)
    }

    /// Notification delivery never fails the action that triggered it.
    async fn fan_out(
        &self,
        event: &Event,
        visible_user_ids: &[Uuid],
        notification_type: NotificationType,
        actor: Uuid,
    ) {
        let request = FanoutRequest::for_event(event, visible_user_ids, notification_type, actor);
        if let Err(e) = self.fanout.notify_band_members(request).await {
            log::warn!(
                "Failed to fan out {} for event {}: {}",
                notification_type,
                event.id,
                e
            );
        }
    }
}

fn concurrent_change() -> AppError {
    AppError::InvalidState("Event was changed by another request; reload and retry".to_string())
}
