use std::collections::{HashMap, HashSet};

use serde_json::json;
use uuid::Uuid;

use crate::database::{
    ServiceRole,
    models::{
        Event, EventMode, EventVisibility, NewNotification, Notification,
        NotificationPreferences, NotificationType,
    },
    repositories::{band, notification, preferences, push_subscription},
};
use crate::error::AppError;
use crate::services::push::{PushClient, PushError};

/// What every recipient of one fan-out receives.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationContent {
    pub notification_type: NotificationType,
    pub title: String,
    pub body: Option<String>,
    pub link: Option<String>,
    pub data: Option<serde_json::Value>,
}

impl NotificationContent {
    /// Standard content for an event-domain notification.
    pub fn for_event(event: &Event, notification_type: NotificationType) -> Self {
        let when = event
            .start_time
            .map(|t| t.format("%a %b %-d, %H:%M UTC").to_string());

        let (title, body) = match notification_type {
            NotificationType::EventCreated => (
                format!("New {}: {}", event.event_type, event.title),
                match &event.mode {
                    EventMode::Poll(_) => Some("Vote on the date that works for you".to_string()),
                    EventMode::Fixed => when,
                },
            ),
            NotificationType::EventUpdated => (format!("Updated: {}", event.title), when),
            NotificationType::EventCancelled => (
                format!("Cancelled: {}", event.title),
                Some("This event has been cancelled".to_string()),
            ),
            NotificationType::PollResolved => (format!("Date set: {}", event.title), when),
            NotificationType::RsvpReminder => (
                format!("RSVP needed: {}", event.title),
                event
                    .rsvp_deadline
                    .map(|d| format!("Please respond by {}", d.format("%a %b %-d, %H:%M UTC"))),
            ),
            NotificationType::PollReminder => (
                format!("Vote needed: {}", event.title),
                event.poll().and_then(|p| p.poll_closes_at).map(|d| {
                    format!("Voting closes {}", d.format("%a %b %-d, %H:%M UTC"))
                }),
            ),
        };

        Self {
            notification_type,
            title,
            body,
            link: Some(format!("/bands/{}/events/{}", event.band_id, event.id)),
            data: Some(json!({ "eventId": event.id, "bandId": event.band_id })),
        }
    }
}

/// One event-domain action to fan out to a band.
#[derive(Debug, Clone)]
pub struct FanoutRequest {
    pub band_id: Uuid,
    pub content: NotificationContent,
    /// The actor; never notified of their own action.
    pub exclude_user_id: Option<Uuid>,
    pub visibility: EventVisibility,
    pub visible_user_ids: Vec<Uuid>,
    /// Event creator; sees a private event whether or not they are listed.
    pub creator_id: Option<Uuid>,
}

impl FanoutRequest {
    pub fn for_event(
        event: &Event,
        visible_user_ids: &[Uuid],
        notification_type: NotificationType,
        actor: Uuid,
    ) -> Self {
        Self {
            band_id: event.band_id,
            content: NotificationContent::for_event(event, notification_type),
            exclude_user_id: Some(actor),
            visibility: event.visibility,
            visible_user_ids: visible_user_ids.to_vec(),
            creator_id: Some(event.created_by),
        }
    }
}

/// Band members entitled to the notification, in member order. For a private event that is
/// the listed users plus the creator, the same audience `is_visible` grants.
pub fn select_recipients(
    member_ids: &[Uuid],
    visibility: EventVisibility,
    visible_user_ids: &[Uuid],
    creator_id: Option<Uuid>,
    exclude_user_id: Option<Uuid>,
) -> Vec<Uuid> {
    let visible: HashSet<&Uuid> = visible_user_ids.iter().collect();
    member_ids
        .iter()
        .filter(|id| {
            visibility == EventVisibility::Band
                || Some(**id) == creator_id
                || visible.contains(id)
        })
        .filter(|id| Some(**id) != exclude_user_id)
        .copied()
        .collect()
}

/// Drops recipients who opted out. Users without stored preferences get the defaults.
pub fn apply_preferences(
    recipients: Vec<Uuid>,
    stored: &HashMap<Uuid, NotificationPreferences>,
    notification_type: NotificationType,
) -> Vec<Uuid> {
    recipients
        .into_iter()
        .filter(|id| match stored.get(id) {
            Some(prefs) => prefs.permits(notification_type),
            None => NotificationPreferences::defaults_for(*id).permits(notification_type),
        })
        .collect()
}

pub fn build_notifications(
    recipients: &[Uuid],
    content: &NotificationContent,
) -> Vec<NewNotification> {
    recipients
        .iter()
        .map(|user_id| NewNotification {
            user_id: *user_id,
            notification_type: content.notification_type,
            title: content.title.clone(),
            body: content.body.clone(),
            link: content.link.clone(),
            data: content.data.clone(),
        })
        .collect()
}

/// Writes notifications on behalf of other users. Holds the only copy of the service role
/// outside the reminder scheduler and is reachable only from domain actions.
#[derive(Clone)]
pub struct NotificationFanout {
    role: ServiceRole,
    push: PushClient,
}

impl NotificationFanout {
    pub(crate) fn new(role: ServiceRole, push: PushClient) -> Self {
        Self { role, push }
    }

    pub async fn notify_band_members(
        &self,
        request: FanoutRequest,
    ) -> Result<Vec<Notification>, AppError> {
        let member_ids = band::member_ids(self.role.pool(), request.band_id).await?;
        if member_ids.is_empty() {
            return Ok(Vec::new());
        }

        let recipients = select_recipients(
            &member_ids,
            request.visibility,
            &request.visible_user_ids,
            request.creator_id,
            request.exclude_user_id,
        );

        self.notify_users(recipients, &request.content).await
    }

    /// Preference-filters `recipients`, stores one notification each and pushes them.
    pub async fn notify_users(
        &self,
        recipients: Vec<Uuid>,
        content: &NotificationContent,
    ) -> Result<Vec<Notification>, AppError> {
        if recipients.is_empty() {
            return Ok(Vec::new());
        }

        let stored: HashMap<Uuid, NotificationPreferences> =
            preferences::find_many(&self.role, &recipients)
                .await?
                .into_iter()
                .map(|p| (p.user_id, p))
                .collect();
        let recipients = apply_preferences(recipients, &stored, content.notification_type);
        if recipients.is_empty() {
            return Ok(Vec::new());
        }

        let created =
            notification::insert_many(&self.role, &build_notifications(&recipients, content))
                .await?;
        log::info!(
            "Created {} {} notifications",
            created.len(),
            content.notification_type
        );

        let push_users: HashSet<Uuid> = stored
            .values()
            .filter(|p| p.push_enabled)
            .map(|p| p.user_id)
            .collect();
        self.push_all(&created, &push_users).await;

        Ok(created)
    }

    /// Best-effort push. Gone subscriptions are pruned; other failures are logged.
    async fn push_all(&self, notifications: &[Notification], push_users: &HashSet<Uuid>) {
        if !self.push.is_enabled() || push_users.is_empty() {
            return;
        }

        let user_ids: Vec<Uuid> = push_users.iter().copied().collect();
        let subscriptions = match push_subscription::for_users(&self.role, &user_ids).await {
            Ok(subscriptions) => subscriptions,
            Err(e) => {
                log::warn!("Failed to load push subscriptions: {}", e);
                return;
            }
        };

        for notification in notifications
            .iter()
            .filter(|n| push_users.contains(&n.user_id))
        {
            let message = self.push.message_for(notification);
            for subscription in subscriptions
                .iter()
                .filter(|s| s.user_id == notification.user_id)
            {
                match self.push.send(subscription, &message).await {
                    Ok(()) => {}
                    Err(PushError::Gone) => {
                        log::info!("Pruning expired push subscription {}", subscription.id);
                        if let Err(e) =
                            push_subscription::delete_by_id(&self.role, subscription.id).await
                        {
                            log::warn!(
                                "Failed to prune push subscription {}: {}",
                                subscription.id,
                                e
                            );
                        }
                    }
                    Err(e) => {
                        log::warn!(
                            "Push delivery of notification {} failed: {}",
                            notification.id,
                            e
                        );
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::event::fixtures::{event, poll_event};
    use pretty_assertions::assert_eq;

    #[test]
    fn private_fanout_skips_the_actor_and_unlisted_members() {
        let (u1, u2, u3) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        let recipients = select_recipients(
            &[u1, u2, u3],
            EventVisibility::Private,
            &[u1],
            Some(u1),
            Some(u1),
        );

        assert!(recipients.is_empty());
    }

    #[test]
    fn band_fanout_reaches_everyone_but_the_actor() {
        let (u1, u2, u3) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        let recipients =
            select_recipients(&[u1, u2, u3], EventVisibility::Band, &[], Some(u1), Some(u2));

        assert_eq!(recipients, vec![u1, u3]);
    }

    #[test]
    fn private_fanout_reaches_listed_members_only() {
        let (u1, u2, u3) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let outsider = Uuid::new_v4();

        let recipients = select_recipients(
            &[u1, u2, u3],
            EventVisibility::Private,
            &[u3, outsider],
            Some(u1),
            Some(u1),
        );

        assert_eq!(recipients, vec![u3]);
    }

    #[test]
    fn private_fanout_includes_unlisted_creator_when_someone_else_acts() {
        let (creator, admin, listed, other) =
            (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        let recipients = select_recipients(
            &[creator, admin, listed, other],
            EventVisibility::Private,
            &[listed],
            Some(creator),
            Some(admin),
        );

        assert_eq!(recipients, vec![creator, listed]);
    }

    #[test]
    fn preferences_filter_by_type_and_default_to_send() {
        let (muted, defaulted) = (Uuid::new_v4(), Uuid::new_v4());
        let mut stored = HashMap::new();
        stored.insert(
            muted,
            NotificationPreferences {
                event_created: false,
                ..NotificationPreferences::defaults_for(muted)
            },
        );

        let created =
            apply_preferences(vec![muted, defaulted], &stored, NotificationType::EventCreated);
        assert_eq!(created, vec![defaulted]);

        let resolved =
            apply_preferences(vec![muted, defaulted], &stored, NotificationType::PollResolved);
        assert_eq!(resolved, vec![muted, defaulted]);
    }

    #[test]
    fn event_content_links_to_the_event() {
        let event = event(EventMode::Fixed);
        let content = NotificationContent::for_event(&event, NotificationType::EventCancelled);

        assert_eq!(content.title, "Cancelled: Summer show");
        assert_eq!(
            content.link,
            Some(format!("/bands/{}/events/{}", event.band_id, event.id))
        );
        assert_eq!(content.data.unwrap()["eventId"], event.id.to_string());

        let poll = poll_event();
        let created = NotificationContent::for_event(&poll, NotificationType::EventCreated);
        assert_eq!(created.title, "New show: Summer show");
    }

    #[test]
    fn builds_one_row_per_recipient() {
        let content = NotificationContent::for_event(
            &event(EventMode::Fixed),
            NotificationType::EventUpdated,
        );
        let recipients = [Uuid::new_v4(), Uuid::new_v4()];

        let rows = build_notifications(&recipients, &content);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].user_id, recipients[1]);
        assert_eq!(rows[0].notification_type, NotificationType::EventUpdated);
    }
}
