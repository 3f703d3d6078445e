use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
    #[serde(rename_all = "snake_case")]
    pub enum NotificationType {
        EventCreated => "event_created",
        EventUpdated => "event_updated",
        EventCancelled => "event_cancelled",
        PollResolved => "poll_resolved",
        RsvpReminder => "rsvp_reminder",
        PollReminder => "poll_reminder",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub body: Option<String>,
    pub link: Option<String>,
    pub data: Option<serde_json::Value>,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Row to insert for one recipient.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub notification_type: NotificationType,
    pub title: String,
    pub body: Option<String>,
    pub link: Option<String>,
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreferences {
    pub user_id: Uuid,
    pub event_created: bool,
    pub event_updated: bool,
    pub rsvp_reminder: bool,
    pub poll_reminder: bool,
    pub push_enabled: bool,
}

impl NotificationPreferences {
    /// Everything on except push, which needs an explicit subscription.
    pub fn defaults_for(user_id: Uuid) -> Self {
        Self {
            user_id,
            event_created: true,
            event_updated: true,
            rsvp_reminder: true,
            poll_reminder: true,
            push_enabled: false,
        }
    }

    pub fn permits(&self, notification_type: NotificationType) -> bool {
        match notification_type {
            NotificationType::EventCreated => self.event_created,
            NotificationType::EventUpdated | NotificationType::EventCancelled => self.event_updated,
            NotificationType::RsvpReminder => self.rsvp_reminder,
            NotificationType::PollReminder => self.poll_reminder,
            NotificationType::PollResolved => true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePreferencesInput {
    pub event_created: Option<bool>,
    pub event_updated: Option<bool>,
    pub rsvp_reminder: Option<bool>,
    pub poll_reminder: Option<bool>,
    pub push_enabled: Option<bool>,
}
