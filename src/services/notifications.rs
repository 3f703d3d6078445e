use uuid::Uuid;

use crate::database::{
    models::{
        Notification, NotificationPreferences, NotificationQuery, PushSubscription,
        SubscribePushInput, UpdatePreferencesInput,
    },
    repositories::{NotificationRepository, PreferencesRepository, PushSubscriptionRepository},
};
use crate::error::AppError;

pub const DEFAULT_NOTIFICATION_LIMIT: i64 = 50;
pub const MAX_NOTIFICATION_LIMIT: i64 = 200;

/// The caller's own inbox, preferences and push subscriptions. Never writes for anyone else.
#[derive(Clone)]
pub struct NotificationService {
    notifications: NotificationRepository,
    preferences: PreferencesRepository,
    subscriptions: PushSubscriptionRepository,
}

impl NotificationService {
    pub fn new(
        notifications: NotificationRepository,
        preferences: PreferencesRepository,
        subscriptions: PushSubscriptionRepository,
    ) -> Self {
        Self {
            notifications,
            preferences,
            subscriptions,
        }
    }

    pub async fn list_notifications(
        &self,
        user_id: Uuid,
        query: NotificationQuery,
    ) -> Result<Vec<Notification>, AppError> {
        let limit = query.limit.unwrap_or(DEFAULT_NOTIFICATION_LIMIT);
        if !(1..=MAX_NOTIFICATION_LIMIT).contains(&limit) {
            return Err(AppError::validation(format!(
                "limit must be between 1 and {}",
                MAX_NOTIFICATION_LIMIT
            )));
        }

        Ok(self
            .notifications
            .list_for_user(user_id, query.unread_only, limit)
            .await?)
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64, AppError> {
        Ok(self.notifications.unread_count(user_id).await?)
    }

    pub async fn mark_read(
        &self,
        user_id: Uuid,
        notification_id: Uuid,
    ) -> Result<Notification, AppError> {
        self.notifications
            .mark_read(user_id, notification_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, AppError> {
        Ok(self.notifications.mark_all_read(user_id).await?)
    }

    pub async fn delete(&self, user_id: Uuid, notification_id: Uuid) -> Result<(), AppError> {
        if !self.notifications.delete(user_id, notification_id).await? {
            return Err(AppError::NotFound("Notification not found".to_string()));
        }
        Ok(())
    }

    pub async fn get_preferences(&self, user_id: Uuid) -> Result<NotificationPreferences, AppError> {
        Ok(self.preferences.get_or_create(user_id).await?)
    }

    pub async fn update_preferences(
        &self,
        user_id: Uuid,
        input: UpdatePreferencesInput,
    ) -> Result<NotificationPreferences, AppError> {
        Ok(self.preferences.update(user_id, &input).await?)
    }

    pub async fn subscribe_push(
        &self,
        user_id: Uuid,
        input: SubscribePushInput,
    ) -> Result<PushSubscription, AppError> {
        let endpoint = input.endpoint.trim();
        if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
            return Err(AppError::validation("endpoint must be an http(s) URL"));
        }
        if input.keys.p256dh.trim().is_empty() || input.keys.auth.trim().is_empty() {
            return Err(AppError::validation("keys.p256dh and keys.auth are required"));
        }

        let subscription = self
            .subscriptions
            .upsert(user_id, endpoint, &input.keys.p256dh, &input.keys.auth)
            .await?;
        log::info!("User {} subscribed to push", user_id);

        Ok(subscription)
    }

    pub async fn unsubscribe_push(&self, user_id: Uuid, endpoint: &str) -> Result<(), AppError> {
        if !self.subscriptions.delete(user_id, endpoint.trim()).await? {
            return Err(AppError::NotFound("Push subscription not found".to_string()));
        }
        Ok(())
    }
}
