use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{
    ServiceRole,
    models::{NotificationPreferences, UpdatePreferencesInput},
    utils::sql,
};

#[derive(Clone)]
pub struct PreferencesRepository {
    pool: PgPool,
}

impl PreferencesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Reads the row, creating the defaults on first access.
    pub async fn get_or_create(&self, user_id: Uuid) -> Result<NotificationPreferences, sqlx::Error> {
        sqlx::query(&sql(r#"
            INSERT INTO
                notification_preferences (user_id)
            VALUES
                (?)
            ON CONFLICT (user_id) DO NOTHING
        "#))
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        let preferences = sqlx::query_as::<_, NotificationPreferences>(&sql(r#"
            SELECT
                user_id,
                event_created,
                event_updated,
                rsvp_reminder,
                poll_reminder,
                push_enabled
            FROM
                notification_preferences
            WHERE
                user_id = ?
        "#))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(preferences)
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        input: &UpdatePreferencesInput,
    ) -> Result<NotificationPreferences, sqlx::Error> {
        let preferences = sqlx::query_as::<_, NotificationPreferences>(&sql(r#"
            INSERT INTO
                notification_preferences (
                    user_id,
                    event_created,
                    event_updated,
                    rsvp_reminder,
                    poll_reminder,
                    push_enabled
                )
            VALUES
                (?, COALESCE(?, TRUE), COALESCE(?, TRUE), COALESCE(?, TRUE), COALESCE(?, TRUE), COALESCE(?, FALSE))
            ON CONFLICT (user_id) DO UPDATE
            SET
                event_created = COALESCE(?, notification_preferences.event_created),
                event_updated = COALESCE(?, notification_preferences.event_updated),
                rsvp_reminder = COALESCE(?, notification_preferences.rsvp_reminder),
                poll_reminder = COALESCE(?, notification_preferences.poll_reminder),
                push_enabled = COALESCE(?, notification_preferences.push_enabled),
                updated_at = NOW()
            RETURNING
                user_id,
                event_created,
                event_updated,
                rsvp_reminder,
                poll_reminder,
                push_enabled
        "#))
        .bind(user_id)
        .bind(input.event_created)
        .bind(input.event_updated)
        .bind(input.rsvp_reminder)
        .bind(input.poll_reminder)
        .bind(input.push_enabled)
        .bind(input.event_created)
        .bind(input.event_updated)
        .bind(input.rsvp_reminder)
        .bind(input.poll_reminder)
        .bind(input.push_enabled)
        .fetch_one(&self.pool)
        .await?;

        Ok(preferences)
    }
}

/// Stored preference rows for `user_ids`. Users without a row are simply absent.
pub async fn find_many(
    role: &ServiceRole,
    user_ids: &[Uuid],
) -> Result<Vec<NotificationPreferences>, sqlx::Error> {
    let preferences = sqlx::query_as::<_, NotificationPreferences>(&sql(r#"
        SELECT
            user_id,
            event_created,
            event_updated,
            rsvp_reminder,
            poll_reminder,
            push_enabled
        FROM
            notification_preferences
        WHERE
            user_id = ANY(?)
    "#))
    .bind(user_ids)
    .fetch_all(role.pool())
    .await?;

    Ok(preferences)
}
