use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{
    ServiceRole,
    models::{NewNotification, Notification},
    utils::sql,
};

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, type, title, body, link, data, read_at, created_at";

/// The caller's own inbox. Every query is scoped by `user_id`.
#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let notifications = sqlx::query_as::<_, Notification>(&format!(
            r#"
            SELECT {}
            FROM notifications
            WHERE user_id = $1
              AND (NOT $2 OR read_at IS NULL)
            ORDER BY created_at DESC
            LIMIT $3
            "#,
            NOTIFICATION_COLUMNS
        ))
        .bind(user_id)
        .bind(unread_only)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64, sqlx::Error> {
        let count = sqlx::query_scalar::<_, i64>(&sql(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ? AND read_at IS NULL",
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    pub async fn mark_read(
        &self,
        user_id: Uuid,
        notification_id: Uuid,
    ) -> Result<Option<Notification>, sqlx::Error> {
        let notification = sqlx::query_as::<_, Notification>(&format!(
            r#"
            UPDATE notifications
            SET read_at = COALESCE(read_at, NOW())
            WHERE id = $1 AND user_id = $2
            RETURNING {}
            "#,
            NOTIFICATION_COLUMNS
        ))
        .bind(notification_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(notification)
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(&sql(
            "UPDATE notifications SET read_at = NOW() WHERE user_id = ? AND read_at IS NULL",
        ))
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete(&self, user_id: Uuid, notification_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(&sql(
            "DELETE FROM notifications WHERE id = ? AND user_id = ?",
        ))
        .bind(notification_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Batch insert on behalf of other users. Only reachable with the service role.
pub async fn insert_many(
    role: &ServiceRole,
    notifications: &[NewNotification],
) -> Result<Vec<Notification>, sqlx::Error> {
    if notifications.is_empty() {
        return Ok(Vec::new());
    }

    let user_ids: Vec<Uuid> = notifications.iter().map(|n| n.user_id).collect();
    let types: Vec<&str> = notifications
        .iter()
        .map(|n| n.notification_type.as_str())
        .collect();
    let titles: Vec<&str> = notifications.iter().map(|n| n.title.as_str()).collect();
    let bodies: Vec<Option<&str>> = notifications.iter().map(|n| n.body.as_deref()).collect();
    let links: Vec<Option<&str>> = notifications.iter().map(|n| n.link.as_deref()).collect();
    let data: Vec<Option<serde_json::Value>> =
        notifications.iter().map(|n| n.data.clone()).collect();

    let inserted = sqlx::query_as::<_, Notification>(&format!(
        r#"
        INSERT INTO
            notifications (user_id, type, title, body, link, data)
        SELECT *
        FROM UNNEST($1::uuid[], $2::varchar[], $3::varchar[], $4::text[], $5::text[], $6::jsonb[])
        RETURNING {}
        "#,
        NOTIFICATION_COLUMNS
    ))
    .bind(user_ids)
    .bind(types)
    .bind(titles)
    .bind(bodies)
    .bind(links)
    .bind(data)
    .fetch_all(role.pool())
    .await?;

    Ok(inserted)
}
