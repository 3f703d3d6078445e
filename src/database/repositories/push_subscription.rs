use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{ServiceRole, models::PushSubscription, utils::sql};

#[derive(Clone)]
pub struct PushSubscriptionRepository {
    pool: PgPool,
}

impl PushSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Subscribes and turns push on in the caller's preferences, atomically.
    pub async fn upsert(
        &self,
        user_id: Uuid,
        endpoint: &str,
        p256dh: &str,
        auth: &str,
    ) -> Result<PushSubscription, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let subscription = sqlx::query_as::<_, PushSubscription>(&sql(r#"
            INSERT INTO
                push_subscriptions (user_id, endpoint, p256dh, auth)
            VALUES
                (?, ?, ?, ?)
            ON CONFLICT (endpoint) DO UPDATE
            SET
                user_id = EXCLUDED.user_id,
                p256dh = EXCLUDED.p256dh,
                auth = EXCLUDED.auth
            RETURNING
                id,
                user_id,
                endpoint,
                p256dh,
                auth,
                created_at
        "#))
        .bind(user_id)
        .bind(endpoint)
        .bind(p256dh)
        .bind(auth)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(&sql(r#"
            INSERT INTO
                notification_preferences (user_id, push_enabled)
            VALUES
                (?, TRUE)
            ON CONFLICT (user_id) DO UPDATE
            SET
                push_enabled = TRUE,
                updated_at = NOW()
        "#))
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(subscription)
    }

    pub async fn delete(&self, user_id: Uuid, endpoint: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(&sql(
            "DELETE FROM push_subscriptions WHERE user_id = ? AND endpoint = ?",
        ))
        .bind(user_id)
        .bind(endpoint)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

pub async fn for_users(
    role: &ServiceRole,
    user_ids: &[Uuid],
) -> Result<Vec<PushSubscription>, sqlx::Error> {
    let subscriptions = sqlx::query_as::<_, PushSubscription>(&sql(r#"
        SELECT
            id,
            user_id,
            endpoint,
            p256dh,
            auth,
            created_at
        FROM
            push_subscriptions
        WHERE
            user_id = ANY(?)
    "#))
    .bind(user_ids)
    .fetch_all(role.pool())
    .await?;

    Ok(subscriptions)
}

/// Drops a subscription the push provider reported as gone.
pub async fn delete_by_id(role: &ServiceRole, subscription_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query(&sql("DELETE FROM push_subscriptions WHERE id = ?"))
        .bind(subscription_id)
        .execute(role.pool())
        .await?;

    Ok(())
}
