use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{
    models::{EventRsvp, EventRsvpWithUser, RsvpStatus},
    utils::sql,
};

#[derive(Clone)]
pub struct RsvpRepository {
    pool: PgPool,
}

impl RsvpRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn upsert(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        status: RsvpStatus,
        note: Option<&str>,
    ) -> Result<EventRsvp, sqlx::Error> {
        let rsvp = sqlx::query_as::<_, EventRsvp>(&sql(r#"
            INSERT INTO
                event_rsvps (event_id, user_id, status, note)
            VALUES
                (?, ?, ?, ?)
            ON CONFLICT (event_id, user_id) DO UPDATE
            SET
                status = EXCLUDED.status,
                note = EXCLUDED.note,
                updated_at = NOW()
            RETURNING
                id,
                event_id,
                user_id,
                status,
                note,
                created_at,
                updated_at
        "#))
        .bind(event_id)
        .bind(user_id)
        .bind(status)
        .bind(note)
        .fetch_one(&self.pool)
        .await?;

        Ok(rsvp)
    }

    pub async fn find(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<EventRsvp>, sqlx::Error> {
        let rsvp = sqlx::query_as::<_, EventRsvp>(&sql(r#"
            SELECT
                id,
                event_id,
                user_id,
                status,
                note,
                created_at,
                updated_at
            FROM
                event_rsvps
            WHERE
                event_id = ?
                AND user_id = ?
        "#))
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(rsvp)
    }

    pub async fn list_with_users(
        &self,
        event_id: Uuid,
    ) -> Result<Vec<EventRsvpWithUser>, sqlx::Error> {
        let rsvps = sqlx::query_as::<_, EventRsvpWithUser>(&sql(r#"
            SELECT
                r.user_id,
                r.status,
                r.note,
                u.display_name,
                u.avatar_url,
                r.updated_at
            FROM
                event_rsvps r
            JOIN
                users u ON u.id = r.user_id
            WHERE
                r.event_id = ?
            ORDER BY
                r.created_at ASC
        "#))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rsvps)
    }

    pub async fn delete(&self, event_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(&sql(
            "DELETE FROM event_rsvps WHERE event_id = ? AND user_id = ?",
        ))
        .bind(event_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

pub async fn responder_ids(pool: &PgPool, event_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
    let ids = sqlx::query_scalar::<_, Uuid>(&sql(
        "SELECT user_id FROM event_rsvps WHERE event_id = ?",
    ))
    .bind(event_id)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}
