use std::collections::HashMap;

use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::database::utils::sql;

#[derive(Clone)]
pub struct VisibilityRepository {
    pool: PgPool,
}

impl VisibilityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, event_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        visible_user_ids(&self.pool, event_id).await
    }

    /// Visibility sets keyed by event, for filtering a list of events in one query.
    pub async fn list_for_events(
        &self,
        event_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<Uuid>>, sqlx::Error> {
        if event_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, (Uuid, Uuid)>(&sql(r#"
            SELECT
                event_id,
                user_id
            FROM
                event_visibility
            WHERE
                event_id = ANY(?)
        "#))
        .bind(event_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut sets: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for (event_id, user_id) in rows {
            sets.entry(event_id).or_default().push(user_id);
        }

        Ok(sets)
    }

    pub async fn replace(&self, event_id: Uuid, user_ids: &[Uuid]) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(&sql("DELETE FROM event_visibility WHERE event_id = ?"))
            .bind(event_id)
            .execute(&mut *tx)
            .await?;
        insert(&mut tx, event_id, user_ids).await?;

        tx.commit().await
    }

    pub async fn add(&self, event_id: Uuid, user_ids: &[Uuid]) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        insert(&mut tx, event_id, user_ids).await?;
        tx.commit().await
    }

    pub async fn remove(&self, event_id: Uuid, user_ids: &[Uuid]) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(&sql(
            "DELETE FROM event_visibility WHERE event_id = ? AND user_id = ANY(?)",
        ))
        .bind(event_id)
        .bind(user_ids)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

/// Adds visibility rows; users already on the list are skipped.
pub async fn insert(
    tx: &mut Transaction<'_, Postgres>,
    event_id: Uuid,
    user_ids: &[Uuid],
) -> Result<(), sqlx::Error> {
    if user_ids.is_empty() {
        return Ok(());
    }

    sqlx::query(&sql(r#"
        INSERT INTO
            event_visibility (event_id, user_id)
        SELECT
            ?, user_id
        FROM
            UNNEST(?::uuid[]) AS t(user_id)
        ON CONFLICT (event_id, user_id) DO NOTHING
    "#))
    .bind(event_id)
    .bind(user_ids)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

pub async fn visible_user_ids(pool: &PgPool, event_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
    let ids = sqlx::query_scalar::<_, Uuid>(&sql(
        "SELECT user_id FROM event_visibility WHERE event_id = ? ORDER BY created_at",
    ))
    .bind(event_id)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}
