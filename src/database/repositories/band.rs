use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{models::BandMember, utils::sql};

#[derive(Clone)]
pub struct BandRepository {
    pool: PgPool,
}

impl BandRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn band_exists(&self, band_id: Uuid) -> Result<bool, sqlx::Error> {
        let exists = sqlx::query_scalar::<_, bool>(&sql(
            "SELECT EXISTS (SELECT 1 FROM bands WHERE id = ?)",
        ))
        .bind(band_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    pub async fn find_membership(
        &self,
        band_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<BandMember>, sqlx::Error> {
        let member = sqlx::query_as::<_, BandMember>(&sql(r#"
            SELECT
                band_id,
                user_id,
                role,
                created_at
            FROM
                band_members
            WHERE
                band_id = ?
                AND user_id = ?
        "#))
        .bind(band_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    /// Of `user_ids`, the ones that belong to the band.
    pub async fn filter_members(
        &self,
        band_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<Vec<Uuid>, sqlx::Error> {
        let members = sqlx::query_scalar::<_, Uuid>(&sql(r#"
            SELECT
                user_id
            FROM
                band_members
            WHERE
                band_id = ?
                AND user_id = ANY(?)
        "#))
        .bind(band_id)
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    pub async fn band_ids_for_user(&self, user_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        let band_ids = sqlx::query_scalar::<_, Uuid>(&sql(
            "SELECT band_id FROM band_members WHERE user_id = ?",
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(band_ids)
    }
}

/// Member ids through an arbitrary pool, for the elevated callers.
pub async fn member_ids(pool: &PgPool, band_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
    let ids = sqlx::query_scalar::<_, Uuid>(&sql(r#"
        SELECT
            user_id
        FROM
            band_members
        WHERE
            band_id = ?
        ORDER BY
            created_at
    "#))
    .bind(band_id)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}
