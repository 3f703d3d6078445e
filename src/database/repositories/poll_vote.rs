use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{
    models::{PollVote, VoteResponse, VoteWithVoter},
    utils::sql,
};

#[derive(Clone)]
pub struct PollVoteRepository {
    pool: PgPool,
}

impl PollVoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Last write wins on `(event_id, user_id, slot_key)`.
    pub async fn upsert(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        slot_key: &str,
        response: VoteResponse,
    ) -> Result<PollVote, sqlx::Error> {
        let vote = sqlx::query_as::<_, PollVote>(&sql(r#"
            INSERT INTO
                poll_votes (event_id, user_id, slot_key, response)
            VALUES
                (?, ?, ?, ?)
            ON CONFLICT (event_id, user_id, slot_key) DO UPDATE
            SET
                response = EXCLUDED.response,
                updated_at = NOW()
            RETURNING
                id,
                event_id,
                user_id,
                slot_key,
                response,
                created_at,
                updated_at
        "#))
        .bind(event_id)
        .bind(user_id)
        .bind(slot_key)
        .bind(response)
        .fetch_one(&self.pool)
        .await?;

        Ok(vote)
    }

    /// All votes of an event in recording order, joined with voter profiles.
    pub async fn votes_with_voters(&self, event_id: Uuid) -> Result<Vec<VoteWithVoter>, sqlx::Error> {
        let votes = sqlx::query_as::<_, VoteWithVoter>(&sql(r#"
            SELECT
                v.user_id,
                v.slot_key,
                v.response,
                u.display_name,
                u.avatar_url
            FROM
                poll_votes v
            JOIN
                users u ON u.id = v.user_id
            WHERE
                v.event_id = ?
            ORDER BY
                v.created_at ASC,
                v.id ASC
        "#))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(votes)
    }

    pub async fn votes_for_user(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<PollVote>, sqlx::Error> {
        let votes = sqlx::query_as::<_, PollVote>(&sql(r#"
            SELECT
                id,
                event_id,
                user_id,
                slot_key,
                response,
                created_at,
                updated_at
            FROM
                poll_votes
            WHERE
                event_id = ?
                AND user_id = ?
            ORDER BY
                created_at ASC
        "#))
        .bind(event_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(votes)
    }
}

pub async fn voter_ids(pool: &PgPool, event_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
    let ids = sqlx::query_scalar::<_, Uuid>(&sql(
        "SELECT DISTINCT user_id FROM poll_votes WHERE event_id = ?",
    ))
    .bind(event_id)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}
