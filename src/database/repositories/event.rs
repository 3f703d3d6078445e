use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::database::{
    models::{Event, EventMode, EventModeKind, EventStatus, NewEvent},
    types::{EVENT_COLUMNS, EventRow, into_events},
    utils::sql,
};

#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, event_id: Uuid) -> Result<Option<Event>, sqlx::Error> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {} FROM events WHERE id = $1",
            EVENT_COLUMNS
        ))
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Event::try_from).transpose()
    }

    /// Events of one band, optionally filtered, soonest first with unscheduled events last.
    pub async fn find_by_band(
        &self,
        band_id: Uuid,
        status: Option<EventStatus>,
        mode: Option<EventModeKind>,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<Event>, sqlx::Error> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            SELECT {}
            FROM events
            WHERE band_id = $1
              AND ($2::varchar IS NULL OR status = $2)
              AND ($3::varchar IS NULL OR mode = $3)
              AND ($4::timestamptz IS NULL OR start_time >= $4)
              AND ($5::timestamptz IS NULL OR start_time <= $5)
            ORDER BY start_time ASC NULLS LAST, created_at ASC
            "#,
            EVENT_COLUMNS
        ))
        .bind(band_id)
        .bind(status)
        .bind(mode)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        into_events(rows)
    }

    /// Open events starting at or after `now` across the given bands.
    pub async fn find_upcoming(
        &self,
        band_ids: &[Uuid],
        now: DateTime<Utc>,
    ) -> Result<Vec<Event>, sqlx::Error> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            SELECT {}
            FROM events
            WHERE band_id = ANY($1)
              AND status = 'open'
              AND start_time >= $2
            ORDER BY start_time ASC
            "#,
            EVENT_COLUMNS
        ))
        .bind(band_ids)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        into_events(rows)
    }

    /// Writes every mutable column of `event` back. Mode and ownership are never touched.
    pub async fn update(&self, event: &Event) -> Result<Event, sqlx::Error> {
        let (poll_options, poll_closes_at) = match &event.mode {
            EventMode::Poll(poll) => (Some(Json(&poll.poll_options)), poll.poll_closes_at),
            EventMode::Fixed => (None, None),
        };

        let row = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            UPDATE events
            SET
                title = $2,
                event_type = $3,
                start_time = $4,
                end_time = $5,
                location = $6,
                description = $7,
                metadata = $8,
                visibility = $9,
                require_rsvp = $10,
                rsvp_deadline = $11,
                poll_options = $12,
                poll_closes_at = $13,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            EVENT_COLUMNS
        ))
        .bind(event.id)
        .bind(&event.title)
        .bind(event.event_type)
        .bind(event.start_time)
        .bind(event.end_time)
        .bind(&event.location)
        .bind(&event.description)
        .bind(Json(&event.metadata))
        .bind(event.visibility)
        .bind(event.require_rsvp)
        .bind(event.rsvp_deadline)
        .bind(poll_options)
        .bind(poll_closes_at)
        .fetch_one(&self.pool)
        .await?;

        Event::try_from(row)
    }

    /// Moves the event to `to` only if it is still in `from`. `None` means another writer got
    /// there first.
    pub async fn transition_status(
        &self,
        event_id: Uuid,
        from: EventStatus,
        to: EventStatus,
    ) -> Result<Option<Event>, sqlx::Error> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            UPDATE events
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            EVENT_COLUMNS
        ))
        .bind(event_id)
        .bind(from)
        .bind(to)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Event::try_from).transpose()
    }

    /// Stores a resolution computed from a snapshot whose `resolved_at` was
    /// `previous_resolved_at`. Returns `None` when the row changed underneath.
    pub async fn save_resolution(
        &self,
        event: &Event,
        previous_resolved_at: Option<DateTime<Utc>>,
    ) -> Result<Option<Event>, sqlx::Error> {
        let Some(poll) = event.poll() else {
            return Ok(None);
        };

        let row = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            UPDATE events
            SET
                start_time = $2,
                end_time = $3,
                status = $4,
                resolved_at = $5,
                resolved_slot_key = $6,
                updated_at = NOW()
            WHERE id = $1
              AND mode = 'poll'
              AND status <> 'cancelled'
              AND resolved_at IS NOT DISTINCT FROM $7
            RETURNING {}
            "#,
            EVENT_COLUMNS
        ))
        .bind(event.id)
        .bind(event.start_time)
        .bind(event.end_time)
        .bind(event.status)
        .bind(poll.resolved_at)
        .bind(&poll.resolved_slot_key)
        .bind(previous_resolved_at)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Event::try_from).transpose()
    }

    /// Dependent votes, RSVPs, visibility rows and event messages go with it.
    pub async fn delete(&self, event_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(&sql("DELETE FROM events WHERE id = ?"))
            .bind(event_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

pub async fn insert(
    tx: &mut Transaction<'_, Postgres>,
    event: &NewEvent,
) -> Result<Event, sqlx::Error> {
    let (poll_options, poll_closes_at) = match &event.mode {
        EventMode::Poll(poll) => (Some(Json(&poll.poll_options)), poll.poll_closes_at),
        EventMode::Fixed => (None, None),
    };
    let mode = match event.mode {
        EventMode::Fixed => EventModeKind::Fixed,
        EventMode::Poll(_) => EventModeKind::Poll,
    };

    let row = sqlx::query_as::<_, EventRow>(&format!(
        r#"
        INSERT INTO
            events (
                band_id,
                title,
                event_type,
                mode,
                status,
                start_time,
                end_time,
                location,
                description,
                metadata,
                created_by,
                visibility,
                poll_options,
                poll_closes_at,
                require_rsvp,
                rsvp_deadline
            )
        VALUES
            ($1, $2, $3, $4, 'open', $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        RETURNING {}
        "#,
        EVENT_COLUMNS
    ))
    .bind(event.band_id)
    .bind(&event.title)
    .bind(event.event_type)
    .bind(mode)
    .bind(event.start_time)
    .bind(event.end_time)
    .bind(&event.location)
    .bind(&event.description)
    .bind(Json(&event.metadata))
    .bind(event.created_by)
    .bind(event.visibility)
    .bind(poll_options)
    .bind(poll_closes_at)
    .bind(event.require_rsvp)
    .bind(event.rsvp_deadline)
    .fetch_one(&mut **tx)
    .await?;

    Event::try_from(row)
}

/// Open, unreminded events with a deadline in `(now, until]`.
pub async fn reminder_candidates(
    pool: &PgPool,
    now: DateTime<Utc>,
    until: DateTime<Utc>,
) -> Result<Vec<Event>, sqlx::Error> {
    let rows = sqlx::query_as::<_, EventRow>(&format!(
        r#"
        SELECT {}
        FROM events
        WHERE status = 'open'
          AND reminder_sent_at IS NULL
          AND (
            (mode = 'poll' AND resolved_slot_key IS NULL
                AND poll_closes_at > $1 AND poll_closes_at <= $2)
            OR (require_rsvp AND (mode = 'fixed' OR resolved_slot_key IS NOT NULL)
                AND rsvp_deadline > $1 AND rsvp_deadline <= $2)
          )
        ORDER BY created_at ASC
        "#,
        EVENT_COLUMNS
    ))
    .bind(now)
    .bind(until)
    .fetch_all(pool)
    .await?;

    into_events(rows)
}

pub async fn mark_reminder_sent(
    pool: &PgPool,
    event_id: Uuid,
    at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(&sql(
        "UPDATE events SET reminder_sent_at = ? WHERE id = ? AND reminder_sent_at IS NULL",
    ))
    .bind(at)
    .bind(event_id)
    .execute(pool)
    .await?;

    Ok(())
}
