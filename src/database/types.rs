use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::types::Json;
use uuid::Uuid;

use super::models::{
    Event, EventMode, EventModeKind, EventStatus, EventType, EventVisibility, PollOption,
    PollSchedule,
};

/// Flat `events` row. Mode-specific columns are folded into [`EventMode`] on conversion.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventRow {
    pub id: Uuid,
    pub band_id: Uuid,
    pub title: String,
    pub event_type: EventType,
    pub mode: EventModeKind,
    pub status: EventStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub metadata: Json<Map<String, Value>>,
    pub created_by: Uuid,
    pub visibility: EventVisibility,
    pub poll_options: Option<Json<Vec<PollOption>>>,
    pub poll_closes_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_slot_key: Option<String>,
    pub require_rsvp: bool,
    pub rsvp_deadline: Option<DateTime<Utc>>,
    pub reminder_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const EVENT_COLUMNS: &str = "id, band_id, title, event_type, mode, status, start_time, \
    end_time, location, description, metadata, created_by, visibility, poll_options, \
    poll_closes_at, resolved_at, resolved_slot_key, require_rsvp, rsvp_deadline, \
    reminder_sent_at, created_at, updated_at";

impl TryFrom<EventRow> for Event {
    type Error = sqlx::Error;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let mode = match row.mode {
            EventModeKind::Fixed => {
                if row.poll_options.is_some() || row.resolved_slot_key.is_some() {
                    return Err(corrupt(row.id, "fixed event carries poll columns"));
                }
                EventMode::Fixed
            }
            EventModeKind::Poll => {
                let Some(Json(poll_options)) = row.poll_options else {
                    return Err(corrupt(row.id, "poll event without options"));
                };
                EventMode::Poll(PollSchedule {
                    poll_options,
                    poll_closes_at: row.poll_closes_at,
                    resolved_at: row.resolved_at,
                    resolved_slot_key: row.resolved_slot_key,
                })
            }
        };

        Ok(Event {
            id: row.id,
            band_id: row.band_id,
            title: row.title,
            event_type: row.event_type,
            status: row.status,
            start_time: row.start_time,
            end_time: row.end_time,
            location: row.location,
            description: row.description,
            metadata: row.metadata.0,
            created_by: row.created_by,
            visibility: row.visibility,
            require_rsvp: row.require_rsvp,
            rsvp_deadline: row.rsvp_deadline,
            reminder_sent_at: row.reminder_sent_at,
            mode,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn corrupt(event_id: Uuid, reason: &str) -> sqlx::Error {
    sqlx::Error::Decode(format!("event {}: {}", event_id, reason).into())
}

pub fn into_events(rows: Vec<EventRow>) -> Result<Vec<Event>, sqlx::Error> {
    rows.into_iter().map(Event::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::event::fixtures::poll_options;

    fn row(mode: EventModeKind) -> EventRow {
        let now = Utc::now();
        EventRow {
            id: Uuid::new_v4(),
            band_id: Uuid::new_v4(),
            title: "Rehearsal".to_string(),
            event_type: EventType::Rehearsal,
            mode,
            status: EventStatus::Open,
            start_time: None,
            end_time: None,
            location: None,
            description: None,
            metadata: Json(Map::new()),
            created_by: Uuid::new_v4(),
            visibility: EventVisibility::Band,
            poll_options: None,
            poll_closes_at: None,
            resolved_at: None,
            resolved_slot_key: None,
            require_rsvp: false,
            rsvp_deadline: None,
            reminder_sent_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn poll_row_folds_columns_into_the_mode() {
        let mut poll = row(EventModeKind::Poll);
        poll.poll_options = Some(Json(poll_options()));
        poll.resolved_slot_key = Some("slot1".to_string());
        poll.resolved_at = Some(Utc::now());

        let event = Event::try_from(poll).unwrap();
        let schedule = event.poll().unwrap();
        assert_eq!(schedule.poll_options.len(), 2);
        assert!(schedule.is_resolved());
    }

    #[test]
    fn rejects_rows_that_break_the_mode_shape() {
        let mut fixed = row(EventModeKind::Fixed);
        fixed.poll_options = Some(Json(poll_options()));
        assert!(Event::try_from(fixed).is_err());

        assert!(Event::try_from(row(EventModeKind::Poll)).is_err());
    }
}
