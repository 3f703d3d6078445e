use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::macros::string_enum;
use crate::error::AppError;

pub const TITLE_MAX_LEN: usize = 200;
pub const DESCRIPTION_MAX_LEN: usize = 5000;
pub const LOCATION_MAX_LEN: usize = 500;
pub const SLOT_KEY_MAX_LEN: usize = 200;

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
    #[serde(rename_all = "snake_case")]
    pub enum EventType {
        Show => "show",
        Rehearsal => "rehearsal",
        Meeting => "meeting",
        Recording => "recording",
        Photoshoot => "photoshoot",
        Deadline => "deadline",
        Other => "other",
    }
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
    #[serde(rename_all = "snake_case")]
    pub enum EventStatus {
        Open => "open",
        Closed => "closed",
        Cancelled => "cancelled",
    }
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
    #[serde(rename_all = "snake_case")]
    pub enum EventVisibility {
        Band => "band",
        Private => "private",
    }
}

string_enum! {
    /// Column discriminator for [`EventMode`].
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
    #[serde(rename_all = "snake_case")]
    pub enum EventModeKind {
        Fixed => "fixed",
        Poll => "poll",
    }
}

/// One candidate slot of a poll-mode event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PollOption {
    pub slot_key: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
}

impl PollOption {
    /// Start of the slot; a slot without a start time begins at midnight.
    pub fn starts_at(&self) -> Result<DateTime<Utc>, AppError> {
        let time = match &self.start_time {
            Some(value) => parse_clock(value)?,
            None => NaiveTime::from_hms_opt(0, 0, 0)
                .ok_or_else(|| AppError::internal_server_error_message("midnight"))?,
        };

        Ok(self.date.and_time(time).and_utc())
    }

    /// End of the slot. An end earlier than the start rolls over to the next day.
    pub fn ends_at(&self) -> Result<Option<DateTime<Utc>>, AppError> {
        let Some(value) = &self.end_time else {
            return Ok(None);
        };

        let start = self.starts_at()?;
        let end = self.date.and_time(parse_clock(value)?).and_utc();

        Ok(Some(if end < start {
            end + Duration::days(1)
        } else {
            end
        }))
    }
}

/// Parses `HH:MM` (seconds optional).
pub fn parse_clock(value: &str) -> Result<NaiveTime, AppError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| AppError::validation(format!("Invalid time '{}', expected HH:MM", value)))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PollSchedule {
    pub poll_options: Vec<PollOption>,
    pub poll_closes_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_slot_key: Option<String>,
}

impl PollSchedule {
    pub fn option(&self, slot_key: &str) -> Option<&PollOption> {
        self.poll_options.iter().find(|o| o.slot_key == slot_key)
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved_slot_key.is_some()
    }
}

/// Scheduling mode. Poll-only fields live inside the `Poll` variant so a fixed event cannot
/// carry poll options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum EventMode {
    Fixed,
    Poll(PollSchedule),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub band_id: Uuid,
    pub title: String,
    pub event_type: EventType,
    pub status: EventStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub metadata: Map<String, Value>,
    pub created_by: Uuid,
    pub visibility: EventVisibility,
    pub require_rsvp: bool,
    pub rsvp_deadline: Option<DateTime<Utc>>,
    pub reminder_sent_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub mode: EventMode,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn mode_kind(&self) -> EventModeKind {
        match self.mode {
            EventMode::Fixed => EventModeKind::Fixed,
            EventMode::Poll(_) => EventModeKind::Poll,
        }
    }

    pub fn poll(&self) -> Option<&PollSchedule> {
        match &self.mode {
            EventMode::Poll(poll) => Some(poll),
            EventMode::Fixed => None,
        }
    }

    pub fn is_private(&self) -> bool {
        self.visibility == EventVisibility::Private
    }

    /// Fixed events and resolved polls have an authoritative time and take RSVPs.
    pub fn has_fixed_time(&self) -> bool {
        match &self.mode {
            EventMode::Fixed => true,
            EventMode::Poll(poll) => poll.is_resolved(),
        }
    }

    /// `open -> cancelled`
    pub fn cancel(&mut self) -> Result<(), AppError> {
        self.transition(EventStatus::Cancelled)
    }

    /// `open -> closed`
    pub fn close(&mut self) -> Result<(), AppError> {
        self.transition(EventStatus::Closed)
    }

    fn transition(&mut self, to: EventStatus) -> Result<(), AppError> {
        if self.status != EventStatus::Open {
            return Err(AppError::InvalidState(format!(
                "Cannot move a {} event to {}",
                self.status, to
            )));
        }
        self.status = to;
        Ok(())
    }

    /// Turns the chosen poll slot into the event's authoritative time and reopens the event.
    ///
    /// Nothing is modified when the slot is rejected.
    pub fn resolve(&mut self, slot_key: &str, now: DateTime<Utc>) -> Result<(), AppError> {
        if self.status == EventStatus::Cancelled {
            return Err(AppError::InvalidState(
                "Cannot resolve a cancelled event".to_string(),
            ));
        }

        let EventMode::Poll(poll) = &mut self.mode else {
            return Err(AppError::NotAPoll);
        };

        let option = poll
            .option(slot_key)
            .ok_or_else(|| AppError::InvalidSlot(format!("Unknown slot '{}'", slot_key)))?;
        let start = option.starts_at()?;
        let end = option.ends_at()?;

        poll.resolved_at = Some(now);
        poll.resolved_slot_key = Some(slot_key.to_string());
        self.start_time = Some(start);
        self.end_time = end;
        self.status = EventStatus::Open;

        Ok(())
    }
}

/// Event with the private visibility list, as loaded for filtering. The list never leaves
/// the service layer.
#[derive(Debug, Clone)]
pub struct EventWithAudience {
    pub event: Event,
    pub visible_user_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventInput {
    pub band_id: Option<Uuid>,
    pub title: Option<String>,
    pub event_type: Option<String>,
    pub mode: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub metadata: Option<Map<String, Value>>,
    pub visibility: Option<String>,
    #[serde(default)]
    pub visible_user_ids: Vec<Uuid>,
    pub poll_options: Option<Vec<PollOption>>,
    pub poll_closes_at: Option<DateTime<Utc>>,
    pub require_rsvp: Option<bool>,
    pub rsvp_deadline: Option<DateTime<Utc>>,
}

/// A validated [`CreateEventInput`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub band_id: Uuid,
    pub title: String,
    pub event_type: EventType,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub metadata: Map<String, Value>,
    pub created_by: Uuid,
    pub visibility: EventVisibility,
    pub visible_user_ids: Vec<Uuid>,
    pub require_rsvp: bool,
    pub rsvp_deadline: Option<DateTime<Utc>>,
    pub mode: EventMode,
}

/// Partial update. For nullable columns `None` leaves the value untouched and
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventInput {
    pub title: Option<String>,
    pub event_type: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub start_time: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "nullable")]
    pub end_time: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "nullable")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    pub metadata: Option<Map<String, Value>>,
    pub visibility: Option<String>,
    pub require_rsvp: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub rsvp_deadline: Option<Option<DateTime<Utc>>>,
    pub poll_options: Option<Vec<PollOption>>,
    #[serde(default, deserialize_with = "nullable")]
    pub poll_closes_at: Option<Option<DateTime<Utc>>>,
}

fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvePollInput {
    pub slot_key: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventQuery {
    pub status: Option<String>,
    pub mode: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibleUsersInput {
    pub user_ids: Vec<Uuid>,
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn resolving_a_poll_takes_the_slot_time_and_stays_open() {
        let mut event = poll_event();
        let now = Utc.with_ymd_and_hms(2024, 5, 20, 9, 0, 0).unwrap();

        event.resolve("slot2", now).unwrap();

        assert_eq!(
            event.start_time,
            Some(Utc.with_ymd_and_hms(2024, 6, 2, 20, 0, 0).unwrap())
        );
        assert_eq!(
            event.end_time,
            Some(Utc.with_ymd_and_hms(2024, 6, 2, 23, 0, 0).unwrap())
        );
        assert_eq!(event.status, EventStatus::Open);
        let poll = event.poll().unwrap();
        assert_eq!(poll.resolved_slot_key.as_deref(), Some("slot2"));
        assert_eq!(poll.resolved_at, Some(now));
    }

    #[test]
    fn resolving_with_unknown_slot_changes_nothing() {
        let mut event = poll_event();
        let before = event.clone();

        let err = event.resolve("slot9", Utc::now()).unwrap_err();

        assert!(matches!(err, AppError::InvalidSlot(_)));
        assert_eq!(event, before);
    }

    #[test]
    fn resolving_a_fixed_event_is_rejected() {
        let mut event = event(EventMode::Fixed);
        assert!(matches!(
            event.resolve("slot1", Utc::now()),
            Err(AppError::NotAPoll)
        ));
    }

    #[test]
    fn resolving_reopens_a_closed_poll_but_not_a_cancelled_one() {
        let mut closed = poll_event();
        closed.close().unwrap();
        closed.resolve("slot1", Utc::now()).unwrap();
        assert_eq!(closed.status, EventStatus::Open);

        let mut cancelled = poll_event();
        cancelled.cancel().unwrap();
        assert!(matches!(
            cancelled.resolve("slot1", Utc::now()),
            Err(AppError::InvalidState(_))
        ));
    }

    #[test]
    fn cancel_and_close_only_leave_open() {
        let mut event = event(EventMode::Fixed);
        event.cancel().unwrap();
        assert_eq!(event.status, EventStatus::Cancelled);
        assert!(matches!(event.close(), Err(AppError::InvalidState(_))));
        assert!(matches!(event.cancel(), Err(AppError::InvalidState(_))));
    }

    #[test]
    fn overnight_slot_ends_the_next_day() {
        let option = PollOption {
            slot_key: "late".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            start_time: Some("22:30".to_string()),
            end_time: Some("01:00".to_string()),
        };

        assert_eq!(
            option.ends_at().unwrap(),
            Some(Utc.with_ymd_and_hms(2024, 6, 2, 1, 0, 0).unwrap())
        );
    }

    #[test]
    fn slot_without_start_time_begins_at_midnight() {
        let option = PollOption {
            slot_key: "allday".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            start_time: None,
            end_time: None,
        };

        assert_eq!(
            option.starts_at().unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(option.ends_at().unwrap(), None);
    }

    #[test]
    fn serializes_mode_as_a_tag_next_to_common_fields() {
        let json = serde_json::to_value(poll_event()).unwrap();

        assert_eq!(json["mode"], "poll");
        assert_eq!(json["pollOptions"][1]["slotKey"], "slot2");
        assert_eq!(json["pollOptions"][1]["startTime"], "20:00");
        assert_eq!(json["title"], "Summer show");

        let fixed = serde_json::to_value(event(EventMode::Fixed)).unwrap();
        assert_eq!(fixed["mode"], "fixed");
        assert!(fixed.get("pollOptions").is_none());
    }

    #[test]
    fn update_input_distinguishes_absent_from_null() {
        let input: UpdateEventInput =
            serde_json::from_str(r#"{"location": null, "title": "New title"}"#).unwrap();

        assert_eq!(input.location, Some(None));
        assert_eq!(input.description, None);
        assert_eq!(input.title.as_deref(), Some("New title"));
    }
}
