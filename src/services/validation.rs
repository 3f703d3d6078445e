use std::collections::HashSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::database::models::{
    CreateEventInput, DESCRIPTION_MAX_LEN, Event, EventMode, EventModeKind, EventType,
    EventVisibility, LOCATION_MAX_LEN, NewEvent, PollOption, PollSchedule, RSVP_NOTE_MAX_LEN,
    SLOT_KEY_MAX_LEN, TITLE_MAX_LEN, UpdateEventInput, parse_clock,
};
use crate::error::AppError;

/// Parses a string-typed enum field, naming the field in the error.
pub fn parse_field<T: FromStr>(field: &str, value: &str) -> Result<T, AppError> {
    value
        .parse::<T>()
        .map_err(|_| AppError::validation(format!("Invalid {} '{}'", field, value)))
}

fn check_len(field: &str, value: &str, max: usize) -> Result<(), AppError> {
    if value.chars().count() > max {
        return Err(AppError::validation(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

fn title(value: &str) -> Result<String, AppError> {
    let title = value.trim();
    if title.is_empty() {
        return Err(AppError::validation("title is required"));
    }
    check_len("title", title, TITLE_MAX_LEN)?;
    Ok(title.to_string())
}

fn optional_text(field: &str, value: Option<String>, max: usize) -> Result<Option<String>, AppError> {
    match value {
        Some(text) => {
            check_len(field, &text, max)?;
            Ok(Some(text))
        }
        None => Ok(None),
    }
}

pub fn validate_slot_key(slot_key: &str) -> Result<(), AppError> {
    if slot_key.trim().is_empty() {
        return Err(AppError::validation("slotKey is required"));
    }
    check_len("slotKey", slot_key, SLOT_KEY_MAX_LEN)
}

pub fn validate_note(note: Option<String>) -> Result<Option<String>, AppError> {
    optional_text("note", note, RSVP_NOTE_MAX_LEN)
}

pub fn validate_poll_options(options: &[PollOption]) -> Result<(), AppError> {
    if options.is_empty() {
        return Err(AppError::validation("pollOptions must not be empty for a poll"));
    }

    let mut seen = HashSet::new();
    for option in options {
        validate_slot_key(&option.slot_key)?;
        if !seen.insert(option.slot_key.as_str()) {
            return Err(AppError::validation(format!(
                "Duplicate slotKey '{}'",
                option.slot_key
            )));
        }
        if let Some(start) = &option.start_time {
            parse_clock(start)?;
        }
        if let Some(end) = &option.end_time {
            parse_clock(end)?;
        }
    }

    Ok(())
}

fn check_time_order(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<(), AppError> {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(AppError::validation("endTime must not be before startTime"));
        }
    }
    Ok(())
}

fn dedup(ids: Vec<Uuid>) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

/// Checks a create request and fills in defaults. Runs before any data access.
pub fn validate_new_event(input: CreateEventInput, created_by: Uuid) -> Result<NewEvent, AppError> {
    let band_id = input
        .band_id
        .ok_or_else(|| AppError::validation("bandId is required"))?;
    let title = title(input.title.as_deref().unwrap_or_default())?;
    let event_type: EventType = match input.event_type.as_deref() {
        Some(value) => parse_field("eventType", value)?,
        None => return Err(AppError::validation("eventType is required")),
    };
    let mode_kind: EventModeKind = match input.mode.as_deref() {
        Some(value) => parse_field("mode", value)?,
        None => EventModeKind::Fixed,
    };
    let visibility: EventVisibility = match input.visibility.as_deref() {
        Some(value) => parse_field("visibility", value)?,
        None => EventVisibility::Band,
    };
    let location = optional_text("location", input.location, LOCATION_MAX_LEN)?;
    let description = optional_text("description", input.description, DESCRIPTION_MAX_LEN)?;

    let (mode, start_time) = match mode_kind {
        EventModeKind::Fixed => {
            if input.poll_options.is_some() || input.poll_closes_at.is_some() {
                return Err(AppError::validation(
                    "pollOptions and pollClosesAt are only allowed on polls",
                ));
            }
            let start = input
                .start_time
                .ok_or_else(|| AppError::validation("startTime is required"))?;
            (EventMode::Fixed, start)
        }
        EventModeKind::Poll => {
            let poll_options = input.poll_options.unwrap_or_default();
            validate_poll_options(&poll_options)?;
            let start = match input.start_time {
                Some(start) => start,
                None => poll_options[0].starts_at()?,
            };
            (
                EventMode::Poll(PollSchedule {
                    poll_options,
                    poll_closes_at: input.poll_closes_at,
                    resolved_at: None,
                    resolved_slot_key: None,
                }),
                start,
            )
        }
    };
    check_time_order(Some(start_time), input.end_time)?;

    let visible_user_ids = dedup(input.visible_user_ids);
    if visibility == EventVisibility::Band && !visible_user_ids.is_empty() {
        return Err(AppError::validation(
            "visibleUserIds is only allowed on private events",
        ));
    }

    Ok(NewEvent {
        band_id,
        title,
        event_type,
        start_time: Some(start_time),
        end_time: input.end_time,
        location,
        description,
        metadata: input.metadata.unwrap_or_default(),
        created_by,
        visibility,
        visible_user_ids,
        require_rsvp: input.require_rsvp.unwrap_or(false),
        rsvp_deadline: input.rsvp_deadline,
        mode,
    })
}

/// Checks the parts of an update that do not depend on the stored event.
pub fn check_update_input(input: &UpdateEventInput) -> Result<(), AppError> {
    if let Some(value) = &input.title {
        title(value)?;
    }
    if let Some(value) = &input.event_type {
        parse_field::<EventType>("eventType", value)?;
    }
    if let Some(value) = &input.visibility {
        parse_field::<EventVisibility>("visibility", value)?;
    }
    if let Some(Some(value)) = &input.location {
        check_len("location", value, LOCATION_MAX_LEN)?;
    }
    if let Some(Some(value)) = &input.description {
        check_len("description", value, DESCRIPTION_MAX_LEN)?;
    }
    if let Some(options) = &input.poll_options {
        validate_poll_options(options)?;
    }
    Ok(())
}

/// What an applied update touched, for deciding on follow-up work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateEffects {
    pub schedule_changed: bool,
    pub visibility_changed: bool,
}

/// Applies the whitelisted fields present in `input` to `event`. On error `event` may be
/// partially modified and must be discarded.
pub fn apply_event_update(
    event: &mut Event,
    input: UpdateEventInput,
) -> Result<UpdateEffects, AppError> {
    let mut effects = UpdateEffects::default();

    if let Some(value) = input.title {
        event.title = title(&value)?;
    }
    if let Some(value) = input.event_type {
        event.event_type = parse_field("eventType", &value)?;
    }
    if let Some(value) = input.start_time {
        effects.schedule_changed |= event.start_time != value;
        event.start_time = value;
    }
    if let Some(value) = input.end_time {
        effects.schedule_changed |= event.end_time != value;
        event.end_time = value;
    }
    if let Some(value) = input.location {
        let value = optional_text("location", value, LOCATION_MAX_LEN)?;
        effects.schedule_changed |= event.location != value;
        event.location = value;
    }
    if let Some(value) = input.description {
        event.description = optional_text("description", value, DESCRIPTION_MAX_LEN)?;
    }
    if let Some(value) = input.metadata {
        event.metadata = value;
    }
    if let Some(value) = input.visibility {
        let visibility: EventVisibility = parse_field("visibility", &value)?;
        effects.visibility_changed = event.visibility != visibility;
        event.visibility = visibility;
    }
    if let Some(value) = input.require_rsvp {
        event.require_rsvp = value;
    }
    if let Some(value) = input.rsvp_deadline {
        event.rsvp_deadline = value;
    }

    let touches_poll = input.poll_options.is_some() || input.poll_closes_at.is_some();
    match &mut event.mode {
        EventMode::Poll(poll) => {
            if let Some(options) = input.poll_options {
                validate_poll_options(&options)?;
                if let Some(key) = &poll.resolved_slot_key {
                    if !options.iter().any(|o| &o.slot_key == key) {
                        return Err(AppError::validation(format!(
                            "pollOptions must keep the resolved slot '{}'",
                            key
                        )));
                    }
                }
                poll.poll_options = options;
            }
            if let Some(value) = input.poll_closes_at {
                poll.poll_closes_at = value;
            }
        }
        EventMode::Fixed if touches_poll => {
            return Err(AppError::validation(
                "pollOptions and pollClosesAt are only allowed on polls",
            ));
        }
        EventMode::Fixed => {}
    }

    check_time_order(event.start_time, event.end_time)?;

    Ok(effects)
}
