use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::database::{
    ServiceRole,
    models::{Event, EventStatus, NotificationType},
    repositories::{band, event, poll_vote, rsvp, visibility},
};
use crate::error::AppError;
use crate::services::{
    notifier::{NotificationContent, NotificationFanout},
    visibility::is_visible,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderKind {
    /// Unresolved poll whose voting closes soon.
    Poll,
    /// RSVP-required event with a settled time whose RSVP deadline is near.
    Rsvp,
}

impl ReminderKind {
    pub fn notification_type(self) -> NotificationType {
        match self {
            ReminderKind::Poll => NotificationType::PollReminder,
            ReminderKind::Rsvp => NotificationType::RsvpReminder,
        }
    }
}

/// Which reminder, if any, `event` is due for at `now`. An already reminded event never is.
pub fn reminder_plan(event: &Event, now: DateTime<Utc>, window: Duration) -> Option<ReminderKind> {
    if event.status != EventStatus::Open || event.reminder_sent_at.is_some() {
        return None;
    }

    let due = |deadline: Option<DateTime<Utc>>| {
        deadline.is_some_and(|d| d > now && d <= now + window)
    };

    match event.poll() {
        Some(poll) if !poll.is_resolved() => due(poll.poll_closes_at).then_some(ReminderKind::Poll),
        _ if event.require_rsvp && event.has_fixed_time() => {
            due(event.rsvp_deadline).then_some(ReminderKind::Rsvp)
        }
        _ => None,
    }
}

/// Members who have not answered yet and can see the event.
pub fn non_responders(
    event: &Event,
    member_ids: &[Uuid],
    responder_ids: &[Uuid],
    visible_user_ids: &[Uuid],
) -> Vec<Uuid> {
    let responded: HashSet<&Uuid> = responder_ids.iter().collect();
    member_ids
        .iter()
        .filter(|id| !responded.contains(id))
        .filter(|id| is_visible(event, visible_user_ids, **id))
        .copied()
        .collect()
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReminderReport {
    pub events_scanned: usize,
    pub events_reminded: usize,
    pub notifications_created: usize,
    pub failures: usize,
}

#[derive(Clone)]
pub struct ReminderScheduler {
    role: ServiceRole,
    fanout: NotificationFanout,
    window: Duration,
}

impl ReminderScheduler {
    pub(crate) fn new(role: ServiceRole, fanout: NotificationFanout, window_hours: i64) -> Self {
        Self {
            role,
            fanout,
            window: Duration::hours(window_hours),
        }
    }

    /// One pass over due events. A failing event is logged and counted; the rest still run.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<ReminderReport, AppError> {
        let candidates =
            event::reminder_candidates(self.role.pool(), now, now + self.window).await?;
        let mut report = ReminderReport {
            events_scanned: candidates.len(),
            ..Default::default()
        };

        for candidate in &candidates {
            match self.remind(candidate, now).await {
                Ok(Some(created)) => {
                    report.events_reminded += 1;
                    report.notifications_created += created;
                }
                Ok(None) => {}
                Err(e) => {
                    report.failures += 1;
                    log::warn!("Reminder for event {} failed: {}", candidate.id, e);
                }
            }
        }

        log::info!(
            "Reminder run: {} scanned, {} reminded, {} notifications, {} failures",
            report.events_scanned,
            report.events_reminded,
            report.notifications_created,
            report.failures
        );

        Ok(report)
    }

    async fn remind(&self, target: &Event, now: DateTime<Utc>) -> Result<Option<usize>, AppError> {
        let Some(kind) = reminder_plan(target, now, self.window) else {
            return Ok(None);
        };

        let pool = self.role.pool();
        let member_ids = band::member_ids(pool, target.band_id).await?;
        let responder_ids = match kind {
            ReminderKind::Poll => poll_vote::voter_ids(pool, target.id).await?,
            ReminderKind::Rsvp => rsvp::responder_ids(pool, target.id).await?,
        };
        let visible_user_ids = if target.is_private() {
            visibility::visible_user_ids(pool, target.id).await?
        } else {
            Vec::new()
        };

        let recipients = non_responders(target, &member_ids, &responder_ids, &visible_user_ids);
        let content = NotificationContent::for_event(target, kind.notification_type());
        let created = self.fanout.notify_users(recipients, &content).await?;

        event::mark_reminder_sent(pool, target.id, now).await?;

        Ok(Some(created.len()))
    }
}

/// Runs the scheduler every `interval_hours` until the process exits.
pub async fn run_reminder_loop(scheduler: ReminderScheduler, interval_hours: u64) {
    let mut interval =
        tokio::time::interval(std::time::Duration::from_secs(interval_hours.max(1) * 3600));

    loop {
        interval.tick().await;
        if let Err(e) = scheduler.run(Utc::now()).await {
            log::error!("Reminder run aborted: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{
        EventMode, EventVisibility,
        event::fixtures::{event, poll_event},
    };
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 31, 12, 0, 0).unwrap()
    }

    fn closing_poll(in_hours: i64) -> Event {
        let mut poll = poll_event();
        if let EventMode::Poll(schedule) = &mut poll.mode {
            schedule.poll_closes_at = Some(now() + Duration::hours(in_hours));
        }
        poll
    }

    fn rsvp_event(deadline_in_hours: i64) -> Event {
        let mut fixed = event(EventMode::Fixed);
        fixed.require_rsvp = true;
        fixed.rsvp_deadline = Some(now() + Duration::hours(deadline_in_hours));
        fixed
    }

    #[test]
    fn plans_poll_reminders_inside_the_window() {
        let window = Duration::hours(24);
        assert_eq!(
            reminder_plan(&closing_poll(5), now(), window),
            Some(ReminderKind::Poll)
        );
        assert_eq!(reminder_plan(&closing_poll(30), now(), window), None);
        assert_eq!(reminder_plan(&closing_poll(-1), now(), window), None);
    }

    #[test]
    fn plans_rsvp_reminders_for_settled_events_only() {
        let window = Duration::hours(24);
        assert_eq!(
            reminder_plan(&rsvp_event(3), now(), window),
            Some(ReminderKind::Rsvp)
        );

        let mut not_required = rsvp_event(3);
        not_required.require_rsvp = false;
        assert_eq!(reminder_plan(&not_required, now(), window), None);
    }

    #[test]
    fn never_plans_a_second_batch() {
        let mut reminded = closing_poll(5);
        reminded.reminder_sent_at = Some(now() - Duration::hours(1));

        assert_eq!(reminder_plan(&reminded, now(), Duration::hours(24)), None);
    }

    #[test]
    fn skips_events_that_are_not_open() {
        let mut cancelled = rsvp_event(3);
        cancelled.cancel().unwrap();

        assert_eq!(reminder_plan(&cancelled, now(), Duration::hours(24)), None);
    }

    #[test]
    fn resolved_polls_switch_to_rsvp_reminders() {
        let mut resolved = closing_poll(5);
        resolved.resolve("slot1", now()).unwrap();
        assert_eq!(reminder_plan(&resolved, now(), Duration::hours(24)), None);

        resolved.require_rsvp = true;
        resolved.rsvp_deadline = Some(now() + Duration::hours(2));
        assert_eq!(
            reminder_plan(&resolved, now(), Duration::hours(24)),
            Some(ReminderKind::Rsvp)
        );
    }

    #[test]
    fn non_responders_exclude_answers_and_hidden_members() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let band_event = rsvp_event(3);

        assert_eq!(non_responders(&band_event, &[a, b, c], &[b], &[]), vec![a, c]);

        let mut private = rsvp_event(3);
        private.visibility = EventVisibility::Private;
        assert_eq!(non_responders(&private, &[a, b, c], &[b], &[c]), vec![c]);
    }
}
