use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::database::{
    models::{
        Event, EventStatus, PollOption, PollResults, PollSchedule, PollSummary, PollVote,
        SlotSummary, SlotTally, SubmitVoteInput, VoteResponse, VoteWithVoter, Voter,
    },
    repositories::PollVoteRepository,
};
use crate::error::AppError;
use crate::services::{
    access_guard::{Access, AccessGuard},
    validation::{parse_field, validate_slot_key},
};

/// Groups votes by slot in one pass. Slots appear in the order their first vote was seen.
pub fn aggregate(votes: Vec<VoteWithVoter>) -> Vec<SlotTally> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut tallies: Vec<SlotTally> = Vec::new();

    for vote in votes {
        let position = *index.entry(vote.slot_key.clone()).or_insert_with(|| {
            tallies.push(SlotTally {
                slot_key: vote.slot_key.clone(),
                counts: Default::default(),
                voters: Vec::new(),
            });
            tallies.len() - 1
        });

        let tally = &mut tallies[position];
        match vote.response {
            VoteResponse::Available => tally.counts.available += 1,
            VoteResponse::Maybe => tally.counts.maybe += 1,
            VoteResponse::Unavailable => tally.counts.unavailable += 1,
        }
        tally.counts.total += 1;
        tally.voters.push(Voter {
            user_id: vote.user_id,
            display_name: vote.display_name,
            avatar_url: vote.avatar_url,
            response: vote.response,
        });
    }

    tallies
}

pub fn summarize(tallies: &[SlotTally]) -> Vec<SlotSummary> {
    tallies
        .iter()
        .map(|t| SlotSummary {
            slot_key: t.slot_key.clone(),
            counts: t.counts.clone(),
        })
        .collect()
}

/// The option with the strictly highest `available` count. The first such option in poll
/// order wins a tie; nobody being available means no recommendation.
pub fn best_slot(options: &[PollOption], tallies: &[SlotTally]) -> Option<String> {
    let available: HashMap<&str, u32> = tallies
        .iter()
        .map(|t| (t.slot_key.as_str(), t.counts.available))
        .collect();

    let mut best: Option<(&str, u32)> = None;
    for option in options {
        let count = available.get(option.slot_key.as_str()).copied().unwrap_or(0);
        if count > best.map_or(0, |(_, max)| max) {
            best = Some((option.slot_key.as_str(), count));
        }
    }

    best.map(|(key, _)| key.to_string())
}

/// The poll of `event`, checked to still accept a vote for `slot_key` at `now`.
pub fn ensure_accepting_votes<'a>(
    event: &'a Event,
    slot_key: &str,
    now: DateTime<Utc>,
) -> Result<&'a PollSchedule, AppError> {
    let poll = event.poll().ok_or(AppError::NotAPoll)?;

    if event.status != EventStatus::Open {
        return Err(AppError::InvalidState(format!(
            "Voting is not possible on a {} event",
            event.status
        )));
    }
    if poll.is_resolved() {
        return Err(AppError::InvalidState("Poll is already resolved".to_string()));
    }
    if poll.poll_closes_at.is_some_and(|closes| closes <= now) {
        return Err(AppError::InvalidState("Poll is closed for voting".to_string()));
    }
    if poll.option(slot_key).is_none() {
        return Err(AppError::InvalidSlot(format!("Unknown slot '{}'", slot_key)));
    }

    Ok(poll)
}

#[derive(Clone)]
pub struct PollService {
    guard: AccessGuard,
    votes: PollVoteRepository,
}

impl PollService {
    pub fn new(guard: AccessGuard, votes: PollVoteRepository) -> Self {
        Self { guard, votes }
    }

    pub async fn submit_vote(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        input: SubmitVoteInput,
    ) -> Result<PollVote, AppError> {
        validate_slot_key(&input.slot_key)?;
        let response: VoteResponse = parse_field("response", &input.response)?;

        let authorized = self
            .guard
            .authorize_event(event_id, user_id, Access::View)
            .await?;
        ensure_accepting_votes(&authorized.event, &input.slot_key, Utc::now())?;

        let vote = self
            .votes
            .upsert(event_id, user_id, &input.slot_key, response)
            .await?;
        log::debug!(
            "User {} voted {} for slot {} of event {}",
            user_id,
            response,
            input.slot_key,
            event_id
        );

        Ok(vote)
    }

    pub async fn get_user_votes(&self, event_id: Uuid, user_id: Uuid) -> Result<Vec<PollVote>, AppError> {
        let authorized = self
            .guard
            .authorize_event(event_id, user_id, Access::View)
            .await?;
        authorized.event.poll().ok_or(AppError::NotAPoll)?;

        Ok(self.votes.votes_for_user(event_id, user_id).await?)
    }

    pub async fn get_poll_results(&self, event_id: Uuid, user_id: Uuid) -> Result<PollResults, AppError> {
        let (poll_options, tallies) = self.tallies(event_id, user_id).await?;

        Ok(PollResults {
            event_id,
            best_slot_key: best_slot(&poll_options, &tallies),
            slots: tallies,
        })
    }

    pub async fn get_poll_summary(&self, event_id: Uuid, user_id: Uuid) -> Result<PollSummary, AppError> {
        let (poll_options, tallies) = self.tallies(event_id, user_id).await?;

        Ok(PollSummary {
            event_id,
            best_slot_key: best_slot(&poll_options, &tallies),
            slots: summarize(&tallies),
        })
    }

    async fn tallies(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<(Vec<PollOption>, Vec<SlotTally>), AppError> {
        let authorized = self
            .guard
            .authorize_event(event_id, user_id, Access::View)
            .await?;
        let poll_options = authorized
            .event
            .poll()
            .ok_or(AppError::NotAPoll)?
            .poll_options
            .clone();

        let votes = self.votes.votes_with_voters(event_id).await?;
        Ok((poll_options, aggregate(votes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{
        EventMode,
        event::fixtures::{event, poll_event, poll_options},
    };
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn vote(slot_key: &str, response: VoteResponse) -> VoteWithVoter {
        VoteWithVoter {
            user_id: Uuid::new_v4(),
            slot_key: slot_key.to_string(),
            response,
            display_name: "Player".to_string(),
            avatar_url: None,
        }
    }

    fn votes(slot_key: &str, response: VoteResponse, n: usize) -> Vec<VoteWithVoter> {
        (0..n).map(|_| vote(slot_key, response)).collect()
    }

    #[test]
    fn aggregates_in_first_seen_order() {
        let mut all = vec![vote("slot2", VoteResponse::Maybe)];
        all.push(vote("slot1", VoteResponse::Available));
        all.push(vote("slot2", VoteResponse::Available));
        all.push(vote("slot2", VoteResponse::Unavailable));

        let tallies = aggregate(all);

        assert_eq!(tallies.len(), 2);
        assert_eq!(tallies[0].slot_key, "slot2");
        assert_eq!(tallies[0].counts.available, 1);
        assert_eq!(tallies[0].counts.maybe, 1);
        assert_eq!(tallies[0].counts.unavailable, 1);
        assert_eq!(tallies[0].counts.total, 3);
        assert_eq!(tallies[0].voters.len(), 3);
        assert_eq!(tallies[1].slot_key, "slot1");
        assert_eq!(tallies[1].counts.total, 1);
    }

    #[test]
    fn summary_drops_voter_identities() {
        let tallies = aggregate(votes("slot1", VoteResponse::Available, 2));
        let summary = summarize(&tallies);

        assert_eq!(summary[0].counts, tallies[0].counts);
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json[0].get("voters").is_none());
        assert_eq!(json[0]["available"], 2);
    }

    #[test]
    fn best_slot_has_most_available_votes() {
        let mut all = votes("slot1", VoteResponse::Available, 3);
        all.extend(votes("slot2", VoteResponse::Available, 5));

        assert_eq!(
            best_slot(&poll_options(), &aggregate(all)).as_deref(),
            Some("slot2")
        );
    }

    #[test]
    fn best_slot_tie_goes_to_the_earlier_option() {
        let mut all = votes("slot2", VoteResponse::Available, 2);
        all.extend(votes("slot1", VoteResponse::Available, 2));
        all.extend(votes("slot2", VoteResponse::Maybe, 4));

        assert_eq!(
            best_slot(&poll_options(), &aggregate(all)).as_deref(),
            Some("slot1")
        );
    }

    #[test]
    fn no_available_votes_means_no_recommendation() {
        let all = votes("slot1", VoteResponse::Unavailable, 4);
        assert_eq!(best_slot(&poll_options(), &aggregate(all)), None);
        assert_eq!(best_slot(&poll_options(), &[]), None);
    }

    #[test]
    fn votes_need_an_open_unresolved_poll_and_a_known_slot() {
        let now = Utc.with_ymd_and_hms(2024, 5, 20, 12, 0, 0).unwrap();

        let open = poll_event();
        assert!(ensure_accepting_votes(&open, "slot1", now).is_ok());
        assert!(matches!(
            ensure_accepting_votes(&open, "slot7", now),
            Err(AppError::InvalidSlot(_))
        ));

        assert!(matches!(
            ensure_accepting_votes(&event(EventMode::Fixed), "slot1", now),
            Err(AppError::NotAPoll)
        ));

        let mut resolved = poll_event();
        resolved.resolve("slot1", now).unwrap();
        assert!(matches!(
            ensure_accepting_votes(&resolved, "slot1", now),
            Err(AppError::InvalidState(_))
        ));

        let mut closed = poll_event();
        closed.close().unwrap();
        assert!(ensure_accepting_votes(&closed, "slot1", now).is_err());

        let mut expired = poll_event();
        if let EventMode::Poll(poll) = &mut expired.mode {
            poll.poll_closes_at = Some(now - Duration::minutes(1));
        }
        assert!(matches!(
            ensure_accepting_votes(&expired, "slot1", now),
            Err(AppError::InvalidState(_))
        ));
    }
}
