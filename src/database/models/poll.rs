use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
    #[serde(rename_all = "snake_case")]
    pub enum VoteResponse {
        Available => "available",
        Maybe => "maybe",
        Unavailable => "unavailable",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PollVote {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub slot_key: String,
    pub response: VoteResponse,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Vote joined with the voter's profile.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VoteWithVoter {
    pub user_id: Uuid,
    pub slot_key: String,
    pub response: VoteResponse,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitVoteInput {
    pub slot_key: String,
    pub response: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Voter {
    pub user_id: Uuid,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub response: VoteResponse,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SlotCounts {
    pub available: u32,
    pub maybe: u32,
    pub unavailable: u32,
    pub total: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SlotTally {
    pub slot_key: String,
    #[serde(flatten)]
    pub counts: SlotCounts,
    pub voters: Vec<Voter>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SlotSummary {
    pub slot_key: String,
    #[serde(flatten)]
    pub counts: SlotCounts,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollResults {
    pub event_id: Uuid,
    pub slots: Vec<SlotTally>,
    pub best_slot_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollSummary {
    pub event_id: Uuid,
    pub slots: Vec<SlotSummary>,
    pub best_slot_key: Option<String>,
}
