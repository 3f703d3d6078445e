use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
    #[serde(rename_all = "snake_case")]
    pub enum BandRole {
        Member => "member",
        Admin => "admin",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BandMember {
    pub band_id: Uuid,
    pub user_id: Uuid,
    pub role: BandRole,
    pub created_at: DateTime<Utc>,
}

impl BandMember {
    pub fn is_admin(&self) -> bool {
        self.role == BandRole::Admin
    }
}
