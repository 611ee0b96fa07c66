pub mod client;
pub mod live;
pub mod scoring;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Domain types mirroring the tournament backend's REST schemas
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    #[default]
    Preparing,
    Ongoing,
    Finished,
    Cancelled,
}

impl MatchStatus {
    pub fn label(&self) -> &'static str {
        match self {
            MatchStatus::Preparing => "preparing",
            MatchStatus::Ongoing => "ongoing",
            MatchStatus::Finished => "finished",
            MatchStatus::Cancelled => "cancelled",
        }
    }

    /// Finished and cancelled matches are frozen.
    pub fn is_archived(&self) -> bool {
        matches!(self, MatchStatus::Finished | MatchStatus::Cancelled)
    }

    pub fn can_start_live(&self) -> bool {
        *self == MatchStatus::Ongoing
    }

    /// Same-state is not a transition; archived states are terminal.
    pub fn can_transition_to(&self, next: MatchStatus) -> bool {
        matches!(
            (self, next),
            (MatchStatus::Preparing, MatchStatus::Ongoing)
                | (MatchStatus::Preparing, MatchStatus::Cancelled)
                | (MatchStatus::Ongoing, MatchStatus::Finished)
                | (MatchStatus::Ongoing, MatchStatus::Cancelled)
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamInfo {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// One minigame round scheduled inside a match.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MatchGame {
    pub id: i64,
    pub match_id: i64,
    pub game_id: i64,
    #[serde(default = "default_game_order")]
    pub game_order: u32,
    pub structure_type: String,
    pub game: Game,
    #[serde(default)]
    pub is_live: bool,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub end_time: Option<DateTime<Utc>>,
}

fn default_game_order() -> u32 {
    1
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Match {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: MatchStatus,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub prize_pool: Option<String>,
    #[serde(default)]
    pub max_teams: Option<u32>,
    #[serde(default)]
    pub winning_team_id: Option<i64>,
    #[serde(default)]
    pub participants: Vec<TeamInfo>,
    #[serde(default)]
    pub match_games: Vec<MatchGame>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Match {
    pub fn live_match_game(&self) -> Option<&MatchGame> {
        self.match_games.iter().find(|g| g.is_live)
    }
}

/// Pick the match a viewer should follow when none was requested.
pub fn select_live_match(matches: &[Match]) -> Option<&Match> {
    matches.iter().find(|m| m.status.can_start_live())
}

/// Parse a backend timestamp. The backend emits RFC 3339 for tz-aware
/// columns and naive ISO-8601 otherwise; naive values are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}
