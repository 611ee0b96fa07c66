//! Live feed wire types (JSON text frames pushed on `/ws/live/{match_id}`).
use crate::MatchStatus;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Snapshot frame
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSubScore {
    pub team_id: i64,
    pub team_name: String,
    pub score: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchGameLive {
    pub match_game_id: i64,
    pub game_name: String,
    pub structure_type: String,
    pub teams: Vec<TeamSubScore>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamTotalScore {
    pub rank: u32,
    pub team_id: i64,
    pub team_name: String,
    pub total_points: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastEvent {
    pub match_game_id: i64,
    pub user_id: i64,
    pub description: String,
}

/// Full state snapshot the backend broadcasts after every reported event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveUpdate {
    pub match_id: i64,
    pub match_name: String,
    pub total_leaderboard: Vec<TeamTotalScore>,
    pub current_match_game: MatchGameLive,
    #[serde(default)]
    pub last_event: Option<LastEvent>,
}

// ---------------------------------------------------------------------------
// Tagged frames
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteOption {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    pub option_id: i64,
    pub votes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveMessage {
    LiveUpdate(LiveUpdate),
    MatchStatus {
        match_id: i64,
        status: MatchStatus,
    },
    GameStart {
        match_id: i64,
        match_game: MatchGameLive,
    },
    GameEnd {
        match_id: i64,
        match_game_id: i64,
    },
    VoteStart {
        match_id: i64,
        vote_id: i64,
        options: Vec<VoteOption>,
        duration_secs: u64,
    },
    VoteUpdate {
        match_id: i64,
        vote_id: i64,
        tallies: Vec<VoteTally>,
    },
    VoteEnd {
        match_id: i64,
        vote_id: i64,
        #[serde(default)]
        winner_option_id: Option<i64>,
    },
    HalftimeStart {
        match_id: i64,
        duration_secs: u64,
    },
    HalftimeEnd {
        match_id: i64,
    },
    Heartbeat,
}

impl LiveMessage {
    /// Decode one text frame. Frames without a `type` field are the
    /// backend's plain snapshot and decode as [`LiveMessage::LiveUpdate`].
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(text)?;
        if value.get("type").is_some() {
            serde_json::from_value(value)
        } else {
            serde_json::from_value(value).map(LiveMessage::LiveUpdate)
        }
    }

    pub fn match_id(&self) -> Option<i64> {
        match self {
            LiveMessage::LiveUpdate(update) => Some(update.match_id),
            LiveMessage::MatchStatus { match_id, .. }
            | LiveMessage::GameStart { match_id, .. }
            | LiveMessage::GameEnd { match_id, .. }
            | LiveMessage::VoteStart { match_id, .. }
            | LiveMessage::VoteUpdate { match_id, .. }
            | LiveMessage::VoteEnd { match_id, .. }
            | LiveMessage::HalftimeStart { match_id, .. }
            | LiveMessage::HalftimeEnd { match_id } => Some(*match_id),
            LiveMessage::Heartbeat => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            LiveMessage::LiveUpdate(_) => "live_update",
            LiveMessage::MatchStatus { .. } => "match_status",
            LiveMessage::GameStart { .. } => "game_start",
            LiveMessage::GameEnd { .. } => "game_end",
            LiveMessage::VoteStart { .. } => "vote_start",
            LiveMessage::VoteUpdate { .. } => "vote_update",
            LiveMessage::VoteEnd { .. } => "vote_end",
            LiveMessage::HalftimeStart { .. } => "halftime_start",
            LiveMessage::HalftimeEnd { .. } => "halftime_end",
            LiveMessage::Heartbeat => "heartbeat",
        }
    }
}

pub fn live_path(match_id: i64) -> String {
    format!("/ws/live/{match_id}")
}

pub fn live_url(base: &str, match_id: i64) -> String {
    format!("{}{}", base.trim_end_matches('/'), live_path(match_id))
}

/// Extract the match id from a `/ws/live/{match_id}` request path.
pub fn parse_live_path(path: &str) -> Option<i64> {
    let path = path.split('?').next().unwrap_or(path);
    path.strip_prefix("/ws/live/")?
        .trim_end_matches('/')
        .parse()
        .ok()
}

// ---------------------------------------------------------------------------
// Event reports (game server → backend)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPost {
    pub match_game_id: i64,
    pub user_id: i64,
    pub team_id: i64,
    pub event_type: String,
    #[serde(default)]
    pub event_data: HashMap<String, Value>,
}

impl EventPost {
    pub fn points(&self) -> i64 {
        self.event_data
            .get("points")
            .and_then(Value::as_i64)
            .unwrap_or(0)
    }

    pub fn describe(&self) -> String {
        format!("Team {} scored {} points.", self.team_id, self.points())
    }

    pub fn to_last_event(&self) -> LastEvent {
        LastEvent {
            match_game_id: self.match_game_id,
            user_id: self.user_id,
            description: self.describe(),
        }
    }
}

impl LiveUpdate {
    /// Fold a reported event into the snapshot the way the backend rebuilds
    /// it: the event's match game becomes current, the points are credited
    /// there and on the total leaderboard (adding rows for teams seen for
    /// the first time), both tables are re-sorted and `last_event` is set.
    pub fn record_event(&mut self, event: &EventPost) {
        let points = event.points();
        let team_name = self.team_name(event.team_id);

        let game = &mut self.current_match_game;
        if game.match_game_id != event.match_game_id {
            game.match_game_id = event.match_game_id;
            game.game_name = format!("Match game {}", event.match_game_id);
            game.teams.clear();
        }
        match game.teams.iter_mut().find(|t| t.team_id == event.team_id) {
            Some(team) => team.score += points,
            None => game.teams.push(TeamSubScore {
                team_id: event.team_id,
                team_name: team_name.clone(),
                score: points,
            }),
        }
        game.teams
            .sort_by(|a, b| b.score.cmp(&a.score).then(a.team_id.cmp(&b.team_id)));

        match self
            .total_leaderboard
            .iter_mut()
            .find(|t| t.team_id == event.team_id)
        {
            Some(team) => team.total_points += points,
            None => self.total_leaderboard.push(TeamTotalScore {
                rank: 0,
                team_id: event.team_id,
                team_name,
                total_points: points,
            }),
        }
        self.total_leaderboard
            .sort_by(|a, b| b.total_points.cmp(&a.total_points).then(a.team_id.cmp(&b.team_id)));
        for (i, team) in self.total_leaderboard.iter_mut().enumerate() {
            team.rank = i as u32 + 1;
        }

        self.last_event = Some(event.to_last_event());
    }

    fn team_name(&self, team_id: i64) -> String {
        self.total_leaderboard
            .iter()
            .find(|t| t.team_id == team_id)
            .map(|t| t.team_name.clone())
            .or_else(|| {
                self.current_match_game
                    .teams
                    .iter()
                    .find(|t| t.team_id == team_id)
                    .map(|t| t.team_name.clone())
            })
            .unwrap_or_else(|| format!("Team {team_id}"))
    }
}
