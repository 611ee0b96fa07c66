use chrono::{DateTime, Local};
use log::{debug, warn};
use mcc_api::live::{
    LastEvent, LiveMessage, LiveUpdate, MatchGameLive, TeamTotalScore, VoteOption, VoteTally,
};
use mcc_api::scoring::standard_scores;
use mcc_api::{Match, MatchStatus};
use std::collections::BTreeMap;
use tokio::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// Connection status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    #[default]
    Idle,
    Connecting { attempt: u32 },
    Connected,
    Reconnecting { attempt: u32, delay: Duration },
    /// The server ended the feed normally.
    Closed,
    /// Reconnect attempts are exhausted.
    Failed,
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        *self == ConnectionStatus::Connected
    }

    pub fn label(&self) -> String {
        match self {
            ConnectionStatus::Idle => "idle".into(),
            ConnectionStatus::Connecting { attempt: 1 } => "connecting".into(),
            ConnectionStatus::Connecting { attempt } => format!("connecting (attempt {attempt})"),
            ConnectionStatus::Connected => "live".into(),
            ConnectionStatus::Reconnecting { attempt, delay } => {
                format!("reconnecting in {}s (attempt {attempt})", delay.as_secs_f32().ceil() as u64)
            }
            ConnectionStatus::Closed => "closed".into(),
            ConnectionStatus::Failed => "disconnected".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Voting and halftime
// ---------------------------------------------------------------------------

/// Longest countdown a frame may start.
pub const MAX_COUNTDOWN: Duration = Duration::from_secs(24 * 60 * 60);

/// Deadline `duration_secs` after `now`, clamped to [`MAX_COUNTDOWN`].
fn deadline(now: Instant, duration_secs: u64) -> Instant {
    let duration = Duration::from_secs(duration_secs).min(MAX_COUNTDOWN);
    now.checked_add(duration).unwrap_or(now)
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoteState {
    pub vote_id: i64,
    pub options: Vec<VoteOption>,
    /// option id → votes; only ids from `options` are kept.
    pub tallies: BTreeMap<i64, u32>,
    pub ends_at: Instant,
    pub closed: bool,
    pub winner: Option<i64>,
}

impl VoteState {
    fn open(vote_id: i64, options: Vec<VoteOption>, ends_at: Instant) -> Self {
        let tallies = options.iter().map(|o| (o.id, 0)).collect();
        Self { vote_id, options, tallies, ends_at, closed: false, winner: None }
    }

    fn apply_tallies(&mut self, tallies: &[VoteTally]) -> bool {
        let mut changed = false;
        for tally in tallies {
            match self.tallies.get_mut(&tally.option_id) {
                Some(votes) if *votes != tally.votes => {
                    *votes = tally.votes;
                    changed = true;
                }
                Some(_) => {}
                None => debug!("dropping tally for unknown option {}", tally.option_id),
            }
        }
        changed
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        if self.closed {
            return Duration::ZERO;
        }
        self.ends_at.saturating_duration_since(now)
    }

    /// Option with the most votes; ties go to the lowest option id.
    pub fn leading(&self) -> Option<&VoteOption> {
        let (best_id, best_votes) = self
            .tallies
            .iter()
            .fold(None, |best: Option<(i64, u32)>, (&id, &votes)| match best {
                Some((_, top)) if top >= votes => best,
                _ => Some((id, votes)),
            })?;
        if best_votes == 0 {
            return None;
        }
        self.options.iter().find(|o| o.id == best_id)
    }

    pub fn option_name(&self, id: i64) -> Option<&str> {
        self.options.iter().find(|o| o.id == id).map(|o| o.name.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Halftime {
    pub ends_at: Instant,
}

impl Halftime {
    pub fn remaining(&self, now: Instant) -> Duration {
        self.ends_at.saturating_duration_since(now)
    }

    pub fn is_over(&self, now: Instant) -> bool {
        self.remaining(now).is_zero()
    }
}

// ---------------------------------------------------------------------------
// Live match state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LiveState {
    pub match_id: i64,
    pub match_name: Option<String>,
    pub status: MatchStatus,
    pub connection: ConnectionStatus,
    /// Sorted by rank, then team id.
    pub leaderboard: Vec<TeamTotalScore>,
    /// Teams sorted by score, highest first.
    pub current_game: Option<MatchGameLive>,
    pub finished_games: Vec<i64>,
    pub last_event: Option<LastEvent>,
    pub vote: Option<VoteState>,
    pub halftime: Option<Halftime>,
    pub error: Option<String>,
    pub updates_received: u64,
    pub last_update_at: Option<DateTime<Local>>,
    /// Set once a live frame has carried game data; REST snapshots no
    /// longer overwrite the current game after that.
    has_live_data: bool,
}

impl LiveState {
    pub fn new(match_id: i64) -> Self {
        Self {
            match_id,
            match_name: None,
            status: MatchStatus::default(),
            connection: ConnectionStatus::default(),
            leaderboard: Vec::new(),
            current_game: None,
            finished_games: Vec::new(),
            last_event: None,
            vote: None,
            halftime: None,
            error: None,
            updates_received: 0,
            last_update_at: None,
            has_live_data: false,
        }
    }

    /// Fold one inbound frame into the state. Returns whether anything the
    /// view shows has changed.
    pub fn apply(&mut self, msg: LiveMessage, now: Instant) -> bool {
        if let Some(match_id) = msg.match_id()
            && match_id != self.match_id
        {
            debug!("ignoring {} frame for match {match_id}", msg.kind());
            return false;
        }

        match msg {
            LiveMessage::LiveUpdate(update) => {
                self.apply_update(update);
                true
            }
            LiveMessage::MatchStatus { status, .. } => self.transition(status),
            LiveMessage::GameStart { match_game, .. } => {
                self.set_current_game(match_game);
                self.vote = None;
                self.halftime = None;
                self.promote_to_ongoing();
                true
            }
            LiveMessage::GameEnd { match_game_id, .. } => {
                if self.finished_games.contains(&match_game_id) {
                    return false;
                }
                self.finished_games.push(match_game_id);
                true
            }
            LiveMessage::VoteStart { vote_id, options, duration_secs, .. } => {
                self.vote = Some(VoteState::open(vote_id, options, deadline(now, duration_secs)));
                true
            }
            LiveMessage::VoteUpdate { vote_id, tallies, .. } => match self.vote.as_mut() {
                Some(vote) if vote.vote_id == vote_id && !vote.closed => vote.apply_tallies(&tallies),
                _ => {
                    debug!("ignoring tallies for vote {vote_id}: not the open vote");
                    false
                }
            },
            LiveMessage::VoteEnd { vote_id, winner_option_id, .. } => match self.vote.as_mut() {
                Some(vote) if vote.vote_id == vote_id && !vote.closed => {
                    let winner = winner_option_id.or_else(|| vote.leading().map(|o| o.id));
                    vote.winner = winner;
                    vote.closed = true;
                    true
                }
                _ => false,
            },
            LiveMessage::HalftimeStart { duration_secs, .. } => {
                self.halftime = Some(Halftime { ends_at: deadline(now, duration_secs) });
                true
            }
            LiveMessage::HalftimeEnd { .. } => self.halftime.take().is_some(),
            LiveMessage::Heartbeat => false,
        }
    }

    fn apply_update(&mut self, update: LiveUpdate) {
        let LiveUpdate { match_name, mut total_leaderboard, current_match_game, last_event, .. } =
            update;

        total_leaderboard.sort_by_key(|t| (t.rank, t.team_id));
        self.match_name = Some(match_name);
        self.leaderboard = total_leaderboard;
        self.set_current_game(current_match_game);
        self.last_event = last_event;
        self.error = None;
        self.updates_received += 1;
        self.last_update_at = Some(Local::now());
        self.promote_to_ongoing();
    }

    fn set_current_game(&mut self, mut game: MatchGameLive) {
        game.teams.sort_by(|a, b| b.score.cmp(&a.score).then(a.team_id.cmp(&b.team_id)));

        let switched = self
            .current_game
            .as_ref()
            .is_some_and(|current| current.match_game_id != game.match_game_id);
        if switched && self.vote.as_ref().is_some_and(|v| !v.closed) {
            self.vote = None;
        }

        self.current_game = Some(game);
        self.has_live_data = true;
    }

    fn promote_to_ongoing(&mut self) {
        if self.status == MatchStatus::Preparing {
            self.status = MatchStatus::Ongoing;
        }
    }

    fn transition(&mut self, next: MatchStatus) -> bool {
        if self.status == next {
            return false;
        }
        if !self.status.can_transition_to(next) {
            warn!(
                "rejecting status change {} -> {} for match {}",
                self.status.label(),
                next.label(),
                self.match_id
            );
            return false;
        }

        self.status = next;
        if next.is_archived() {
            self.vote = None;
            self.halftime = None;
        }
        true
    }

    pub fn on_connection(&mut self, status: ConnectionStatus) -> bool {
        if status == ConnectionStatus::Connected {
            self.error = None;
        }
        let changed = self.connection != status;
        self.connection = status;
        changed
    }

    pub fn on_invalid(&mut self, reason: &str) {
        debug!("invalid live data: {reason}");
        self.error = Some("received invalid live data from the server".into());
    }

    pub fn on_socket_error(&mut self, reason: &str) {
        self.error = Some(format!("connection error: {reason}"));
    }

    /// Merge a REST snapshot of the match. Live frames win over REST data.
    pub fn on_match_loaded(&mut self, snapshot: &Match) -> bool {
        if snapshot.id != self.match_id {
            return false;
        }

        let mut changed = false;
        if self.match_name.is_none() {
            self.match_name = Some(snapshot.name.clone());
            changed = true;
        }

        // REST lags behind live frames (a snapshot promotes preparing to
        // ongoing, the backend row does not); only walk forward.
        if lifecycle_stage(snapshot.status) < lifecycle_stage(self.status) {
            debug!(
                "REST status {} is behind {} for match {}",
                snapshot.status.label(),
                self.status.label(),
                self.match_id
            );
        } else if self.status != snapshot.status {
            if self.status == MatchStatus::Preparing
                && snapshot.status == MatchStatus::Finished
            {
                changed |= self.transition(MatchStatus::Ongoing);
            }
            changed |= self.transition(snapshot.status);
        }

        if !self.has_live_data
            && self.current_game.is_none()
            && let Some(game) = snapshot.live_match_game()
        {
            self.current_game = Some(MatchGameLive {
                match_game_id: game.id,
                game_name: game.game.name.clone(),
                structure_type: game.structure_type.clone(),
                teams: Vec::new(),
            });
            changed = true;
        }

        changed
    }

    /// Expire a finished halftime countdown. Returns true while a countdown
    /// is running (or just ended) so the view keeps refreshing.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut refresh = false;
        if let Some(halftime) = self.halftime {
            if halftime.is_over(now) {
                self.halftime = None;
            }
            refresh = true;
        }
        if self.vote.as_ref().is_some_and(|v| !v.closed && !v.remaining(now).is_zero()) {
            refresh = true;
        }
        refresh
    }

    /// Standard scores of the current game's teams, in display order.
    pub fn standard_scores(&self) -> Vec<(i64, f64)> {
        let Some(game) = &self.current_game else {
            return Vec::new();
        };
        let raw: Vec<(i64, i64)> = game.teams.iter().map(|t| (t.team_id, t.score)).collect();
        standard_scores(&raw)
    }
}

fn lifecycle_stage(status: MatchStatus) -> u8 {
    match status {
        MatchStatus::Preparing => 0,
        MatchStatus::Ongoing => 1,
        MatchStatus::Finished | MatchStatus::Cancelled => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcc_api::live::TeamSubScore;
    use mcc_api::{Game, MatchGame};

    const MATCH_ID: i64 = 7;

    fn team(rank: u32, team_id: i64, total_points: i64) -> TeamTotalScore {
        TeamTotalScore { rank, team_id, team_name: format!("Team {team_id}"), total_points }
    }

    fn game(match_game_id: i64, scores: &[(i64, i64)]) -> MatchGameLive {
        MatchGameLive {
            match_game_id,
            game_name: "Build Battle".into(),
            structure_type: "team".into(),
            teams: scores
                .iter()
                .map(|&(team_id, score)| TeamSubScore { team_id, team_name: format!("Team {team_id}"), score })
                .collect(),
        }
    }

    fn update(match_id: i64, current: MatchGameLive) -> LiveMessage {
        LiveMessage::LiveUpdate(LiveUpdate {
            match_id,
            match_name: "W2CC Winter Crossover".into(),
            total_leaderboard: vec![team(2, 5, 640), team(1, 3, 820), team(2, 4, 640)],
            current_match_game: current,
            last_event: Some(LastEvent {
                match_game_id: 21,
                user_id: 9,
                description: "Team 3 scored 15 points.".into(),
            }),
        })
    }

    fn vote_start(vote_id: i64, duration_secs: u64) -> LiveMessage {
        LiveMessage::VoteStart {
            match_id: MATCH_ID,
            vote_id,
            options: vec![
                VoteOption { id: 1, name: "Skywars".into() },
                VoteOption { id: 2, name: "TNT Run".into() },
            ],
            duration_secs,
        }
    }

    fn tallies(vote_id: i64, counts: &[(i64, u32)]) -> LiveMessage {
        LiveMessage::VoteUpdate {
            match_id: MATCH_ID,
            vote_id,
            tallies: counts.iter().map(|&(option_id, votes)| VoteTally { option_id, votes }).collect(),
        }
    }

    fn status(status: MatchStatus) -> LiveMessage {
        LiveMessage::MatchStatus { match_id: MATCH_ID, status }
    }

    #[test]
    fn snapshot_replaces_state_and_sorts() {
        let now = Instant::now();
        let mut state = LiveState::new(MATCH_ID);
        state.on_invalid("bad frame");

        assert!(state.apply(update(MATCH_ID, game(21, &[(5, 10), (3, 40), (4, 40)])), now));

        assert_eq!(state.match_name.as_deref(), Some("W2CC Winter Crossover"));
        let order: Vec<i64> = state.leaderboard.iter().map(|t| t.team_id).collect();
        assert_eq!(order, vec![3, 4, 5]);
        let teams: Vec<i64> = state.current_game.as_ref().unwrap().teams.iter().map(|t| t.team_id).collect();
        assert_eq!(teams, vec![3, 4, 5]);
        assert!(state.last_event.is_some());
        assert!(state.error.is_none(), "a good frame clears the error");
        assert_eq!(state.updates_received, 1);
        assert_eq!(state.status, MatchStatus::Ongoing, "live data promotes a preparing match");
    }

    #[test]
    fn frames_for_other_matches_are_ignored() {
        let mut state = LiveState::new(MATCH_ID);
        assert!(!state.apply(update(99, game(21, &[])), Instant::now()));
        assert!(state.match_name.is_none());
        assert_eq!(state.updates_received, 0);
    }

    #[test]
    fn null_last_event_clears_previous_one() {
        let now = Instant::now();
        let mut state = LiveState::new(MATCH_ID);
        state.apply(update(MATCH_ID, game(21, &[])), now);

        let LiveMessage::LiveUpdate(mut next) = update(MATCH_ID, game(21, &[])) else {
            unreachable!()
        };
        next.last_event = None;
        state.apply(LiveMessage::LiveUpdate(next), now);
        assert!(state.last_event.is_none());
    }

    #[test]
    fn status_follows_lifecycle_and_rejects_illegal_moves() {
        let now = Instant::now();
        let mut state = LiveState::new(MATCH_ID);

        assert!(!state.apply(status(MatchStatus::Finished), now), "preparing cannot finish");
        assert_eq!(state.status, MatchStatus::Preparing);
        assert!(!state.apply(status(MatchStatus::Preparing), now), "same state is no change");

        assert!(state.apply(status(MatchStatus::Ongoing), now));
        state.apply(vote_start(1, 30), now);
        state.apply(LiveMessage::HalftimeStart { match_id: MATCH_ID, duration_secs: 300 }, now);

        assert!(state.apply(status(MatchStatus::Finished), now));
        assert!(state.vote.is_none() && state.halftime.is_none());

        assert!(!state.apply(status(MatchStatus::Ongoing), now), "finished is terminal");
        assert!(!state.apply(status(MatchStatus::Cancelled), now));
        assert_eq!(state.status, MatchStatus::Finished);
    }

    #[test]
    fn snapshot_after_finish_keeps_terminal_status() {
        let now = Instant::now();
        let mut state = LiveState::new(MATCH_ID);
        state.apply(status(MatchStatus::Ongoing), now);
        state.apply(status(MatchStatus::Finished), now);
        state.apply(update(MATCH_ID, game(21, &[(3, 50)])), now);
        assert_eq!(state.status, MatchStatus::Finished);
        assert_eq!(state.updates_received, 1);
    }

    #[test]
    fn voting_tracks_tallies_and_picks_winner() {
        let now = Instant::now();
        let mut state = LiveState::new(MATCH_ID);
        assert!(state.apply(vote_start(4, 45), now));

        let vote = state.vote.as_ref().unwrap();
        assert_eq!(vote.remaining(now), Duration::from_secs(45));
        assert!(vote.leading().is_none(), "no leader before any votes");

        assert!(state.apply(tallies(4, &[(1, 3), (2, 5), (99, 40)]), now));
        let vote = state.vote.as_ref().unwrap();
        assert_eq!(vote.tallies.len(), 2, "unknown options are dropped");
        assert_eq!(vote.leading().map(|o| o.name.as_str()), Some("TNT Run"));

        assert!(!state.apply(tallies(4, &[(1, 3), (2, 5)]), now), "same tallies are no change");
        assert!(!state.apply(tallies(3, &[(1, 50)]), now), "stale vote ids are ignored");

        assert!(state.apply(LiveMessage::VoteEnd { match_id: MATCH_ID, vote_id: 4, winner_option_id: None }, now));
        let vote = state.vote.as_ref().unwrap();
        assert!(vote.closed);
        assert_eq!(vote.winner, Some(2));
        assert_eq!(vote.remaining(now), Duration::ZERO);

        assert!(!state.apply(tallies(4, &[(1, 9)]), now), "closed votes are frozen");
    }

    #[test]
    fn explicit_vote_winner_wins_over_tally() {
        let now = Instant::now();
        let mut state = LiveState::new(MATCH_ID);
        state.apply(vote_start(4, 45), now);
        state.apply(tallies(4, &[(1, 3), (2, 5)]), now);
        state.apply(LiveMessage::VoteEnd { match_id: MATCH_ID, vote_id: 4, winner_option_id: Some(1) }, now);
        assert_eq!(state.vote.as_ref().unwrap().winner, Some(1));
    }

    #[test]
    fn tied_votes_lead_with_lowest_option_id() {
        let now = Instant::now();
        let mut state = LiveState::new(MATCH_ID);
        state.apply(vote_start(4, 45), now);
        state.apply(tallies(4, &[(1, 5), (2, 5)]), now);
        assert_eq!(state.vote.as_ref().unwrap().leading().map(|o| o.id), Some(1));
    }

    #[test]
    fn switching_games_clears_open_vote() {
        let now = Instant::now();
        let mut state = LiveState::new(MATCH_ID);
        state.apply(update(MATCH_ID, game(21, &[])), now);
        state.apply(vote_start(4, 45), now);

        state.apply(update(MATCH_ID, game(21, &[(3, 1)])), now);
        assert!(state.vote.is_some(), "same game keeps the vote");

        state.apply(update(MATCH_ID, game(22, &[])), now);
        assert!(state.vote.is_none());
    }

    #[test]
    fn game_start_resets_vote_and_halftime() {
        let now = Instant::now();
        let mut state = LiveState::new(MATCH_ID);
        state.apply(vote_start(4, 45), now);
        state.apply(LiveMessage::HalftimeStart { match_id: MATCH_ID, duration_secs: 60 }, now);

        assert!(state.apply(LiveMessage::GameStart { match_id: MATCH_ID, match_game: game(22, &[]) }, now));
        assert_eq!(state.current_game.as_ref().map(|g| g.match_game_id), Some(22));
        assert!(state.vote.is_none() && state.halftime.is_none());
        assert_eq!(state.status, MatchStatus::Ongoing);
    }

    #[test]
    fn game_end_is_recorded_once() {
        let now = Instant::now();
        let mut state = LiveState::new(MATCH_ID);
        state.apply(update(MATCH_ID, game(21, &[])), now);
        let end = LiveMessage::GameEnd { match_id: MATCH_ID, match_game_id: 21 };
        assert!(state.apply(end.clone(), now));
        assert!(!state.apply(end, now));
        assert_eq!(state.finished_games, vec![21]);
        assert!(state.current_game.is_some(), "finished game stays on screen");
    }

    #[test]
    fn halftime_counts_down_and_expires_on_tick() {
        let start = Instant::now();
        let mut state = LiveState::new(MATCH_ID);
        state.apply(LiveMessage::HalftimeStart { match_id: MATCH_ID, duration_secs: 90 }, start);

        let halftime = state.halftime.unwrap();
        assert_eq!(halftime.remaining(start + Duration::from_secs(30)), Duration::from_secs(60));

        assert!(state.tick(start + Duration::from_secs(30)));
        assert!(state.halftime.is_some());

        assert!(state.tick(start + Duration::from_secs(91)), "expiry itself needs a redraw");
        assert!(state.halftime.is_none());
        assert!(!state.tick(start + Duration::from_secs(92)));
    }

    #[test]
    fn halftime_end_clears_early() {
        let now = Instant::now();
        let mut state = LiveState::new(MATCH_ID);
        assert!(!state.apply(LiveMessage::HalftimeEnd { match_id: MATCH_ID }, now));
        state.apply(LiveMessage::HalftimeStart { match_id: MATCH_ID, duration_secs: 90 }, now);
        assert!(state.apply(LiveMessage::HalftimeEnd { match_id: MATCH_ID }, now));
        assert!(state.halftime.is_none());
    }

    #[test]
    fn heartbeat_changes_nothing() {
        let mut state = LiveState::new(MATCH_ID);
        assert!(!state.apply(LiveMessage::Heartbeat, Instant::now()));
    }

    #[test]
    fn connection_status_and_errors() {
        let mut state = LiveState::new(MATCH_ID);
        assert!(state.on_connection(ConnectionStatus::Connecting { attempt: 1 }));
        state.on_socket_error("connection refused");
        assert!(state.error.as_deref().unwrap().contains("connection refused"));

        assert!(state.on_connection(ConnectionStatus::Connected));
        assert!(state.connection.is_connected());
        assert!(state.error.is_none());
        assert!(!state.on_connection(ConnectionStatus::Connected));

        state.on_invalid("expected value at line 1");
        assert_eq!(state.error.as_deref(), Some("received invalid live data from the server"));
    }

    fn rest_match(status: MatchStatus) -> Match {
        Match {
            id: MATCH_ID,
            name: "W2CC Winter Crossover".into(),
            status,
            match_games: vec![MatchGame {
                id: 21,
                match_id: MATCH_ID,
                game_id: 2,
                game_order: 1,
                structure_type: "team".into(),
                game: Game { id: 2, name: "Parkour Warrior".into(), description: None },
                is_live: true,
                start_time: None,
                end_time: None,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn rest_snapshot_bootstraps_empty_state() {
        let mut state = LiveState::new(MATCH_ID);
        assert!(state.on_match_loaded(&rest_match(MatchStatus::Ongoing)));
        assert_eq!(state.match_name.as_deref(), Some("W2CC Winter Crossover"));
        assert_eq!(state.status, MatchStatus::Ongoing);
        let current = state.current_game.as_ref().unwrap();
        assert_eq!((current.match_game_id, current.game_name.as_str()), (21, "Parkour Warrior"));

        assert!(!state.on_match_loaded(&rest_match(MatchStatus::Ongoing)), "repeat is no change");
    }

    #[test]
    fn rest_snapshot_never_overrides_live_data() {
        let now = Instant::now();
        let mut state = LiveState::new(MATCH_ID);
        state.apply(update(MATCH_ID, game(30, &[(3, 5)])), now);

        state.on_match_loaded(&rest_match(MatchStatus::Ongoing));
        assert_eq!(state.current_game.as_ref().unwrap().match_game_id, 30);
    }

    #[test]
    fn rest_snapshot_walks_status_forward() {
        let mut state = LiveState::new(MATCH_ID);
        assert!(state.on_match_loaded(&rest_match(MatchStatus::Finished)));
        assert_eq!(state.status, MatchStatus::Finished);

        state.on_match_loaded(&rest_match(MatchStatus::Ongoing));
        assert_eq!(state.status, MatchStatus::Finished, "REST cannot reopen a finished match");

        let mut other = LiveState::new(MATCH_ID + 1);
        assert!(!other.on_match_loaded(&rest_match(MatchStatus::Ongoing)));
    }

    #[test]
    fn stale_rest_status_is_skipped_after_live_promotion() {
        let now = Instant::now();
        let mut state = LiveState::new(MATCH_ID);
        state.apply(update(MATCH_ID, game(21, &[(3, 5)])), now);
        assert_eq!(state.status, MatchStatus::Ongoing);

        assert!(!state.on_match_loaded(&rest_match(MatchStatus::Preparing)));
        assert_eq!(state.status, MatchStatus::Ongoing);

        assert!(state.on_match_loaded(&rest_match(MatchStatus::Finished)));
        assert_eq!(state.status, MatchStatus::Finished);
    }

    #[test]
    fn huge_countdowns_are_clamped() {
        let now = Instant::now();
        let mut state = LiveState::new(MATCH_ID);

        let vote = LiveMessage::parse(
            r#"{"type":"vote_start","match_id":7,"vote_id":1,
                "options":[{"id":1,"name":"Skywars"}],
                "duration_secs":18446744073709551615}"#,
        )
        .unwrap();
        assert!(state.apply(vote, now));
        assert_eq!(state.vote.as_ref().unwrap().remaining(now), MAX_COUNTDOWN);

        let halftime = LiveMessage::parse(
            r#"{"type":"halftime_start","match_id":7,"duration_secs":18446744073709551615}"#,
        )
        .unwrap();
        assert!(state.apply(halftime, now));
        assert!(state.tick(Instant::now()));
        assert_eq!(state.halftime.unwrap().remaining(now), MAX_COUNTDOWN);
    }

    #[test]
    fn tick_refreshes_only_while_a_vote_runs() {
        let start = Instant::now();
        let mut state = LiveState::new(MATCH_ID);
        assert!(!state.tick(start));

        state.apply(vote_start(4, 30), start);
        assert!(state.tick(start + Duration::from_secs(10)));
        assert!(!state.tick(start + Duration::from_secs(31)), "expired vote needs no refresh");

        state.apply(vote_start(5, 30), start);
        state.apply(LiveMessage::VoteEnd { match_id: MATCH_ID, vote_id: 5, winner_option_id: None }, start);
        assert!(!state.tick(start + Duration::from_secs(10)), "closed vote needs no refresh");
    }

    #[test]
    fn standard_scores_follow_current_game() {
        let now = Instant::now();
        let mut state = LiveState::new(MATCH_ID);
        assert!(state.standard_scores().is_empty());
        state.apply(update(MATCH_ID, game(21, &[(5, 100), (3, 200)])), now);
        assert_eq!(state.standard_scores(), vec![(3, 10000.0), (5, 5000.0)]);
    }
}
