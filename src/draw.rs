use crate::state::live::LiveState;
use std::fmt::Write as _;
use std::io::{self, Write};
use tokio::time::{Duration, Instant};

pub fn draw<W: Write>(out: &mut W, state: &LiveState, now: Instant) -> io::Result<()> {
    out.write_all(render(state, now).as_bytes())?;
    out.flush()
}

/// Plain-text snapshot of the live view.
pub fn render(state: &LiveState, now: Instant) -> String {
    let mut s = String::new();

    let title = state.match_name.as_deref().unwrap_or("Live match");
    let _ = writeln!(
        s,
        "== {title} [{}] ({})",
        state.status.label(),
        state.connection.label()
    );
    if let Some(at) = state.last_update_at {
        let _ = writeln!(s, "   last update {}", at.format("%H:%M:%S"));
    }
    if let Some(error) = &state.error {
        let _ = writeln!(s, "!! {error}");
    }

    if state.current_game.is_none() && state.leaderboard.is_empty() {
        s.push_str("   waiting for live data...\n");
        return s;
    }

    if let Some(halftime) = &state.halftime {
        let _ = writeln!(s, "-- Halftime: {} left", format_countdown(halftime.remaining(now)));
    }

    if !state.leaderboard.is_empty() {
        s.push_str("-- Leaderboard\n");
        for team in &state.leaderboard {
            let _ = writeln!(s, "{:>4}. {:<24} {:>8}", team.rank, team.team_name, team.total_points);
        }
    }

    if let Some(game) = &state.current_game {
        let finished = if state.finished_games.contains(&game.match_game_id) { " (finished)" } else { "" };
        let _ = writeln!(s, "-- Current game: {}{finished}", game.game_name);
        let standard = state.standard_scores();
        for (team, (_, std_score)) in game.teams.iter().zip(standard.iter()) {
            let _ = writeln!(
                s,
                "      {:<24} {:>8}  ({:.2} std)",
                team.team_name, team.score, std_score
            );
        }
    }

    if let Some(event) = &state.last_event {
        let _ = writeln!(s, "-- Latest: {}", event.description);
    }

    if let Some(vote) = &state.vote {
        if vote.closed {
            let winner = vote.winner.and_then(|id| vote.option_name(id)).unwrap_or("no winner");
            let _ = writeln!(s, "-- Vote closed: {winner}");
        } else {
            let _ = writeln!(s, "-- Vote ({} left)", format_countdown(vote.remaining(now)));
        }
        for option in &vote.options {
            let votes = vote.tallies.get(&option.id).copied().unwrap_or(0);
            let _ = writeln!(s, "      {:<24} {:>5}", option.name, votes);
        }
    }

    s
}

/// `mm:ss`, rounding partial seconds up so the display never shows 00:00
/// while time remains.
pub fn format_countdown(remaining: Duration) -> String {
    let secs = remaining.as_millis().div_ceil(1000) as u64;
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
