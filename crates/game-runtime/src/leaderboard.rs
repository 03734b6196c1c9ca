//! Live ranking read by the scoreboard and team views.

use game_core::GameSession;
use serde::Serialize;
use std::cmp::Ordering;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub team: String,
    pub score: f64,
    /// Decision recorded for the current round.
    pub acted: bool,
    pub auto_submitted: bool,
    pub ready: bool,
}

/// Teams ranked by score, highest first; ties broken by name.
///
/// Teams without a processed round carry the game's baseline score.
pub fn leaderboard(session: &GameSession) -> Vec<LeaderboardEntry> {
    let baseline = game_econ::baseline_score(session.game_type);
    let mut rows: Vec<(&String, f64)> = session
        .teams
        .iter()
        .map(|(name, t)| (name, t.score.unwrap_or(baseline)))
        .collect();
    rows.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });
    rows.into_iter()
        .enumerate()
        .map(|(i, (name, score))| {
            let t = &session.teams[name];
            LeaderboardEntry {
                rank: i + 1,
                team: name.clone(),
                score,
                acted: t.has_acted(session.current_round),
                auto_submitted: t.auto_submitted,
                ready: t.ready,
            }
        })
        .collect()
}

pub fn ready_count(session: &GameSession) -> usize {
    session.teams.values().filter(|t| t.ready).count()
}

/// False for a session without teams.
pub fn all_ready(session: &GameSession) -> bool {
    !session.teams.is_empty() && session.teams.values().all(|t| t.ready)
}
