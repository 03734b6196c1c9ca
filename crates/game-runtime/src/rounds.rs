//! Round processing and advancement.
//!
//! These functions mutate a session in place and never touch storage. The
//! `processed_round` marker makes [`process_round`] idempotent per round, and
//! history entries are write-once, so re-running any step after a retry or a
//! duplicate click leaves the session unchanged.

use crate::environment;
use game_core::{
    Decisions, GameSession, GameType, RoundEnvironment, RoundSnapshot, SessionStatus,
    TeamResults,
};
use game_econ::crypto::RoundMarket;
use rand::Rng;
use tracing::{debug, info};

/// Carry forward decisions for every team that has not acted this round.
///
/// Returns the names of the teams that were auto-submitted.
pub fn auto_submit_missing(session: &mut GameSession) -> Vec<String> {
    let round = session.current_round;
    let game_type = session.game_type;
    let mut filled = Vec::new();
    for (name, team) in session.teams.iter_mut() {
        if team.has_acted(round) {
            continue;
        }
        let carried = team
            .decisions
            .take()
            .filter(|d| d.game_type() == game_type)
            .unwrap_or_else(|| Decisions::default_for(game_type));
        team.decisions = Some(carried);
        team.decision_saved_round = round;
        team.auto_submitted = true;
        filled.push(name.clone());
    }
    if !filled.is_empty() {
        debug!(join_code = %session.join_code, round, teams = ?filled, "auto-submitted decisions");
    }
    filled
}

/// Score every team for `current_round`, exactly once per round.
///
/// Returns false when the round was already processed or is the pre-game
/// round 0. A crypto round without indicators gets them drawn here.
pub fn process_round<R: Rng + ?Sized>(session: &mut GameSession, rng: &mut R) -> bool {
    let round = session.current_round;
    if round == 0 || session.game_state.processed_round == Some(round) {
        return false;
    }

    let existing = session
        .game_state
        .environment
        .as_ref()
        .and_then(|e| e.crypto())
        .map(|m| RoundMarket::from_indicators(&m.indicators));
    let crypto_round = match existing {
        Some(m) => Some(m),
        None if session.game_type == GameType::CryptoCrash => {
            let market = environment::crypto_market(environment::draw_indicators(
                rng,
                session.settings.difficulty,
            ));
            let round_market = RoundMarket::from_indicators(&market.indicators);
            session.game_state.environment = Some(RoundEnvironment::Crypto(market));
            Some(round_market)
        }
        None => None,
    };
    if let Some(m) = &crypto_round {
        session.game_state.asset_returns = Some(m.returns.clone());
        session.game_state.market_risk = Some((m.market_risk * 10.0).round() / 10.0);
    }

    let game_type = session.game_type;
    let env = session.game_state.environment.as_ref();
    for team in session.teams.values_mut() {
        let decisions = team
            .decisions
            .clone()
            .filter(|d| d.game_type() == game_type)
            .unwrap_or_else(|| Decisions::default_for(game_type));
        let out = game_econ::score_round(&decisions, env, team.results.as_ref());
        team.results = Some(out.results);
        team.score = Some(out.score);
    }
    session.game_state.processed_round = Some(round);
    info!(join_code = %session.join_code, round, teams = session.teams.len(), "round processed");
    true
}

/// Record each team's outcome for `current_round` in its history.
///
/// Round 0 is never recorded and existing entries are never overwritten.
/// Returns the number of entries written.
pub fn snapshot_round(session: &mut GameSession) -> usize {
    let round = session.current_round;
    if round == 0 {
        return 0;
    }
    let game_type = session.game_type;
    let mut written = 0;
    for team in session.teams.values_mut() {
        if team.round_history.contains_key(&round) {
            continue;
        }
        let snapshot = RoundSnapshot {
            decisions: team
                .decisions
                .clone()
                .unwrap_or_else(|| Decisions::default_for(game_type)),
            results: team
                .results
                .clone()
                .unwrap_or_else(|| TeamResults::initial(game_type)),
            score: team
                .score
                .unwrap_or_else(|| game_econ::baseline_score(game_type)),
        };
        team.round_history.insert(round, snapshot);
        written += 1;
    }
    written
}

/// Close the current round and open the next one.
///
/// Auto-submits missing decisions, processes and snapshots the round, draws
/// the next environment, then increments the round with the lock, the
/// timer and every team's ready flag cleared.
pub fn advance_round<R: Rng + ?Sized>(session: &mut GameSession, rng: &mut R) {
    auto_submit_missing(session);
    process_round(session, rng);
    snapshot_round(session);

    session.game_state.environment = Some(environment::generate(
        rng,
        session.game_type,
        session.settings.difficulty,
    ));
    session.current_round += 1;
    session.round_locked = false;
    session.round_timer_end = None;
    for team in session.teams.values_mut() {
        team.ready = false;
    }
    info!(
        join_code = %session.join_code,
        round = session.current_round,
        headline = session.game_state.environment.as_ref().map(|e| e.headline()).unwrap_or_default(),
        "round advanced"
    );
}

/// Score the last active round and close the game.
///
/// The round counter and environment are left as they are. Calling this on
/// a finished game is a no-op.
pub fn finish_game<R: Rng + ?Sized>(session: &mut GameSession, rng: &mut R) {
    if session.status == SessionStatus::Finished {
        return;
    }
    auto_submit_missing(session);
    process_round(session, rng);
    snapshot_round(session);
    session.status = SessionStatus::Finished;
    session.round_locked = true;
    session.round_timer_end = None;
    info!(join_code = %session.join_code, round = session.current_round, "game finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use game_core::{EngineConfig, PolicyDecisions, PortfolioAllocation, TeamState};
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn session(game_type: GameType, teams: &[&str]) -> GameSession {
        let now = Utc.with_ymd_and_hms(2024, 5, 2, 10, 0, 0).unwrap();
        let mut s = GameSession::new(
            "QWE123".into(),
            game_type,
            "Admin".into(),
            EngineConfig::default().default_settings(game_type, 4),
            now,
        );
        for t in teams {
            s.teams.insert(t.to_string(), TeamState::new(now, None, None));
        }
        s.status = SessionStatus::Running;
        s
    }

    #[test]
    fn round_zero_is_never_processed_or_recorded() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut s = session(GameType::BuildCountry, &["A", "B"]);
        advance_round(&mut s, &mut rng);
        assert_eq!(s.current_round, 1);
        assert_eq!(s.game_state.processed_round, None);
        assert!(s.teams.values().all(|t| t.round_history.is_empty()));
        assert!(s.game_state.environment.as_ref().and_then(|e| e.scenario()).is_some());
    }

    #[test]
    fn history_is_written_once_per_round() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut s = session(GameType::BeatMarket, &["A", "B"]);
        advance_round(&mut s, &mut rng);
        advance_round(&mut s, &mut rng);
        for t in s.teams.values() {
            assert_eq!(t.round_history.keys().copied().collect::<Vec<_>>(), vec![1]);
        }
        let first = s.teams["A"].round_history[&1].clone();

        // Re-running the snapshot for round 1 must not overwrite it.
        s.current_round = 1;
        s.teams.get_mut("A").unwrap().score = Some(-999.0);
        assert_eq!(snapshot_round(&mut s), 0);
        assert_eq!(s.teams["A"].round_history[&1], first);
    }

    #[test]
    fn process_round_is_idempotent() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut s = session(GameType::CryptoCrash, &["A"]);
        advance_round(&mut s, &mut rng);
        auto_submit_missing(&mut s);
        assert!(process_round(&mut s, &mut rng));
        let after_first = s.clone();
        assert!(!process_round(&mut s, &mut rng));
        assert_eq!(s, after_first);
    }

    #[test]
    fn crypto_round_without_environment_draws_indicators() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut s = session(GameType::CryptoCrash, &["A"]);
        s.current_round = 1;
        assert!(process_round(&mut s, &mut rng));
        assert!(s.game_state.environment.as_ref().and_then(|e| e.crypto()).is_some());
        assert!(s.game_state.asset_returns.is_some());
        assert!(s.game_state.market_risk.is_some());
    }

    #[test]
    fn auto_submit_carries_last_decision() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut s = session(GameType::BuildCountry, &["A", "B"]);
        advance_round(&mut s, &mut rng);
        let bold = Decisions::BuildCountry(PolicyDecisions {
            tax_rate: 45.0,
            ..Default::default()
        });
        {
            let a = s.teams.get_mut("A").unwrap();
            a.decisions = Some(bold.clone());
            a.decision_saved_round = 1;
        }
        advance_round(&mut s, &mut rng);
        assert!(!s.teams["A"].auto_submitted);
        assert!(s.teams["B"].auto_submitted);
        assert_eq!(
            s.teams["B"].round_history[&1].decisions,
            Decisions::default_for(GameType::BuildCountry)
        );

        // Round 2: A did not act, so its round-1 choice is carried forward.
        let filled = auto_submit_missing(&mut s);
        assert_eq!(filled, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(s.teams["A"].decisions, Some(bold));
        assert!(s.teams["A"].auto_submitted);
    }

    #[test]
    fn advancing_resets_lock_timer_and_ready() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let mut s = session(GameType::BeatMarket, &["A"]);
        s.round_locked = true;
        s.round_timer_end = Some(Utc.with_ymd_and_hms(2024, 5, 2, 10, 3, 0).unwrap());
        s.teams.get_mut("A").unwrap().ready = true;
        advance_round(&mut s, &mut rng);
        assert!(!s.round_locked);
        assert!(s.round_timer_end.is_none());
        assert!(!s.teams["A"].ready);
    }

    #[test]
    fn finish_scores_last_round_without_advancing() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut s = session(GameType::BeatMarket, &["A"]);
        advance_round(&mut s, &mut rng);
        s.teams.get_mut("A").unwrap().decisions =
            Some(Decisions::BeatMarket(PortfolioAllocation::from_array([0.0, 0.0, 100.0, 0.0])));
        s.teams.get_mut("A").unwrap().decision_saved_round = 1;
        let env = s.game_state.environment.clone();
        finish_game(&mut s, &mut rng);
        assert_eq!(s.status, SessionStatus::Finished);
        assert_eq!(s.current_round, 1);
        assert!(s.round_locked);
        assert_eq!(s.game_state.environment, env);
        assert_eq!(s.game_state.processed_round, Some(1));
        assert!(s.teams["A"].round_history.contains_key(&1));

        let done = s.clone();
        finish_game(&mut s, &mut rng);
        assert_eq!(s, done);
    }

    proptest! {
        #[test]
        fn repeated_advances_write_one_entry_per_round(rounds in 1u32..6, seed in any::<u64>()) {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut s = session(GameType::CryptoCrash, &["A", "B", "C"]);
            for _ in 0..=rounds {
                advance_round(&mut s, &mut rng);
            }
            for t in s.teams.values() {
                let keys: Vec<u32> = t.round_history.keys().copied().collect();
                prop_assert_eq!(keys, (1..=rounds).collect::<Vec<_>>());
                prop_assert!(t.score.is_some_and(|x| x > 0.0));
            }
        }
    }
}
