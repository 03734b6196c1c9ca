//! Lobby and instructor operations.

use crate::codes::unique_code;
use crate::rounds;
use crate::{GameContext, GameError, GameResult};
use chrono::{DateTime, Duration, Utc};
use game_core::{
    validate_decisions, validate_settings, validate_team_name, Decisions, GameSession,
    GameSettings, GameType, SessionStatus, TeamCode, TeamState,
};
use persistence::{normalize_code, SessionStore};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{info, warn};

/// Result of a successful join.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct JoinOutcome {
    pub team_name: String,
    pub team_slot: Option<u32>,
}

/// What an instructor's "next round" did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStep {
    Advanced { round: u32 },
    Finished,
}

fn timer_end(session: &GameSession, now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::seconds(i64::from(session.settings.round_duration_secs))
}

/// Advance a running session; past the configured rounds this finishes it.
fn step_round(session: &mut GameSession, rng: &mut ChaCha8Rng) -> GameResult<RoundStep> {
    match session.status {
        SessionStatus::Running => {}
        SessionStatus::Finished => return Err(GameError::GameFinished),
        SessionStatus::Setup => return Err(GameError::NotRunning),
    }
    if session.on_last_round() {
        rounds::finish_game(session, rng);
        return Ok(RoundStep::Finished);
    }
    rounds::advance_round(session, rng);
    Ok(RoundStep::Advanced {
        round: session.current_round,
    })
}

fn team_mut<'a>(session: &'a mut GameSession, team: &str) -> GameResult<&'a mut TeamState> {
    session
        .teams
        .get_mut(team)
        .ok_or_else(|| GameError::TeamNotFound(team.to_string()))
}

impl<S: SessionStore> GameContext<S> {
    /// Shared-secret check for instructor actions.
    pub fn authenticate_admin(&self, password: &str) -> GameResult<()> {
        if password == self.config().admin_password {
            Ok(())
        } else {
            warn!("admin authentication failed");
            Err(GameError::Unauthorized)
        }
    }

    /// Create a session with a fresh join code and `settings.num_teams` team codes.
    ///
    /// Expired sessions are cleaned up first.
    pub fn create_session(
        &mut self,
        game_type: GameType,
        admin_name: &str,
        settings: GameSettings,
        now: DateTime<Utc>,
    ) -> GameResult<GameSession> {
        validate_settings(&settings, self.config.max_teams)?;
        self.cleanup_old_sessions(now)?;
        let len = self.config.join_code_length;
        // Join codes and team codes share one namespace across sessions.
        let mut taken: BTreeSet<String> = BTreeSet::new();
        for s in self.store.list_all()? {
            taken.extend(s.team_codes.into_keys());
            taken.insert(s.join_code);
        }

        loop {
            let join_code = unique_code(&mut self.rng, len, |c| taken.contains(c));
            let mut session = GameSession::new(
                join_code.clone(),
                game_type,
                admin_name.trim().to_string(),
                settings.clone(),
                now,
            );
            let mut used: BTreeSet<String> = BTreeSet::new();
            for slot in 1..=settings.num_teams {
                let code = unique_code(&mut self.rng, len, |c| {
                    used.contains(c) || taken.contains(c) || c == join_code
                });
                used.insert(code.clone());
                session.team_codes.insert(
                    code,
                    TeamCode {
                        team_slot: slot,
                        team_name: None,
                        assigned: false,
                    },
                );
            }
            if self.store.create(&session)? {
                info!(join_code = %session.join_code, game = %game_type, teams = settings.num_teams, "session created");
                return Ok(session);
            }
            taken.insert(join_code);
        }
    }

    /// Locate the session that owns `team_code`.
    pub fn find_team_code(&self, team_code: &str) -> GameResult<Option<(String, TeamCode)>> {
        let code = normalize_code(team_code);
        Ok(self.store.list_all()?.into_iter().find_map(|s| {
            s.team_codes
                .get(&code)
                .cloned()
                .map(|tc| (s.join_code.clone(), tc))
        }))
    }

    /// Add a team to a session, redeeming `team_code` when the session uses codes.
    pub fn join_team(
        &mut self,
        join_code: &str,
        team_name: &str,
        team_code: Option<&str>,
        now: DateTime<Utc>,
    ) -> GameResult<JoinOutcome> {
        let name = validate_team_name(team_name)?;
        self.with_session(join_code, |s, _, cfg| {
            if s.status == SessionStatus::Finished {
                return Err(GameError::GameFinished);
            }
            if s.teams.contains_key(&name) {
                return Err(GameError::DuplicateTeamName(name.clone()));
            }
            let slot = if s.uses_team_codes() {
                let code = team_code
                    .map(normalize_code)
                    .filter(|c| !c.is_empty())
                    .ok_or(GameError::TeamCodeRequired)?;
                let entry = s
                    .team_codes
                    .get_mut(&code)
                    .ok_or(GameError::InvalidTeamCode)?;
                if entry.assigned {
                    return Err(GameError::TeamCodeUsed);
                }
                entry.assigned = true;
                entry.team_name = Some(name.clone());
                let slot = entry.team_slot;
                s.teams
                    .insert(name.clone(), TeamState::new(now, Some(code), Some(slot)));
                Some(slot)
            } else {
                if s.teams.len() >= cfg.max_teams as usize {
                    return Err(GameError::TooManyTeams { max: cfg.max_teams });
                }
                s.teams.insert(name.clone(), TeamState::new(now, None, None));
                None
            };
            info!(join_code = %s.join_code, team = %name, ?slot, "team joined");
            Ok(JoinOutcome {
                team_name: name.clone(),
                team_slot: slot,
            })
        })
    }

    /// Remove a team. Its team code stays assigned.
    pub fn remove_team(&mut self, join_code: &str, team: &str) -> GameResult<()> {
        self.with_session(join_code, |s, _, _| {
            s.teams
                .remove(team)
                .ok_or_else(|| GameError::TeamNotFound(team.to_string()))?;
            info!(join_code = %s.join_code, team, "team removed");
            Ok(())
        })
    }

    pub fn delete_session(&mut self, join_code: &str) -> GameResult<()> {
        if !self.store.delete(join_code)? {
            return Err(GameError::SessionNotFound(normalize_code(join_code)));
        }
        info!(join_code = %normalize_code(join_code), "session deleted");
        Ok(())
    }

    /// Delete sessions created more than `session_cleanup_hours` before `now`.
    pub fn cleanup_old_sessions(&mut self, now: DateTime<Utc>) -> GameResult<usize> {
        let cutoff = now - Duration::hours(i64::from(self.config.session_cleanup_hours));
        let mut removed = 0;
        for s in self.store.list_all()? {
            if s.created_at < cutoff && self.store.delete(&s.join_code)? {
                removed += 1;
            }
        }
        if removed > 0 {
            info!(removed, "old sessions cleaned up");
        }
        Ok(removed)
    }

    /// Save a team's decisions for the current round.
    pub fn submit_decisions(
        &mut self,
        join_code: &str,
        team: &str,
        decisions: Decisions,
    ) -> GameResult<()> {
        self.with_session(join_code, |s, _, _| {
            match s.status {
                SessionStatus::Running => {}
                SessionStatus::Finished => return Err(GameError::GameFinished),
                SessionStatus::Setup => return Err(GameError::NotRunning),
            }
            if s.round_locked {
                return Err(GameError::RoundLocked);
            }
            validate_decisions(s.game_type, &decisions)?;
            let round = s.current_round;
            let t = team_mut(s, team)?;
            if t.has_acted(round) {
                return Err(GameError::DecisionAlreadySaved(round));
            }
            t.decisions = Some(decisions);
            t.decision_saved_round = round;
            t.auto_submitted = false;
            info!(join_code = %s.join_code, round, team, "decision saved");
            Ok(())
        })
    }

    pub fn set_team_ready(&mut self, join_code: &str, team: &str, ready: bool) -> GameResult<()> {
        self.with_session(join_code, |s, _, _| {
            team_mut(s, team)?.ready = ready;
            Ok(())
        })
    }

    pub fn reset_ready(&mut self, join_code: &str) -> GameResult<()> {
        self.with_session(join_code, |s, _, _| {
            for t in s.teams.values_mut() {
                t.ready = false;
            }
            Ok(())
        })
    }

    /// Move a session from setup to round 1 and start its timer.
    pub fn start_game(&mut self, join_code: &str, now: DateTime<Utc>) -> GameResult<()> {
        self.with_session(join_code, |s, rng, cfg| {
            if !s.status.can_transition_to(SessionStatus::Running) {
                return Err(GameError::InvalidTransition {
                    from: s.status,
                    to: SessionStatus::Running,
                });
            }
            if (s.teams.len() as u32) < cfg.min_teams {
                return Err(GameError::NotEnoughTeams { min: cfg.min_teams });
            }
            s.status = SessionStatus::Running;
            rounds::advance_round(s, rng);
            s.round_timer_end = Some(timer_end(s, now));
            info!(join_code = %s.join_code, teams = s.teams.len(), "game started");
            Ok(())
        })
    }

    /// Score the current round without advancing.
    pub fn process_round(&mut self, join_code: &str) -> GameResult<bool> {
        self.with_session(join_code, |s, rng, _| Ok(rounds::process_round(s, rng)))
    }

    /// Open the next round untimed, or finish once the last round is reached.
    pub fn advance_round(&mut self, join_code: &str) -> GameResult<RoundStep> {
        self.with_session(join_code, |s, rng, _| step_round(s, rng))
    }

    pub fn finish_game(&mut self, join_code: &str) -> GameResult<()> {
        self.with_session(join_code, |s, rng, _| {
            if s.status == SessionStatus::Setup {
                return Err(GameError::InvalidTransition {
                    from: s.status,
                    to: SessionStatus::Finished,
                });
            }
            rounds::finish_game(s, rng);
            Ok(())
        })
    }

    /// Advance and restart the timer, or finish once the last round is reached.
    pub fn next_round(&mut self, join_code: &str, now: DateTime<Utc>) -> GameResult<RoundStep> {
        self.with_session(join_code, |s, rng, _| {
            let step = step_round(s, rng)?;
            if let RoundStep::Advanced { .. } = step {
                s.round_timer_end = Some(timer_end(s, now));
            }
            Ok(step)
        })
    }
}
