//! Round timer and lock.
//!
//! Expiry is evaluated lazily against the caller's clock; nothing runs in
//! the background. Reading an expired timer locks the round when the
//! session's `auto_lock` setting is on.

use crate::{GameContext, GameError, GameResult};
use chrono::{DateTime, Duration, Utc};
use game_core::{GameSession, SessionStatus};
use persistence::SessionStore;
use serde::Serialize;
use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TimerState {
    Idle,
    Running { remaining_secs: i64 },
    Expired,
}

pub fn timer_state(session: &GameSession, now: DateTime<Utc>) -> TimerState {
    match session.round_timer_end {
        None => TimerState::Idle,
        Some(end) if now >= end => TimerState::Expired,
        Some(end) => TimerState::Running {
            remaining_secs: (end - now).num_seconds(),
        },
    }
}

/// Whether reading `state` should lock the round.
fn needs_auto_lock(session: &GameSession, state: TimerState) -> bool {
    state == TimerState::Expired
        && session.settings.auto_lock
        && session.status == SessionStatus::Running
        && !session.round_locked
}

/// Format seconds as `MM:SS`.
pub fn format_remaining(secs: i64) -> String {
    let secs = secs.max(0);
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

impl<S: SessionStore> GameContext<S> {
    /// Start the timer for the session's configured round duration.
    pub fn start_round_timer(
        &mut self,
        join_code: &str,
        now: DateTime<Utc>,
    ) -> GameResult<DateTime<Utc>> {
        self.with_session(join_code, |s, _, _| {
            if s.status != SessionStatus::Running {
                return Err(GameError::NotRunning);
            }
            let end = now + Duration::seconds(i64::from(s.settings.round_duration_secs));
            s.round_timer_end = Some(end);
            info!(join_code = %s.join_code, round = s.current_round, %end, "round timer started");
            Ok(end)
        })
    }

    pub fn stop_round_timer(&mut self, join_code: &str) -> GameResult<()> {
        self.with_session(join_code, |s, _, _| {
            s.round_timer_end = None;
            Ok(())
        })
    }

    /// Current timer state, locking the round on expiry when configured.
    pub fn check_round_timer(&mut self, join_code: &str, now: DateTime<Utc>) -> GameResult<TimerState> {
        let session = self.session(join_code)?;
        let state = timer_state(&session, now);
        if needs_auto_lock(&session, state) {
            self.with_session(join_code, |s, _, _| {
                if needs_auto_lock(s, timer_state(s, now)) {
                    s.round_locked = true;
                    info!(join_code = %s.join_code, round = s.current_round, "round auto-locked");
                }
                Ok(())
            })?;
        }
        Ok(state)
    }

    pub fn lock_round(&mut self, join_code: &str) -> GameResult<()> {
        self.set_locked(join_code, true)
    }

    pub fn unlock_round(&mut self, join_code: &str) -> GameResult<()> {
        self.set_locked(join_code, false)
    }

    fn set_locked(&mut self, join_code: &str, locked: bool) -> GameResult<()> {
        self.with_session(join_code, |s, _, _| {
            if s.status == SessionStatus::Finished {
                return Err(GameError::GameFinished);
            }
            s.round_locked = locked;
            info!(join_code = %s.join_code, round = s.current_round, locked, "round lock changed");
            Ok(())
        })
    }
}
