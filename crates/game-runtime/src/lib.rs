#![deny(warnings)]

//! Session runtime for the classroom games.
//!
//! [`GameContext`] owns the session store, the engine configuration and the
//! random source. Every mutating operation is one read-modify-write of a
//! single session record; the pure round logic in [`rounds`] operates on a
//! `&mut GameSession` and never touches the store itself.

pub mod codes;
pub mod environment;
mod error;
pub mod leaderboard;
mod lobby;
pub mod report;
pub mod rounds;
pub mod timer;

pub use error::{GameError, GameResult};
pub use leaderboard::{leaderboard, LeaderboardEntry};
pub use lobby::{JoinOutcome, RoundStep};
pub use report::{build_report, Report};
pub use timer::TimerState;

use game_core::{EngineConfig, GameSession};
use persistence::{normalize_code, SessionStore};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Session-scoped engine state passed to every operation.
pub struct GameContext<S: SessionStore> {
    store: S,
    config: EngineConfig,
    rng: ChaCha8Rng,
}

impl<S: SessionStore> GameContext<S> {
    pub fn new(store: S, config: EngineConfig, seed: u64) -> Self {
        Self {
            store,
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fetch a session by join code.
    pub fn session(&self, join_code: &str) -> GameResult<GameSession> {
        self.store
            .get(join_code)?
            .ok_or_else(|| GameError::SessionNotFound(normalize_code(join_code)))
    }

    /// Read-modify-write of one session.
    ///
    /// `f` works on a draft; the draft replaces the stored record only when
    /// `f` succeeds, so a rejected operation leaves the session unchanged.
    pub(crate) fn with_session<R>(
        &mut self,
        join_code: &str,
        f: impl FnOnce(&mut GameSession, &mut ChaCha8Rng, &EngineConfig) -> GameResult<R>,
    ) -> GameResult<R> {
        let Self { store, config, rng } = self;
        let out = store.update(join_code, |stored| {
            let mut draft = stored.clone();
            let res = f(&mut draft, rng, config);
            if res.is_ok() {
                *stored = draft;
            }
            res
        })?;
        out.unwrap_or_else(|| Err(GameError::SessionNotFound(normalize_code(join_code))))
    }
}
