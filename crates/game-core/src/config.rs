//! Engine configuration loaded by the binaries.

use crate::{GameSettings, GameType};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Per-game-type defaults used when an instructor does not override them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameDefaults {
    pub num_rounds: u32,
    pub round_duration_secs: u32,
}

impl Default for GameDefaults {
    fn default() -> Self {
        Self {
            num_rounds: 3,
            round_duration_secs: 180,
        }
    }
}

/// Engine-wide settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Shared secret checked before an instructor may create or control a game.
    pub admin_password: String,
    pub build_country: GameDefaults,
    pub beat_market: GameDefaults,
    pub crypto_crash: GameDefaults,
    pub auto_lock_default: bool,
    pub max_teams: u32,
    pub min_teams: u32,
    /// Directory holding the JSON session store.
    pub data_directory: PathBuf,
    /// Sessions older than this are removed by cleanup.
    pub session_cleanup_hours: u32,
    pub join_code_length: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            admin_password: "ASDF".to_string(),
            build_country: GameDefaults::default(),
            beat_market: GameDefaults::default(),
            crypto_crash: GameDefaults::default(),
            auto_lock_default: true,
            max_teams: 8,
            min_teams: 1,
            data_directory: PathBuf::from("/tmp/economics_games_data"),
            session_cleanup_hours: 24,
            join_code_length: 6,
        }
    }
}

impl EngineConfig {
    pub fn defaults_for(&self, game_type: GameType) -> &GameDefaults {
        match game_type {
            GameType::BuildCountry => &self.build_country,
            GameType::BeatMarket => &self.beat_market,
            GameType::CryptoCrash => &self.crypto_crash,
        }
    }

    /// Settings for a new session of `game_type` with `num_teams` team codes.
    pub fn default_settings(&self, game_type: GameType, num_teams: u32) -> GameSettings {
        let d = self.defaults_for(game_type);
        GameSettings {
            num_rounds: d.num_rounds,
            round_duration_secs: d.round_duration_secs,
            auto_lock: self.auto_lock_default,
            num_teams,
            difficulty: Default::default(),
            esg_mode: false,
        }
    }
}
