#![deny(warnings)]

//! Core domain models for the classroom economics games.
//!
//! This crate defines the serializable session and team records shared by
//! the scoring, runtime and persistence crates, together with validation
//! helpers used at the submission boundary.

mod config;
mod decisions;
mod environment;
mod results;

pub use config::{EngineConfig, GameDefaults};
pub use decisions::{
    ClimatePolicy, CoinAllocation, CryptoDecisions, Decisions, PolicyDecisions,
    PortfolioAllocation,
};
pub use environment::{
    AssetReturns, CryptoMarket, IndicatorNote, IndicatorNotes, MarketEvent, MarketEventKind,
    MarketIndicators, RoundEnvironment, Scenario, ScenarioKind,
};
pub use results::{
    CountryMetrics, CountryState, CryptoPortfolio, FiscalState, PortfolioValue, RiskLabel,
    TeamResults,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Longest accepted team name, in characters.
pub const MAX_TEAM_NAME_CHARS: usize = 30;

/// Slider bounds for Build-a-Country policy inputs.
pub const POLICY_MIN: f64 = 10.0;
pub const POLICY_MAX: f64 = 50.0;

/// Leverage bounds for Crypto Crash.
pub const LEVERAGE_MIN: f64 = 1.0;
pub const LEVERAGE_MAX: f64 = 5.0;

/// The three game types an instructor can run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    BuildCountry,
    BeatMarket,
    CryptoCrash,
}

impl GameType {
    pub const ALL: [GameType; 3] = [
        GameType::BuildCountry,
        GameType::BeatMarket,
        GameType::CryptoCrash,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GameType::BuildCountry => "build_country",
            GameType::BeatMarket => "beat_market",
            GameType::CryptoCrash => "crypto_crash",
        }
    }

    /// Human-readable title.
    pub fn title(self) -> &'static str {
        match self {
            GameType::BuildCountry => "Build a Country",
            GameType::BeatMarket => "Beat the Market",
            GameType::CryptoCrash => "Crypto Crash or Boom",
        }
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GameType::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownGameType(s.to_string()))
    }
}

/// Session lifecycle. Transitions only move forward: setup, running, finished.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Setup,
    Running,
    Finished,
}

impl SessionStatus {
    pub fn successor(self) -> Option<Self> {
        match self {
            SessionStatus::Setup => Some(SessionStatus::Running),
            SessionStatus::Running => Some(SessionStatus::Finished),
            SessionStatus::Finished => None,
        }
    }

    pub fn can_transition_to(self, next: SessionStatus) -> bool {
        self.successor() == Some(next)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionStatus::Setup => "setup",
            SessionStatus::Running => "running",
            SessionStatus::Finished => "finished",
        })
    }
}

/// Crypto Crash market volatility setting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// Multiplier applied to the sampled price-change range.
    pub fn volatility(self) -> f64 {
        match self {
            Difficulty::Easy => 0.5,
            Difficulty::Medium => 1.0,
            Difficulty::Hard => 1.5,
        }
    }
}

/// Session configuration, fixed at creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameSettings {
    pub num_rounds: u32,
    pub round_duration_secs: u32,
    /// Lock the round automatically once its timer is read as expired.
    pub auto_lock: bool,
    /// Number of team codes generated at creation.
    pub num_teams: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub esg_mode: bool,
}

/// A single-use code binding one team slot to one team.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TeamCode {
    pub team_slot: u32,
    pub team_name: Option<String>,
    /// Flips from false to true exactly once.
    pub assigned: bool,
}

/// Immutable record of one processed round for one team.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundSnapshot {
    pub decisions: Decisions,
    pub results: TeamResults,
    pub score: f64,
}

/// Per-team state nested under a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TeamState {
    pub joined_at: DateTime<Utc>,
    #[serde(default)]
    pub ready: bool,
    #[serde(default)]
    pub team_code: Option<String>,
    #[serde(default)]
    pub team_slot: Option<u32>,
    /// Latest decisions, submitted or carried over.
    #[serde(default)]
    pub decisions: Option<Decisions>,
    /// Round for which `decisions` were recorded.
    #[serde(default)]
    pub decision_saved_round: u32,
    #[serde(default)]
    pub auto_submitted: bool,
    /// Outcome of the most recently processed round.
    #[serde(default)]
    pub results: Option<TeamResults>,
    #[serde(default)]
    pub score: Option<f64>,
    /// Append-only, keyed by round number (>= 1).
    #[serde(default)]
    pub round_history: BTreeMap<u32, RoundSnapshot>,
}

impl TeamState {
    pub fn new(joined_at: DateTime<Utc>, team_code: Option<String>, team_slot: Option<u32>) -> Self {
        Self {
            joined_at,
            ready: false,
            team_code,
            team_slot,
            decisions: None,
            decision_saved_round: 0,
            auto_submitted: false,
            results: None,
            score: None,
            round_history: BTreeMap::new(),
        }
    }

    /// Whether the team has a decision recorded for `round`.
    pub fn has_acted(&self, round: u32) -> bool {
        self.decision_saved_round == round
    }
}

/// Transient per-session scratch data.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Last round whose scoring has been applied.
    #[serde(default)]
    pub processed_round: Option<u32>,
    #[serde(default)]
    pub environment: Option<RoundEnvironment>,
    /// Crypto asset returns of the last processed round.
    #[serde(default)]
    pub asset_returns: Option<AssetReturns>,
    #[serde(default)]
    pub market_risk: Option<f64>,
}

/// One instructor-created game, keyed by its join code.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    pub join_code: String,
    pub game_type: GameType,
    pub admin_name: String,
    pub status: SessionStatus,
    pub settings: GameSettings,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub teams: BTreeMap<String, TeamState>,
    #[serde(default)]
    pub team_codes: BTreeMap<String, TeamCode>,
    pub current_round: u32,
    pub round_locked: bool,
    pub round_timer_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub game_state: GameState,
}

impl GameSession {
    pub fn new(
        join_code: String,
        game_type: GameType,
        admin_name: String,
        settings: GameSettings,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            join_code,
            game_type,
            admin_name,
            status: SessionStatus::Setup,
            settings,
            created_at,
            teams: BTreeMap::new(),
            team_codes: BTreeMap::new(),
            current_round: 0,
            round_locked: false,
            round_timer_end: None,
            game_state: GameState::default(),
        }
    }

    /// True once the configured number of rounds has been reached.
    pub fn on_last_round(&self) -> bool {
        self.current_round >= self.settings.num_rounds
    }

    pub fn uses_team_codes(&self) -> bool {
        !self.team_codes.is_empty()
    }
}

/// Validation errors raised at the submission boundary.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("unknown game type: {0}")]
    UnknownGameType(String),
    #[error("number of rounds must be at least 1")]
    NoRounds,
    #[error("round duration must be at least 1 second")]
    NoDuration,
    #[error("team count {requested} outside [1, {max}]")]
    TeamCount { requested: u32, max: u32 },
    #[error("team name must not be empty")]
    EmptyTeamName,
    #[error("team name longer than 30 characters")]
    TeamNameTooLong,
    #[error("decisions are for {got}, game is {expected}")]
    WrongGameType { expected: GameType, got: GameType },
    #[error("{0} must be a finite number")]
    NonFinite(&'static str),
    #[error("{field} = {value} outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// Validate session settings against the engine's team limit.
pub fn validate_settings(settings: &GameSettings, max_teams: u32) -> Result<(), ValidationError> {
    if settings.num_rounds == 0 {
        return Err(ValidationError::NoRounds);
    }
    if settings.round_duration_secs == 0 {
        return Err(ValidationError::NoDuration);
    }
    if settings.num_teams == 0 || settings.num_teams > max_teams {
        return Err(ValidationError::TeamCount {
            requested: settings.num_teams,
            max: max_teams,
        });
    }
    Ok(())
}

/// Trim and check a team name, returning the name to store.
pub fn validate_team_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyTeamName);
    }
    if trimmed.chars().count() > MAX_TEAM_NAME_CHARS {
        return Err(ValidationError::TeamNameTooLong);
    }
    Ok(trimmed.to_string())
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFinite(field));
    }
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

fn check_allocation(fields: [(&'static str, f64); 4]) -> Result<(), ValidationError> {
    for (field, value) in fields {
        check_range(field, value, 0.0, 100.0)?;
    }
    Ok(())
}

/// Validate a submitted decision for a game of `game_type`.
///
/// Allocations need not sum to 100; scoring rescales them.
pub fn validate_decisions(game_type: GameType, decisions: &Decisions) -> Result<(), ValidationError> {
    if decisions.game_type() != game_type {
        return Err(ValidationError::WrongGameType {
            expected: game_type,
            got: decisions.game_type(),
        });
    }
    match decisions {
        Decisions::BuildCountry(p) => {
            check_range("tax_rate", p.tax_rate, POLICY_MIN, POLICY_MAX)?;
            check_range("education_spending", p.education_spending, POLICY_MIN, POLICY_MAX)?;
            check_range(
                "infrastructure_spending",
                p.infrastructure_spending,
                POLICY_MIN,
                POLICY_MAX,
            )?;
        }
        Decisions::BeatMarket(a) => check_allocation([
            ("cash_pct", a.cash_pct),
            ("bonds_pct", a.bonds_pct),
            ("shares_pct", a.shares_pct),
            ("crypto_pct", a.crypto_pct),
        ])?,
        Decisions::CryptoCrash(c) => {
            let a = &c.allocations;
            check_allocation([
                ("btc", a.btc),
                ("eth", a.eth),
                ("doge", a.doge),
                ("stable", a.stable),
            ])?;
            check_range("leverage", c.leverage, LEVERAGE_MIN, LEVERAGE_MAX)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn settings() -> GameSettings {
        GameSettings {
            num_rounds: 3,
            round_duration_secs: 180,
            auto_lock: true,
            num_teams: 4,
            difficulty: Difficulty::Medium,
            esg_mode: false,
        }
    }

    fn session() -> GameSession {
        let t0 = Utc.with_ymd_and_hms(2024, 9, 2, 9, 0, 0).unwrap();
        GameSession::new(
            "ABC123".to_string(),
            GameType::BuildCountry,
            "Ms. Rivera".to_string(),
            settings(),
            t0,
        )
    }

    #[test]
    fn session_json_roundtrip_keeps_history_keys() {
        let mut s = session();
        let mut team = TeamState::new(s.created_at, None, None);
        team.round_history.insert(
            1,
            RoundSnapshot {
                decisions: Decisions::default_for(GameType::BuildCountry),
                results: TeamResults::initial(GameType::BuildCountry),
                score: 42.0,
            },
        );
        team.decisions = Some(Decisions::default_for(GameType::BuildCountry));
        team.results = Some(TeamResults::initial(GameType::BuildCountry));
        team.score = Some(42.0);
        s.teams.insert("Econ Owls".to_string(), team);
        s.game_state.processed_round = Some(1);
        s.game_state.environment = Some(RoundEnvironment::Scenario(Scenario {
            kind: ScenarioKind::TechBoom,
            name: "Tech Boom".to_string(),
            description: "Startups everywhere.".to_string(),
            hint: "Invest in skills.".to_string(),
        }));

        let json = serde_json::to_string_pretty(&s).unwrap();
        assert!(json.contains("\"1\""));
        assert!(json.contains("\"build_country\""));
        let back: GameSession = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn every_environment_variant_roundtrips() {
        let envs = [
            RoundEnvironment::Scenario(Scenario {
                kind: ScenarioKind::Recession,
                name: "Recession".to_string(),
                description: String::new(),
                hint: String::new(),
            }),
            RoundEnvironment::MarketEvent(MarketEvent {
                kind: MarketEventKind::RateHike,
                name: "Rate Hike".to_string(),
                description: String::new(),
                hint: String::new(),
            }),
            RoundEnvironment::Crypto(CryptoMarket {
                indicators: MarketIndicators::default(),
                story: "Calm seas.".to_string(),
                notes: IndicatorNotes::default(),
            }),
        ];
        for env in envs {
            let json = serde_json::to_string(&env).unwrap();
            let back: RoundEnvironment = serde_json::from_str(&json).unwrap();
            assert_eq!(back, env);
        }
    }

    #[test]
    fn every_decision_and_result_variant_roundtrips() {
        for g in GameType::ALL {
            let d = Decisions::default_for(g);
            let back: Decisions = serde_json::from_str(&serde_json::to_string(&d).unwrap()).unwrap();
            assert_eq!(back, d);
            let r = TeamResults::initial(g);
            let back: TeamResults = serde_json::from_str(&serde_json::to_string(&r).unwrap()).unwrap();
            assert_eq!(back, r);
        }
    }

    #[test]
    fn status_only_moves_forward() {
        use SessionStatus::*;
        assert!(Setup.can_transition_to(Running));
        assert!(Running.can_transition_to(Finished));
        assert!(!Setup.can_transition_to(Finished));
        assert!(!Running.can_transition_to(Setup));
        assert!(!Finished.can_transition_to(Running));
        assert!(!Finished.can_transition_to(Finished));
    }

    #[test]
    fn game_type_parses_wire_names() {
        for g in GameType::ALL {
            assert_eq!(g.as_str().parse::<GameType>().unwrap(), g);
        }
        assert_eq!(
            "poker".parse::<GameType>(),
            Err(ValidationError::UnknownGameType("poker".to_string()))
        );
    }

    #[test]
    fn settings_validation() {
        assert!(validate_settings(&settings(), 8).is_ok());
        let mut s = settings();
        s.num_rounds = 0;
        assert_eq!(validate_settings(&s, 8), Err(ValidationError::NoRounds));
        let mut s = settings();
        s.num_teams = 9;
        assert!(matches!(
            validate_settings(&s, 8),
            Err(ValidationError::TeamCount { requested: 9, .. })
        ));
    }

    #[test]
    fn team_names_are_trimmed_and_bounded() {
        assert_eq!(validate_team_name("  Owls ").unwrap(), "Owls");
        assert_eq!(validate_team_name("   "), Err(ValidationError::EmptyTeamName));
        let long = "x".repeat(MAX_TEAM_NAME_CHARS + 1);
        assert_eq!(validate_team_name(&long), Err(ValidationError::TeamNameTooLong));
    }

    #[test]
    fn decisions_must_match_game_type() {
        let d = Decisions::default_for(GameType::BeatMarket);
        assert!(matches!(
            validate_decisions(GameType::CryptoCrash, &d),
            Err(ValidationError::WrongGameType { .. })
        ));
    }

    #[test]
    fn non_finite_allocation_rejected() {
        let d = Decisions::BeatMarket(PortfolioAllocation::from_array([f64::NAN, 25.0, 25.0, 25.0]));
        assert_eq!(
            validate_decisions(GameType::BeatMarket, &d),
            Err(ValidationError::NonFinite("cash_pct"))
        );
    }

    #[test]
    fn leverage_bounds_checked() {
        let d = Decisions::CryptoCrash(CryptoDecisions {
            allocations: CoinAllocation::default(),
            leverage: 7.0,
        });
        assert!(matches!(
            validate_decisions(GameType::CryptoCrash, &d),
            Err(ValidationError::OutOfRange { field: "leverage", .. })
        ));
    }

    proptest! {
        #[test]
        fn policy_sliders_in_range_accepted(tax in 10.0f64..=50.0, edu in 10.0f64..=50.0, infra in 10.0f64..=50.0) {
            let d = Decisions::BuildCountry(PolicyDecisions {
                tax_rate: tax,
                education_spending: edu,
                infrastructure_spending: infra,
                climate_policy: ClimatePolicy::Strong,
            });
            prop_assert!(validate_decisions(GameType::BuildCountry, &d).is_ok());
        }

        #[test]
        fn policy_sliders_below_range_rejected(tax in -100.0f64..9.99) {
            let d = Decisions::BuildCountry(PolicyDecisions { tax_rate: tax, ..Default::default() });
            prop_assert!(validate_decisions(GameType::BuildCountry, &d).is_err());
        }
    }
}
