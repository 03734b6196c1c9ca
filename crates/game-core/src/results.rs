//! Result state produced by round processing.

use crate::decisions::CoinAllocation;
use crate::GameType;
use serde::{Deserialize, Serialize};

/// Build-a-Country outcome metrics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CountryMetrics {
    /// GDP index, clamped to [60, 200].
    pub gdp: f64,
    /// Employment rate, clamped to [40, 100].
    pub employment: f64,
    /// Inequality index, clamped to [0, 100] (lower is better).
    pub inequality: f64,
    /// Public approval, clamped to [0, 100].
    pub approval: f64,
}

impl Default for CountryMetrics {
    fn default() -> Self {
        Self {
            gdp: 100.0,
            employment: 75.0,
            inequality: 50.0,
            approval: 50.0,
        }
    }
}

/// Public finances, all expressed as percent of GDP.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FiscalState {
    /// Outstanding public debt, clamped to [0, 250].
    pub debt_pct_gdp: f64,
    /// Deficit of the last processed round (negative for a surplus).
    pub deficit_pct_gdp: f64,
    pub spending_pct_gdp: f64,
    pub revenue_pct_gdp: f64,
}

impl Default for FiscalState {
    fn default() -> Self {
        Self {
            debt_pct_gdp: 60.0,
            deficit_pct_gdp: 0.0,
            spending_pct_gdp: 0.0,
            revenue_pct_gdp: 0.0,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CountryState {
    pub metrics: CountryMetrics,
    pub fiscal: FiscalState,
}

/// Beat-the-Market portfolio state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PortfolioValue {
    /// Portfolio value in dollars.
    pub value: f64,
    /// Return of the last processed round, in percent.
    pub returns: f64,
    /// Risk score in [0, 100].
    pub risk: f64,
    /// ESG rating in [0, 100]; carried for display when ESG mode is on.
    pub esg: f64,
}

impl Default for PortfolioValue {
    fn default() -> Self {
        Self {
            value: 1_000_000.0,
            returns: 0.0,
            risk: 50.0,
            esg: 50.0,
        }
    }
}

/// Display bucket for crypto risk exposure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLabel {
    #[default]
    Low,
    Medium,
    High,
    Extreme,
}

impl RiskLabel {
    pub fn from_exposure(exposure: f64) -> Self {
        if exposure < 25.0 {
            RiskLabel::Low
        } else if exposure < 55.0 {
            RiskLabel::Medium
        } else if exposure < 80.0 {
            RiskLabel::High
        } else {
            RiskLabel::Extreme
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLabel::Low => "Low",
            RiskLabel::Medium => "Medium",
            RiskLabel::High => "High",
            RiskLabel::Extreme => "Extreme",
        }
    }
}

/// Crypto Crash account state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CryptoPortfolio {
    pub equity: f64,
    /// Leveraged return of the last processed round, in percent.
    pub last_return_pct: f64,
    pub total_return_pct: f64,
    /// Normalised allocation that was applied.
    pub allocations: CoinAllocation,
    pub leverage: f64,
    pub risk_exposure: f64,
    pub risk_label: RiskLabel,
    pub liquidations: u32,
    /// Whether the last processed round ended in liquidation.
    pub liquidated: bool,
    pub explain: String,
    pub outcome: String,
}

impl Default for CryptoPortfolio {
    fn default() -> Self {
        Self {
            equity: 1000.0,
            last_return_pct: 0.0,
            total_return_pct: 0.0,
            allocations: CoinAllocation::default(),
            leverage: 1.0,
            risk_exposure: 0.0,
            risk_label: RiskLabel::Low,
            liquidations: 0,
            liquidated: false,
            explain: String::new(),
            outcome: String::new(),
        }
    }
}

/// Game-specific result state of a team, tagged by game type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "game", rename_all = "snake_case")]
pub enum TeamResults {
    BuildCountry(CountryState),
    BeatMarket(PortfolioValue),
    CryptoCrash(CryptoPortfolio),
}

impl TeamResults {
    /// Starting state before any round has been processed.
    pub fn initial(game_type: GameType) -> Self {
        match game_type {
            GameType::BuildCountry => TeamResults::BuildCountry(CountryState::default()),
            GameType::BeatMarket => TeamResults::BeatMarket(PortfolioValue::default()),
            GameType::CryptoCrash => TeamResults::CryptoCrash(CryptoPortfolio::default()),
        }
    }

    pub fn game_type(&self) -> GameType {
        match self {
            TeamResults::BuildCountry(_) => GameType::BuildCountry,
            TeamResults::BeatMarket(_) => GameType::BeatMarket,
            TeamResults::CryptoCrash(_) => GameType::CryptoCrash,
        }
    }
}
