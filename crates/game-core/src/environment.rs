//! Shared per-round environment: macro scenarios, market events and crypto indicators.

use serde::{Deserialize, Serialize};

/// Build-a-Country macro scenarios.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    Recession,
    TechBoom,
    NaturalDisaster,
    ClimateCrisis,
    TradeAgreement,
    SocialMovement,
}

impl ScenarioKind {
    pub const ALL: [ScenarioKind; 6] = [
        ScenarioKind::Recession,
        ScenarioKind::TechBoom,
        ScenarioKind::NaturalDisaster,
        ScenarioKind::ClimateCrisis,
        ScenarioKind::TradeAgreement,
        ScenarioKind::SocialMovement,
    ];
}

/// A drawn macro scenario with its narrative.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub kind: ScenarioKind,
    pub name: String,
    pub description: String,
    pub hint: String,
}

/// Beat-the-Market market events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketEventKind {
    BullRally,
    RateHike,
    CompanyScandal,
    TechBreakthrough,
    MarketCorrection,
    ClimateRegulation,
}

impl MarketEventKind {
    pub const ALL: [MarketEventKind; 6] = [
        MarketEventKind::BullRally,
        MarketEventKind::RateHike,
        MarketEventKind::CompanyScandal,
        MarketEventKind::TechBreakthrough,
        MarketEventKind::MarketCorrection,
        MarketEventKind::ClimateRegulation,
    ];
}

/// A drawn market event with its narrative.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketEvent {
    pub kind: MarketEventKind,
    pub name: String,
    pub description: String,
    pub hint: String,
}

/// Crypto market indicators shared by every team in a round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketIndicators {
    /// Market sentiment in [20, 80].
    pub sentiment: u32,
    /// Trading volume in [30, 90].
    pub volume: u32,
    /// Social hype in [25, 95].
    pub hype: u32,
    /// Reference BTC price in dollars.
    pub price: f64,
    /// Price change over the round, in percent.
    pub price_change: f64,
    /// Stablecoin drift for the round, in percent.
    #[serde(default)]
    pub stable_drift: f64,
}

impl Default for MarketIndicators {
    /// A neutral market: every asset return is zero.
    fn default() -> Self {
        Self {
            sentiment: 50,
            volume: 60,
            hype: 50,
            price: 10_000.0,
            price_change: 0.0,
            stable_drift: 0.0,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorNote {
    pub text: String,
    pub hint: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorNotes {
    pub sentiment: IndicatorNote,
    pub volume: IndicatorNote,
    pub hype: IndicatorNote,
}

/// Crypto indicators plus the narrative derived from them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CryptoMarket {
    pub indicators: MarketIndicators,
    pub story: String,
    pub notes: IndicatorNotes,
}

/// Per-asset returns of a crypto round, in percent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetReturns {
    pub btc: f64,
    pub eth: f64,
    pub doge: f64,
    pub stable: f64,
}

/// Environment of the current round, tagged by game type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "env", rename_all = "snake_case")]
pub enum RoundEnvironment {
    Scenario(Scenario),
    MarketEvent(MarketEvent),
    Crypto(CryptoMarket),
}

impl RoundEnvironment {
    pub fn scenario(&self) -> Option<&Scenario> {
        match self {
            RoundEnvironment::Scenario(s) => Some(s),
            _ => None,
        }
    }

    pub fn market_event(&self) -> Option<&MarketEvent> {
        match self {
            RoundEnvironment::MarketEvent(e) => Some(e),
            _ => None,
        }
    }

    pub fn crypto(&self) -> Option<&CryptoMarket> {
        match self {
            RoundEnvironment::Crypto(c) => Some(c),
            _ => None,
        }
    }

    /// One-line headline for status output.
    pub fn headline(&self) -> &str {
        match self {
            RoundEnvironment::Scenario(s) => &s.name,
            RoundEnvironment::MarketEvent(e) => &e.name,
            RoundEnvironment::Crypto(c) => &c.story,
        }
    }
}
