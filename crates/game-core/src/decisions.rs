//! Per-game team decisions.

use crate::GameType;
use serde::{Deserialize, Serialize};

/// Climate policy stance for Build-a-Country.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClimatePolicy {
    Weak,
    #[default]
    Moderate,
    Strong,
}

/// Build-a-Country policy sliders. Each slider is a percentage in [10, 50].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolicyDecisions {
    pub tax_rate: f64,
    pub education_spending: f64,
    pub infrastructure_spending: f64,
    pub climate_policy: ClimatePolicy,
}

impl Default for PolicyDecisions {
    fn default() -> Self {
        Self {
            tax_rate: 30.0,
            education_spending: 25.0,
            infrastructure_spending: 25.0,
            climate_policy: ClimatePolicy::Moderate,
        }
    }
}

/// Beat-the-Market allocation across four asset classes, in percent.
///
/// Raw input is not required to sum to 100; scoring rescales it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PortfolioAllocation {
    pub cash_pct: f64,
    pub bonds_pct: f64,
    pub shares_pct: f64,
    pub crypto_pct: f64,
}

impl Default for PortfolioAllocation {
    fn default() -> Self {
        Self::from_array([25.0; 4])
    }
}

impl PortfolioAllocation {
    /// Values in `[cash, bonds, shares, crypto]` order.
    pub fn as_array(&self) -> [f64; 4] {
        [self.cash_pct, self.bonds_pct, self.shares_pct, self.crypto_pct]
    }

    pub fn from_array(v: [f64; 4]) -> Self {
        Self {
            cash_pct: v[0],
            bonds_pct: v[1],
            shares_pct: v[2],
            crypto_pct: v[3],
        }
    }
}

/// Crypto Crash coin allocation, in percent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoinAllocation {
    pub btc: f64,
    pub eth: f64,
    pub doge: f64,
    pub stable: f64,
}

impl Default for CoinAllocation {
    fn default() -> Self {
        Self::from_array([40.0, 30.0, 20.0, 10.0])
    }
}

impl CoinAllocation {
    /// Values in `[btc, eth, doge, stable]` order.
    pub fn as_array(&self) -> [f64; 4] {
        [self.btc, self.eth, self.doge, self.stable]
    }

    pub fn from_array(v: [f64; 4]) -> Self {
        Self {
            btc: v[0],
            eth: v[1],
            doge: v[2],
            stable: v[3],
        }
    }

    /// Share of the portfolio held outside the stablecoin, in [0, 1] once normalised.
    pub fn risky_fraction(&self) -> f64 {
        (self.btc + self.eth + self.doge) / 100.0
    }
}

/// Crypto Crash decision: coin mix plus a leverage multiplier in [1, 5].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CryptoDecisions {
    pub allocations: CoinAllocation,
    pub leverage: f64,
}

impl Default for CryptoDecisions {
    fn default() -> Self {
        Self {
            allocations: CoinAllocation::default(),
            leverage: 1.0,
        }
    }
}

/// A team's choices for one round, tagged by game type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "game", rename_all = "snake_case")]
pub enum Decisions {
    BuildCountry(PolicyDecisions),
    BeatMarket(PortfolioAllocation),
    CryptoCrash(CryptoDecisions),
}

impl Decisions {
    /// Decisions used when a team has never submitted anything.
    pub fn default_for(game_type: GameType) -> Self {
        match game_type {
            GameType::BuildCountry => Decisions::BuildCountry(PolicyDecisions::default()),
            GameType::BeatMarket => Decisions::BeatMarket(PortfolioAllocation::default()),
            GameType::CryptoCrash => Decisions::CryptoCrash(CryptoDecisions::default()),
        }
    }

    pub fn game_type(&self) -> GameType {
        match self {
            Decisions::BuildCountry(_) => GameType::BuildCountry,
            Decisions::BeatMarket(_) => GameType::BeatMarket,
            Decisions::CryptoCrash(_) => GameType::CryptoCrash,
        }
    }
}
