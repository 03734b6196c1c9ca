//! Beat-the-Market: four-asset portfolio with event shocks.

use crate::{clamp, normalize_shares};
use game_core::{MarketEventKind, PortfolioAllocation, PortfolioValue};

/// Per-round return of each asset class, in percent.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AssetClassReturns {
    pub cash: f64,
    pub bonds: f64,
    pub shares: f64,
    pub crypto: f64,
}

impl AssetClassReturns {
    fn plus(self, o: AssetClassReturns) -> Self {
        Self {
            cash: self.cash + o.cash,
            bonds: self.bonds + o.bonds,
            shares: self.shares + o.shares,
            crypto: self.crypto + o.crypto,
        }
    }
}

pub const BASE_RETURNS: AssetClassReturns = AssetClassReturns {
    cash: 0.2,
    bonds: 0.6,
    shares: 1.2,
    crypto: 2.0,
};

const EQUAL_SPLIT: [f64; 4] = [25.0; 4];

/// Return nudges applied by a market event.
pub fn event_shocks(kind: Option<MarketEventKind>) -> AssetClassReturns {
    let zero = AssetClassReturns::default();
    match kind {
        None => zero,
        Some(MarketEventKind::BullRally) => AssetClassReturns {
            shares: 1.0,
            crypto: 1.5,
            ..zero
        },
        Some(MarketEventKind::RateHike) => AssetClassReturns {
            bonds: -0.7,
            shares: -0.6,
            ..zero
        },
        Some(MarketEventKind::CompanyScandal) => AssetClassReturns {
            shares: -1.3,
            ..zero
        },
        Some(MarketEventKind::TechBreakthrough) => AssetClassReturns {
            shares: 1.0,
            ..zero
        },
        Some(MarketEventKind::MarketCorrection) => AssetClassReturns {
            shares: -1.0,
            crypto: -1.8,
            ..zero
        },
        Some(MarketEventKind::ClimateRegulation) => AssetClassReturns {
            bonds: 0.2,
            shares: -0.4,
            ..zero
        },
    }
}

/// Rescale an allocation to sum to 100, falling back to an equal split.
pub fn normalize_allocation(a: &PortfolioAllocation) -> PortfolioAllocation {
    PortfolioAllocation::from_array(normalize_shares(a.as_array(), EQUAL_SPLIT))
}

/// Risk score of a normalised allocation, in [0, 100].
pub fn risk_score(a: &PortfolioAllocation) -> f64 {
    clamp(20.0 + 0.6 * a.shares_pct + 0.9 * a.crypto_pct, 0.0, 100.0)
}

/// Weighted return of a normalised allocation, in percent.
pub fn portfolio_return(a: &PortfolioAllocation, r: &AssetClassReturns) -> f64 {
    (a.cash_pct * r.cash + a.bonds_pct * r.bonds + a.shares_pct * r.shares + a.crypto_pct * r.crypto)
        / 100.0
}

pub fn advance(
    decisions: &PortfolioAllocation,
    event: Option<MarketEventKind>,
    prev: &PortfolioValue,
) -> PortfolioValue {
    let alloc = normalize_allocation(decisions);
    let returns = BASE_RETURNS.plus(event_shocks(event));
    let round_return = portfolio_return(&alloc, &returns);
    PortfolioValue {
        value: prev.value * (1.0 + round_return / 100.0),
        returns: round_return,
        risk: risk_score(&alloc),
        esg: prev.esg,
    }
}

/// Ranking score: return per unit of risk, scaled by 100.
pub fn risk_adjusted_score(v: &PortfolioValue) -> f64 {
    if v.risk > 0.0 {
        v.returns / v.risk.max(1.0) * 100.0
    } else {
        v.returns
    }
}
