//! Crypto Crash or Boom: leveraged coin portfolio with liquidation.
//!
//! Asset returns are a function of the round's shared indicators. A team's
//! leveraged return is checked against a leverage-dependent threshold before
//! it is applied: breaching it caps the loss at the threshold and slashes
//! equity to [`LIQUIDATION_KEEP`] of its prior value instead.

use crate::{clamp, normalize_shares};
use game_core::{
    AssetReturns, CoinAllocation, CryptoDecisions, CryptoPortfolio, MarketIndicators, RiskLabel,
    LEVERAGE_MAX, LEVERAGE_MIN,
};

/// Share of equity kept after a liquidation.
pub const LIQUIDATION_KEEP: f64 = 0.35;
/// Bound on the stablecoin's per-round move, in percent.
pub const STABLE_BOUND: f64 = 0.2;

const FALLBACK_MIX: [f64; 4] = [50.0, 20.0, 10.0, 20.0];

pub fn normalize_coins(a: &CoinAllocation) -> CoinAllocation {
    CoinAllocation::from_array(normalize_shares(a.as_array(), FALLBACK_MIX))
}

/// Market-wide risk in [0, 100] from hype outrunning sentiment, a falling
/// price and thin volume.
pub fn market_risk(ind: &MarketIndicators) -> f64 {
    let divergence = (ind.hype as f64 - ind.sentiment as f64).max(0.0);
    let trend_down = (-ind.price_change).max(0.0);
    let thin = (40.0 - ind.volume as f64).max(0.0);
    clamp(
        0.45 * divergence + 0.35 * (trend_down * 3.0) + 0.20 * thin,
        0.0,
        100.0,
    )
}

/// Per-coin returns implied by the indicators, in percent.
pub fn asset_returns(ind: &MarketIndicators) -> AssetReturns {
    let s = (ind.sentiment as f64 - 50.0) / 50.0;
    let h = (ind.hype as f64 - 50.0) / 50.0;
    let v = (ind.volume as f64 - 60.0) / 40.0;
    let drift = ind.price_change * 0.25;

    AssetReturns {
        btc: clamp(drift + 3.0 * s + 0.8 * v, -12.0, 12.0),
        eth: clamp(drift + 3.5 * s + 1.5 * h + v, -18.0, 18.0),
        doge: clamp(drift + 7.0 * h + 1.5 * s + 1.2 * v, -30.0, 30.0),
        stable: clamp(ind.stable_drift, -STABLE_BOUND, STABLE_BOUND),
    }
}

/// Market conditions shared by every team in a round.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RoundMarket {
    pub returns: AssetReturns,
    pub market_risk: f64,
}

impl RoundMarket {
    pub fn from_indicators(ind: &MarketIndicators) -> Self {
        Self {
            returns: asset_returns(ind),
            market_risk: market_risk(ind),
        }
    }
}

pub fn clamp_leverage(leverage: f64) -> f64 {
    clamp(leverage, LEVERAGE_MIN, LEVERAGE_MAX)
}

/// Leveraged loss, in percent, at which a position is liquidated.
pub fn liquidation_threshold(leverage: f64) -> f64 {
    match clamp_leverage(leverage) as u32 {
        1 => 60.0,
        2 => 35.0,
        3 => 22.0,
        4 => 15.0,
        _ => 12.0,
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LeverageOutcome {
    pub equity: f64,
    /// Applied leveraged return, capped at the threshold on liquidation.
    pub return_pct: f64,
    pub liquidated: bool,
}

/// Apply an unleveraged return to `equity` under `leverage`.
pub fn apply_leverage(equity: f64, unlevered_pct: f64, leverage: f64) -> LeverageOutcome {
    let leverage = clamp_leverage(leverage);
    let levered = unlevered_pct * leverage;
    let threshold = liquidation_threshold(leverage);
    if levered <= -threshold {
        LeverageOutcome {
            equity: equity * LIQUIDATION_KEEP,
            return_pct: -threshold,
            liquidated: true,
        }
    } else {
        LeverageOutcome {
            equity: equity * (1.0 + levered / 100.0),
            return_pct: levered,
            liquidated: false,
        }
    }
}

/// Display-only exposure in [0, 100]; not used for scoring.
pub fn risk_exposure(alloc: &CoinAllocation, leverage: f64, market_risk: f64) -> f64 {
    clamp(
        alloc.risky_fraction() * (leverage / LEVERAGE_MAX) * (market_risk / 100.0) * 100.0,
        0.0,
        100.0,
    )
}

fn weighted_return(a: &CoinAllocation, r: &AssetReturns) -> f64 {
    (a.btc * r.btc + a.eth * r.eth + a.doge * r.doge + a.stable * r.stable) / 100.0
}

pub fn advance(d: &CryptoDecisions, market: &RoundMarket, prev: &CryptoPortfolio) -> CryptoPortfolio {
    let allocations = normalize_coins(&d.allocations);
    let leverage = clamp_leverage(d.leverage);
    let out = apply_leverage(
        prev.equity,
        weighted_return(&allocations, &market.returns),
        leverage,
    );
    let exposure = risk_exposure(&allocations, leverage, market.market_risk);
    let label = RiskLabel::from_exposure(exposure);

    let explain = format!(
        "{:.0}% of the portfolio is in coins at {leverage:.0}x leverage. Market risk is {:.1}/100, \
         so risk exposure is {} ({exposure:.0}/100).",
        allocations.risky_fraction() * 100.0,
        market.market_risk,
        label.as_str(),
    );
    let outcome = if out.liquidated {
        format!(
            "Liquidated: the leveraged loss reached {:.0}% in one round and the position was \
             closed with a heavy penalty. Lower leverage or hold more stablecoin when risk is high.",
            liquidation_threshold(leverage)
        )
    } else {
        format!(
            "Round return {:+.2}% after leverage. When risk is High or Extreme, lower leverage \
             or add stablecoin.",
            out.return_pct
        )
    };

    CryptoPortfolio {
        equity: out.equity,
        last_return_pct: out.return_pct,
        total_return_pct: prev.total_return_pct + out.return_pct,
        allocations,
        leverage,
        risk_exposure: exposure,
        risk_label: label,
        liquidations: prev.liquidations + u32::from(out.liquidated),
        liquidated: out.liquidated,
        explain,
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn all_btc(leverage: f64) -> CryptoDecisions {
        CryptoDecisions {
            allocations: CoinAllocation::from_array([100.0, 0.0, 0.0, 0.0]),
            leverage,
        }
    }

    fn market_with_btc(btc: f64) -> RoundMarket {
        RoundMarket {
            returns: AssetReturns {
                btc,
                ..Default::default()
            },
            market_risk: 50.0,
        }
    }

    #[test]
    fn loss_beyond_threshold_liquidates() {
        let prev = CryptoPortfolio::default();
        let p = advance(&all_btc(3.0), &market_with_btc(-25.0 / 3.0), &prev);
        assert!(p.liquidated);
        assert_eq!(p.liquidations, 1);
        assert!((p.equity - 350.0).abs() < 1e-9);
        assert_eq!(p.last_return_pct, -22.0);
        assert_eq!(p.total_return_pct, -22.0);
    }

    #[test]
    fn loss_within_threshold_compounds() {
        let prev = CryptoPortfolio::default();
        let p = advance(&all_btc(3.0), &market_with_btc(-10.0 / 3.0), &prev);
        assert!(!p.liquidated);
        assert_eq!(p.liquidations, 0);
        assert!((p.equity - 900.0).abs() < 1e-9);
        assert!((p.last_return_pct + 10.0).abs() < 1e-9);
    }

    #[test]
    fn liquidations_accumulate() {
        let mut p = CryptoPortfolio::default();
        for _ in 0..2 {
            p = advance(&all_btc(5.0), &market_with_btc(-5.0), &p);
        }
        assert_eq!(p.liquidations, 2);
        assert!((p.equity - 1000.0 * LIQUIDATION_KEEP * LIQUIDATION_KEEP).abs() < 1e-9);
    }

    #[test]
    fn thresholds_fall_with_leverage() {
        let t: Vec<f64> = [1.0, 2.0, 3.0, 4.0, 5.0]
            .iter()
            .map(|l| liquidation_threshold(*l))
            .collect();
        assert_eq!(t, vec![60.0, 35.0, 22.0, 15.0, 12.0]);
        assert_eq!(liquidation_threshold(2.7), 35.0);
        assert_eq!(liquidation_threshold(9.0), 12.0);
        assert_eq!(liquidation_threshold(0.0), 60.0);
    }

    #[test]
    fn neutral_market_leaves_equity_flat() {
        let round = RoundMarket::from_indicators(&MarketIndicators::default());
        assert_eq!(round.market_risk, 0.0);
        let p = advance(&CryptoDecisions::default(), &round, &CryptoPortfolio::default());
        assert_eq!(p.equity, 1000.0);
        assert_eq!(p.risk_label, RiskLabel::Low);
    }

    #[test]
    fn hype_without_sentiment_is_risky_and_moves_doge_most() {
        let ind = MarketIndicators {
            sentiment: 30,
            hype: 90,
            volume: 35,
            price_change: -10.0,
            ..Default::default()
        };
        // 0.45*60 + 0.35*30 + 0.20*5
        assert!((market_risk(&ind) - 38.5).abs() < 1e-9);
        let r = asset_returns(&ind);
        assert!(r.doge > r.eth && r.eth > r.btc);
    }

    #[test]
    fn stablecoin_move_is_bounded() {
        let ind = MarketIndicators {
            stable_drift: 3.0,
            ..Default::default()
        };
        assert_eq!(asset_returns(&ind).stable, STABLE_BOUND);
    }

    #[test]
    fn empty_allocation_uses_fallback_mix() {
        let a = normalize_coins(&CoinAllocation::from_array([0.0; 4]));
        assert_eq!(a.as_array(), FALLBACK_MIX);
    }

    proptest! {
        #[test]
        fn equity_never_goes_negative(
            sentiment in 20u32..=80,
            volume in 30u32..=90,
            hype in 25u32..=95,
            change in -20.0f64..20.0,
            leverage in 1.0f64..=5.0,
        ) {
            let ind = MarketIndicators { sentiment, volume, hype, price_change: change, ..Default::default() };
            let round = RoundMarket::from_indicators(&ind);
            let d = CryptoDecisions { leverage, ..Default::default() };
            let p = advance(&d, &round, &CryptoPortfolio::default());
            prop_assert!(p.equity > 0.0);
            prop_assert!(p.last_return_pct >= -liquidation_threshold(leverage));
            prop_assert!((0.0..=100.0).contains(&p.risk_exposure));
        }
    }
}
