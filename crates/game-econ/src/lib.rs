#![deny(warnings)]

//! Scoring models for the three classroom games.
//!
//! Every function here is pure: it takes a team's decisions, the shared
//! round environment and the team's previous result state, and returns the
//! new state together with a ranking score. All three models follow the
//! same shape:
//! - a signed delta per tracked quantity from decisions and environment
//! - added to the previous value and clamped to a valid range
//!
//! Out-of-range numeric input is clamped or rescaled, never rejected.

pub mod country;
pub mod crypto;
pub mod market;

use game_core::{Decisions, GameType, RoundEnvironment, TeamResults};

/// Clamp `x` into `[lo, hi]`, mapping NaN to `lo`.
pub fn clamp(x: f64, lo: f64, hi: f64) -> f64 {
    if x.is_nan() {
        return lo;
    }
    x.clamp(lo, hi)
}

/// Rescale four shares so they sum to exactly 100.
///
/// Negative or non-finite entries count as zero. When the cleaned total is
/// not positive, `fallback` is used instead.
///
/// Example:
/// let v = normalize_shares([1.0, 1.0, 2.0, 0.0], [25.0; 4]);
/// assert_eq!(v, [25.0, 25.0, 50.0, 0.0]);
pub fn normalize_shares(raw: [f64; 4], fallback: [f64; 4]) -> [f64; 4] {
    let cleaned = raw.map(|x| if x.is_finite() && x > 0.0 { x } else { 0.0 });
    let total: f64 = cleaned.iter().sum();
    let (values, total) = if total > 0.0 {
        (cleaned, total)
    } else {
        (fallback, fallback.iter().sum())
    };
    values.map(|x| x * 100.0 / total)
}

/// Outcome of scoring one team for one round.
#[derive(Clone, Debug, PartialEq)]
pub struct RoundOutcome {
    pub results: TeamResults,
    pub score: f64,
}

/// Score one team for one round, dispatching on the decision variant.
///
/// `previous` is ignored when it belongs to a different game type, in which
/// case the starting state for the decisions' game is used.
pub fn score_round(
    decisions: &Decisions,
    environment: Option<&RoundEnvironment>,
    previous: Option<&TeamResults>,
) -> RoundOutcome {
    let previous = previous
        .filter(|p| p.game_type() == decisions.game_type())
        .cloned()
        .unwrap_or_else(|| TeamResults::initial(decisions.game_type()));

    match (decisions, previous) {
        (Decisions::BuildCountry(d), TeamResults::BuildCountry(prev)) => {
            let scenario = environment.and_then(|e| e.scenario()).map(|s| s.kind);
            let state = country::advance(d, scenario, &prev);
            let score = country::score(d, &state);
            RoundOutcome {
                results: TeamResults::BuildCountry(state),
                score,
            }
        }
        (Decisions::BeatMarket(d), TeamResults::BeatMarket(prev)) => {
            let event = environment.and_then(|e| e.market_event()).map(|e| e.kind);
            let value = market::advance(d, event, &prev);
            let score = market::risk_adjusted_score(&value);
            RoundOutcome {
                results: TeamResults::BeatMarket(value),
                score,
            }
        }
        (Decisions::CryptoCrash(d), TeamResults::CryptoCrash(prev)) => {
            let indicators = environment
                .and_then(|e| e.crypto())
                .map(|c| c.indicators.clone())
                .unwrap_or_default();
            let round = crypto::RoundMarket::from_indicators(&indicators);
            let portfolio = crypto::advance(d, &round, &prev);
            let score = portfolio.equity;
            RoundOutcome {
                results: TeamResults::CryptoCrash(portfolio),
                score,
            }
        }
        // `previous` was filtered to the decisions' game type above.
        (d, _) => RoundOutcome {
            results: TeamResults::initial(d.game_type()),
            score: baseline_score(d.game_type()),
        },
    }
}

/// Score of a team that has not had a round processed yet.
pub fn baseline_score(game_type: GameType) -> f64 {
    match game_type {
        GameType::BuildCountry => country::score(
            &Default::default(),
            &game_core::CountryState::default(),
        ),
        GameType::BeatMarket => market::risk_adjusted_score(&Default::default()),
        GameType::CryptoCrash => game_core::CryptoPortfolio::default().equity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn normalize_example() {
        assert_eq!(
            normalize_shares([1.0, 1.0, 2.0, 0.0], [25.0; 4]),
            [25.0, 25.0, 50.0, 0.0]
        );
    }

    #[test]
    fn normalize_falls_back_on_empty_input() {
        assert_eq!(normalize_shares([0.0; 4], [50.0, 20.0, 10.0, 20.0]), [50.0, 20.0, 10.0, 20.0]);
        assert_eq!(normalize_shares([-5.0, f64::NAN, 0.0, 0.0], [25.0; 4]), [25.0; 4]);
    }

    #[test]
    fn clamp_maps_nan_to_lower_bound() {
        assert_eq!(clamp(f64::NAN, 0.0, 100.0), 0.0);
        assert_eq!(clamp(150.0, 0.0, 100.0), 100.0);
    }

    #[test]
    fn mismatched_previous_state_is_reset() {
        let d = Decisions::default_for(GameType::BeatMarket);
        let stale = TeamResults::initial(GameType::CryptoCrash);
        let out = score_round(&d, None, Some(&stale));
        assert_eq!(out.results.game_type(), GameType::BeatMarket);
    }

    proptest! {
        #[test]
        fn normalized_shares_sum_to_100(a in 0.0f64..1e6, b in 0.0f64..1e6, c in 0.0f64..1e6, d in 0.0f64..1e6) {
            prop_assume!(a + b + c + d > 1e-9);
            let v = normalize_shares([a, b, c, d], [25.0; 4]);
            let sum: f64 = v.iter().sum();
            prop_assert!((sum - 100.0).abs() < 1e-9);
            prop_assert!(v.iter().all(|x| *x >= 0.0));
        }
    }
}
