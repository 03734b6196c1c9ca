//! Build-a-Country: macro policy with fiscal accounting.
//!
//! Policy sliders move GDP, employment, inequality and approval through fixed
//! linear coefficients around a moderate baseline. Spending and taxation also
//! drive a deficit that accumulates into debt; high debt and large deficits
//! feed back as a drag on growth, so spending-fuelled growth without revenue
//! eventually depresses its own score.

use crate::clamp;
use game_core::{
    ClimatePolicy, CountryMetrics, CountryState, FiscalState, PolicyDecisions, ScenarioKind,
    POLICY_MAX, POLICY_MIN,
};

/// Government spending floor, % of GDP.
pub const BASELINE_SPENDING: f64 = 18.0;
/// Interest charged on outstanding debt each round.
pub const DEBT_INTEREST: f64 = 0.04;
/// Debt level above which servicing starts to drag on growth, % of GDP.
pub const DEBT_DRAG_THRESHOLD: f64 = 90.0;
/// Deficit level above which markets get nervous, % of GDP.
pub const DEFICIT_STRESS_THRESHOLD: f64 = 3.0;
/// Upper bound on debt, % of GDP.
pub const DEBT_CAP: f64 = 250.0;

/// Goldilocks centre and width of the policy fit.
const FIT_CENTRE: (f64, f64, f64) = (30.0, 25.0, 25.0);
const FIT_SIGMA: f64 = 25.0;

/// Additive shocks applied by a macro scenario.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MetricShocks {
    pub gdp: f64,
    pub employment: f64,
    pub inequality: f64,
    pub approval: f64,
}

/// Shock table for the scenario catalog.
pub fn scenario_shocks(kind: Option<ScenarioKind>) -> MetricShocks {
    let Some(kind) = kind else {
        return MetricShocks::default();
    };
    match kind {
        ScenarioKind::Recession => MetricShocks {
            gdp: -2.5,
            employment: -2.0,
            approval: -1.0,
            ..Default::default()
        },
        ScenarioKind::TechBoom => MetricShocks {
            gdp: 2.0,
            employment: 1.0,
            approval: 1.0,
            ..Default::default()
        },
        ScenarioKind::NaturalDisaster => MetricShocks {
            gdp: -1.5,
            approval: -2.0,
            ..Default::default()
        },
        ScenarioKind::ClimateCrisis => MetricShocks {
            approval: -1.0,
            inequality: 1.0,
            ..Default::default()
        },
        ScenarioKind::TradeAgreement => MetricShocks {
            gdp: 1.5,
            employment: 1.0,
            ..Default::default()
        },
        ScenarioKind::SocialMovement => MetricShocks {
            approval: -0.5,
            inequality: 2.0,
            ..Default::default()
        },
    }
}

/// Policy sliders clamped to their valid range.
#[derive(Clone, Copy, Debug)]
struct Sliders {
    tax: f64,
    edu: f64,
    infra: f64,
}

impl Sliders {
    fn clamped(d: &PolicyDecisions) -> Self {
        Self {
            tax: clamp(d.tax_rate, POLICY_MIN, POLICY_MAX),
            edu: clamp(d.education_spending, POLICY_MIN, POLICY_MAX),
            infra: clamp(d.infrastructure_spending, POLICY_MIN, POLICY_MAX),
        }
    }
}

/// Spending, revenue and deficit of one round, all % of GDP.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FiscalFlows {
    pub spending: f64,
    pub revenue: f64,
    pub deficit: f64,
}

/// Budget implied by a set of policy decisions.
pub fn fiscal_flows(d: &PolicyDecisions) -> FiscalFlows {
    let s = Sliders::clamped(d);
    let climate_cost = match d.climate_policy {
        ClimatePolicy::Strong => 1.0,
        ClimatePolicy::Moderate | ClimatePolicy::Weak => 0.0,
    };
    let spending = BASELINE_SPENDING
        + (s.edu * 0.20).min(10.0)
        + (s.infra * 0.16).min(8.0)
        + climate_cost;
    let high_tax_drag = (s.tax - 35.0).max(0.0) * 0.15;
    let revenue = 12.0 + 0.45 * s.tax - high_tax_drag;
    FiscalFlows {
        spending,
        revenue,
        deficit: spending - revenue,
    }
}

/// GDP points lost to servicing debt above the drag threshold.
pub fn debt_burden(debt_pct_gdp: f64) -> f64 {
    (debt_pct_gdp - DEBT_DRAG_THRESHOLD).max(0.0) * 0.08
}

/// GDP points lost to a deficit above the stress threshold.
pub fn deficit_stress(deficit_pct_gdp: f64) -> f64 {
    (deficit_pct_gdp - DEFICIT_STRESS_THRESHOLD).max(0.0) * 0.35
}

/// Apply one round of policy to the previous country state.
pub fn advance(
    d: &PolicyDecisions,
    scenario: Option<ScenarioKind>,
    prev: &CountryState,
) -> CountryState {
    let s = Sliders::clamped(d);
    let flows = fiscal_flows(d);
    let fiscal_drag = debt_burden(prev.fiscal.debt_pct_gdp) + deficit_stress(flows.deficit);

    let mut gdp_delta = (s.infra - 25.0) * 0.25 + (s.edu - 25.0) * 0.12
        - (s.tax - 30.0).max(0.0) * 0.18
        - fiscal_drag;
    let emp_delta = (s.infra - 25.0) * 0.30 + (s.edu - 25.0) * 0.08
        - (s.tax - 35.0).max(0.0) * 0.12
        - fiscal_drag * 0.5;
    let ineq_delta = -(s.edu - 25.0) * 0.25 - (s.tax - 30.0).max(0.0) * 0.15
        + (25.0 - s.tax).max(0.0) * 0.10;
    let mut appr_delta = gdp_delta * 0.5 + emp_delta * 0.6 - ineq_delta * 0.3;

    match d.climate_policy {
        ClimatePolicy::Strong => {
            gdp_delta -= 0.8;
            appr_delta += 1.4;
        }
        ClimatePolicy::Weak => appr_delta -= 0.8,
        ClimatePolicy::Moderate => {}
    }

    let shock = scenario_shocks(scenario);
    let prev_m = &prev.metrics;
    let metrics = CountryMetrics {
        gdp: clamp(prev_m.gdp + gdp_delta + shock.gdp, 60.0, 200.0),
        employment: clamp(prev_m.employment + emp_delta + shock.employment, 40.0, 100.0),
        inequality: clamp(prev_m.inequality + ineq_delta + shock.inequality, 0.0, 100.0),
        approval: clamp(prev_m.approval + appr_delta + shock.approval, 0.0, 100.0),
    };

    let debt = prev.fiscal.debt_pct_gdp * (1.0 + DEBT_INTEREST) + flows.deficit;

    CountryState {
        metrics,
        fiscal: FiscalState {
            debt_pct_gdp: clamp(debt, 0.0, DEBT_CAP),
            deficit_pct_gdp: flows.deficit,
            spending_pct_gdp: flows.spending,
            revenue_pct_gdp: flows.revenue,
        },
    }
}

/// Gaussian fit in (0, 1] peaking at moderate policy settings.
pub fn policy_fit(d: &PolicyDecisions) -> f64 {
    let s = Sliders::clamped(d);
    let (t0, e0, i0) = FIT_CENTRE;
    let dist2 = (s.tax - t0).powi(2) + (s.edu - e0).powi(2) + (s.infra - i0).powi(2);
    (-dist2 / (2.0 * FIT_SIGMA * FIT_SIGMA)).exp()
}

/// Weighted outcome index in [0, 1].
///
/// GDP 30%, employment 25%, inverse inequality 25%, approval 20%.
pub fn outcome_index(m: &CountryMetrics) -> f64 {
    let gdp = clamp((m.gdp - 60.0) / 140.0, 0.0, 1.0);
    let emp = clamp((m.employment - 40.0) / 60.0, 0.0, 1.0);
    let equality = clamp((100.0 - m.inequality) / 100.0, 0.0, 1.0);
    let approval = clamp(m.approval / 100.0, 0.0, 1.0);
    0.30 * gdp + 0.25 * emp + 0.25 * equality + 0.20 * approval
}

/// Score points deducted for unsustainable public finances.
pub fn fiscal_penalty(f: &FiscalState) -> f64 {
    (f.debt_pct_gdp - DEBT_DRAG_THRESHOLD).max(0.0) * 0.15
        + (f.deficit_pct_gdp - DEFICIT_STRESS_THRESHOLD).max(0.0) * 0.5
}

/// Ranking score for a country state reached with decisions `d`.
pub fn score(d: &PolicyDecisions, state: &CountryState) -> f64 {
    let policy_factor = 0.5 + 0.5 * policy_fit(d);
    let raw = 100.0 * outcome_index(&state.metrics) * policy_factor;
    (raw - fiscal_penalty(&state.fiscal)).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn policy(tax: f64, edu: f64, infra: f64, climate: ClimatePolicy) -> PolicyDecisions {
        PolicyDecisions {
            tax_rate: tax,
            education_spending: edu,
            infrastructure_spending: infra,
            climate_policy: climate,
        }
    }

    #[test]
    fn moderate_policy_outscores_extreme_policy_on_same_outcome() {
        let state = CountryState::default();
        let moderate = score(&policy(30.0, 25.0, 25.0, ClimatePolicy::Moderate), &state);
        let extreme = score(&policy(50.0, 50.0, 50.0, ClimatePolicy::Moderate), &state);
        assert!(moderate > extreme, "{moderate} <= {extreme}");
    }

    #[test]
    fn fit_peaks_at_centre() {
        assert!((policy_fit(&PolicyDecisions::default()) - 1.0).abs() < 1e-12);
        assert!(policy_fit(&policy(10.0, 10.0, 10.0, ClimatePolicy::Weak)) < 1.0);
    }

    #[test]
    fn fiscal_flows_follow_caps() {
        let f = fiscal_flows(&policy(30.0, 50.0, 50.0, ClimatePolicy::Strong));
        // 18 + 10 (edu capped) + 8 (infra capped) + 1 (strong climate)
        assert!((f.spending - 37.0).abs() < 1e-9);
        assert!((f.revenue - 25.5).abs() < 1e-9);
        assert!((f.deficit - 11.5).abs() < 1e-9);
    }

    #[test]
    fn high_tax_has_drag_on_revenue() {
        let f = fiscal_flows(&policy(50.0, 25.0, 25.0, ClimatePolicy::Moderate));
        assert!((f.revenue - (12.0 + 22.5 - 2.25)).abs() < 1e-9);
    }

    #[test]
    fn moderate_policy_without_shock_is_stable() {
        let next = advance(&PolicyDecisions::default(), None, &CountryState::default());
        let m = &next.metrics;
        assert_eq!(m.gdp, 100.0);
        assert_eq!(m.employment, 75.0);
        assert_eq!(m.inequality, 50.0);
        assert_eq!(m.approval, 50.0);
        // 60 * 1.04 + 1.5 deficit
        assert!((next.fiscal.debt_pct_gdp - 63.9).abs() < 1e-9);
    }

    #[test]
    fn debt_compounds_regardless_of_growth() {
        let d = policy(30.0, 50.0, 50.0, ClimatePolicy::Moderate);
        let prev = CountryState::default();
        let next = advance(&d, Some(ScenarioKind::TechBoom), &prev);
        assert!(next.metrics.gdp > prev.metrics.gdp);
        let expected = prev.fiscal.debt_pct_gdp * 1.04 + fiscal_flows(&d).deficit;
        assert!((next.fiscal.debt_pct_gdp - expected).abs() < 1e-9);
    }

    #[test]
    fn recession_shock_applies() {
        let next = advance(
            &PolicyDecisions::default(),
            Some(ScenarioKind::Recession),
            &CountryState::default(),
        );
        assert!((next.metrics.gdp - 97.5).abs() < 1e-9);
        assert!((next.metrics.employment - 73.0).abs() < 1e-9);
        assert!((next.metrics.approval - 49.0).abs() < 1e-9);
    }

    #[test]
    fn unfunded_spending_eventually_hurts_growth() {
        let d = policy(10.0, 50.0, 50.0, ClimatePolicy::Moderate);
        let mut state = CountryState::default();
        let mut gdps = vec![state.metrics.gdp];
        for _ in 0..15 {
            state = advance(&d, None, &state);
            gdps.push(state.metrics.gdp);
        }
        let peak = gdps.iter().cloned().fold(f64::MIN, f64::max);
        let last = *gdps.last().unwrap();
        assert!(gdps[1] > gdps[0], "spending should buy early growth");
        assert!(last < peak, "debt should eventually depress GDP");
        assert!(state.fiscal.debt_pct_gdp > DEBT_DRAG_THRESHOLD);

        let early = score(&d, &advance(&d, None, &CountryState::default()));
        assert!(score(&d, &state) < early);
    }

    #[test]
    fn score_is_never_negative() {
        let state = CountryState {
            metrics: CountryMetrics {
                gdp: 60.0,
                employment: 40.0,
                inequality: 100.0,
                approval: 0.0,
            },
            fiscal: FiscalState {
                debt_pct_gdp: DEBT_CAP,
                deficit_pct_gdp: 30.0,
                ..Default::default()
            },
        };
        assert_eq!(score(&PolicyDecisions::default(), &state), 0.0);
    }

    proptest! {
        #[test]
        fn metrics_stay_in_bounds(tax in -100.0f64..200.0, edu in -100.0f64..200.0, infra in -100.0f64..200.0, rounds in 1usize..30) {
            let d = policy(tax, edu, infra, ClimatePolicy::Strong);
            let mut state = CountryState::default();
            for i in 0..rounds {
                let kind = ScenarioKind::ALL[i % ScenarioKind::ALL.len()];
                state = advance(&d, Some(kind), &state);
            }
            let m = &state.metrics;
            prop_assert!((60.0..=200.0).contains(&m.gdp));
            prop_assert!((40.0..=100.0).contains(&m.employment));
            prop_assert!((0.0..=100.0).contains(&m.inequality));
            prop_assert!((0.0..=100.0).contains(&m.approval));
            prop_assert!((0.0..=DEBT_CAP).contains(&state.fiscal.debt_pct_gdp));
        }
    }
}
