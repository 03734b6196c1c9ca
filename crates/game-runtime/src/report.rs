//! Tabular end-of-game report.
//!
//! One summary table, one ranked final-score table and one round-by-round
//! table per team with history. Numeric cells are rounded to two decimals.

use game_core::{
    Decisions, GameSession, GameType, RoundSnapshot, TeamResults, TeamState,
};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use std::cmp::Ordering;

/// Longest allowed table title.
pub const MAX_TITLE_CHARS: usize = 31;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Int(i64),
    Num(Decimal),
    Text(String),
}

impl Cell {
    pub fn num(x: f64) -> Self {
        Cell::Num(Decimal::from_f64(x).unwrap_or_default().round_dp(2))
    }

    pub fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Table {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    fn new(title: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            title: title.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Report {
    pub summary: Table,
    pub final_scores: Table,
    pub teams: Vec<Table>,
}

/// Table title for a team: at most 31 characters, only letters, digits,
/// spaces and underscores.
pub fn sheet_title(team: &str) -> String {
    let clipped: String = if team.chars().count() > MAX_TITLE_CHARS {
        team.chars().take(MAX_TITLE_CHARS - 3).chain("...".chars()).collect()
    } else {
        team.to_string()
    };
    clipped
        .chars()
        .map(|c| if c.is_alphanumeric() || c == ' ' || c == '_' { c } else { '_' })
        .collect()
}

fn summary(session: &GameSession) -> Table {
    let mut t = Table::new(
        "Game Summary",
        &[
            "Game Type",
            "Admin",
            "Created At",
            "Status",
            "Total Rounds",
            "Current Round",
            "Number of Teams",
        ],
    );
    t.rows.push(vec![
        Cell::text(session.game_type.as_str()),
        Cell::text(&session.admin_name),
        Cell::text(session.created_at.to_rfc3339()),
        Cell::text(session.status.to_string()),
        Cell::Int(i64::from(session.settings.num_rounds)),
        Cell::Int(i64::from(session.current_round)),
        Cell::Int(session.teams.len() as i64),
    ]);
    t
}

fn final_columns(game_type: GameType) -> &'static [&'static str] {
    match game_type {
        GameType::BuildCountry => &[
            "Rank", "Team", "Final Score", "GDP", "Employment", "Inequality", "Approval",
            "Debt (% GDP)",
        ],
        GameType::BeatMarket => &["Rank", "Team", "Risk-Adj Score", "Portfolio Value", "Returns (%)", "Risk"],
        GameType::CryptoCrash => &[
            "Rank",
            "Team",
            "Final Equity",
            "Total Return (%)",
            "Risk Exposure",
            "Risk Label",
            "Leverage",
            "Liquidations",
        ],
    }
}

/// Result columns shared by the final table, without rank, team or score.
fn result_cells(results: &TeamResults) -> Vec<Cell> {
    match results {
        TeamResults::BuildCountry(c) => vec![
            Cell::num(c.metrics.gdp),
            Cell::num(c.metrics.employment),
            Cell::num(c.metrics.inequality),
            Cell::num(c.metrics.approval),
            Cell::num(c.fiscal.debt_pct_gdp),
        ],
        TeamResults::BeatMarket(p) => vec![Cell::num(p.value), Cell::num(p.returns), Cell::num(p.risk)],
        TeamResults::CryptoCrash(p) => vec![
            Cell::num(p.total_return_pct),
            Cell::num(p.risk_exposure),
            Cell::text(p.risk_label.as_str()),
            Cell::num(p.leverage),
            Cell::Int(i64::from(p.liquidations)),
        ],
    }
}

fn final_scores(session: &GameSession) -> Table {
    let game_type = session.game_type;
    let baseline = game_econ::baseline_score(game_type);
    let mut ranked: Vec<(&String, &TeamState, f64)> = session
        .teams
        .iter()
        .map(|(n, t)| (n, t, t.score.unwrap_or(baseline)))
        .collect();
    ranked.sort_by(|a, b| {
        b.2.partial_cmp(&a.2)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });

    let mut t = Table::new("Final Scores", final_columns(game_type));
    for (i, (name, team, score)) in ranked.into_iter().enumerate() {
        let results = team
            .results
            .clone()
            .unwrap_or_else(|| TeamResults::initial(game_type));
        let mut row = vec![Cell::Int(i as i64 + 1), Cell::text(name.as_str()), Cell::num(score)];
        row.extend(result_cells(&results));
        t.rows.push(row);
    }
    t
}

fn history_columns(game_type: GameType) -> &'static [&'static str] {
    match game_type {
        GameType::BuildCountry => &[
            "Round",
            "Tax Rate (%)",
            "Education (%)",
            "Infrastructure (%)",
            "Climate Policy",
            "GDP",
            "Employment (%)",
            "Inequality",
            "Approval (%)",
            "Debt (% GDP)",
            "Deficit (% GDP)",
            "Score",
        ],
        GameType::BeatMarket => &[
            "Round",
            "Cash (%)",
            "Bonds (%)",
            "Shares (%)",
            "Crypto (%)",
            "Portfolio Value",
            "Returns (%)",
            "Risk",
            "Risk-Adj Score",
        ],
        GameType::CryptoCrash => &[
            "Round",
            "BTC (%)",
            "ETH (%)",
            "DOGE (%)",
            "Stable (%)",
            "Leverage",
            "Equity",
            "Round Return (%)",
            "Risk Label",
            "Liquidations",
        ],
    }
}

fn history_row(round: u32, snap: &RoundSnapshot) -> Vec<Cell> {
    let mut row = vec![Cell::Int(i64::from(round))];
    match &snap.decisions {
        Decisions::BuildCountry(d) => row.extend([
            Cell::num(d.tax_rate),
            Cell::num(d.education_spending),
            Cell::num(d.infrastructure_spending),
            Cell::text(format!("{:?}", d.climate_policy)),
        ]),
        Decisions::BeatMarket(a) => row.extend(a.as_array().map(Cell::num)),
        Decisions::CryptoCrash(c) => {
            row.extend(c.allocations.as_array().map(Cell::num));
            row.push(Cell::num(c.leverage));
        }
    }
    match &snap.results {
        TeamResults::BuildCountry(c) => row.extend([
            Cell::num(c.metrics.gdp),
            Cell::num(c.metrics.employment),
            Cell::num(c.metrics.inequality),
            Cell::num(c.metrics.approval),
            Cell::num(c.fiscal.debt_pct_gdp),
            Cell::num(c.fiscal.deficit_pct_gdp),
            Cell::num(snap.score),
        ]),
        TeamResults::BeatMarket(p) => row.extend([
            Cell::num(p.value),
            Cell::num(p.returns),
            Cell::num(p.risk),
            Cell::num(snap.score),
        ]),
        TeamResults::CryptoCrash(p) => row.extend([
            Cell::num(p.equity),
            Cell::num(p.last_return_pct),
            Cell::text(p.risk_label.as_str()),
            Cell::Int(i64::from(p.liquidations)),
        ]),
    }
    row
}

/// Build the full report for a session.
pub fn build_report(session: &GameSession) -> Report {
    let columns = history_columns(session.game_type);
    let teams = session
        .teams
        .iter()
        .filter(|(_, t)| !t.round_history.is_empty())
        .map(|(name, t)| {
            let mut table = Table::new(sheet_title(name), columns);
            table.rows = t
                .round_history
                .iter()
                .map(|(round, snap)| history_row(*round, snap))
                .collect();
            table
        })
        .collect();
    Report {
        summary: summary(session),
        final_scores: final_scores(session),
        teams,
    }
}
