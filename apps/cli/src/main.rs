#![deny(warnings)]

//! Headless CLI that plays a scripted classroom game end to end.
//!
//! Teams join with their team codes, submit a fixed strategy each round and
//! the instructor advances until the game finishes. The final leaderboard is
//! printed, and `--report` dumps the full report as JSON.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use game_core::{
    ClimatePolicy, CoinAllocation, CryptoDecisions, Decisions, EngineConfig, GameType,
    PolicyDecisions, PortfolioAllocation,
};
use game_runtime::{build_report, leaderboard, GameContext, RoundStep};
use persistence::{JsonFileStore, MemoryStore, SessionStore};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct Args {
    config: Option<PathBuf>,
    game: GameType,
    teams: u32,
    rounds: Option<u32>,
    seed: u64,
    persist: bool,
    report: bool,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        config: None,
        game: GameType::BuildCountry,
        teams: 3,
        rounds: None,
        seed: 42,
        persist: false,
        report: false,
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => args.config = it.next().map(PathBuf::from),
            "--game" => {
                let g = it.next().context("--game needs a value")?;
                args.game = g.parse()?;
            }
            "--teams" => args.teams = it.next().and_then(|s| s.parse().ok()).unwrap_or(args.teams),
            "--rounds" => args.rounds = it.next().and_then(|s| s.parse().ok()),
            "--seed" => args.seed = it.next().and_then(|s| s.parse().ok()).unwrap_or(args.seed),
            "--persist" => args.persist = true,
            "--report" => args.report = true,
            _ => {}
        }
    }
    Ok(args)
}

fn load_config(path: Option<&PathBuf>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_yaml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

/// Fixed per-team strategy: team 0 plays it safe, later teams take more risk.
fn strategy(game: GameType, team: usize, round: u32) -> Decisions {
    let step = (team as f64) * 10.0;
    match game {
        GameType::BuildCountry => Decisions::BuildCountry(PolicyDecisions {
            tax_rate: (30.0 - step).clamp(10.0, 50.0),
            education_spending: (20.0 + step).clamp(10.0, 50.0),
            infrastructure_spending: (20.0 + f64::from(round) * 5.0).clamp(10.0, 50.0),
            climate_policy: match team % 3 {
                0 => ClimatePolicy::Moderate,
                1 => ClimatePolicy::Strong,
                _ => ClimatePolicy::Weak,
            },
        }),
        GameType::BeatMarket => {
            let risky = (20.0 + step * 2.0).min(80.0);
            Decisions::BeatMarket(PortfolioAllocation::from_array([
                (100.0 - risky) / 2.0,
                (100.0 - risky) / 2.0,
                risky * 0.75,
                risky * 0.25,
            ]))
        }
        GameType::CryptoCrash => Decisions::CryptoCrash(CryptoDecisions {
            allocations: if team == 0 {
                CoinAllocation::from_array([10.0, 5.0, 0.0, 85.0])
            } else {
                CoinAllocation::from_array([40.0, 30.0, 20.0, 10.0])
            },
            leverage: (1.0 + team as f64).min(5.0),
        }),
    }
}

fn play<S: SessionStore>(ctx: &mut GameContext<S>, args: &Args) -> Result<()> {
    let mut settings = ctx.config().default_settings(args.game, args.teams);
    if let Some(rounds) = args.rounds {
        settings.num_rounds = rounds;
    }
    let mut now = Utc::now();
    let session = ctx.create_session(args.game, "CLI", settings, now)?;
    let code = session.join_code.clone();
    info!(join_code = %code, game = %args.game, "session created");

    let mut teams = Vec::new();
    for (i, team_code) in session.team_codes.keys().enumerate() {
        let name = format!("Team {}", i + 1);
        ctx.join_team(&code, &name, Some(team_code.as_str()), now)?;
        teams.push(name);
    }

    ctx.start_game(&code, now)?;
    loop {
        let round = ctx.session(&code)?.current_round;
        for (i, team) in teams.iter().enumerate() {
            // The last team sits out round 2 to exercise auto-submission.
            if round == 2 && i + 1 == teams.len() && teams.len() > 1 {
                continue;
            }
            ctx.submit_decisions(&code, team, strategy(args.game, i, round))?;
        }
        now += Duration::seconds(30);
        let timer = ctx.check_round_timer(&code, now)?;
        info!(round, ?timer, "round closing");
        match ctx.next_round(&code, now)? {
            RoundStep::Advanced { round } => info!(round, "advanced"),
            RoundStep::Finished => break,
        }
    }

    let finished = ctx.session(&code)?;
    println!(
        "Game {} | {} | rounds: {} | teams: {}",
        finished.join_code,
        finished.game_type,
        finished.settings.num_rounds,
        finished.teams.len()
    );
    for entry in leaderboard(&finished) {
        println!(
            "#{} {:<10} {:>10.2}{}",
            entry.rank,
            entry.team,
            entry.score,
            if entry.auto_submitted { " (auto)" } else { "" }
        );
    }
    if args.report {
        println!("{}", serde_json::to_string_pretty(&build_report(&finished))?);
    }
    Ok(())
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .init();

    let args = parse_args()?;
    info!(?args, "starting CLI");
    let config = load_config(args.config.as_ref())?;

    if args.persist {
        let store = JsonFileStore::in_dir(&config.data_directory);
        info!(path = %store.path().display(), "using JSON store");
        play(&mut GameContext::new(store, config, args.seed), &args)
    } else {
        play(&mut GameContext::new(MemoryStore::new(), config, args.seed), &args)
    }
}
