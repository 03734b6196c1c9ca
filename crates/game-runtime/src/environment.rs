//! Per-round environment generation.
//!
//! Each call is an independent draw: a scenario for Build-a-Country, a
//! market event for Beat-the-Market, or a fresh set of crypto indicators
//! with narrative notes.

use game_core::{
    CryptoMarket, Difficulty, GameType, IndicatorNote, IndicatorNotes, MarketEvent,
    MarketEventKind, MarketIndicators, RoundEnvironment, Scenario, ScenarioKind,
};
use rand::seq::SliceRandom;
use rand::Rng;

pub fn scenario(kind: ScenarioKind) -> Scenario {
    let (name, description, hint) = match kind {
        ScenarioKind::Recession => (
            "Global Recession",
            "A worldwide recession hits. Exports fall, unemployment rises and investors pull \
             back. Tax revenue shrinks while pressure for public support grows.",
            "Cut wasteful spending, protect safety nets and fund job programs.",
        ),
        ScenarioKind::TechBoom => (
            "Tech Boom",
            "Innovation lifts productivity and draws in foreign investment. New industries \
             appear and wages rise, though inequality may widen.",
            "Invest in education and infrastructure and keep opportunity broadly shared.",
        ),
        ScenarioKind::NaturalDisaster => (
            "Natural Disaster",
            "A major disaster wrecks infrastructure and disrupts production. Housing is short \
             and supply problems push prices up.",
            "Prioritise emergency spending and rebuild infrastructure.",
        ),
        ScenarioKind::ClimateCrisis => (
            "Climate Crisis",
            "Pollution and extreme weather damage crops, health and long-term growth. \
             Investors and neighbours demand sustainability reforms.",
            "Back clean energy, enforce regulation and plan for resilience.",
        ),
        ScenarioKind::TradeAgreement => (
            "Trade Agreement",
            "A new trade deal opens foreign markets and lowers tariffs. Exports surge but local \
             industries face tougher competition.",
            "Support key industries and invest in logistics.",
        ),
        ScenarioKind::SocialMovement => (
            "Social Movement",
            "Large protests demand fair wages, equality and better public services. Trust \
             drops, but reform could strengthen stability.",
            "Raise social investment and reduce inequality.",
        ),
    };
    Scenario {
        kind,
        name: name.to_string(),
        description: description.to_string(),
        hint: hint.to_string(),
    }
}

pub fn market_event(kind: MarketEventKind) -> MarketEvent {
    let (name, description, hint) = match kind {
        MarketEventKind::BullRally => (
            "Bull Market Rally",
            "Optimism spreads and stocks climb quickly. Speculative trading picks up and \
             valuations stretch.",
            "Ride the momentum but stay diversified in case it reverses.",
        ),
        MarketEventKind::RateHike => (
            "Interest Rate Hike",
            "The central bank raises rates to fight inflation. Borrowing gets expensive and \
             spending slows.",
            "Lean toward defensive holdings and avoid heavily indebted companies.",
        ),
        MarketEventKind::CompanyScandal => (
            "Company Scandal",
            "A major firm is caught manipulating its accounts. Confidence drops and the whole \
             sector sells off.",
            "Diversify and consider safer assets for a while.",
        ),
        MarketEventKind::TechBreakthrough => (
            "Tech Breakthrough",
            "An AI breakthrough reshapes the tech landscape. Tech stocks rally while older \
             firms risk falling behind.",
            "Back innovators, but do not chase hype without fundamentals.",
        ),
        MarketEventKind::MarketCorrection => (
            "Market Correction",
            "After a long rally, markets drop sharply as traders take profits.",
            "Hold quality assets and avoid panic selling.",
        ),
        MarketEventKind::ClimateRegulation => (
            "Climate Regulation",
            "Strict climate laws raise costs for polluters while renewables gain ground.",
            "Cut exposure to fossil-heavy firms and look at ESG leaders.",
        ),
    };
    MarketEvent {
        kind,
        name: name.to_string(),
        description: description.to_string(),
        hint: hint.to_string(),
    }
}

/// Sample crypto indicators. Difficulty scales the price-change range.
pub fn draw_indicators<R: Rng + ?Sized>(rng: &mut R, difficulty: Difficulty) -> MarketIndicators {
    let swing = 20.0 * difficulty.volatility();
    MarketIndicators {
        sentiment: rng.gen_range(20..=80),
        volume: rng.gen_range(30..=90),
        hype: rng.gen_range(25..=95),
        price: round2(rng.gen_range(8000.0..=15000.0)),
        price_change: round2(rng.gen_range(-swing..=swing)),
        stable_drift: rng.gen_range(-0.05..=0.08),
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn note(text: &str, hint: &str) -> IndicatorNote {
    IndicatorNote {
        text: text.to_string(),
        hint: hint.to_string(),
    }
}

/// Narrative notes derived from indicator thresholds.
pub fn describe(ind: &MarketIndicators) -> IndicatorNotes {
    let sentiment = if ind.sentiment < 35 {
        note(
            "Fear dominates the market and selling pressure is rising.",
            "Reduce risk: more stablecoin, less leverage, or wait for calmer conditions.",
        )
    } else if ind.sentiment > 65 {
        note(
            "Optimism is high and traders expect prices to keep rising.",
            "Consider taking profits and avoid extreme leverage.",
        )
    } else {
        note(
            "Sentiment is mixed and traders are waiting for direction.",
            "Diversify across BTC and ETH and keep some stablecoin.",
        )
    };
    let volume = if ind.volume > 75 {
        note(
            "Trading volume is very high; big players may be moving money.",
            "High volume can mean a breakout or a crash. Use lower leverage if unsure.",
        )
    } else if ind.volume < 40 {
        note(
            "Trading volume is weak and the market is thin and jumpy.",
            "Thin markets crash easily. Hold more stablecoin and avoid leverage.",
        )
    } else {
        note(
            "Trading volume is normal, with steady but cautious activity.",
            "Follow the trend but keep some stablecoin as protection.",
        )
    };
    let hype = if ind.hype > 75 {
        note(
            "Social media hype is exploding. Meme coins can spike and crash fast.",
            "DOGE with leverage is the riskiest combination.",
        )
    } else if ind.hype < 40 {
        note(
            "Hype is low and attention is fading.",
            "Fewer pumps, but also less buying demand.",
        )
    } else {
        note(
            "Hype is moderate; speculation exists but is not yet a mania.",
            "Focus on BTC and ETH and manage leverage.",
        )
    };
    IndicatorNotes {
        sentiment,
        volume,
        hype,
    }
}

pub fn crypto_market(indicators: MarketIndicators) -> CryptoMarket {
    let notes = describe(&indicators);
    let story = format!(
        "{} {} {}",
        notes.sentiment.text, notes.volume.text, notes.hype.text
    );
    CryptoMarket {
        indicators,
        story,
        notes,
    }
}

/// Draw the environment for the next round of a `game_type` session.
pub fn generate<R: Rng + ?Sized>(
    rng: &mut R,
    game_type: GameType,
    difficulty: Difficulty,
) -> RoundEnvironment {
    match game_type {
        GameType::BuildCountry => {
            let kind = *ScenarioKind::ALL
                .choose(rng)
                .unwrap_or(&ScenarioKind::Recession);
            RoundEnvironment::Scenario(scenario(kind))
        }
        GameType::BeatMarket => {
            let kind = *MarketEventKind::ALL
                .choose(rng)
                .unwrap_or(&MarketEventKind::BullRally);
            RoundEnvironment::MarketEvent(market_event(kind))
        }
        GameType::CryptoCrash => {
            RoundEnvironment::Crypto(crypto_market(draw_indicators(rng, difficulty)))
        }
    }
}
