use chrono::{TimeZone, Utc};
use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use game_core::{EngineConfig, GameSession, GameType, SessionStatus, TeamState};
use game_runtime::rounds;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn classroom(game_type: GameType, teams: usize) -> GameSession {
    let now = Utc.with_ymd_and_hms(2024, 1, 8, 9, 0, 0).unwrap();
    let mut s = GameSession::new(
        "BENCH1".into(),
        game_type,
        "Bench".into(),
        EngineConfig::default().default_settings(game_type, 8),
        now,
    );
    for i in 0..teams {
        s.teams
            .insert(format!("Team {i}"), TeamState::new(now, None, None));
    }
    s.status = SessionStatus::Running;
    s.current_round = 1;
    s
}

fn bench_rounds(c: &mut Criterion) {
    for game_type in GameType::ALL {
        let base = classroom(game_type, 30);
        c.bench_function(&format!("advance_round_{game_type}"), |b| {
            let mut rng = ChaCha8Rng::seed_from_u64(42);
            b.iter_batched(
                || base.clone(),
                |mut s| rounds::advance_round(&mut s, &mut rng),
                BatchSize::SmallInput,
            )
        });
    }
}

criterion_group!(benches, bench_rounds);
criterion_main!(benches);
