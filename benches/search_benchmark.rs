use criterion::{black_box, criterion_group, criterion_main, Criterion};
use microchess::{compare, minimax, Position, SelfPlayConfig, Strategy, UniformMaterial, WeightVector, WeightedMaterial};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn benchmark_move_generation(c: &mut Criterion) {
    let position = Position::initial();
    let after_pawn = position
        .simulate_move(position.legal_moves_for_mover()[0])
        .expect("legal move");

    c.bench_function("legal_moves_initial", |b| {
        b.iter(|| black_box(position.legal_moves_for_mover()))
    });

    c.bench_function("legal_moves_black_reply", |b| {
        b.iter(|| black_box(after_pawn.legal_moves_for_mover()))
    });

    c.bench_function("winner_initial", |b| b.iter(|| black_box(position.winner())));
}

fn benchmark_minimax(c: &mut Criterion) {
    let position = Position::initial();
    let weighted = WeightedMaterial::new(WeightVector::classic());
    let uniform = UniformMaterial::new();

    let mut group = c.benchmark_group("minimax");
    group.sample_size(20);
    for depth in [2, 3] {
        group.bench_function(format!("weighted_depth_{depth}"), |b| {
            b.iter(|| black_box(minimax(&position, depth, &weighted)))
        });
        group.bench_function(format!("uniform_depth_{depth}"), |b| {
            b.iter(|| black_box(minimax(&position, depth, &uniform)))
        });
    }
    group.finish();
}

fn benchmark_self_play(c: &mut Criterion) {
    let config = SelfPlayConfig {
        games: 2,
        agent_probability: 0.9,
        depth: 1,
        max_plies: Some(80),
    };
    let first = Strategy::weighted(WeightVector::classic());
    let second = Strategy::uniform();

    let mut group = c.benchmark_group("self_play");
    group.sample_size(10);
    group.bench_function("two_games_depth_1", |b| {
        let mut rng = StdRng::seed_from_u64(17);
        b.iter(|| black_box(compare(&first, &second, &config, &mut rng)))
    });
    group.finish();
}

criterion_group!(
    benches,
    benchmark_move_generation,
    benchmark_minimax,
    benchmark_self_play
);
criterion_main!(benches);
