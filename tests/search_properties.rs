// Search properties
//
// Minimax behaviour checked through the public API on positions reached by
// seeded random play.

use std::sync::Arc;

use microchess::{
    minimax, Color, Coord, Evaluator, MicroChessError, MinimaxAgent, Move, PieceType, Position,
    SearchConfig, UniformMaterial, WeightVector, WeightedMaterial,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Undecided positions along a few seeded random games.
fn sample_positions(seed: u64, count: usize) -> Vec<Position> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut samples = Vec::new();
    while samples.len() < count {
        let mut position = Position::initial();
        for _ in 0..12 {
            if position.winner().is_decided() {
                break;
            }
            samples.push(position.clone());
            let moves = position.legal_moves_for_mover();
            let chosen = *moves.choose(&mut rng).unwrap();
            position.apply_move(chosen).unwrap();
        }
    }
    samples.truncate(count);
    samples
}

#[test]
fn depth_zero_is_the_static_evaluation() {
    let evaluator = WeightedMaterial::new(WeightVector::new([0.8, 0.6, 0.3, 1.0]));
    for position in sample_positions(1, 25) {
        let (value, best) = minimax(&position, 0, &evaluator).unwrap();
        assert_eq!(value, evaluator.evaluate(&position));
        assert!(best.is_none());
    }
}

#[test]
fn agent_and_free_function_agree() {
    let evaluator = Arc::new(UniformMaterial::new());
    let agent = MinimaxAgent::new(evaluator.clone(), 2);
    for position in sample_positions(2, 8) {
        let result = agent.search(&position).unwrap();
        let (value, best) = minimax(&position, 2, evaluator.as_ref()).unwrap();
        assert_eq!(result.evaluation, value);
        assert_eq!(result.best_move, best);
        assert!(position.legal_moves_for_mover().contains(&best.unwrap()));
    }
}

#[test]
fn deeper_search_visits_more_nodes() {
    let position = Position::initial();
    let shallow = MinimaxAgent::new(Arc::new(UniformMaterial::new()), 1)
        .search(&position)
        .unwrap();
    let deep = MinimaxAgent::new(Arc::new(UniformMaterial::new()), 2)
        .search(&position)
        .unwrap();
    assert!(deep.nodes_searched > shallow.nodes_searched);
}

#[test]
fn white_finds_mate_as_the_minimizing_side() {
    // White to move: the rook lift to (0, 2) mates, the rook on row 1 covers
    // the escape squares and the Black pawn rules out stalemate lines.
    let position = Position::from_placements(
        Color::White,
        &[
            (Color::Black, PieceType::King, Coord::new(0, 0)),
            (Color::White, PieceType::Rook, Coord::new(1, 3)),
            (Color::Black, PieceType::Pawn, Coord::new(2, 3)),
            (Color::White, PieceType::King, Coord::new(4, 0)),
            (Color::White, PieceType::Rook, Coord::new(4, 2)),
        ],
    )
    .unwrap();

    let result = MinimaxAgent::new(Arc::new(UniformMaterial::new()), 1)
        .search(&position)
        .unwrap();
    assert_eq!(result.evaluation, f64::NEG_INFINITY);
    assert_eq!(
        result.best_move,
        Some(Move::new(Coord::new(4, 2), Coord::new(0, 2)))
    );
}

#[test]
fn node_budget_bounds_the_search() {
    let position = Position::initial();
    let unlimited = MinimaxAgent::new(Arc::new(UniformMaterial::new()), 2)
        .search(&position)
        .unwrap();

    let exact = MinimaxAgent::with_config(
        Arc::new(UniformMaterial::new()),
        SearchConfig {
            depth: 2,
            max_nodes: Some(unlimited.nodes_searched),
        },
    )
    .search(&position)
    .unwrap();
    assert_eq!(exact.best_move, unlimited.best_move);

    let short = MinimaxAgent::with_config(
        Arc::new(UniformMaterial::new()),
        SearchConfig {
            depth: 2,
            max_nodes: Some(unlimited.nodes_searched - 1),
        },
    )
    .search(&position);
    assert!(matches!(
        short,
        Err(MicroChessError::SearchBudgetExhausted { .. })
    ));
}
