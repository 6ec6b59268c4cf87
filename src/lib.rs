//! # MicroChess
//!
//! A 5×4 chess variant with an exhaustive minimax player and a genetic
//! algorithm that tunes the player's material weights through self-play.
//!
//! ## Features
//!
//! - **Rules engine**: legal move generation per piece type, check and
//!   checkmate detection by move simulation, lone-King draws
//! - **Minimax search**: depth-limited, no pruning, values always oriented
//!   toward Black
//! - **Weighted material evaluation**: one tunable weight per Rook, Knight,
//!   Bishop and Pawn
//! - **Self-play**: matches between strategies with a configurable share of
//!   random moves
//! - **Breeding**: memoized fitness, blend crossover, mutation, elitist
//!   survivor selection, optional rayon-parallel evaluation
//!
//! ## Quick Start
//!
//! ```rust
//! use microchess::{MinimaxAgent, Position, UniformMaterial};
//! use std::sync::Arc;
//!
//! let position = Position::initial();
//! let agent = MinimaxAgent::new(Arc::new(UniformMaterial::new()), 1);
//!
//! let result = agent.search(&position).unwrap();
//! println!("{} nodes, best move {:?}", result.nodes_searched, result.best_move);
//! assert!(position.legal_moves_for_mover().contains(&result.best_move.unwrap()));
//! ```

// Core modules
pub mod errors;
pub mod piece;
pub mod position;

pub mod evaluation;
pub mod genetic;
pub mod search;
pub mod self_play;

// Re-export commonly used types
pub use errors::{MicroChessError, Result};
pub use evaluation::{
    random_score, uniform_material, weighted_material, Evaluator, UniformMaterial, WeightVector,
    WeightedMaterial, GENOME_LEN, MAXIMIZING_SIDE, TUNED_PIECES,
};
pub use genetic::{
    crossover, fitness_vs_uniform, mutate, random_population, select_most_fit, BreedConfig,
    BreedReport, FitnessMemo, GenerationStats, GeneticAlgorithm,
};
pub use piece::{Color, Coord, Piece, PieceType, COLS, ROWS};
pub use position::{Move, Outcome, Position, INITIAL_LAYOUT};
pub use search::{minimax, MinimaxAgent, SearchConfig, SearchResult};
pub use self_play::{compare, first_strategy_color, MatchReport, SelfPlayConfig, Strategy};
