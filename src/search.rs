use crate::errors::{MicroChessError, Result};
use crate::evaluation::{Evaluator, MAXIMIZING_SIDE};
use crate::position::{Move, Outcome, Position};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Search configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Plies searched below the root
    pub depth: u32,
    /// Abort with `SearchBudgetExhausted` after visiting this many nodes.
    /// `None` searches the full tree.
    pub max_nodes: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            depth: 2,
            max_nodes: None,
        }
    }
}

/// Search result
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Minimax value from the maximizing side's point of view
    pub evaluation: f64,
    /// `None` at a decided position or when searched at depth 0
    pub best_move: Option<Move>,
    pub depth: u32,
    pub nodes_searched: u64,
    pub time_elapsed: Duration,
}

/// Depth-limited exhaustive minimax player.
///
/// Values are always oriented toward [`MAXIMIZING_SIDE`], whichever side is
/// to move at the root. There is no pruning: the whole tree below the depth
/// bound is visited.
#[derive(Clone)]
pub struct MinimaxAgent {
    evaluator: Arc<dyn Evaluator>,
    config: SearchConfig,
}

impl MinimaxAgent {
    pub fn new(evaluator: Arc<dyn Evaluator>, depth: u32) -> Self {
        Self::with_config(
            evaluator,
            SearchConfig {
                depth,
                ..SearchConfig::default()
            },
        )
    }

    pub fn with_config(evaluator: Arc<dyn Evaluator>, config: SearchConfig) -> Self {
        Self { evaluator, config }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn evaluator_name(&self) -> &'static str {
        self.evaluator.component_name()
    }

    pub fn search(&self, position: &Position) -> Result<SearchResult> {
        let start = Instant::now();
        let mut tree = Minimax {
            evaluator: self.evaluator.as_ref(),
            nodes: 0,
            max_nodes: self.config.max_nodes,
        };
        let (evaluation, best_move) = tree.visit(position, self.config.depth)?;

        tracing::trace!(
            nodes = tree.nodes,
            depth = self.config.depth,
            evaluation,
            "minimax search finished"
        );

        Ok(SearchResult {
            evaluation,
            best_move,
            depth: self.config.depth,
            nodes_searched: tree.nodes,
            time_elapsed: start.elapsed(),
        })
    }

    /// The move minimax prefers, `None` when the game is already decided.
    pub fn choose_move(&self, position: &Position) -> Result<Option<Move>> {
        Ok(self.search(position)?.best_move)
    }
}

impl std::fmt::Debug for MinimaxAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MinimaxAgent")
            .field("evaluator", &self.evaluator.component_name())
            .field("config", &self.config)
            .finish()
    }
}

/// Plain minimax over `position` to `depth` plies, returning the value and
/// the chosen move.
pub fn minimax(
    position: &Position,
    depth: u32,
    evaluator: &dyn Evaluator,
) -> Result<(f64, Option<Move>)> {
    Minimax {
        evaluator,
        nodes: 0,
        max_nodes: None,
    }
    .visit(position, depth)
}

struct Minimax<'a> {
    evaluator: &'a dyn Evaluator,
    nodes: u64,
    max_nodes: Option<u64>,
}

impl Minimax<'_> {
    fn visit(&mut self, position: &Position, depth: u32) -> Result<(f64, Option<Move>)> {
        self.nodes += 1;
        if let Some(limit) = self.max_nodes {
            if self.nodes > limit {
                return Err(MicroChessError::SearchBudgetExhausted { nodes: self.nodes });
            }
        }

        let moves = position.legal_moves_for_mover();

        // Decided positions win over the depth cutoff so mates are seen at depth 0.
        match position.outcome_with(&moves) {
            Outcome::Winner(color) if color == MAXIMIZING_SIDE => return Ok((f64::INFINITY, None)),
            Outcome::Winner(_) => return Ok((f64::NEG_INFINITY, None)),
            Outcome::Draw => return Ok((0.0, None)),
            Outcome::Ongoing => {}
        }

        if depth == 0 {
            return Ok((self.evaluator.evaluate(position), None));
        }

        let maximizing = position.turn() == MAXIMIZING_SIDE;
        let mut best_value = if maximizing {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
        let mut best_move = None;

        for mv in moves {
            let child = position.simulate_move(mv)?;
            let (value, _) = self.visit(&child, depth - 1)?;
            // Non-strict: the last move tying the best value is kept.
            let replaces = if maximizing {
                value >= best_value
            } else {
                value <= best_value
            };
            if replaces {
                best_value = value;
                best_move = Some(mv);
            }
        }

        Ok((best_value, best_move))
    }
}
