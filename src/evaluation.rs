//! Static evaluation of MicroChess positions.
//!
//! Every evaluator returns a score from a fixed side's point of view:
//! positive is good for `perspective`, negative is good for its opponent.
//! Search maximizes for [`MAXIMIZING_SIDE`], so evaluators default to it.

use std::hash::{Hash, Hasher};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::piece::{Color, PieceType};
use crate::position::Position;

/// Side whose score minimax maximizes.
pub const MAXIMIZING_SIDE: Color = Color::Black;

/// Piece types whose values are tuned, in genome order.
pub const TUNED_PIECES: [PieceType; 4] = [
    PieceType::Rook,
    PieceType::Knight,
    PieceType::Bishop,
    PieceType::Pawn,
];

pub const GENOME_LEN: usize = TUNED_PIECES.len();

/// Interface for evaluation functions plugged into search
pub trait Evaluator: Send + Sync {
    fn evaluate(&self, position: &Position) -> f64;
    fn component_name(&self) -> &'static str;
}

/// Per-piece-type material values for Rook, Knight, Bishop and Pawn.
/// King and Queen are always worth 0.
///
/// Equality and hashing are by exact bit pattern, so a vector can key the
/// fitness memo by value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WeightVector {
    genes: [f64; GENOME_LEN],
}

impl WeightVector {
    pub fn new(genes: [f64; GENOME_LEN]) -> Self {
        Self { genes }
    }

    /// The textbook 6/3/3/1 ratios, scaled so the Rook is worth 1.
    pub fn classic() -> Self {
        Self::new([6.0, 3.0, 3.0, 1.0]).normalized()
    }

    /// Uniform random genes, normalized.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut genes = [0.0; GENOME_LEN];
        for gene in genes.iter_mut() {
            *gene = rng.gen::<f64>();
        }
        Self::new(genes).normalized()
    }

    pub fn genes(&self) -> &[f64; GENOME_LEN] {
        &self.genes
    }

    pub fn genes_mut(&mut self) -> &mut [f64; GENOME_LEN] {
        &mut self.genes
    }

    pub fn weight(&self, kind: PieceType) -> f64 {
        TUNED_PIECES
            .iter()
            .position(|&tuned| tuned == kind)
            .map_or(0.0, |index| self.genes[index])
    }

    pub fn max_gene(&self) -> f64 {
        self.genes.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Scale so the largest gene is exactly 1. An all-zero vector is returned as is.
    pub fn normalized(mut self) -> Self {
        let max = self.max_gene();
        if max > 0.0 {
            for gene in self.genes.iter_mut() {
                *gene /= max;
            }
        }
        self
    }

    /// Genes rounded to `places` decimals, for reporting.
    pub fn rounded(&self, places: i32) -> [f64; GENOME_LEN] {
        let scale = 10f64.powi(places);
        self.genes.map(|gene| (gene * scale).round() / scale)
    }
}

impl PartialEq for WeightVector {
    fn eq(&self, other: &Self) -> bool {
        self.genes
            .iter()
            .zip(other.genes.iter())
            .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

impl Eq for WeightVector {}

impl Hash for WeightVector {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for gene in &self.genes {
            gene.to_bits().hash(state);
        }
    }
}

/// Sum of `weights` over `perspective`'s pieces minus the opponent's.
pub fn weighted_material(position: &Position, weights: &WeightVector, perspective: Color) -> f64 {
    let side_total = |color: Color| -> f64 {
        position
            .pieces(color)
            .map(|piece| weights.weight(piece.kind()))
            .sum()
    };
    side_total(perspective) - side_total(perspective.opponent())
}

/// Piece count of `perspective` minus the opponent's piece count.
pub fn uniform_material(position: &Position, perspective: Color) -> f64 {
    position.piece_count(perspective) as f64 - position.piece_count(perspective.opponent()) as f64
}

/// Unbounded pseudo-random score. Random play never runs it through search;
/// self-play picks a uniformly random legal move instead.
pub fn random_score<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let magnitude: f64 = rng.gen::<f64>() / (1.0 - rng.gen::<f64>());
    if rng.gen_bool(0.5) {
        magnitude
    } else {
        -magnitude
    }
}

/// Weighted material evaluation component
#[derive(Debug, Clone)]
pub struct WeightedMaterial {
    weights: WeightVector,
    perspective: Color,
}

impl WeightedMaterial {
    pub fn new(weights: WeightVector) -> Self {
        Self {
            weights,
            perspective: MAXIMIZING_SIDE,
        }
    }

    pub fn with_perspective(mut self, perspective: Color) -> Self {
        self.perspective = perspective;
        self
    }

    pub fn weights(&self) -> &WeightVector {
        &self.weights
    }
}

impl Evaluator for WeightedMaterial {
    fn evaluate(&self, position: &Position) -> f64 {
        weighted_material(position, &self.weights, self.perspective)
    }

    fn component_name(&self) -> &'static str {
        "WeightedMaterial"
    }
}

/// Every non-King piece counts the same
#[derive(Debug, Clone)]
pub struct UniformMaterial {
    perspective: Color,
}

impl UniformMaterial {
    pub fn new() -> Self {
        Self {
            perspective: MAXIMIZING_SIDE,
        }
    }

    pub fn with_perspective(mut self, perspective: Color) -> Self {
        self.perspective = perspective;
        self
    }
}

impl Default for UniformMaterial {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator for UniformMaterial {
    fn evaluate(&self, position: &Position) -> f64 {
        uniform_material(position, self.perspective)
    }

    fn component_name(&self) -> &'static str {
        "UniformMaterial"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::{Coord, ROWS};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn fixture() -> Vec<(Color, PieceType, Coord)> {
        vec![
            (Color::Black, PieceType::King, Coord::new(0, 0)),
            (Color::Black, PieceType::Rook, Coord::new(0, 3)),
            (Color::Black, PieceType::Pawn, Coord::new(1, 1)),
            (Color::White, PieceType::King, Coord::new(4, 3)),
            (Color::White, PieceType::Knight, Coord::new(3, 0)),
        ]
    }

    fn mirrored(placements: &[(Color, PieceType, Coord)]) -> Vec<(Color, PieceType, Coord)> {
        placements
            .iter()
            .map(|&(color, kind, coord)| {
                (
                    color.opponent(),
                    kind,
                    Coord::new(ROWS - 1 - coord.row, coord.col),
                )
            })
            .collect()
    }

    #[test]
    fn test_initial_position_is_balanced() {
        let position = Position::initial();
        let weighted = WeightedMaterial::new(WeightVector::classic());
        assert!(weighted.evaluate(&position).abs() < 1e-12);
        assert_eq!(UniformMaterial::new().evaluate(&position), 0.0);
    }

    #[test]
    fn test_weighted_material_counts_per_type() {
        let position = Position::from_placements(Color::White, &fixture()).unwrap();
        let weights = WeightVector::new([1.0, 0.25, 0.5, 0.125]);
        // Black: rook + pawn = 1.125, White: knight = 0.25
        let score = WeightedMaterial::new(weights).evaluate(&position);
        assert!((score - 0.875).abs() < 1e-12);
        assert_eq!(UniformMaterial::new().evaluate(&position), 1.0);
    }

    #[test]
    fn test_perspective_swap_negates() {
        let position = Position::from_placements(Color::White, &fixture()).unwrap();
        let weights = WeightVector::classic();
        let black = WeightedMaterial::new(weights).evaluate(&position);
        let white = WeightedMaterial::new(weights)
            .with_perspective(Color::White)
            .evaluate(&position);
        assert_eq!(black, -white);
    }

    #[test]
    fn test_color_mirrored_position_scores_the_same_for_the_swapped_side() {
        let placements = fixture();
        let original = Position::from_placements(Color::White, &placements).unwrap();
        let mirror = Position::from_placements(Color::Black, &mirrored(&placements)).unwrap();
        let weights = WeightVector::new([0.9, 0.4, 0.35, 0.1]);

        let black_view = weighted_material(&original, &weights, Color::Black);
        let white_view_of_mirror = weighted_material(&mirror, &weights, Color::White);
        assert_eq!(black_view, white_view_of_mirror);
        assert_eq!(black_view, -weighted_material(&mirror, &weights, Color::Black));
    }

    #[test]
    fn test_king_and_queen_are_weightless() {
        let weights = WeightVector::new([0.3, 0.2, 0.1, 1.0]);
        assert_eq!(weights.weight(PieceType::King), 0.0);
        assert_eq!(weights.weight(PieceType::Queen), 0.0);
        assert_eq!(weights.weight(PieceType::Pawn), 1.0);
        assert_eq!(weights.weight(PieceType::Knight), 0.2);
    }

    #[test]
    fn test_normalization_sets_max_to_one() {
        let weights = WeightVector::new([0.2, 0.4, 0.1, 0.05]).normalized();
        assert_eq!(weights.max_gene(), 1.0);
        assert_eq!(weights.genes()[0], 0.5);

        let zero = WeightVector::new([0.0; GENOME_LEN]).normalized();
        assert_eq!(zero.genes(), &[0.0; GENOME_LEN]);

        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..20 {
            let random = WeightVector::random(&mut rng);
            assert_eq!(random.max_gene(), 1.0);
            assert!(random.genes().iter().all(|g| (0.0..=1.0).contains(g)));
        }
    }

    #[test]
    fn test_value_equality_and_hashing() {
        let a = WeightVector::new([1.0, 0.5, 0.25, 0.125]);
        let b = WeightVector::new([1.0, 0.5, 0.25, 0.125]);
        let c = WeightVector::new([1.0, 0.5, 0.25, 0.126]);
        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<WeightVector> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_rounded_for_reports() {
        let weights = WeightVector::new([1.0, 0.123456, 0.5, 0.0]);
        assert_eq!(weights.rounded(2), [1.0, 0.12, 0.5, 0.0]);
    }

    #[test]
    fn test_random_score_takes_both_signs() {
        let mut rng = StdRng::seed_from_u64(3);
        let scores: Vec<f64> = (0..200).map(|_| random_score(&mut rng)).collect();
        assert!(scores.iter().any(|&s| s > 0.0));
        assert!(scores.iter().any(|&s| s < 0.0));
        assert!(scores.iter().all(|s| s.is_finite()));
    }
}
