//! Self-play between two move strategies.
//!
//! A match is a fixed number of full games from the initial position. Colors
//! alternate by game index: in even-numbered games the first strategy plays
//! Black. On every ply the mover follows its strategy with probability
//! `agent_probability` and otherwise plays a uniformly random legal move.

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::errors::{MicroChessError, Result};
use crate::evaluation::{Evaluator, UniformMaterial, WeightVector, WeightedMaterial};
use crate::piece::Color;
use crate::position::{Move, Outcome, Position};
use crate::search::MinimaxAgent;

/// How one side picks its moves during self-play.
#[derive(Clone)]
pub enum Strategy {
    /// Minimax over the given evaluator
    Search(Arc<dyn Evaluator>),
    /// Uniformly random legal moves; never wrapped in a search agent
    Random,
}

impl Strategy {
    pub fn weighted(weights: WeightVector) -> Self {
        Strategy::Search(Arc::new(WeightedMaterial::new(weights)))
    }

    pub fn uniform() -> Self {
        Strategy::Search(Arc::new(UniformMaterial::new()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Search(evaluator) => evaluator.component_name(),
            Strategy::Random => "Random",
        }
    }

    fn player(&self, depth: u32) -> Player {
        match self {
            Strategy::Search(evaluator) => Player::Agent(MinimaxAgent::new(evaluator.clone(), depth)),
            Strategy::Random => Player::Random,
        }
    }
}

impl std::fmt::Debug for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

enum Player {
    Agent(MinimaxAgent),
    Random,
}

/// Configuration for a self-play match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelfPlayConfig {
    /// Games per match
    pub games: usize,
    /// Chance that the mover follows its strategy instead of moving randomly
    pub agent_probability: f64,
    /// Minimax depth for search strategies
    pub depth: u32,
    /// Adjudicate a draw after this many plies. `None` plays every game out.
    pub max_plies: Option<usize>,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        Self {
            games: 10,
            agent_probability: 0.9,
            depth: 2,
            max_plies: None,
        }
    }
}

impl SelfPlayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.games == 0 {
            return Err(MicroChessError::invalid_config("games", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.agent_probability) {
            return Err(MicroChessError::invalid_config(
                "agent_probability",
                format!("{} is outside [0, 1]", self.agent_probability),
            ));
        }
        if self.depth == 0 {
            return Err(MicroChessError::invalid_config(
                "depth",
                "search strategies need at least one ply to pick a move",
            ));
        }
        if self.max_plies == Some(0) {
            return Err(MicroChessError::invalid_config("max_plies", "must be at least 1"));
        }
        Ok(())
    }
}

/// Tally of a match, from the first strategy's point of view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchReport {
    pub games: usize,
    pub wins: usize,
    pub losses: usize,
    /// Includes adjudicated games
    pub draws: usize,
    pub adjudicated: usize,
    /// Plies played over all games
    pub plies: usize,
}

impl MatchReport {
    /// Wins plus half the draws, over games played.
    pub fn win_rate(&self) -> f64 {
        if self.games == 0 {
            return 0.0;
        }
        (self.wins as f64 + self.draws as f64 / 2.0) / self.games as f64
    }

    /// Credit one finished game to the first strategy, which played
    /// `first_color`. An `Ongoing` outcome is an adjudicated draw.
    pub fn record(&mut self, outcome: Outcome, first_color: Color, plies: usize) {
        self.games += 1;
        self.plies += plies;
        match outcome {
            Outcome::Winner(color) if color == first_color => self.wins += 1,
            Outcome::Winner(_) => self.losses += 1,
            Outcome::Draw => self.draws += 1,
            Outcome::Ongoing => {
                self.draws += 1;
                self.adjudicated += 1;
            }
        }
    }
}

/// Color of the first strategy in game `game`: Black in even games, White in
/// odd ones.
pub fn first_strategy_color(game: usize) -> Color {
    if game % 2 == 0 {
        Color::Black
    } else {
        Color::White
    }
}

/// Play `config.games` games between `first` and `second` and report the
/// result for `first`.
pub fn compare<R: Rng + ?Sized>(
    first: &Strategy,
    second: &Strategy,
    config: &SelfPlayConfig,
    rng: &mut R,
) -> Result<MatchReport> {
    config.validate()?;

    let players = [first.player(config.depth), second.player(config.depth)];
    let mut report = MatchReport::default();

    for game in 0..config.games {
        let first_color = first_strategy_color(game);
        let (outcome, plies) = play_game(&players, first_color, config, rng)?;
        report.record(outcome, first_color, plies);

        tracing::debug!(
            game,
            first = first.name(),
            second = second.name(),
            first_color = ?first_color,
            outcome = ?outcome,
            plies,
            "self-play game finished"
        );
    }

    Ok(report)
}

/// Returns the final outcome, `Ongoing` if the ply cap stopped the game.
fn play_game<R: Rng + ?Sized>(
    players: &[Player; 2],
    first_color: Color,
    config: &SelfPlayConfig,
    rng: &mut R,
) -> Result<(Outcome, usize)> {
    let mut position = Position::initial();
    let mut plies = 0;

    loop {
        let moves = position.legal_moves_for_mover();
        let outcome = position.outcome_with(&moves);
        if outcome.is_decided() {
            return Ok((outcome, plies));
        }
        if config.max_plies.is_some_and(|cap| plies >= cap) {
            return Ok((Outcome::Ongoing, plies));
        }

        let mover = if position.turn() == first_color {
            &players[0]
        } else {
            &players[1]
        };
        let follow_strategy = rng.gen::<f64>() < config.agent_probability;
        let chosen = match mover {
            Player::Agent(agent) if follow_strategy => agent.choose_move(&position)?,
            _ => None,
        };
        let mv = match chosen {
            Some(mv) => mv,
            None => random_move(&moves, rng),
        };

        position.apply_move(mv)?;
        plies += 1;
    }
}

fn random_move<R: Rng + ?Sized>(moves: &[Move], rng: &mut R) -> Move {
    // The caller only gets here with an undecided position, which has moves.
    *moves
        .choose(rng)
        .unwrap_or_else(|| unreachable!("undecided position without legal moves"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn quick_config(games: usize) -> SelfPlayConfig {
        SelfPlayConfig {
            games,
            agent_probability: 0.8,
            depth: 1,
            max_plies: Some(60),
        }
    }

    #[test]
    fn test_report_tallies_add_up() {
        let mut rng = StdRng::seed_from_u64(7);
        let report = compare(
            &Strategy::weighted(WeightVector::classic()),
            &Strategy::uniform(),
            &quick_config(6),
            &mut rng,
        )
        .unwrap();

        assert_eq!(report.games, 6);
        assert_eq!(report.wins + report.losses + report.draws, 6);
        assert!(report.adjudicated <= report.draws);
        assert!(report.plies > 0);
        assert!((0.0..=1.0).contains(&report.win_rate()));
    }

    #[test]
    fn test_same_seed_same_match() {
        let config = quick_config(4);
        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            compare(&Strategy::uniform(), &Strategy::Random, &config, &mut rng).unwrap()
        };
        assert_eq!(run(21), run(21));
    }

    #[test]
    fn test_win_rate_gives_half_credit_for_draws() {
        let report = MatchReport {
            games: 4,
            wins: 1,
            losses: 1,
            draws: 2,
            adjudicated: 0,
            plies: 80,
        };
        assert_eq!(report.win_rate(), 0.5);
        assert_eq!(MatchReport::default().win_rate(), 0.0);
    }

    #[test]
    fn test_colors_alternate_by_game_parity() {
        assert_eq!(first_strategy_color(0), Color::Black);
        assert_eq!(first_strategy_color(1), Color::White);
        assert_eq!(first_strategy_color(6), Color::Black);
        assert_eq!(first_strategy_color(9), Color::White);
    }

    #[test]
    fn test_results_are_credited_to_the_first_strategy() {
        let mut report = MatchReport::default();

        // Even game: first strategy is Black.
        let black_game = first_strategy_color(0);
        report.record(Outcome::Winner(Color::Black), black_game, 10);
        assert_eq!((report.wins, report.losses), (1, 0));
        report.record(Outcome::Winner(Color::White), black_game, 10);
        assert_eq!((report.wins, report.losses), (1, 1));

        // Odd game: first strategy is White.
        let white_game = first_strategy_color(1);
        report.record(Outcome::Winner(Color::White), white_game, 10);
        assert_eq!((report.wins, report.losses), (2, 1));
        report.record(Outcome::Winner(Color::Black), white_game, 10);
        assert_eq!((report.wins, report.losses), (2, 2));

        report.record(Outcome::Draw, white_game, 4);
        report.record(Outcome::Ongoing, black_game, 60);
        assert_eq!(report.draws, 2);
        assert_eq!(report.adjudicated, 1);
        assert_eq!(report.games, 6);
        assert_eq!(report.plies, 104);
        assert_eq!(report.win_rate(), 0.5);
    }

    #[test]
    fn test_ply_cap_adjudicates_draws() {
        let config = SelfPlayConfig {
            games: 3,
            agent_probability: 0.0,
            depth: 1,
            max_plies: Some(1),
        };
        let mut rng = StdRng::seed_from_u64(1);
        let report = compare(&Strategy::Random, &Strategy::Random, &config, &mut rng).unwrap();
        // One ply from the start can never decide a game.
        assert_eq!(report.draws, 3);
        assert_eq!(report.adjudicated, 3);
        assert_eq!(report.plies, 3);
        assert_eq!(report.win_rate(), 0.5);
    }

    #[test]
    fn test_invalid_configs_are_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        let bad = [
            SelfPlayConfig {
                games: 0,
                ..quick_config(1)
            },
            SelfPlayConfig {
                agent_probability: 1.5,
                ..quick_config(1)
            },
            SelfPlayConfig {
                depth: 0,
                ..quick_config(1)
            },
            SelfPlayConfig {
                max_plies: Some(0),
                ..quick_config(1)
            },
        ];
        for config in bad {
            let err = compare(&Strategy::Random, &Strategy::Random, &config, &mut rng).unwrap_err();
            assert!(matches!(err, MicroChessError::InvalidConfig { .. }));
        }
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!(Strategy::Random.name(), "Random");
        assert_eq!(Strategy::uniform().name(), "UniformMaterial");
        assert_eq!(format!("{:?}", Strategy::weighted(WeightVector::classic())), "WeightedMaterial");
    }
}
