use clap::{Arg, Command};
use microchess::{Color, MinimaxAgent, Outcome, Position, UniformMaterial, WeightVector, WeightedMaterial};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let matches = Command::new("MicroChess Demo")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Play one game of MicroChess between two minimax agents")
        .arg(
            Arg::new("depth")
                .short('d')
                .long("depth")
                .value_name("DEPTH")
                .help("Minimax search depth for both sides")
                .value_parser(clap::value_parser!(u32))
                .default_value("2"),
        )
        .arg(
            Arg::new("max-plies")
                .short('m')
                .long("max-plies")
                .value_name("PLIES")
                .help("Stop the game after this many plies")
                .value_parser(clap::value_parser!(usize))
                .default_value("100"),
        )
        .get_matches();

    let depth = *matches.get_one::<u32>("depth").unwrap_or(&2);
    let max_plies = *matches.get_one::<usize>("max-plies").unwrap_or(&100);

    // Black weighs pieces classically, White counts them.
    let black = MinimaxAgent::new(Arc::new(WeightedMaterial::new(WeightVector::classic())), depth);
    let white = MinimaxAgent::new(Arc::new(UniformMaterial::new()), depth);

    println!("MicroChess Demo");
    println!("===============");
    println!("Black: {} | White: {}", black.evaluator_name(), white.evaluator_name());

    let mut position = Position::initial();
    println!("{position}");

    let mut plies = 0;
    while plies < max_plies {
        let agent = match position.turn() {
            Color::Black => &black,
            Color::White => &white,
        };
        let result = agent.search(&position)?;
        let Some(mv) = result.best_move else {
            break;
        };

        plies += 1;
        println!(
            "{plies:>3}. {:?} plays {mv} (eval {:.2}, {} nodes)",
            position.turn(),
            result.evaluation,
            result.nodes_searched
        );
        position.apply_move(mv)?;
        println!("{position}");
    }

    match position.winner() {
        Outcome::Winner(color) => println!("{color:?} wins after {plies} plies"),
        Outcome::Draw => println!("Draw after {plies} plies"),
        Outcome::Ongoing => println!("Stopped after {plies} plies"),
    }

    Ok(())
}
