use clap::{Arg, ArgAction, Command};
use microchess::{compare, BreedConfig, GeneticAlgorithm, SelfPlayConfig, Strategy};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let matches = Command::new("MicroChess Breeder")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Tune MicroChess material weights with a genetic algorithm")
        .arg(
            Arg::new("pop_size")
                .value_name("POP_SIZE")
                .help("Population size of each generation")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("generations")
                .value_name("GENERATIONS")
                .help("Number of generations to breed")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("mutation_rate")
                .value_name("MUTATION_RATE")
                .help("Per-gene mutation probability")
                .value_parser(clap::value_parser!(f64)),
        )
        .arg(
            Arg::new("num_games")
                .value_name("NUM_GAMES")
                .help("Self-play games per fitness evaluation")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("prob")
                .value_name("PROB")
                .help("Probability that an agent follows its search instead of moving randomly")
                .value_parser(clap::value_parser!(f64)),
        )
        .arg(
            Arg::new("depth")
                .value_name("DEPTH")
                .help("Minimax search depth")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("seed")
                .short('s')
                .long("seed")
                .value_name("SEED")
                .help("Seed for a reproducible run")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("PATH")
                .help("JSON breeding config; positional arguments override it"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("PATH")
                .help("Write the breeding report as JSON"),
        )
        .arg(
            Arg::new("parallel")
                .long("parallel")
                .help("Evaluate fitness on all cores")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("benchmark-games")
                .short('b')
                .long("benchmark-games")
                .value_name("GAMES")
                .help("Games played when benchmarking the winner (0 skips)")
                .value_parser(clap::value_parser!(usize))
                .default_value("1000"),
        )
        .get_matches();

    let mut config = match matches.get_one::<String>("config") {
        Some(path) => BreedConfig::load(path)?,
        None => BreedConfig::default(),
    };
    if let Some(&pop_size) = matches.get_one::<usize>("pop_size") {
        config.population_size = pop_size;
    }
    if let Some(&generations) = matches.get_one::<usize>("generations") {
        config.generations = generations;
    }
    if let Some(&rate) = matches.get_one::<f64>("mutation_rate") {
        config.mutation_rate = rate;
    }
    if let Some(&games) = matches.get_one::<usize>("num_games") {
        config.self_play.games = games;
    }
    if let Some(&prob) = matches.get_one::<f64>("prob") {
        config.self_play.agent_probability = prob;
    }
    if let Some(&depth) = matches.get_one::<u32>("depth") {
        config.self_play.depth = depth;
    }
    config.parallel = config.parallel || matches.get_flag("parallel");
    config.show_progress = true;

    let mut rng = match matches.get_one::<u64>("seed") {
        Some(&seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    println!("MicroChess Genetic Algorithm");
    println!("============================");
    println!(
        "Breeding {} generations of {} weight vectors, mutation rate {}",
        config.generations, config.population_size, config.mutation_rate
    );
    println!(
        "Fitness: {} games against uniform material at depth {}, following the search {:.0}% of the time",
        config.self_play.games,
        config.self_play.depth,
        config.self_play.agent_probability * 100.0
    );

    let algorithm = GeneticAlgorithm::new(config)?;
    let start = Instant::now();
    let report = algorithm.breed(&mut rng)?;
    println!("\nBreeding took {:.1}s", start.elapsed().as_secs_f64());

    let [rook, knight, bishop, pawn] = report.best_weights.rounded(4);
    println!("Best weights: rook {rook}, knight {knight}, bishop {bishop}, pawn {pawn}");
    println!("Best fitness: {:.4}", report.best_fitness);

    if let Some(path) = matches.get_one::<String>("output") {
        report.save(path)?;
        println!("Report written to {path}");
    }

    let benchmark_games = *matches.get_one::<usize>("benchmark-games").unwrap_or(&1000);
    if benchmark_games > 0 {
        let benchmark = SelfPlayConfig {
            games: benchmark_games,
            ..algorithm.config().self_play.clone()
        };
        let best = Strategy::weighted(report.best_weights);

        println!("\nDraws count as half a win.");
        for (label, opponent) in [
            ("random play", Strategy::Random),
            ("uniform material", Strategy::uniform()),
        ] {
            let result = compare(&best, &opponent, &benchmark, &mut rng)?;
            println!(
                "vs {label} over {} games: {:.3} ({} wins, {} losses, {} draws)",
                result.games,
                result.win_rate(),
                result.wins,
                result.losses,
                result.draws
            );
        }
    }

    Ok(())
}
