//! Genetic algorithm that tunes material weights through self-play.
//!
//! Each generation:
//! 1. ranks the population by fitness and keeps the top quarter (by default)
//!    as parents,
//! 2. blends random parent pairs into a full population of offspring,
//! 3. pools the current population with the offspring and keeps the fittest,
//! 4. mutates the survivors, except after the final generation.
//!
//! Fitness is the self-play win rate against uniform material. Every
//! evaluated vector is memoized by exact value, and ranking always runs over
//! the whole memo, so the best fitness on record never drops between
//! generations.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::{MicroChessError, Result};
use crate::evaluation::{WeightVector, GENOME_LEN};
use crate::self_play::{compare, SelfPlayConfig, Strategy};

/// Configuration for a breeding run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreedConfig {
    pub population_size: usize,
    pub generations: usize,
    /// Per-gene chance of being replaced by a fresh random value
    pub mutation_rate: f64,
    /// Crossover noise is drawn from `[-crossover_noise, crossover_noise]`
    pub crossover_noise: f64,
    /// Share of the population kept as parents
    pub parent_fraction: f64,
    /// Match settings for every fitness evaluation
    pub self_play: SelfPlayConfig,
    /// Evaluate fitness on the rayon thread pool
    pub parallel: bool,
    /// Show a progress bar over generations
    pub show_progress: bool,
}

impl Default for BreedConfig {
    fn default() -> Self {
        Self {
            population_size: 8,
            generations: 5,
            mutation_rate: 0.1,
            crossover_noise: 0.05,
            parent_fraction: 0.25,
            self_play: SelfPlayConfig::default(),
            parallel: true,
            show_progress: false,
        }
    }
}

impl BreedConfig {
    /// Read a JSON config and validate it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let config: BreedConfig = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Number of parents kept per generation.
    pub fn parent_count(&self) -> usize {
        (self.population_size as f64 * self.parent_fraction).floor() as usize
    }

    pub fn validate(&self) -> Result<()> {
        if self.population_size == 0 {
            return Err(MicroChessError::invalid_config("population_size", "must be at least 1"));
        }
        if self.generations == 0 {
            return Err(MicroChessError::invalid_config("generations", "must be at least 1"));
        }
        for (field, value) in [
            ("mutation_rate", self.mutation_rate),
            ("parent_fraction", self.parent_fraction),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(MicroChessError::invalid_config(
                    field,
                    format!("{value} is outside [0, 1]"),
                ));
            }
        }
        if !(self.crossover_noise.is_finite() && self.crossover_noise >= 0.0) {
            return Err(MicroChessError::invalid_config(
                "crossover_noise",
                "must be a finite non-negative number",
            ));
        }
        if self.parent_count() < 2 {
            return Err(MicroChessError::invalid_config(
                "population_size",
                format!(
                    "{} with parent fraction {} leaves fewer than two parents",
                    self.population_size, self.parent_fraction
                ),
            ));
        }
        self.self_play.validate()
    }
}

/// Fitness of every vector evaluated so far, keyed by exact value.
///
/// Iteration and ranking follow first-insertion order, so equal fitness
/// values rank the earlier-evaluated vector first.
#[derive(Debug, Clone, Default)]
pub struct FitnessMemo {
    scores: HashMap<WeightVector, f64>,
    order: Vec<WeightVector>,
}

impl FitnessMemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, weights: &WeightVector) -> Option<f64> {
        self.scores.get(weights).copied()
    }

    pub fn contains(&self, weights: &WeightVector) -> bool {
        self.scores.contains_key(weights)
    }

    /// Record a fitness. A vector already present keeps its first score.
    pub fn insert(&mut self, weights: WeightVector, fitness: f64) {
        if !self.scores.contains_key(&weights) {
            self.scores.insert(weights, fitness);
            self.order.push(weights);
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&WeightVector, f64)> + '_ {
        self.order.iter().map(move |w| (w, self.scores[w]))
    }

    /// Up to `count` vectors with the highest fitness, best first.
    pub fn top(&self, count: usize) -> Vec<WeightVector> {
        let mut ranked: Vec<(WeightVector, f64)> = self.iter().map(|(w, f)| (*w, f)).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.into_iter().take(count).map(|(w, _)| w).collect()
    }

    pub fn best(&self) -> Option<(WeightVector, f64)> {
        self.top(1).first().map(|w| (*w, self.scores[w]))
    }
}

/// `size` random vectors, each normalized so its largest gene is 1.
pub fn random_population<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Vec<WeightVector> {
    (0..size).map(|_| WeightVector::random(rng)).collect()
}

/// Win rate of `weights` against uniform material under `config`.
pub fn fitness_vs_uniform<R: Rng + ?Sized>(
    weights: &WeightVector,
    config: &SelfPlayConfig,
    rng: &mut R,
) -> Result<f64> {
    let report = compare(&Strategy::weighted(*weights), &Strategy::uniform(), config, rng)?;
    Ok(report.win_rate())
}

/// Evaluate every vector of `population` the memo lacks, then return the
/// `target` fittest vectors in the whole memo, best first.
///
/// Each new vector is evaluated with its own `StdRng`, seeded from `rng` in
/// population order before any evaluation runs, so `parallel` only changes
/// where the work happens and not the result.
pub fn select_most_fit<R, F>(
    population: &[WeightVector],
    memo: &mut FitnessMemo,
    target: usize,
    fitness: &F,
    parallel: bool,
    rng: &mut R,
) -> Result<Vec<WeightVector>>
where
    R: Rng + ?Sized,
    F: Fn(&WeightVector, &mut StdRng) -> Result<f64> + Sync,
{
    if target > population.len() {
        return Err(MicroChessError::SelectionTooLarge {
            requested: target,
            available: population.len(),
        });
    }

    let mut seen = HashSet::new();
    let pending: Vec<(WeightVector, u64)> = population
        .iter()
        .filter(|w| !memo.contains(w) && seen.insert(**w))
        .map(|w| (*w, rng.gen::<u64>()))
        .collect();

    let evaluate = |(weights, seed): &(WeightVector, u64)| -> Result<(WeightVector, f64)> {
        let mut eval_rng = StdRng::seed_from_u64(*seed);
        let score = fitness(weights, &mut eval_rng)?;
        tracing::debug!(weights = ?weights.rounded(3), fitness = score, "evaluated fitness");
        Ok((*weights, score))
    };

    let scored: Vec<(WeightVector, f64)> = if parallel {
        pending.par_iter().map(evaluate).collect::<Result<_>>()?
    } else {
        pending.iter().map(evaluate).collect::<Result<_>>()?
    };

    for (weights, score) in scored {
        memo.insert(weights, score);
    }

    Ok(memo.top(target))
}

/// Blend random parent pairs into `count` offspring.
///
/// Each gene is `alpha * a + (1 - alpha) * b + noise` with fresh `alpha` in
/// [0, 1) and `noise` in `[-noise, noise]`, and the offspring is normalized.
/// Blended genes are clamped at 0 first, so noise never yields a negative
/// piece value; the classic blend without the clamp can.
pub fn crossover<R: Rng + ?Sized>(
    parents: &[WeightVector],
    count: usize,
    noise: f64,
    rng: &mut R,
) -> Result<Vec<WeightVector>> {
    if parents.len() < 2 {
        return Err(MicroChessError::SelectionTooLarge {
            requested: 2,
            available: parents.len(),
        });
    }

    let mut offspring = Vec::with_capacity(count);
    for _ in 0..count {
        let pair: Vec<&WeightVector> = parents.choose_multiple(rng, 2).collect();
        let (a, b) = (pair[0].genes(), pair[1].genes());
        let mut genes = [0.0; GENOME_LEN];
        for (i, gene) in genes.iter_mut().enumerate() {
            let alpha = rng.gen::<f64>();
            let jitter = rng.gen_range(-noise..=noise);
            *gene = (alpha * a[i] + (1.0 - alpha) * b[i] + jitter).max(0.0);
        }
        offspring.push(WeightVector::new(genes).normalized());
    }
    Ok(offspring)
}

/// Replace each gene with a fresh uniform value with probability `rate`,
/// then renormalize.
///
/// The renormalization is a deliberate departure from plain uniform
/// mutation: it keeps every stored genome at a largest gene of exactly 1, so
/// the memo never holds two scalings of the same weights. An all-zero genome
/// is left as is.
pub fn mutate<R: Rng + ?Sized>(population: &mut [WeightVector], rate: f64, rng: &mut R) {
    for weights in population.iter_mut() {
        for gene in weights.genes_mut().iter_mut() {
            if rng.gen::<f64>() < rate {
                *gene = rng.gen::<f64>();
            }
        }
        *weights = weights.normalized();
    }
}

/// Population summary after survivor selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub generation: usize,
    pub best_weights: WeightVector,
    pub best_fitness: f64,
    pub mean_fitness: f64,
    /// Vectors newly evaluated this generation
    pub evaluated: usize,
    pub memo_size: usize,
}

/// Outcome of a breeding run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreedReport {
    pub best_weights: WeightVector,
    pub best_fitness: f64,
    pub generations: Vec<GenerationStats>,
    pub config: BreedConfig,
}

impl BreedReport {
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Generational breeding driver.
#[derive(Debug, Clone)]
pub struct GeneticAlgorithm {
    config: BreedConfig,
}

impl GeneticAlgorithm {
    pub fn new(config: BreedConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &BreedConfig {
        &self.config
    }

    /// Breed with self-play fitness against uniform material.
    pub fn breed<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<BreedReport> {
        let self_play = &self.config.self_play;
        let fitness = |weights: &WeightVector, eval_rng: &mut StdRng| {
            fitness_vs_uniform(weights, self_play, eval_rng)
        };
        self.breed_with(&fitness, rng)
    }

    /// Breed with a caller-supplied fitness function.
    pub fn breed_with<R, F>(&self, fitness: &F, rng: &mut R) -> Result<BreedReport>
    where
        R: Rng + ?Sized,
        F: Fn(&WeightVector, &mut StdRng) -> Result<f64> + Sync,
    {
        let config = &self.config;
        let size = config.population_size;
        let mut memo = FitnessMemo::new();
        let mut population = random_population(size, rng);
        let mut history = Vec::with_capacity(config.generations);

        let pb = if config.show_progress {
            ProgressBar::new(config.generations as u64)
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} generations ({eta}) {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }

        for generation in 0..config.generations {
            let memo_before = memo.len();

            let parents = select_most_fit(
                &population,
                &mut memo,
                config.parent_count(),
                fitness,
                config.parallel,
                rng,
            )?;
            let offspring = crossover(&parents, size, config.crossover_noise, rng)?;

            let mut pool = population;
            pool.extend(offspring);
            population = select_most_fit(&pool, &mut memo, size, fitness, config.parallel, rng)?;

            let stats = generation_stats(generation, &population, &memo, memo.len() - memo_before);
            tracing::info!(
                generation,
                best_fitness = stats.best_fitness,
                mean_fitness = stats.mean_fitness,
                evaluated = stats.evaluated,
                memo_size = stats.memo_size,
                "generation complete"
            );
            pb.set_message(format!("best {:.3}", stats.best_fitness));
            pb.inc(1);
            history.push(stats);

            if generation + 1 != config.generations {
                mutate(&mut population, config.mutation_rate, rng);
            }
        }
        pb.finish_and_clear();

        // The final generation is never mutated, so every survivor is memoized.
        let (best_weights, best_fitness) = population
            .iter()
            .filter_map(|w| memo.get(w).map(|f| (*w, f)))
            .fold(None, |best: Option<(WeightVector, f64)>, (w, f)| match best {
                Some((_, best_f)) if best_f >= f => best,
                _ => Some((w, f)),
            })
            .ok_or_else(|| MicroChessError::invalid_config("population_size", "population is empty"))?;

        Ok(BreedReport {
            best_weights,
            best_fitness,
            generations: history,
            config: config.clone(),
        })
    }
}

fn generation_stats(
    generation: usize,
    population: &[WeightVector],
    memo: &FitnessMemo,
    evaluated: usize,
) -> GenerationStats {
    let scores: Vec<f64> = population.iter().filter_map(|w| memo.get(w)).collect();
    let (best_weights, best_fitness) = population
        .first()
        .and_then(|w| memo.get(w).map(|f| (*w, f)))
        .unwrap_or((WeightVector::new([0.0; GENOME_LEN]), 0.0));
    let mean_fitness = if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    };

    GenerationStats {
        generation,
        best_weights,
        best_fitness,
        mean_fitness,
        evaluated,
        memo_size: memo.len(),
    }
}
