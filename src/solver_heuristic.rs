
/*!
This module provides the heuristic consensus solver: a genetic algorithm with elitism, uniform crossover and mutation, and steepest descent local search.
Given the same seeds and parameters it always returns the same solutions.

# Example usage
```rust
use subopt_con::example_gen::generate_planted_problem;
use subopt_con::solver::Solver;
use subopt_con::solver_config::HeuristicConfigBuilder;
use subopt_con::solver_heuristic::SolverHeuristic;

let (distances, ranges, hubs) = generate_planted_problem(5, 4, 0);
let config = HeuristicConfigBuilder::default()
    .population_size(30)
    .num_generations(20)
    .elite_size(3)
    .improvement_probability(0.5)
    .improvement_depth(10)
    .build()
    .unwrap();
let solver = SolverHeuristic::with_config(config).unwrap();
let solutions = solver.solve(&distances, &ranges).unwrap();
assert_eq!(solutions[0].genes(), &hubs[..]);
assert_eq!(solutions[0].score(), 0.0);
```
*/

use log::{debug, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashSet as HashSet;
use std::ops::Range;

use crate::consensus_problem::DistanceMatrix;
use crate::error::ConsensusError;
use crate::progress::{LogProgress, NoProgress, ProgressSink};
use crate::solution::{sort_solutions, Solution};
use crate::solver::{assign_score, leeway, random_solution, steepest_descent, validate_ranges, within_leeway, Solver};
use crate::solver_config::HeuristicConfig;

/// Builds a child from `parent1`, taking each gene from `parent2` with probability `mixing_ratio`.
/// The child is unscored.
pub fn uniform_crossover<R: Rng>(parent1: &Solution, parent2: &Solution, mixing_ratio: f64, rng: &mut R) -> Solution {
    let genes: Vec<usize> = parent1.genes().iter()
        .zip(parent2.genes().iter())
        .map(|(&g1, &g2)| {
            if rng.gen::<f64>() < mixing_ratio {
                g2
            } else {
                g1
            }
        })
        .collect();
    Solution::new(genes, f64::INFINITY)
}

/// Redraws each gene uniformly from its own range with probability `strength`.
/// The score is not updated.
pub fn uniform_mutation<R: Rng>(solution: &mut Solution, ranges: &[Range<usize>], strength: f64, rng: &mut R) {
    for (position, range) in ranges.iter().enumerate() {
        if rng.gen::<f64>() < strength {
            let gene = rng.gen_range(range.clone());
            solution.set_gene(position, gene);
        }
    }
}

/// Picks two distinct individuals at random and returns the index of the better one; the second wins ties.
/// A population of one always selects its only member.
pub fn binary_tournament<R: Rng>(population: &[Solution], rng: &mut R) -> usize {
    if population.len() < 2 {
        return 0;
    }

    let first = rng.gen_range(0..population.len());
    let mut second = rng.gen_range(0..population.len());
    while first == second {
        second = rng.gen_range(0..population.len());
    }

    if population[first].score() < population[second].score() {
        first
    } else {
        second
    }
}

/// Heuristic solver, a genetic algorithm with local search.
#[derive(Clone, Debug, Default)]
pub struct SolverHeuristic {
    /// Population, operator, and seed settings
    config: HeuristicConfig
}

impl SolverHeuristic {
    /// Creates a new solver and performs sanity checks on the config.
    /// # Arguments
    /// * `config` - the solver configuration
    /// # Errors
    /// * `Configuration` if any parameter is out of its domain
    pub fn with_config(config: HeuristicConfig) -> Result<SolverHeuristic, ConsensusError> {
        config.validate()?;
        Ok(SolverHeuristic {
            config
        })
    }

    pub fn config(&self) -> &HeuristicConfig {
        &self.config
    }

    /// A fresh generator from the configured seed words, so every solve call replays the same stream
    fn seeded_rng(&self) -> StdRng {
        let mut seed = <StdRng as SeedableRng>::Seed::default();
        for (chunk, word) in seed.chunks_exact_mut(4).zip(self.config.seeds.iter()) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        StdRng::from_seed(seed)
    }
}

impl Solver for SolverHeuristic {
    fn solve(&self, distances: &DistanceMatrix, ranges: &[Range<usize>]) -> Result<Vec<Solution>, ConsensusError> {
        validate_ranges(distances, ranges)?;
        if ranges.is_empty() {
            return Ok(vec![]);
        }

        let config = &self.config;
        let leeway = leeway(config.tolerance, ranges.len());
        let mut rng = self.seeded_rng();
        let mut progress: Box<dyn ProgressSink> = if self.is_verbose() {
            Box::new(LogProgress::new("Heuristic solver"))
        } else {
            Box::new(NoProgress)
        };

        let mut population: Vec<Solution> = (0..config.population_size)
            .map(|_i| random_solution(ranges, distances, &mut rng))
            .collect();

        let mut best_score = f64::INFINITY;
        let mut kept: Vec<Solution> = vec![];
        let mut kept_genes: HashSet<Vec<usize>> = Default::default();

        for generation in 0..config.num_generations {
            progress.update(generation as f64 / config.num_generations as f64);

            for solution in population.iter_mut() {
                assign_score(solution, distances);
            }
            population.sort_by(|a, b| a.score().total_cmp(&b.score()));

            // population is non-empty, validated by the config
            let generation_best = population[0].score();
            best_score = best_score.min(generation_best);

            // remember everything near this generation's best
            let mut newly_kept = 0;
            for solution in population.iter() {
                if !within_leeway(solution.score(), generation_best, leeway) {
                    break;
                }
                if kept_genes.insert(solution.genes().to_vec()) {
                    kept.push(solution.clone());
                    newly_kept += 1;
                }
            }
            trace!("Generation {generation}: best = {generation_best}, newly kept = {newly_kept}");

            // unique individuals only, in score order
            let mut elite: Vec<Solution> = Vec::with_capacity(config.elite_size);
            for solution in population.iter() {
                if elite.len() >= config.elite_size {
                    break;
                }
                if !elite.iter().any(|e| e.genes() == solution.genes()) {
                    elite.push(solution.clone());
                }
            }

            let num_children = config.population_size - elite.len();
            let parents: Vec<usize> = (0..2 * num_children)
                .map(|_i| binary_tournament(&population, &mut rng))
                .collect();

            let mut children: Vec<Solution> = Vec::with_capacity(config.population_size);
            for pair in parents.chunks_exact(2) {
                let parent1 = &population[pair[0]];
                let parent2 = &population[pair[1]];

                let mut child = if rng.gen::<f64>() < config.crossover_probability {
                    uniform_crossover(parent1, parent2, config.crossover_mixing_ratio, &mut rng)
                } else {
                    parent1.clone()
                };

                if rng.gen::<f64>() < config.mutation_probability {
                    uniform_mutation(&mut child, ranges, config.mutation_strength, &mut rng);
                }

                if rng.gen::<f64>() < config.improvement_probability {
                    steepest_descent(&mut child, distances, ranges, config.improvement_depth);
                }
                children.push(child);
            }

            children.extend(elite);
            population = children;
        }
        progress.update(1.0);

        // earlier generations may have kept solutions that are no longer close to the overall best
        let mut solutions: Vec<Solution> = kept.into_iter()
            .filter(|s| within_leeway(s.score(), best_score, leeway))
            .collect();
        sort_solutions(&mut solutions);
        debug!("generations: {}, best_score: {best_score}, solutions: {}", config.num_generations, solutions.len());
        Ok(solutions)
    }

    fn is_verbose(&self) -> bool {
        self.config.verbose
    }
}
