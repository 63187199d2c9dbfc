
/*!
This module provides the exact branch-and-bound consensus solver.
It returns every assignment whose score is within the configured tolerance of the optimum.

# Example usage
```rust
use subopt_con::consensus_problem::DistanceMatrix;
use subopt_con::solver::Solver;
use subopt_con::solver_exact::SolverExact;

// objects 0 and 2 agree, object 1 and 3 disagree with everything
let distances = DistanceMatrix::from_rows(&[
    vec![0.0, 3.0, 0.0, 2.0],
    vec![3.0, 0.0, 3.0, 3.0],
    vec![0.0, 3.0, 0.0, 2.0],
    vec![2.0, 3.0, 2.0, 0.0]
]).unwrap();
let ranges = [0..2, 2..4];

let solver = SolverExact::default();
let solutions = solver.solve(&distances, &ranges).unwrap();
assert_eq!(solutions.len(), 1);
assert_eq!(solutions[0].genes(), &[0, 2]);
assert_eq!(solutions[0].score(), 0.0);
```
*/

use itertools::Itertools;
use log::{debug, trace};
use priority_queue::PriorityQueue;
use std::cmp::Reverse;
use std::hash::{Hash, Hasher};
use std::ops::Range;

use crate::consensus_problem::DistanceMatrix;
use crate::error::ConsensusError;
use crate::progress::{LogProgress, NoProgress, ProgressSink};
use crate::solution::{sort_solutions, OrderedScore, Solution};
use crate::solver::{leeway, pairwise_score, validate_ranges, within_leeway, Solver};
use crate::solver_config::ExactConfig;

/// Lowest partial score first, deepest first on ties
type FrontierPriority = (Reverse<OrderedScore>, usize);

/// A partial assignment in the search frontier.
/// Genes are in exploration order, so `genes.len()` also tells which ranges remain.
#[derive(Clone, Debug)]
struct SubSolution {
    /// One gene for each of the first `genes.len()` explored ranges
    genes: Vec<usize>,
    /// Fraction of the full search space under this node, only used for progress
    weight: f64
}

impl SubSolution {
    fn is_complete(&self, num_ranges: usize) -> bool {
        self.genes.len() == num_ranges
    }
}

// every node has a distinct gene path, so the genes alone identify it
impl PartialEq for SubSolution {
    fn eq(&self, other: &Self) -> bool {
        self.genes == other.genes
    }
}

impl Eq for SubSolution {}

impl Hash for SubSolution {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.genes.hash(state);
    }
}

/// For every object, the smallest distance to any member of each range.
/// `result[object][range]`
pub fn nearest_neighbor_distances(distances: &DistanceMatrix, ranges: &[Range<usize>]) -> Vec<Vec<f64>> {
    (0..distances.len())
        .map(|object| {
            let row = distances.row(object);
            ranges.iter()
                .map(|r| {
                    row[r.clone()].iter()
                        .cloned()
                        .fold(f64::INFINITY, f64::min)
                })
                .collect()
        })
        .collect()
}

/// Exact solver: best-first branch-and-bound over partial assignments.
#[derive(Clone, Debug, Default)]
pub struct SolverExact {
    /// Tolerance and verbosity
    config: ExactConfig
}

impl SolverExact {
    /// Creates a new solver and performs sanity checks on the config.
    /// # Arguments
    /// * `config` - the solver configuration
    /// # Errors
    /// * `Configuration` if the tolerance is negative or not finite
    pub fn with_config(config: ExactConfig) -> Result<SolverExact, ConsensusError> {
        config.validate()?;
        Ok(SolverExact {
            config
        })
    }

    pub fn config(&self) -> &ExactConfig {
        &self.config
    }
}

impl Solver for SolverExact {
    fn solve(&self, distances: &DistanceMatrix, ranges: &[Range<usize>]) -> Result<Vec<Solution>, ConsensusError> {
        validate_ranges(distances, ranges)?;
        if ranges.is_empty() {
            return Ok(vec![]);
        }

        let num_ranges = ranges.len();
        let leeway = leeway(self.config.tolerance, num_ranges);

        // narrowest ranges first; the sort is stable so equal widths keep input order
        let order: Vec<usize> = (0..num_ranges)
            .sorted_by_key(|&r| ranges[r].len())
            .collect();
        let nearest = nearest_neighbor_distances(distances, ranges);

        let mut progress: Box<dyn ProgressSink> = if self.is_verbose() {
            Box::new(LogProgress::new("Exact solver"))
        } else {
            Box::new(NoProgress)
        };
        let mut completed_weight = 0.0;

        let mut best_score = f64::INFINITY;
        let mut kept: Vec<Solution> = vec![];
        let mut nodes_explored: usize = 0;
        let mut nodes_ignored: usize = 0;
        let mut nodes_pruned: usize = 0;
        let mut peak_queue_size: usize = 0;

        // the pqueue defaults to bigger is better, so scores go in a Reverse
        let mut pqueue: PriorityQueue<SubSolution, FrontierPriority> = PriorityQueue::new();
        pqueue.push(SubSolution { genes: vec![], weight: 1.0 }, (Reverse(OrderedScore(0.0)), 0));

        while let Some((node, (Reverse(OrderedScore(partial_score)), depth))) = pqueue.pop() {
            peak_queue_size = peak_queue_size.max(pqueue.len() + 1);
            trace!("Pop: {partial_score} @ {depth} => {:?}", node.genes);

            // the best score may have improved since this node was queued
            if !within_leeway(partial_score, best_score, leeway) {
                trace!("\tIgnored");
                nodes_ignored += 1;
                completed_weight += node.weight;
                progress.update(completed_weight);
                continue;
            }
            nodes_explored += 1;

            if node.is_complete(num_ranges) {
                // report genes in the caller's range order and rescore in that order
                let mut genes = vec![0; num_ranges];
                for (&range_index, &gene) in order.iter().zip(node.genes.iter()) {
                    genes[range_index] = gene;
                }
                let score = pairwise_score(&genes, distances);
                best_score = best_score.min(score);
                if within_leeway(score, best_score, leeway) {
                    trace!("\tKept {score}");
                    kept.push(Solution::new(genes, score));
                }
                completed_weight += node.weight;
                progress.update(completed_weight);
                continue;
            }

            let range_index = order[depth];
            let remaining = &order[depth + 1..];
            let child_weight = node.weight / ranges[range_index].len() as f64;
            for candidate in ranges[range_index].clone() {
                let added: f64 = node.genes.iter()
                    .map(|&g| distances.get(candidate, g))
                    .sum();
                let child_score = partial_score + 2.0 * added;

                // every gene, old or new, must still reach each remaining range
                let lookahead: f64 = node.genes.iter()
                    .chain(std::iter::once(&candidate))
                    .map(|&g| remaining.iter().map(|&r| nearest[g][r]).sum::<f64>())
                    .sum();
                let bound = child_score + 2.0 * lookahead;

                if !within_leeway(bound, best_score, leeway) {
                    nodes_pruned += 1;
                    completed_weight += child_weight;
                    continue;
                }

                let mut genes = Vec::with_capacity(depth + 1);
                genes.extend_from_slice(&node.genes);
                genes.push(candidate);
                pqueue.push(
                    SubSolution { genes, weight: child_weight },
                    (Reverse(OrderedScore(child_score)), depth + 1)
                );
            }
            progress.update(completed_weight);
        }

        debug!("nodes_explored: {nodes_explored}");
        debug!("nodes_ignored: {nodes_ignored}");
        debug!("nodes_pruned: {nodes_pruned}");
        debug!("peak_queue_size: {peak_queue_size}");

        // the best score may have dropped after earlier solutions were kept
        let mut solutions: Vec<Solution> = kept.into_iter()
            .filter(|s| within_leeway(s.score(), best_score, leeway))
            .collect();
        sort_solutions(&mut solutions);
        debug!("best_score: {best_score}, solutions: {}", solutions.len());
        Ok(solutions)
    }

    fn is_verbose(&self) -> bool {
        self.config.verbose
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::example_gen::{generate_planted_problem, generate_random_problem};
    use crate::solver_config::ExactConfigBuilder;

    /// Enumerates every assignment and keeps those within the leeway of the optimum
    fn brute_force(distances: &DistanceMatrix, ranges: &[Range<usize>], tolerance: f64) -> Vec<Solution> {
        let all: Vec<Solution> = ranges.iter()
            .map(|r| r.clone())
            .multi_cartesian_product()
            .map(|genes| {
                let score = pairwise_score(&genes, distances);
                Solution::new(genes, score)
            })
            .collect();
        let best = all.iter().map(|s| s.score()).fold(f64::INFINITY, f64::min);
        let leeway = leeway(tolerance, ranges.len());
        let mut kept: Vec<Solution> = all.into_iter()
            .filter(|s| s.score() <= best + leeway)
            .collect();
        sort_solutions(&mut kept);
        kept
    }

    #[test_log::test]
    fn test_matches_brute_force() {
        for seed in 0..25 {
            let num_ranges = 1 + (seed as usize % 4);
            let (distances, ranges) = generate_random_problem(num_ranges, 4, 10, seed);
            let expected = brute_force(&distances, &ranges, 0.0);
            let solutions = SolverExact::default().solve(&distances, &ranges).unwrap();
            assert_eq!(solutions, expected, "seed {seed}");
        }
    }

    #[test_log::test]
    fn test_matches_brute_force_with_tolerance() {
        let config = ExactConfigBuilder::default().tolerance(0.5).build().unwrap();
        let solver = SolverExact::with_config(config).unwrap();
        for seed in 0..15 {
            let (distances, ranges) = generate_random_problem(4, 3, 6, seed);
            let expected = brute_force(&distances, &ranges, 0.5);
            let solutions = solver.solve(&distances, &ranges).unwrap();
            assert_eq!(solutions, expected, "seed {seed}");
        }
    }

    #[test_log::test]
    fn test_deterministic() {
        let (distances, ranges) = generate_random_problem(5, 4, 3, 7);
        let solver = SolverExact::default();
        let first = solver.solve(&distances, &ranges).unwrap();
        let second = solver.solve(&distances, &ranges).unwrap();
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test_log::test]
    fn test_planted_optimum() {
        let (distances, ranges, hubs) = generate_planted_problem(6, 5, 3);
        let solutions = SolverExact::default().solve(&distances, &ranges).unwrap();
        assert_eq!(solutions.len(), 1);
        assert_eq!(solutions[0].genes(), &hubs[..]);
        assert_eq!(solutions[0].score(), 0.0);
    }

    #[test_log::test]
    fn test_genes_in_range_order() {
        // widths 3, 1, 2 so the search order differs from the input order
        let distances = DistanceMatrix::from_rows(&[
            vec![0.0, 1.0, 1.0, 1.0, 2.0, 1.0],
            vec![1.0, 0.0, 1.0, 1.0, 1.0, 1.0],
            vec![1.0, 1.0, 0.0, 1.0, 1.0, 1.0],
            vec![1.0, 1.0, 1.0, 0.0, 2.0, 1.0],
            vec![2.0, 1.0, 1.0, 2.0, 0.0, 1.0],
            vec![1.0, 1.0, 1.0, 1.0, 1.0, 0.0]
        ]).unwrap();
        let ranges = vec![0..3, 3..4, 4..6];
        let solutions = SolverExact::default().solve(&distances, &ranges).unwrap();
        assert!(!solutions.is_empty());
        for solution in solutions.iter() {
            for (gene, range) in solution.genes().iter().zip(ranges.iter()) {
                assert!(range.contains(gene));
            }
        }
        assert_eq!(solutions, brute_force(&distances, &ranges, 0.0));
    }

    #[test_log::test]
    fn test_edge_inputs() {
        let solver = SolverExact::default();
        let distances = DistanceMatrix::zeros(3);

        assert!(solver.solve(&distances, &[]).unwrap().is_empty());
        assert_eq!(solver.solve(&distances, &[0..1, 1..1]), Err(ConsensusError::EmptyRange(1)));

        // a single group: every candidate scores 0
        let solutions = solver.solve(&distances, &[0..3]).unwrap();
        assert_eq!(solutions.len(), 3);
        assert!(solutions.iter().all(|s| s.score() == 0.0));
    }

    #[test]
    fn test_bad_config() {
        let config = ExactConfigBuilder::default().tolerance(-1.0).build().unwrap();
        assert!(matches!(SolverExact::with_config(config), Err(ConsensusError::Configuration(_))));
    }

    #[test]
    fn test_config_accessors() {
        let default_solver = SolverExact::default();
        assert_eq!(default_solver.config(), &ExactConfig::default());
        assert!(!default_solver.is_verbose());

        let config = ExactConfigBuilder::default()
            .verbose(true)
            .tolerance(0.25)
            .build()
            .unwrap();
        let solver = SolverExact::with_config(config.clone()).unwrap();
        assert_eq!(solver.config(), &config);
        assert_eq!(solver.config().tolerance, 0.25);
        assert!(solver.is_verbose());
    }

    #[test]
    fn test_nearest_neighbor_distances() {
        let distances = DistanceMatrix::from_rows(&[
            vec![0.0, 3.0, 1.0],
            vec![3.0, 0.0, 2.0],
            vec![1.0, 2.0, 0.0]
        ]).unwrap();
        let nearest = nearest_neighbor_distances(&distances, &[0..2, 2..3]);
        assert_eq!(nearest, vec![
            vec![0.0, 1.0],
            vec![0.0, 2.0],
            vec![1.0, 0.0]
        ]);
    }
}
