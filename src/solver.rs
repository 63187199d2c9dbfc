
use rand::Rng;
use std::ops::Range;

use crate::consensus_problem::DistanceMatrix;
use crate::error::ConsensusError;
use crate::solution::Solution;

/// Anything that can pick one index per range so that the total pairwise distance is small.
pub trait Solver {
    /// Returns every solution within the solver's tolerance of the best score it found, sorted by score and then genes.
    /// # Arguments
    /// * `distances` - the full pairwise matrix over all objects
    /// * `ranges` - one half-open range of object indices per group
    /// # Errors
    /// * `EmptyRange` if a range has no indices
    /// * `Configuration` if a range extends past the matrix
    fn solve(&self, distances: &DistanceMatrix, ranges: &[Range<usize>]) -> Result<Vec<Solution>, ConsensusError>;

    /// If true, the solver reports progress while it runs
    fn is_verbose(&self) -> bool;
}

/// Sum of `distances` over all ordered pairs of genes.
/// Each unordered pair is counted twice, leeways are scaled to match.
pub fn pairwise_score(genes: &[usize], distances: &DistanceMatrix) -> f64 {
    let mut total = 0.0;
    for (i, &a) in genes.iter().enumerate() {
        for &b in genes[i + 1..].iter() {
            total += distances.get(a, b);
        }
    }
    2.0 * total
}

/// Recomputes the score of `solution` from scratch.
pub fn assign_score(solution: &mut Solution, distances: &DistanceMatrix) {
    let score = pairwise_score(solution.genes(), distances);
    solution.set_score(score);
}

/// Draws one uniformly random index from each range and scores the result.
pub fn random_solution<R: Rng>(ranges: &[Range<usize>], distances: &DistanceMatrix, rng: &mut R) -> Solution {
    let genes: Vec<usize> = ranges.iter()
        .map(|r| rng.gen_range(r.clone()))
        .collect();
    let score = pairwise_score(&genes, distances);
    Solution::new(genes, score)
}

/// Finds the best replacement for the gene at `position`, holding every other gene fixed.
/// Ties go to the last index scanned.
/// Returns the chosen gene and the change in score versus the current gene, so a negative delta is an improvement.
/// # Arguments
/// * `genes` - the current genes
/// * `position` - the gene to replace
/// * `distances` - the full pairwise matrix
/// * `ranges` - the admissible indices for each position
pub fn best_substitution(genes: &[usize], position: usize, distances: &DistanceMatrix, ranges: &[Range<usize>]) -> (usize, f64) {
    let contribution = |candidate: usize| -> f64 {
        genes.iter().enumerate()
            .filter(|&(i, _)| i != position)
            .map(|(_, &g)| distances.get(candidate, g))
            .sum()
    };

    let original_cost = contribution(genes[position]);
    let mut best_gene = genes[position];
    let mut best_cost = f64::INFINITY;
    for candidate in ranges[position].clone() {
        let cost = contribution(candidate);
        if cost <= best_cost {
            best_cost = cost;
            best_gene = candidate;
        }
    }

    if best_cost.is_infinite() {
        // empty range, nothing to substitute
        return (genes[position], 0.0);
    }
    (best_gene, 2.0 * (best_cost - original_cost))
}

/// Local search: repeatedly applies the single most improving substitution across all positions.
/// Stops at a local optimum or after `max_iterations` rounds, then rescores from scratch.
/// # Arguments
/// * `solution` - modified in place
/// * `distances` - the full pairwise matrix
/// * `ranges` - the admissible indices for each position
/// * `max_iterations` - the maximum number of substitutions applied
pub fn steepest_descent(solution: &mut Solution, distances: &DistanceMatrix, ranges: &[Range<usize>], max_iterations: usize) {
    for _ in 0..max_iterations {
        // (position, gene, delta)
        let mut best_move: Option<(usize, usize, f64)> = None;
        for position in 0..solution.genes().len() {
            let (gene, delta) = best_substitution(solution.genes(), position, distances, ranges);
            let best_delta = best_move.map_or(0.0, |m| m.2);
            if delta < best_delta {
                best_move = Some((position, gene, delta));
            }
        }

        match best_move {
            Some((position, gene, _delta)) => solution.set_gene(position, gene),
            None => break
        }
    }
    assign_score(solution, distances);
}

/// The allowed margin above the best score, in the same doubled units as `pairwise_score`.
pub fn leeway(tolerance: f64, num_ranges: usize) -> f64 {
    tolerance * (num_ranges * num_ranges.saturating_sub(1)) as f64
}

/// Relative slack on score comparisons, since sums taken in different orders can differ in the last bits
const SCORE_EPSILON: f64 = 1e-9;

/// True if `score` is at most `best + leeway`, up to floating point summation noise.
pub fn within_leeway(score: f64, best: f64, leeway: f64) -> bool {
    let cutoff = best + leeway;
    score <= cutoff + SCORE_EPSILON * cutoff.abs().max(1.0)
}

/// Checks that every range is non-empty and inside the matrix.
/// # Errors
/// * `EmptyRange` for the first empty range
/// * `Configuration` if a range ends past the matrix
pub fn validate_ranges(distances: &DistanceMatrix, ranges: &[Range<usize>]) -> Result<(), ConsensusError> {
    for (index, range) in ranges.iter().enumerate() {
        if range.is_empty() {
            return Err(ConsensusError::EmptyRange(index));
        }
        if range.end > distances.len() {
            return Err(ConsensusError::configuration(
                format!("range {index} ({range:?}) exceeds the {} objects in the matrix", distances.len())
            ));
        }
    }
    Ok(())
}
