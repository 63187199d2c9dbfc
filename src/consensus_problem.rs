
/*!
Packs groups of candidate objects into one flat index space and builds the memoized all-pairs distance matrix the solvers consume.

# Example usage
```rust
use subopt_con::consensus_problem::ConsensusProblem;

let groups = vec![
    vec!["a", "b"],
    vec!["a", "c"],
    vec!["b"]
];
let mut calls = 0;
let problem = ConsensusProblem::new(groups, |x: &&str, y: &&str| {
    calls += 1;
    Ok(if x == y { 0.0 } else { 1.0 })
}).unwrap();

// three unique values, so three unordered pairs
assert_eq!(calls, 3);
assert_eq!(problem.objects(), &["a", "b", "a", "c", "b"]);
assert_eq!(problem.ranges(), &[0..2, 2..4, 4..5]);
assert_eq!(problem.distances().get(0, 2), 0.0);
assert_eq!(problem.distances().get(0, 1), 1.0);
```
*/

use rustc_hash::FxHashMap as HashMap;
use std::hash::Hash;
use std::ops::{Index, Range};

use crate::error::ConsensusError;
use crate::solution::Solution;
use crate::solver::Solver;

/// Dense, symmetric, zero-diagonal matrix of pairwise distances.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DistanceMatrix {
    /// Number of rows (and columns)
    size: usize,
    /// Row-major values
    values: Vec<f64>
}

impl DistanceMatrix {
    /// Creates an all-zero matrix
    pub fn zeros(size: usize) -> DistanceMatrix {
        DistanceMatrix {
            size,
            values: vec![0.0; size * size]
        }
    }

    /// Creates a matrix from explicit rows, mostly useful for tests and generated instances.
    /// # Errors
    /// * `Configuration` if the rows are not square, not symmetric, have a non-zero diagonal, or contain negative or non-finite values
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<DistanceMatrix, ConsensusError> {
        let size = rows.len();
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != size) {
            return Err(ConsensusError::configuration(
                format!("row {i} has {} values, expected {size}", row.len())
            ));
        }

        let mut matrix = DistanceMatrix::zeros(size);
        for (i, row) in rows.iter().enumerate() {
            for (j, &value) in row.iter().enumerate() {
                check_distance(value)?;
                if i == j && value != 0.0 {
                    return Err(ConsensusError::configuration(format!("diagonal entry {i} is {value}, expected 0")));
                }
                if rows[j][i] != value {
                    return Err(ConsensusError::configuration(format!("matrix is not symmetric at ({i}, {j})")));
                }
                matrix.values[i * size + j] = value;
            }
        }
        Ok(matrix)
    }

    /// Sets both (i, j) and (j, i)
    pub(crate) fn set_symmetric(&mut self, i: usize, j: usize, value: f64) {
        self.values[i * self.size + j] = value;
        self.values[j * self.size + i] = value;
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.size + j]
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.size..(i + 1) * self.size]
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

impl Index<(usize, usize)> for DistanceMatrix {
    type Output = f64;

    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        &self.values[i * self.size + j]
    }
}

/// Distances must be usable in sums and comparisons
fn check_distance(value: f64) -> Result<(), ConsensusError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConsensusError::configuration(format!("distances must be finite and non-negative, got {value}")));
    }
    Ok(())
}

/// A consensus instance: flattened candidates, one half-open range per group, and their pairwise distances.
#[derive(Clone, Debug)]
pub struct ConsensusProblem<T> {
    /// All candidates, in group order and then within-group order
    objects: Vec<T>,
    /// `objects[ranges[g].clone()]` are the candidates of group `g`
    ranges: Vec<Range<usize>>,
    /// `distances[(i, j)]` is the distance between `objects[i]` and `objects[j]`
    distances: DistanceMatrix
}

impl<T: Clone + Eq + Hash> ConsensusProblem<T> {
    /// Builds the problem, calling `distance_fn` exactly once per unordered pair of distinct object values.
    /// Equal values (including an object with itself) are always at distance 0.
    /// # Arguments
    /// * `groups` - one list of candidates per input unit
    /// * `distance_fn` - the pairwise cost, expected to be symmetric
    /// # Errors
    /// * `EmptyRange` if any group has no candidates
    /// * `Configuration` if `distance_fn` returns a negative or non-finite value
    /// * any error returned by `distance_fn`
    pub fn new<F>(groups: Vec<Vec<T>>, mut distance_fn: F) -> Result<ConsensusProblem<T>, ConsensusError>
    where
        F: FnMut(&T, &T) -> Result<f64, ConsensusError>
    {
        if let Some(empty_index) = groups.iter().position(|g| g.is_empty()) {
            return Err(ConsensusError::EmptyRange(empty_index));
        }

        let mut objects: Vec<T> = Vec::with_capacity(groups.iter().map(|g| g.len()).sum());
        let mut ranges: Vec<Range<usize>> = Vec::with_capacity(groups.len());
        for group in groups.into_iter() {
            let start = objects.len();
            objects.extend(group);
            ranges.push(start..objects.len());
        }

        // assign every object to the first index holding an equal value
        let mut unique_lookup: HashMap<&T, usize> = Default::default();
        let mut representatives: Vec<usize> = vec![];
        let mut unique_ids: Vec<usize> = Vec::with_capacity(objects.len());
        for (index, object) in objects.iter().enumerate() {
            let next_id = representatives.len();
            let unique_id = *unique_lookup.entry(object).or_insert(next_id);
            if unique_id == next_id {
                representatives.push(index);
            }
            unique_ids.push(unique_id);
        }

        let num_unique = representatives.len();
        let mut condensed = DistanceMatrix::zeros(num_unique);
        for a in 0..num_unique {
            for b in (a + 1)..num_unique {
                let value = distance_fn(&objects[representatives[a]], &objects[representatives[b]])?;
                check_distance(value)?;
                condensed.set_symmetric(a, b, value);
            }
        }

        let mut distances = DistanceMatrix::zeros(objects.len());
        for i in 0..objects.len() {
            for j in (i + 1)..objects.len() {
                distances.set_symmetric(i, j, condensed.get(unique_ids[i], unique_ids[j]));
            }
        }

        Ok(ConsensusProblem {
            objects,
            ranges,
            distances
        })
    }

    /// Runs `solver` against this problem's matrix and ranges.
    /// # Errors
    /// * any error from the solver
    pub fn solve(&self, solver: &dyn Solver) -> Result<Vec<Solution>, ConsensusError> {
        solver.solve(&self.distances, &self.ranges)
    }

    /// The chosen object of each group for a set of genes
    pub fn objects_at(&self, genes: &[usize]) -> Vec<&T> {
        genes.iter().map(|&g| &self.objects[g]).collect()
    }

    // Getters
    pub fn objects(&self) -> &[T] {
        &self.objects
    }

    pub fn ranges(&self) -> &[Range<usize>] {
        &self.ranges
    }

    pub fn distances(&self) -> &DistanceMatrix {
        &self.distances
    }
}
