/*!
# subopt_con
This library finds consensus secondary structures across groups of RNA sub-optimal structures.
Each group holds the candidate dot-bracket structures of one sequence, and a consensus picks one candidate per group so that the summed pairwise distance between the picks is minimal.

Key benefits:
* Tree edit distance (Zhang-Shasha) and string edit distance, combined with configurable weights
* An exact branch-and-bound solver and a seeded genetic-algorithm solver behind a single `Solver` trait
* A coarse-then-fine pipeline using stem compression or abstract shapes to cluster similar candidates first

Performance notes:
* The exact solver explores a product of group sizes, so large inputs should use the heuristic solver or a coarser transform
* Distances are memoized per unique structure, so repeated candidates are only compared once

# Example usage
```rust
use subopt_con::compound_distance::CompoundDistance;
use subopt_con::consensus_problem::ConsensusProblem;
use subopt_con::solver_exact::SolverExact;

let groups = vec![
    vec!["((..))".to_string(), "......".to_string()],
    vec!["(....)".to_string(), "((..))".to_string()],
    vec!["((..))".to_string(), "(())..".to_string()]
];

// build the problem with the default compound distance
let distance = CompoundDistance::default();
let problem = ConsensusProblem::new(groups, |a: &String, b: &String| distance.distance(a, b)).unwrap();

// solve it and check the results
let solutions = problem.solve(&SolverExact::default()).unwrap();
assert_eq!(solutions.len(), 1);
assert_eq!(solutions[0].score(), 0.0);
assert_eq!(problem.objects_at(solutions[0].genes()), vec!["((..))"; 3]);
```
*/

/// Weighted combination of tree and string edit distance between structures
pub mod compound_distance;
/// Consensus instances and their memoized distance matrix
pub mod consensus_problem;
/// Error type shared by the library
pub mod error;
/// Utility for generating examples
pub mod example_gen;
/// Coarse-then-fine consensus over grouped structures
pub mod pipeline;
/// Progress reporting for long runs
pub mod progress;
/// Readers for grouped sub-optimal structure files
pub mod readers;
/// Candidate solutions and their ordering
pub mod solution;
/// The solver interface and shared scoring and local search utilities
pub mod solver;
/// Configurations for the exact and heuristic solvers
pub mod solver_config;
/// Exact branch-and-bound solver
pub mod solver_exact;
/// Genetic-algorithm solver
pub mod solver_heuristic;
/// Levenshtein distance on structure strings
pub mod string_distance;
/// Coarse structure transforms: stem compression and abstract shapes
pub mod transforms;
/// Ordered labeled trees parsed from bracket strings
pub mod tree;
/// Zhang-Shasha tree edit distance
pub mod tree_distance;
