
/*!
Two-resolution consensus: solve once on coarse (compressed) structures to find clusters, then solve within each cluster on the original structures.

# Example usage
```rust
use subopt_con::pipeline::{ConsensusPipeline, PipelineConfig};
use subopt_con::progress::NoProgress;
use subopt_con::solver_exact::SolverExact;

let groups = vec![
    vec!["((((...))))".to_string(), "((((....))))".to_string(), "......".to_string()],
    vec!["((((...))))".to_string(), "...(...)...".to_string()],
    vec!["((((...))))".to_string()]
];

let solver = SolverExact::default();
let pipeline = ConsensusPipeline::new(PipelineConfig::default(), &solver, &solver);
let results = pipeline.run(&groups, &mut NoProgress).unwrap();
assert_eq!(results.len(), 1);
assert_eq!(results[0].structures(), &vec!["((((...))))".to_string(); 3][..]);
assert_eq!(results[0].fine_score(), 0.0);
```
*/

use itertools::Itertools;
use log::{debug, info};
use rustc_hash::FxHashSet as HashSet;
use simple_error::bail;

use crate::compound_distance::{CompoundDistance, CompoundWeights};
use crate::consensus_problem::ConsensusProblem;
use crate::progress::ProgressSink;
use crate::solver::Solver;
use crate::transforms::{CoarseTransform, ReverseMapping};
use crate::tree::BracketAlphabet;

/// Settings for the coarse and fine phases.
#[derive(derive_builder::Builder, Clone, Debug, PartialEq)]
#[builder(default)]
pub struct PipelineConfig {
    /// Simplification applied to every candidate before the coarse solve
    pub coarse_transform: CoarseTransform,
    /// Distance weights between coarse structures
    pub coarse_weights: CompoundWeights,
    /// Distance weights between original structures
    pub fine_weights: CompoundWeights
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            coarse_transform: CoarseTransform::Granular(3),
            // coarse values only differ in topology
            coarse_weights: CompoundWeights::tree_only(),
            fine_weights: CompoundWeights::balanced()
        }
    }
}

/// One consensus: a structure per input group plus its normalized scores.
#[derive(Clone, Debug, PartialEq)]
pub struct ConsensusResult {
    /// Score of the coarse consensus this came from, divided by n(n-1)
    coarse_score: f64,
    /// Score of this consensus, divided by n(n-1)
    fine_score: f64,
    /// The chosen structure of each group, in group order
    structures: Vec<String>
}

impl ConsensusResult {
    /// Constructor
    pub fn new(coarse_score: f64, fine_score: f64, structures: Vec<String>) -> ConsensusResult {
        ConsensusResult {
            coarse_score,
            fine_score,
            structures
        }
    }

    // Getters
    pub fn coarse_score(&self) -> f64 {
        self.coarse_score
    }

    pub fn fine_score(&self) -> f64 {
        self.fine_score
    }

    pub fn structures(&self) -> &[String] {
        &self.structures
    }
}

/// Scales a doubled pairwise score to a mean per-pair distance; 0 for fewer than two groups
fn normalize(score: f64, num_groups: usize) -> f64 {
    if num_groups < 2 {
        0.0
    } else {
        score / (num_groups * (num_groups - 1)) as f64
    }
}

/// Coarse-then-fine consensus driver over any two solvers.
pub struct ConsensusPipeline<'a> {
    /// Transform and distance settings
    config: PipelineConfig,
    /// Solves the single coarse problem
    coarse_solver: &'a dyn Solver,
    /// Solves one fine problem per coarse consensus
    fine_solver: &'a dyn Solver
}

impl<'a> ConsensusPipeline<'a> {
    /// Constructor
    pub fn new(config: PipelineConfig, coarse_solver: &'a dyn Solver, fine_solver: &'a dyn Solver) -> ConsensusPipeline<'a> {
        ConsensusPipeline {
            config,
            coarse_solver,
            fine_solver
        }
    }

    /// Runs both phases.
    /// Results come out in coarse consensus order and then fine score order, with duplicate structure lists removed.
    /// # Arguments
    /// * `groups` - candidate structures, one list per input sequence
    /// * `progress` - receives the fraction of coarse clusters refined so far
    /// # Errors
    /// * if there are no groups
    /// * `EmptyRange` if a group has no candidates
    /// * `InvalidStructure` if a candidate does not parse
    /// * any solver error
    pub fn run(&self, groups: &[Vec<String>], progress: &mut dyn ProgressSink) -> Result<Vec<ConsensusResult>, Box<dyn std::error::Error>> {
        if groups.is_empty() {
            bail!("Consensus requires at least one group of structures");
        }
        let num_groups = groups.len();

        // coarse phase
        let transform = self.config.coarse_transform;
        let (coarse_groups, mapping) = ReverseMapping::build(groups, transform)?;
        let coarse_distance = CompoundDistance::with_alphabet(self.config.coarse_weights, transform.output_alphabet());
        let coarse_problem = ConsensusProblem::new(coarse_groups, |a: &String, b: &String| coarse_distance.distance(a, b))?;
        debug!("Coarse problem: {} groups, {} objects", num_groups, coarse_problem.objects().len());

        let coarse_solutions = coarse_problem.solve(self.coarse_solver)?;
        let coarse_consensuses: Vec<(Vec<String>, f64)> = coarse_solutions.iter()
            .map(|s| {
                let structures: Vec<String> = coarse_problem.objects_at(s.genes()).into_iter().cloned().collect();
                (structures, s.score())
            })
            .unique_by(|(structures, _score)| structures.clone())
            .collect();
        info!("Found {} coarse consensus structure sets", coarse_consensuses.len());

        // fine phase, one problem per coarse consensus
        let fine_distance = CompoundDistance::with_alphabet(self.config.fine_weights, BracketAlphabet::DOT_BRACKET);
        let mut results: Vec<ConsensusResult> = vec![];
        let mut emitted: HashSet<Vec<String>> = Default::default();
        for (cluster_index, (coarse_structures, coarse_score)) in coarse_consensuses.iter().enumerate() {
            let fine_groups: Vec<Vec<String>> = coarse_structures.iter().enumerate()
                .map(|(group_index, coarse)| mapping.originals(group_index, coarse).to_vec())
                .collect();
            let fine_problem = ConsensusProblem::new(fine_groups, |a: &String, b: &String| fine_distance.distance(a, b))?;
            let fine_solutions = fine_problem.solve(self.fine_solver)?;
            debug!("Cluster {cluster_index}: {} fine solutions", fine_solutions.len());

            for solution in fine_solutions.iter() {
                let structures: Vec<String> = fine_problem.objects_at(solution.genes()).into_iter().cloned().collect();
                if emitted.insert(structures.clone()) {
                    results.push(ConsensusResult::new(
                        normalize(*coarse_score, num_groups),
                        normalize(solution.score(), num_groups),
                        structures
                    ));
                }
            }
            progress.update((cluster_index + 1) as f64 / coarse_consensuses.len() as f64);
        }

        info!("Generated {} consensus results", results.len());
        Ok(results)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}
