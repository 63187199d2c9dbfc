
/*!
Contains configuration information for the two consensus solvers.
Typical usage is to the use the builder to construct the config, e.g.
```
use subopt_con::solver_config::{HeuristicConfig, HeuristicConfigBuilder};
let config: HeuristicConfig = HeuristicConfigBuilder::default()
    .population_size(50)
    .num_generations(20)
    .elite_size(5)
    .tolerance(0.1)
    .build()
    .unwrap();
assert!(config.validate().is_ok());
```
*/

use crate::error::ConsensusError;

/// Number of 32-bit words used to seed the heuristic solver
pub const NUM_SEED_WORDS: usize = 6;

/// Configuration for the genetic algorithm solver.
#[derive(derive_builder::Builder, Clone, Debug, PartialEq)]
#[builder(default)]
pub struct HeuristicConfig {
    /// If true, progress is reported as generations complete
    pub verbose: bool,
    /// Suboptimality tolerance per ordered pair of groups
    pub tolerance: f64,
    /// Seed words for the random number generator
    pub seeds: [u32; NUM_SEED_WORDS],
    /// Number of individuals in each generation
    pub population_size: usize,
    /// Number of generations to run
    pub num_generations: usize,
    /// Number of unique best individuals copied unchanged into the next generation
    pub elite_size: usize,
    /// Probability that a child is built by crossover instead of cloning the first parent
    pub crossover_probability: f64,
    /// During crossover, the probability each gene is taken from the second parent
    pub crossover_mixing_ratio: f64,
    /// Probability that a child is mutated
    pub mutation_probability: f64,
    /// During mutation, the probability each gene is redrawn from its range
    pub mutation_strength: f64,
    /// Probability that a child goes through steepest descent
    pub improvement_probability: f64,
    /// Maximum steepest descent rounds per child
    pub improvement_depth: usize
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            // reporting is opt-in
            verbose: false,
            // only co-optimal solutions by default
            tolerance: 0.0,
            seeds: [42; NUM_SEED_WORDS],
            population_size: 250,
            num_generations: 250,
            // 10% of the population
            elite_size: 25,
            crossover_probability: 0.5,
            crossover_mixing_ratio: 0.1,
            mutation_probability: 0.05,
            mutation_strength: 0.2,
            improvement_probability: 0.1,
            improvement_depth: 4
        }
    }
}

impl HeuristicConfig {
    /// Checks every parameter is in its domain.
    /// # Errors
    /// * `Configuration` naming the first offending parameter
    pub fn validate(&self) -> Result<(), ConsensusError> {
        if self.population_size == 0 {
            return Err(ConsensusError::configuration("population_size must be > 0"));
        }
        if self.num_generations == 0 {
            return Err(ConsensusError::configuration("num_generations must be > 0"));
        }
        if self.elite_size >= self.population_size {
            return Err(ConsensusError::configuration(format!(
                "elite_size must be < population_size, got {} >= {}", self.elite_size, self.population_size
            )));
        }
        check_tolerance(self.tolerance)?;

        let probabilities = [
            ("crossover_probability", self.crossover_probability),
            ("crossover_mixing_ratio", self.crossover_mixing_ratio),
            ("mutation_probability", self.mutation_probability),
            ("mutation_strength", self.mutation_strength),
            ("improvement_probability", self.improvement_probability)
        ];
        for (name, value) in probabilities.iter() {
            if !(0.0..=1.0).contains(value) {
                return Err(ConsensusError::configuration(format!("{name} must be in [0, 1], got {value}")));
            }
        }
        Ok(())
    }
}

/// Configuration for the branch-and-bound solver.
#[derive(derive_builder::Builder, Clone, Debug, Default, PartialEq)]
#[builder(default)]
pub struct ExactConfig {
    /// If true, progress is reported as the frontier is explored
    pub verbose: bool,
    /// Suboptimality tolerance per ordered pair of groups
    pub tolerance: f64
}

impl ExactConfig {
    /// Checks every parameter is in its domain.
    /// # Errors
    /// * `Configuration` if the tolerance is negative or not finite
    pub fn validate(&self) -> Result<(), ConsensusError> {
        check_tolerance(self.tolerance)
    }
}

fn check_tolerance(tolerance: f64) -> Result<(), ConsensusError> {
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(ConsensusError::configuration(format!("tolerance must be finite and >= 0, got {tolerance}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(HeuristicConfig::default().validate().is_ok());
        assert!(ExactConfig::default().validate().is_ok());
        assert_eq!(HeuristicConfigBuilder::default().build().unwrap(), HeuristicConfig::default());
    }

    #[test]
    fn test_invalid_heuristic_configs() {
        let invalid = [
            HeuristicConfigBuilder::default().population_size(0).elite_size(0).build().unwrap(),
            HeuristicConfigBuilder::default().num_generations(0).build().unwrap(),
            HeuristicConfigBuilder::default().population_size(10).elite_size(10).build().unwrap(),
            HeuristicConfigBuilder::default().tolerance(-0.5).build().unwrap(),
            HeuristicConfigBuilder::default().tolerance(f64::NAN).build().unwrap(),
            HeuristicConfigBuilder::default().crossover_probability(1.5).build().unwrap(),
            HeuristicConfigBuilder::default().crossover_mixing_ratio(-0.1).build().unwrap(),
            HeuristicConfigBuilder::default().mutation_probability(f64::NAN).build().unwrap(),
            HeuristicConfigBuilder::default().mutation_strength(2.0).build().unwrap(),
            HeuristicConfigBuilder::default().improvement_probability(-1.0).build().unwrap()
        ];
        for config in invalid.iter() {
            assert!(matches!(config.validate(), Err(ConsensusError::Configuration(_))), "{config:?}");
        }
    }

    #[test]
    fn test_edge_heuristic_configs() {
        let config = HeuristicConfigBuilder::default()
            .population_size(1)
            .elite_size(0)
            .num_generations(1)
            .crossover_probability(0.0)
            .mutation_probability(1.0)
            .improvement_depth(0)
            .build().unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_exact_config() {
        let config = ExactConfigBuilder::default().tolerance(0.25).build().unwrap();
        assert!(config.validate().is_ok());
        let config = ExactConfigBuilder::default().tolerance(f64::INFINITY).build().unwrap();
        assert!(config.validate().is_err());
    }
}
