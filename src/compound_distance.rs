
/*!
Weighted combination of tree and string edit distance over bracket strings.
Typical usage is to pick one of the preset weightings, e.g.
```
use subopt_con::compound_distance::{CompoundDistance, CompoundWeights, CompoundWeightsBuilder};

// fine phase: both terms count equally
let fine = CompoundDistance::new(CompoundWeights::balanced());
assert_eq!(fine.distance("((..))", "(....)").unwrap(), 3.0 + 2.0);

// custom weights
let weights: CompoundWeights = CompoundWeightsBuilder::default()
    .tree_weight(0.5)
    .string_weight(0.0)
    .build()
    .unwrap();
let custom = CompoundDistance::new(weights);
assert_eq!(custom.distance("((..))", "(....)").unwrap(), 1.5);
```
*/

use crate::error::ConsensusError;
use crate::string_distance::string_ed;
use crate::tree::{BracketAlphabet, OrderedLabeledTree};
use crate::tree_distance::tree_ed;

/// Weights for the two terms of a compound distance.
#[derive(derive_builder::Builder, Clone, Copy, Debug, PartialEq)]
#[builder(default)]
pub struct CompoundWeights {
    /// Multiplier on the Zhang-Shasha tree edit distance
    pub tree_weight: f64,
    /// Multiplier on the Levenshtein distance of the raw strings
    pub string_weight: f64
}

impl CompoundWeights {
    /// Topology only, used for the coarse phase
    pub fn tree_only() -> CompoundWeights {
        CompoundWeights { tree_weight: 1.0, string_weight: 0.0 }
    }

    /// Topology and sequence of symbols weighted equally, used for the fine phase
    pub fn balanced() -> CompoundWeights {
        CompoundWeights { tree_weight: 1.0, string_weight: 1.0 }
    }
}

impl Default for CompoundWeights {
    fn default() -> Self {
        Self::balanced()
    }
}

/// Distance function over dot-bracket strings: `tree_weight * tree_ed + string_weight * string_ed`.
#[derive(Clone, Debug, Default)]
pub struct CompoundDistance {
    /// Term weights
    weights: CompoundWeights,
    /// Symbols used to parse the inputs
    alphabet: BracketAlphabet
}

impl CompoundDistance {
    /// Creates a dot-bracket compound distance.
    pub fn new(weights: CompoundWeights) -> CompoundDistance {
        Self::with_alphabet(weights, BracketAlphabet::DOT_BRACKET)
    }

    /// Creates a compound distance for a different bracket alphabet, e.g. abstract shapes.
    pub fn with_alphabet(weights: CompoundWeights, alphabet: BracketAlphabet) -> CompoundDistance {
        CompoundDistance {
            weights,
            alphabet
        }
    }

    /// Computes the weighted distance between two bracket strings.
    /// Both strings are always parsed, so malformed input is rejected even when the tree term is disabled.
    /// # Arguments
    /// * `s1` - the first structure
    /// * `s2` - the second structure
    /// # Errors
    /// * `InvalidStructure` if either input is not a balanced string over the alphabet
    pub fn distance(&self, s1: &str, s2: &str) -> Result<f64, ConsensusError> {
        let t1 = OrderedLabeledTree::new(s1, self.alphabet)?;
        let t2 = OrderedLabeledTree::new(s2, self.alphabet)?;

        let mut total = 0.0;
        if self.weights.tree_weight != 0.0 {
            total += self.weights.tree_weight * tree_ed(&t1, &t2);
        }
        if self.weights.string_weight != 0.0 {
            total += self.weights.string_weight * string_ed(s1, s2);
        }
        Ok(total)
    }

    // Getters
    pub fn weights(&self) -> CompoundWeights {
        self.weights
    }

    pub fn alphabet(&self) -> BracketAlphabet {
        self.alphabet
    }
}
