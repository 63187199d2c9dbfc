
/*!
Zhang-Shasha ordered tree edit distance.
Costs are pluggable through the `EditCosts` trait; the default is unit cost for deletions, insertions, and label changes.

# Example usage
```rust
use subopt_con::tree::{BracketAlphabet, OrderedLabeledTree};
use subopt_con::tree_distance::tree_ed;

let t1 = OrderedLabeledTree::new("()(((())))", BracketAlphabet::DOT_BRACKET).unwrap();
let t2 = OrderedLabeledTree::new("()((()))", BracketAlphabet::DOT_BRACKET).unwrap();
assert_eq!(tree_ed(&t1, &t2), 1.0);
```
*/

use crate::tree::OrderedLabeledTree;

/// Cost model for the three tree edit operations.
pub trait EditCosts {
    /// Cost of removing a node with `label`, its children are promoted to its parent
    fn delete(&self, label: char) -> f64;
    /// Cost of adding a node with `label`
    fn insert(&self, label: char) -> f64;
    /// Cost of relabeling `from` to `to`, must be 0 when the labels match
    fn substitute(&self, from: char, to: char) -> f64;
}

/// Every operation costs 1, matching labels substitute for free.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnitCosts;

impl EditCosts for UnitCosts {
    fn delete(&self, _label: char) -> f64 {
        1.0
    }

    fn insert(&self, _label: char) -> f64 {
        1.0
    }

    fn substitute(&self, from: char, to: char) -> f64 {
        if from == to { 0.0 } else { 1.0 }
    }
}

/// Same as `UnitCosts` except a label change costs 2, i.e. as much as a delete plus an insert.
#[derive(Clone, Copy, Debug, Default)]
pub struct DoubleSubstitutionCosts;

impl EditCosts for DoubleSubstitutionCosts {
    fn delete(&self, _label: char) -> f64 {
        1.0
    }

    fn insert(&self, _label: char) -> f64 {
        1.0
    }

    fn substitute(&self, from: char, to: char) -> f64 {
        if from == to { 0.0 } else { 2.0 }
    }
}

/// Tree edit distance with unit costs.
/// # Arguments
/// * `t1` - the first tree
/// * `t2` - the second tree
pub fn tree_ed(t1: &OrderedLabeledTree, t2: &OrderedLabeledTree) -> f64 {
    tree_ed_costs(t1, t2, &UnitCosts)
}

/// Tree edit distance with a custom cost model.
/// Runs a forest distance computation for every pair of keyroots, sharing one subtree distance table across all of them.
/// # Arguments
/// * `t1` - the first tree
/// * `t2` - the second tree
/// * `costs` - the cost model
pub fn tree_ed_costs<C: EditCosts>(t1: &OrderedLabeledTree, t2: &OrderedLabeledTree, costs: &C) -> f64 {
    let n1 = t1.len();
    let n2 = t2.len();
    let mut workspace = ForestWorkspace {
        t1,
        t2,
        costs,
        tree_distances: vec![0.0; n1 * n2],
        forest_distances: vec![0.0; (n1 + 1) * (n2 + 1)],
        n2
    };

    for &i in t1.keyroots() {
        for &j in t2.keyroots() {
            workspace.forest_distance(i, j);
        }
    }

    // both roots are the last keyroots, so this entry is always written
    workspace.tree_distances[(n1 - 1) * n2 + (n2 - 1)]
}

/// Scratch tables for a single tree edit distance computation.
struct ForestWorkspace<'a, C: EditCosts> {
    t1: &'a OrderedLabeledTree,
    t2: &'a OrderedLabeledTree,
    costs: &'a C,
    /// `tree_distances[a * n2 + b]` is the distance between the subtrees rooted at post-order positions `a` and `b`
    tree_distances: Vec<f64>,
    /// Forest table, reused between keyroot pairs with a per-call row stride
    forest_distances: Vec<f64>,
    n2: usize
}

impl<'a, C: EditCosts> ForestWorkspace<'a, C> {
    /// Fills in the forest table for keyroots `i` and `j`.
    /// Row `x` covers the forest from `lmd1[i]` through `lmd1[i] + x - 1`, column `y` likewise for the second tree.
    fn forest_distance(&mut self, i: usize, j: usize) {
        let lmd1 = self.t1.leftmost_descendants();
        let lmd2 = self.t2.leftmost_descendants();
        let labels1 = self.t1.postorder_labels();
        let labels2 = self.t2.postorder_labels();

        let start1 = lmd1[i];
        let start2 = lmd2[j];
        let rows = i - start1 + 2;
        let cols = j - start2 + 2;
        let fd = &mut self.forest_distances;

        fd[0] = 0.0;
        for x in 1..rows {
            fd[x * cols] = fd[(x - 1) * cols] + self.costs.delete(labels1[start1 + x - 1]);
        }
        for y in 1..cols {
            fd[y] = fd[y - 1] + self.costs.insert(labels2[start2 + y - 1]);
        }

        for x in 1..rows {
            let a = start1 + x - 1;
            for y in 1..cols {
                let b = start2 + y - 1;
                let delete = fd[(x - 1) * cols + y] + self.costs.delete(labels1[a]);
                let insert = fd[x * cols + y - 1] + self.costs.insert(labels2[b]);

                if lmd1[a] == start1 && lmd2[b] == start2 {
                    // both prefixes are whole trees, so this is also a subtree distance
                    let substitute = fd[(x - 1) * cols + y - 1] + self.costs.substitute(labels1[a], labels2[b]);
                    let best = delete.min(insert).min(substitute);
                    fd[x * cols + y] = best;
                    self.tree_distances[a * self.n2 + b] = best;
                } else {
                    // match the subtrees at a and b as a unit, using the earlier forest before them
                    let p = lmd1[a] - start1;
                    let q = lmd2[b] - start2;
                    let matched = fd[p * cols + q] + self.tree_distances[a * self.n2 + b];
                    fd[x * cols + y] = delete.min(insert).min(matched);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::tree::BracketAlphabet;

    use std::path::PathBuf;

    #[derive(Debug, serde::Deserialize)]
    struct TreeDistanceRecord {
        structure1: String,
        structure2: String,
        distance: f64
    }

    /// Loads (structure1, structure2, distance) triplets from a csv file.
    /// # Arguments
    /// * `filename` - the csv to load, requires a header line
    fn load_distance_csv(filename: &std::path::Path) -> Vec<TreeDistanceRecord> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(filename)
            .unwrap();
        csv_reader.deserialize()
            .map(|row| row.unwrap())
            .collect()
    }

    fn dot_bracket(s: &str) -> OrderedLabeledTree {
        OrderedLabeledTree::new(s, BracketAlphabet::DOT_BRACKET).unwrap()
    }

    #[test]
    fn test_csv_tree_distances() {
        let records = load_distance_csv(&PathBuf::from("./tests/tree_distances.csv"));
        assert!(!records.is_empty());
        for record in records.iter() {
            let t1 = dot_bracket(&record.structure1);
            let t2 = dot_bracket(&record.structure2);
            assert_eq!(tree_ed(&t1, &t2), record.distance, "{record:?}");
            // the unit cost model is symmetric
            assert_eq!(tree_ed(&t2, &t1), record.distance, "{record:?}");
        }
    }

    #[test]
    fn test_identity() {
        let structures = ["", "...", "((..((...))..((...))..))", "(.)....(((((....)))))"];
        for s in structures.iter() {
            let t = dot_bracket(s);
            assert_eq!(tree_ed(&t, &t), 0.0);
        }
    }

    #[test]
    fn test_single_edits() {
        // one deleted pair
        assert_eq!(tree_ed(&dot_bracket("()(((())))"), &dot_bracket("()((()))")), 1.0);
        // one inserted leaf
        assert_eq!(tree_ed(&dot_bracket("(())"), &dot_bracket("((.))")), 1.0);
        // one relabeled node
        assert_eq!(tree_ed(&dot_bracket("(.)"), &dot_bracket("(())")), 1.0);
    }

    #[test]
    fn test_double_substitution_costs() {
        let t1 = dot_bracket("(.)");
        let t2 = dot_bracket("(())");
        assert_eq!(tree_ed_costs(&t1, &t2, &DoubleSubstitutionCosts), 2.0);

        // no relabels are needed here, so both models agree
        let t1 = dot_bracket("((..))");
        let t2 = dot_bracket("(....)");
        assert_eq!(tree_ed_costs(&t1, &t2, &DoubleSubstitutionCosts), tree_ed(&t1, &t2));
    }

    #[test]
    fn test_triangle_inequality() {
        let structures = ["", "()", "(.)", "((..))", "(....)", "(())()", "()()", ".(.)."];
        let trees: Vec<OrderedLabeledTree> = structures.iter().map(|s| dot_bracket(s)).collect();
        for a in trees.iter() {
            for b in trees.iter() {
                for c in trees.iter() {
                    assert!(tree_ed(a, c) <= tree_ed(a, b) + tree_ed(b, c));
                }
            }
        }
    }

    #[test]
    fn test_shape_trees() {
        let t1 = OrderedLabeledTree::new("[][]", BracketAlphabet::SHAPE).unwrap();
        let t2 = OrderedLabeledTree::new("[[][]]", BracketAlphabet::SHAPE).unwrap();
        assert_eq!(tree_ed(&t1, &t2), 1.0);
    }
}
