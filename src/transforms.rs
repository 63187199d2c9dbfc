
/*!
Lossy, many-to-one simplifications of dot-bracket structures used by the coarse consensus phase.
Every transform is a pure string to string map; `ReverseMapping` remembers which originals produced each coarse value.

# Example usage
```rust
use subopt_con::transforms::{abstract_shape, granular, CoarseTransform, ReverseMapping};

assert_eq!(granular("(.)....((((....))))", 2).unwrap(), "()(())");
assert_eq!(abstract_shape("((..((...))..((...))..))", 1).unwrap(), "[_[]_[]_]");

let groups = vec![
    vec!["((..))".to_string(), "((...))".to_string(), "(.)(.)".to_string()]
];
let (coarse, mapping) = ReverseMapping::build(&groups, CoarseTransform::Granular(2)).unwrap();
assert_eq!(coarse, vec![vec!["()".to_string(), "()()".to_string()]]);
assert_eq!(mapping.originals(0, "()"), &["((..))".to_string(), "((...))".to_string()]);
```
*/

use rustc_hash::FxHashMap as HashMap;
use std::collections::VecDeque;

use crate::error::ConsensusError;
use crate::tree::{BracketAlphabet, NodeArena};

/// Shortens every stem to `ceil(length / granularity)` base pairs, dropping all unpaired bases.
/// A stem is a maximal chain of nested pairs where each pair encloses exactly one other pair, starting either at the top level or directly below a multi-branch pair.
/// # Arguments
/// * `structure` - the dot-bracket string; whitespace is ignored
/// * `granularity` - the stem length divisor, must be > 0
/// # Errors
/// * `Configuration` if `granularity` is 0
/// * `InvalidStructure` if the pairs are unbalanced or an unknown symbol is present
pub fn granular(structure: &str, granularity: usize) -> Result<String, ConsensusError> {
    if granularity == 0 {
        return Err(ConsensusError::configuration("granularity must be > 0"));
    }

    let alphabet = BracketAlphabet::DOT_BRACKET;
    let pairs_only: String = structure.chars()
        .filter(|&c| c != alphabet.leaf() && !c.is_whitespace())
        .collect();
    let mut arena = NodeArena::parse(&pairs_only, alphabet)?;

    // collect every stem before editing, stems are disjoint so the edits do not interact
    let mut stems: Vec<Vec<usize>> = vec![];
    let mut search_space: VecDeque<usize> = arena.children(NodeArena::ROOT).iter().cloned().collect();
    while let Some(node) = search_space.pop_front() {
        if starts_stem(&arena, node) {
            let mut stem = vec![node];
            let mut position = node;
            while let [only_child] = arena.children(position) {
                position = *only_child;
                stem.push(position);
            }
            stems.push(stem);
        }
        search_space.extend(arena.children(node).iter().cloned());
    }

    for stem in stems.into_iter() {
        let new_length = stem.len().div_ceil(granularity);
        if new_length == stem.len() {
            continue;
        }

        // the last kept pair adopts whatever the original stem ended on
        let kept_end = stem[new_length - 1];
        let old_end = stem[stem.len() - 1];
        let tail_children = arena.children(old_end).to_vec();
        arena.set_children(kept_end, tail_children);
    }

    Ok(arena.render())
}

/// A node starts a stem if it has at most one child and hangs from the root or from a junction.
fn starts_stem(arena: &NodeArena, node: usize) -> bool {
    let single_or_leaf = arena.children(node).len() <= 1;
    let below_junction = match arena.parent(node) {
        Some(parent) => parent == NodeArena::ROOT || arena.children(parent).len() > 1,
        None => true
    };
    single_or_leaf && below_junction
}

/// Converts a dot-bracket structure to its abstract shape at level 1, 3, or 5.
/// * level 1 - helices collapse to a single `[]`, unpaired regions between helices become `_`
/// * level 3 - as level 1 without any `_`
/// * level 5 - level 3 with any helices that became stems collapsed again
/// # Arguments
/// * `structure` - the dot-bracket string; surrounding whitespace is ignored
/// * `level` - one of 1, 3, 5
/// # Errors
/// * `Configuration` if the level is not supported
/// * `InvalidStructure` if the input does not parse
pub fn abstract_shape(structure: &str, level: usize) -> Result<String, ConsensusError> {
    if !matches!(level, 1 | 3 | 5) {
        return Err(ConsensusError::configuration(format!("abstract shape level must be 1, 3, or 5, got {level}")));
    }

    let dot_bracket = BracketAlphabet::DOT_BRACKET;
    let shape = BracketAlphabet::SHAPE;

    let processed = collapse_unpaired(structure.trim());
    let mut arena = NodeArena::parse(&processed, dot_bracket)?;
    remove_stems(&mut arena);

    let level1: String = arena.render().chars()
        .map(|c| {
            if c == dot_bracket.nest() {
                shape.nest()
            } else if c == dot_bracket.close() {
                shape.close()
            } else {
                shape.leaf()
            }
        })
        .collect();
    if level == 1 {
        return Ok(level1);
    }

    let level3: String = level1.chars()
        .filter(|&c| c != shape.leaf())
        .collect();
    if level == 3 {
        return Ok(level3);
    }

    let mut arena = NodeArena::parse(&level3, shape)?;
    remove_stems(&mut arena);
    Ok(arena.render())
}

/// Collapses runs of unpaired bases to one and then drops the lone unpaired base inside a hairpin, e.g. `((...))` becomes `(())`.
fn collapse_unpaired(structure: &str) -> String {
    let collapsed: Vec<char> = structure.chars()
        .fold(Vec::with_capacity(structure.len()), |mut acc: Vec<char>, c| {
            if !(c == '.' && acc.last() == Some(&'.')) {
                acc.push(c);
            }
            acc
        });

    let mut processed = String::with_capacity(collapsed.len());
    for (i, &c) in collapsed.iter().enumerate() {
        let is_hairpin = c == '.' &&
            processed.ends_with('(') &&
            collapsed.get(i + 1) == Some(&')');
        if !is_hairpin {
            processed.push(c);
        }
    }
    processed
}

/// Breadth-first from each top-level node: a nested node with exactly one child absorbs its grandchildren and is revisited immediately.
fn remove_stems(arena: &mut NodeArena) {
    let nest = arena.alphabet().nest();
    let mut queue: VecDeque<usize> = arena.children(NodeArena::ROOT).iter().cloned().collect();
    while let Some(node) = queue.pop_front() {
        if arena.label(node) != nest {
            continue;
        }

        if let [only_child] = arena.children(node) {
            let grandchildren = arena.children(*only_child).to_vec();
            arena.set_children(node, grandchildren);
            queue.push_front(node);
        } else {
            queue.extend(arena.children(node).iter().cloned());
        }
    }
}

/// Coarse-phase simplification applied to every candidate structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoarseTransform {
    /// Leaves structures unchanged
    Identity,
    /// Stem compression with the given granularity
    Granular(usize),
    /// Abstract shape at the given level
    AbstractShape(usize)
}

impl CoarseTransform {
    /// Applies the transform to a single structure.
    /// # Errors
    /// * if the underlying transform rejects the structure or its parameter
    pub fn apply(&self, structure: &str) -> Result<String, ConsensusError> {
        match self {
            CoarseTransform::Identity => Ok(structure.to_string()),
            CoarseTransform::Granular(granularity) => granular(structure, *granularity),
            CoarseTransform::AbstractShape(level) => abstract_shape(structure, *level)
        }
    }

    /// The bracket alphabet of the transformed strings
    pub fn output_alphabet(&self) -> BracketAlphabet {
        match self {
            CoarseTransform::AbstractShape(_) => BracketAlphabet::SHAPE,
            _ => BracketAlphabet::DOT_BRACKET
        }
    }
}

impl Default for CoarseTransform {
    fn default() -> Self {
        CoarseTransform::Granular(3)
    }
}

/// Per group, maps each coarse value back to the original structures that produced it.
#[derive(Clone, Debug, Default)]
pub struct ReverseMapping {
    /// One map per input group; each value list is unique and in first-seen order
    groups: Vec<HashMap<String, Vec<String>>>
}

impl ReverseMapping {
    /// Transforms every structure and records where each coarse value came from.
    /// Returns the coarse groups (unique coarse values per group, first-seen order) alongside the mapping.
    /// # Arguments
    /// * `groups` - the original candidate structures, one list per input sequence
    /// * `transform` - the coarse transform to apply
    /// # Errors
    /// * if the transform fails on any structure
    pub fn build(groups: &[Vec<String>], transform: CoarseTransform) -> Result<(Vec<Vec<String>>, ReverseMapping), ConsensusError> {
        let mut coarse_groups = Vec::with_capacity(groups.len());
        let mut mapping = Vec::with_capacity(groups.len());
        for group in groups.iter() {
            let mut coarse_values: Vec<String> = vec![];
            let mut originals: HashMap<String, Vec<String>> = Default::default();
            for structure in group.iter() {
                let coarse = transform.apply(structure)?;
                let entry = originals.entry(coarse.clone()).or_default();
                if entry.is_empty() {
                    coarse_values.push(coarse);
                }
                if !entry.contains(structure) {
                    entry.push(structure.clone());
                }
            }
            coarse_groups.push(coarse_values);
            mapping.push(originals);
        }

        Ok((coarse_groups, ReverseMapping { groups: mapping }))
    }

    /// The originals in `group` that map to `coarse`, empty if there are none
    pub fn originals(&self, group: usize, coarse: &str) -> &[String] {
        self.groups.get(group)
            .and_then(|m| m.get(coarse))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Number of groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
