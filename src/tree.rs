
/*!
Ordered labeled trees built from bracket notation.
Each tree precomputes the traversal indices that the Zhang-Shasha tree edit distance needs: post-order labels, leftmost descendants, and keyroots.

# Example usage
```rust
use subopt_con::tree::{BracketAlphabet, OrderedLabeledTree};

let tree = OrderedLabeledTree::new("(.(..))", BracketAlphabet::DOT_BRACKET).unwrap();

// the artificial root, two base pairs, and three unpaired bases
assert_eq!(tree.len(), 6);
assert_eq!(tree.leftmost_descendants(), &[0, 1, 2, 1, 0, 0]);
assert_eq!(tree.keyroots(), &[2, 3, 5]);
assert_eq!(tree.to_string(), "(.(..))");
```
*/

use std::fmt;

use crate::error::ConsensusError;

/// The three symbols of a two-symbol nesting grammar plus its unpaired symbol.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct BracketAlphabet {
    /// Opens a new nested node and descends into it
    nest: char,
    /// Returns to the parent node
    close: char,
    /// Attaches a single leaf to the current node
    leaf: char
}

impl BracketAlphabet {
    /// Vienna dot-bracket notation
    pub const DOT_BRACKET: BracketAlphabet = BracketAlphabet { nest: '(', close: ')', leaf: '.' };
    /// Abstract shape notation
    pub const SHAPE: BracketAlphabet = BracketAlphabet { nest: '[', close: ']', leaf: '_' };

    /// Creates a custom alphabet.
    /// # Errors
    /// * if any two of the symbols are identical
    pub fn new(nest: char, close: char, leaf: char) -> Result<BracketAlphabet, ConsensusError> {
        if nest == close || nest == leaf || close == leaf {
            return Err(ConsensusError::configuration(
                format!("bracket alphabet symbols must be distinct, got {nest:?}, {close:?}, {leaf:?}")
            ));
        }
        Ok(BracketAlphabet { nest, close, leaf })
    }

    /// Checks that `structure` only uses this alphabet and is balanced, i.e. the nesting depth never goes negative and ends at zero.
    /// # Arguments
    /// * `structure` - the bracket string to check
    /// # Errors
    /// * if an unknown symbol is found or the brackets are unbalanced
    pub fn validate(&self, structure: &str) -> Result<(), ConsensusError> {
        let mut depth: usize = 0;
        for (position, c) in structure.chars().enumerate() {
            if c == self.nest {
                depth += 1;
            } else if c == self.close {
                if depth == 0 {
                    return Err(ConsensusError::invalid_structure(
                        structure, format!("unmatched {:?} at position {position}", self.close)
                    ));
                }
                depth -= 1;
            } else if c != self.leaf {
                return Err(ConsensusError::invalid_structure(
                    structure, format!("unrecognized symbol {c:?} at position {position}")
                ));
            }
        }

        if depth != 0 {
            return Err(ConsensusError::invalid_structure(
                structure, format!("{depth} unclosed {:?}", self.nest)
            ));
        }
        Ok(())
    }

    // Getters
    pub fn nest(&self) -> char {
        self.nest
    }

    pub fn close(&self) -> char {
        self.close
    }

    pub fn leaf(&self) -> char {
        self.leaf
    }
}

impl Default for BracketAlphabet {
    fn default() -> Self {
        BracketAlphabet::DOT_BRACKET
    }
}

#[derive(Clone, Debug)]
struct TreeNode {
    label: char,
    parent: Option<usize>,
    children: Vec<usize>
}

/// Index-addressed node storage for a bracket tree.
/// Node 0 is always the artificial root, labeled with the nest symbol, so a top-level forest is still a single tree.
/// Structural edits relink indices; nodes that get cut out simply become unreachable from the root.
#[derive(Clone, Debug)]
pub(crate) struct NodeArena {
    alphabet: BracketAlphabet,
    nodes: Vec<TreeNode>
}

impl NodeArena {
    pub(crate) const ROOT: usize = 0;

    /// Validates and parses a bracket string with a simple stack machine.
    /// # Errors
    /// * if the structure fails `BracketAlphabet::validate`
    pub(crate) fn parse(structure: &str, alphabet: BracketAlphabet) -> Result<NodeArena, ConsensusError> {
        alphabet.validate(structure)?;

        let mut arena = NodeArena {
            alphabet,
            nodes: vec![TreeNode { label: alphabet.nest, parent: None, children: vec![] }]
        };

        let mut position = Self::ROOT;
        for c in structure.chars() {
            if c == alphabet.nest {
                position = arena.push_child(position, c);
            } else if c == alphabet.close {
                position = arena.nodes[position].parent
                    .ok_or_else(|| ConsensusError::invalid_structure(structure, "closed past the root"))?;
            } else {
                arena.push_child(position, c);
            }
        }
        Ok(arena)
    }

    fn push_child(&mut self, parent: usize, label: char) -> usize {
        let index = self.nodes.len();
        self.nodes.push(TreeNode { label, parent: Some(parent), children: vec![] });
        self.nodes[parent].children.push(index);
        index
    }

    pub(crate) fn label(&self, node: usize) -> char {
        self.nodes[node].label
    }

    pub(crate) fn parent(&self, node: usize) -> Option<usize> {
        self.nodes[node].parent
    }

    pub(crate) fn children(&self, node: usize) -> &[usize] {
        &self.nodes[node].children
    }

    pub(crate) fn alphabet(&self) -> BracketAlphabet {
        self.alphabet
    }

    /// Replaces the children of `node`, updating parent links on both the new and the detached children.
    pub(crate) fn set_children(&mut self, node: usize, children: Vec<usize>) {
        let old_children = std::mem::take(&mut self.nodes[node].children);
        for old in old_children {
            self.nodes[old].parent = None;
        }
        for &child in children.iter() {
            self.nodes[child].parent = Some(node);
        }
        self.nodes[node].children = children;
    }

    /// Follows first children from `node` until reaching a node without children.
    pub(crate) fn leftmost_leaf(&self, node: usize) -> usize {
        let mut position = node;
        while let Some(&first) = self.nodes[position].children.first() {
            position = first;
        }
        position
    }

    /// Returns the reachable nodes in post-order (children fully before their parent).
    pub(crate) fn postorder(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(usize, usize)> = vec![(Self::ROOT, 0)];
        while let Some((node, next_child)) = stack.pop() {
            let children = &self.nodes[node].children;
            if next_child < children.len() {
                stack.push((node, next_child + 1));
                stack.push((children[next_child], 0));
            } else {
                order.push(node);
            }
        }
        order
    }

    /// Writes the tree back out in bracket notation, the artificial root is not printed.
    pub(crate) fn render(&self) -> String {
        let nest = self.alphabet.nest;
        let close = self.alphabet.close;
        let mut rendered = String::with_capacity(2 * self.nodes.len());
        let mut stack: Vec<(usize, usize)> = vec![(Self::ROOT, 0)];
        while let Some((node, next_child)) = stack.pop() {
            let is_root = node == Self::ROOT;
            let label = self.nodes[node].label;
            if label != nest {
                rendered.push(label);
                continue;
            }

            if next_child == 0 && !is_root {
                rendered.push(nest);
            }

            let children = &self.nodes[node].children;
            if next_child < children.len() {
                stack.push((node, next_child + 1));
                stack.push((children[next_child], 0));
            } else if !is_root {
                rendered.push(close);
            }
        }
        rendered
    }
}

/// Immutable ordered labeled tree with the Zhang-Shasha traversal indices.
/// All indices are 0-based post-order positions; the last position is always the artificial root.
#[derive(Clone, Debug)]
pub struct OrderedLabeledTree {
    /// Node storage, kept for rendering
    arena: NodeArena,
    /// Labels in post-order traversal order
    postorder_labels: Vec<char>,
    /// For each post-order position, the post-order position of its leftmost descendant
    leftmost_descendants: Vec<usize>,
    /// One position per distinct leftmost descendant (the highest one), ascending
    keyroots: Vec<usize>
}

impl OrderedLabeledTree {
    /// Builds a tree from a bracket string.
    /// # Arguments
    /// * `structure` - the bracket string
    /// * `alphabet` - the nest/close/leaf symbols used by `structure`
    /// # Errors
    /// * `InvalidStructure` if the string is unbalanced or uses a symbol outside of `alphabet`
    pub fn new(structure: &str, alphabet: BracketAlphabet) -> Result<OrderedLabeledTree, ConsensusError> {
        let arena = NodeArena::parse(structure, alphabet)?;
        Ok(Self::from_arena(arena))
    }

    /// Computes the traversal indices for an already built arena.
    pub(crate) fn from_arena(arena: NodeArena) -> OrderedLabeledTree {
        let order = arena.postorder();

        // map from arena index to post-order index; unreachable nodes stay at MAX
        let mut postorder_index = vec![usize::MAX; arena.nodes.len()];
        for (index, &node) in order.iter().enumerate() {
            postorder_index[node] = index;
        }

        let postorder_labels: Vec<char> = order.iter()
            .map(|&node| arena.label(node))
            .collect();

        let leftmost_descendants: Vec<usize> = order.iter()
            .map(|&node| postorder_index[arena.leftmost_leaf(node)])
            .collect();

        // the highest node sharing a leftmost descendant is the keyroot for that descendant
        let mut seen = vec![false; order.len()];
        let mut keyroots = vec![];
        for index in (0..order.len()).rev() {
            let lmd = leftmost_descendants[index];
            if !seen[lmd] {
                seen[lmd] = true;
                keyroots.push(index);
            }
        }
        keyroots.reverse();

        OrderedLabeledTree {
            arena,
            postorder_labels,
            leftmost_descendants,
            keyroots
        }
    }

    /// Reconstructs the original bracket string
    pub fn to_bracket_string(&self) -> String {
        self.arena.render()
    }

    /// Number of nodes, including the artificial root
    pub fn len(&self) -> usize {
        self.postorder_labels.len()
    }

    /// Always false, the artificial root is present even for an empty string
    pub fn is_empty(&self) -> bool {
        self.postorder_labels.is_empty()
    }

    // Getters
    pub fn alphabet(&self) -> BracketAlphabet {
        self.arena.alphabet()
    }

    pub fn postorder_labels(&self) -> &[char] {
        &self.postorder_labels
    }

    pub fn leftmost_descendants(&self) -> &[usize] {
        &self.leftmost_descendants
    }

    pub fn keyroots(&self) -> &[usize] {
        &self.keyroots
    }
}

impl PartialEq for OrderedLabeledTree {
    fn eq(&self, other: &Self) -> bool {
        // post-order labels with leftmost descendants fully determine an ordered tree
        self.postorder_labels == other.postorder_labels &&
            self.leftmost_descendants == other.leftmost_descendants
    }
}

impl Eq for OrderedLabeledTree {}

impl fmt::Display for OrderedLabeledTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_bracket_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_traversal_indices() {
        let tree = OrderedLabeledTree::new("(.(..))", BracketAlphabet::DOT_BRACKET).unwrap();
        assert_eq!(tree.postorder_labels(), &['.', '.', '.', '(', '(', '(']);
        assert_eq!(tree.leftmost_descendants(), &[0, 1, 2, 1, 0, 0]);
        assert_eq!(tree.keyroots(), &[2, 3, 5]);
    }

    #[test]
    fn test_empty_structure() {
        // just the artificial root
        let tree = OrderedLabeledTree::new("", BracketAlphabet::DOT_BRACKET).unwrap();
        assert_eq!(tree.len(), 1);
        assert!(!tree.is_empty());
        assert_eq!(tree.leftmost_descendants(), &[0]);
        assert_eq!(tree.keyroots(), &[0]);
        assert_eq!(tree.to_bracket_string(), "");
    }

    #[test]
    fn test_siblings_are_keyroots() {
        // "()()": postorder = [a, b, root]; b is its own leftmost descendant
        let tree = OrderedLabeledTree::new("()()", BracketAlphabet::DOT_BRACKET).unwrap();
        assert_eq!(tree.leftmost_descendants(), &[0, 1, 0]);
        assert_eq!(tree.keyroots(), &[1, 2]);
    }

    #[test]
    fn test_round_trip() {
        let structures = [
            "",
            "...",
            "()",
            "((..((...))..((...))..))",
            "..((((...))))...((...))..",
            "(.)....(((((....)))))",
        ];
        for s in structures.iter() {
            let tree = OrderedLabeledTree::new(s, BracketAlphabet::DOT_BRACKET).unwrap();
            assert_eq!(&tree.to_bracket_string(), s);
        }

        let shape = OrderedLabeledTree::new("[_[]_[]_]", BracketAlphabet::SHAPE).unwrap();
        assert_eq!(shape.to_string(), "[_[]_[]_]");
    }

    #[test]
    fn test_deep_nesting() {
        // make sure nothing here recurses on depth
        let depth = 50_000;
        let structure = format!("{}{}", "(".repeat(depth), ")".repeat(depth));
        let tree = OrderedLabeledTree::new(&structure, BracketAlphabet::DOT_BRACKET).unwrap();
        assert_eq!(tree.len(), depth + 1);
        assert_eq!(tree.keyroots(), &[depth]);
        assert_eq!(tree.to_bracket_string(), structure);
    }

    #[test]
    fn test_invalid_structures() {
        let alphabet = BracketAlphabet::DOT_BRACKET;
        assert!(matches!(
            OrderedLabeledTree::new("(()", alphabet),
            Err(ConsensusError::InvalidStructure { .. })
        ));
        assert!(matches!(
            OrderedLabeledTree::new("())(", alphabet),
            Err(ConsensusError::InvalidStructure { .. })
        ));
        assert!(matches!(
            OrderedLabeledTree::new("(.x)", alphabet),
            Err(ConsensusError::InvalidStructure { .. })
        ));

        // shape symbols are not part of dot-bracket
        assert!(OrderedLabeledTree::new("[]", alphabet).is_err());
        assert!(OrderedLabeledTree::new("[]", BracketAlphabet::SHAPE).is_ok());
    }

    #[test]
    fn test_custom_alphabet() {
        assert!(BracketAlphabet::new('<', '>', '<').is_err());
        let alphabet = BracketAlphabet::new('<', '>', '-').unwrap();
        let tree = OrderedLabeledTree::new("<-<>>", alphabet).unwrap();
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.to_string(), "<-<>>");
    }

    #[test]
    fn test_structural_equality() {
        let a = OrderedLabeledTree::new("(.)()", BracketAlphabet::DOT_BRACKET).unwrap();
        let b = OrderedLabeledTree::new("(.)()", BracketAlphabet::DOT_BRACKET).unwrap();
        let c = OrderedLabeledTree::new("().()", BracketAlphabet::DOT_BRACKET).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_set_children_relinks() {
        // collapse the outer pair of "(())" onto its grandchildren
        let mut arena = NodeArena::parse("((.))", BracketAlphabet::DOT_BRACKET).unwrap();
        let outer = arena.children(NodeArena::ROOT)[0];
        let inner = arena.children(outer)[0];
        let grandchildren = arena.children(inner).to_vec();
        arena.set_children(outer, grandchildren.clone());

        assert_eq!(arena.parent(grandchildren[0]), Some(outer));
        assert_eq!(arena.parent(inner), None);
        assert_eq!(arena.render(), "(.)");
        assert_eq!(OrderedLabeledTree::from_arena(arena).len(), 3);
    }
}
