
use std::cmp::Ordering;

/// A full assignment: one chosen object index per range, plus its pairwise score.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Solution {
    /// `genes[r]` is an index inside `ranges[r]`
    genes: Vec<usize>,
    /// Sum of distances over all ordered pairs of genes, so each unordered pair counts twice
    score: f64
}

impl Solution {
    /// Constructor
    pub fn new(genes: Vec<usize>, score: f64) -> Solution {
        Solution {
            genes,
            score
        }
    }

    pub(crate) fn set_gene(&mut self, position: usize, gene: usize) {
        self.genes[position] = gene;
    }

    pub(crate) fn set_score(&mut self, score: f64) {
        self.score = score;
    }

    // Getters
    pub fn genes(&self) -> &[usize] {
        &self.genes
    }

    pub fn score(&self) -> f64 {
        self.score
    }
}

/// Total order over scores so they can be used as priorities and sort keys.
#[derive(Clone, Copy, Debug, Default)]
pub struct OrderedScore(pub f64);

impl PartialEq for OrderedScore {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OrderedScore {}

impl PartialOrd for OrderedScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedScore {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Sorts ascending by score, ties broken by gene sequence.
pub fn sort_solutions(solutions: &mut [Solution]) {
    solutions.sort_by(|a, b| {
        a.score.total_cmp(&b.score)
            .then_with(|| a.genes.cmp(&b.genes))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordered_score() {
        let mut scores = vec![OrderedScore(3.0), OrderedScore(-1.0), OrderedScore(2.5)];
        scores.sort();
        assert_eq!(scores, vec![OrderedScore(-1.0), OrderedScore(2.5), OrderedScore(3.0)]);
        assert!(OrderedScore(1.0) < OrderedScore(f64::INFINITY));
    }

    #[test]
    fn test_sort_solutions() {
        let mut solutions = vec![
            Solution::new(vec![1, 4], 2.0),
            Solution::new(vec![0, 5], 2.0),
            Solution::new(vec![2, 3], 0.0)
        ];
        sort_solutions(&mut solutions);
        let genes: Vec<&[usize]> = solutions.iter().map(|s| s.genes()).collect();
        assert_eq!(genes, vec![&[2, 3][..], &[0, 5][..], &[1, 4][..]]);
    }
}
