
use rand::distributions::Uniform;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::Range;

use crate::consensus_problem::DistanceMatrix;

/// Shortest allowed hairpin loop
const MIN_HAIRPIN: usize = 3;

/// Generates a random balanced dot-bracket structure of exactly `length` symbols.
/// Every hairpin has at least 3 unpaired bases.
/// # Arguments
/// * `length` - the structure length
/// * `pair_probability` - chance of opening (and separately, closing) a pair at each position when allowed
/// * `seed` - the random seed
pub fn generate_structure(length: usize, pair_probability: f64, seed: u64) -> String {
    let mut rng = StdRng::seed_from_u64(seed);
    random_structure(length, pair_probability, &mut rng)
}

fn random_structure<R: Rng>(length: usize, pair_probability: f64, rng: &mut R) -> String {
    assert!((0.0..=0.5).contains(&pair_probability));
    let event_distribution = Uniform::new(0.0, 1.0);

    // positions of the currently open pairs
    let mut open_stack: Vec<usize> = vec![];
    let mut structure = String::with_capacity(length);
    for i in 0..length {
        let remaining = length - i;
        if remaining == open_stack.len() {
            // only room left to close
            open_stack.pop();
            structure.push(')');
            continue;
        }

        let can_open = remaining > open_stack.len() + 1 + MIN_HAIRPIN;
        let can_close = open_stack.last().map_or(false, |&p| i - p > MIN_HAIRPIN);
        let event: f64 = rng.sample(event_distribution);
        if can_open && event < pair_probability {
            open_stack.push(i);
            structure.push('(');
        } else if can_close && event >= 1.0 - pair_probability {
            open_stack.pop();
            structure.push(')');
        } else {
            structure.push('.');
        }
    }
    structure
}

/// Generates groups of random structures where one planted structure appears in every group.
/// Returns the planted structure and the groups.
/// # Arguments
/// * `num_groups` - the number of groups
/// * `group_size` - the number of structures per group, including the planted one
/// * `length` - the length of every structure
/// * `seed` - the random seed
pub fn generate_groups(num_groups: usize, group_size: usize, length: usize, seed: u64) -> (String, Vec<Vec<String>>) {
    assert!(group_size > 0);

    let mut rng = StdRng::seed_from_u64(seed);
    let planted = random_structure(length, 0.3, &mut rng);
    let position_distribution = Uniform::new(0, group_size);

    let groups: Vec<Vec<String>> = (0..num_groups)
        .map(|_g| {
            let planted_position = rng.sample(position_distribution);
            (0..group_size)
                .map(|i| {
                    if i == planted_position {
                        planted.clone()
                    } else {
                        random_structure(length, 0.3, &mut rng)
                    }
                })
                .collect()
        })
        .collect();

    (planted, groups)
}

/// Draws contiguous ranges with widths in [1, max_width]
fn random_ranges<R: Rng>(num_ranges: usize, max_width: usize, rng: &mut R) -> Vec<Range<usize>> {
    assert!(max_width > 0);
    let width_distribution = Uniform::new_inclusive(1, max_width);
    let mut start = 0;
    (0..num_ranges)
        .map(|_r| {
            let width = rng.sample(width_distribution);
            let range = start..(start + width);
            start += width;
            range
        })
        .collect()
}

/// Creates a random consensus instance with integer valued distances.
/// # Arguments
/// * `num_ranges` - the number of groups
/// * `max_width` - each group gets between 1 and this many candidates
/// * `max_distance` - distances are drawn uniformly from [0, max_distance]
/// * `seed` - the random seed
pub fn generate_random_problem(num_ranges: usize, max_width: usize, max_distance: u32, seed: u64) -> (DistanceMatrix, Vec<Range<usize>>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let ranges = random_ranges(num_ranges, max_width, &mut rng);
    let num_objects = ranges.last().map_or(0, |r| r.end);

    let distance_distribution = Uniform::new_inclusive(0, max_distance);
    let mut distances = DistanceMatrix::zeros(num_objects);
    for i in 0..num_objects {
        for j in (i + 1)..num_objects {
            distances.set_symmetric(i, j, rng.sample(distance_distribution) as f64);
        }
    }
    (distances, ranges)
}

/// Creates an instance with a single obvious optimum: one hub per range.
/// Hubs are 0 apart from each other, 1 away from every other object, and all other objects are 2 apart.
/// Returns the matrix, the ranges, and the hub of each range.
/// # Arguments
/// * `num_ranges` - the number of groups
/// * `width` - the number of candidates per group
/// * `seed` - the random seed
pub fn generate_planted_problem(num_ranges: usize, width: usize, seed: u64) -> (DistanceMatrix, Vec<Range<usize>>, Vec<usize>) {
    assert!(width > 0);
    let mut rng = StdRng::seed_from_u64(seed);
    let offset_distribution = Uniform::new(0, width);

    let ranges: Vec<Range<usize>> = (0..num_ranges)
        .map(|r| (r * width)..((r + 1) * width))
        .collect();
    let hubs: Vec<usize> = ranges.iter()
        .map(|r| r.start + rng.sample(offset_distribution))
        .collect();

    let num_objects = num_ranges * width;
    let mut is_hub = vec![false; num_objects];
    for &h in hubs.iter() {
        is_hub[h] = true;
    }

    let mut distances = DistanceMatrix::zeros(num_objects);
    for i in 0..num_objects {
        for j in (i + 1)..num_objects {
            let value = match (is_hub[i], is_hub[j]) {
                (true, true) => 0.0,
                (true, false) | (false, true) => 1.0,
                (false, false) => 2.0
            };
            distances.set_symmetric(i, j, value);
        }
    }
    (distances, ranges, hubs)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::tree::BracketAlphabet;

    #[test]
    fn test_generated_structures_are_valid() {
        for seed in 0..20 {
            let structure = generate_structure(60, 0.3, seed);
            assert_eq!(structure.len(), 60);
            assert!(BracketAlphabet::DOT_BRACKET.validate(&structure).is_ok(), "{structure}");
            // no hairpin shorter than the minimum
            assert!(!structure.contains("()"));
            assert!(!structure.contains("(.)"));
        }
        assert_eq!(generate_structure(60, 0.3, 4), generate_structure(60, 0.3, 4));
        assert_eq!(generate_structure(0, 0.3, 0), "");
    }

    #[test]
    fn test_generate_groups() {
        let (planted, groups) = generate_groups(4, 5, 40, 0);
        assert_eq!(groups.len(), 4);
        for group in groups.iter() {
            assert_eq!(group.len(), 5);
            assert!(group.contains(&planted));
        }
    }

    #[test]
    fn test_generate_random_problem() {
        let (distances, ranges) = generate_random_problem(5, 3, 10, 0);
        assert_eq!(ranges.len(), 5);
        assert_eq!(ranges[0].start, 0);
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
            assert!(!pair[1].is_empty());
        }
        assert_eq!(distances.len(), ranges[4].end);
        for i in 0..distances.len() {
            assert_eq!(distances.get(i, i), 0.0);
            for j in 0..distances.len() {
                assert_eq!(distances.get(i, j), distances.get(j, i));
                assert!(distances.get(i, j) <= 10.0);
            }
        }
    }

    #[test]
    fn test_generate_planted_problem() {
        let (distances, ranges, hubs) = generate_planted_problem(3, 4, 1);
        assert_eq!(ranges, vec![0..4, 4..8, 8..12]);
        for (hub, range) in hubs.iter().zip(ranges.iter()) {
            assert!(range.contains(hub));
        }
        assert_eq!(distances.get(hubs[0], hubs[2]), 0.0);
        let non_hub = (0..4).find(|i| *i != hubs[0]).unwrap();
        assert_eq!(distances.get(non_hub, hubs[1]), 1.0);
    }
}
