
use std::cmp::max;

/// Returns the Levenshtein distance (unit cost insert, delete, and mismatch) between two byte slices.
/// Uses a wavefront expansion, so the runtime scales with the distance instead of the product of the lengths.
/// # Arguments
/// * `v1` - the first slice
/// * `v2` - the second slice
/// # Examples
/// ```rust
/// use subopt_con::string_distance::levenshtein;
/// assert_eq!(levenshtein(b"kitten", b"sitting"), 3);
/// assert_eq!(levenshtein(b"((..))", b"(....)"), 2);
/// assert_eq!(levenshtein(b"", b"..."), 3);
/// ```
pub fn levenshtein(v1: &[u8], v2: &[u8]) -> usize {
    let l1 = v1.len();
    let l2 = v2.len();

    // furthest i reached on each diagonal of the current wave; wave e holds the 2e+1 diagonals k = j - i in [-e, e]
    let mut curr_wave: Vec<Option<usize>> = vec![Some(0)];
    let mut edits = 0;

    loop {
        let mut next_wave: Vec<Option<usize>> = vec![None; curr_wave.len() + 2];
        for (diagonal, &reached) in curr_wave.iter().enumerate() {
            let Some(mut i) = reached else {
                continue;
            };
            let k = diagonal as isize - edits as isize;
            let mut j = (i as isize + k) as usize;

            // free moves along matching symbols
            while i < l1 && j < l2 && v1[i] == v2[j] {
                i += 1;
                j += 1;
            }

            if i == l1 && j == l2 {
                return edits;
            }

            // deletion moves to diagonal k-1, mismatch stays on k, insertion moves to k+1
            if i < l1 {
                next_wave[diagonal] = max(next_wave[diagonal], Some(i + 1));
            }
            if i < l1 && j < l2 {
                next_wave[diagonal + 1] = max(next_wave[diagonal + 1], Some(i + 1));
            }
            if j < l2 {
                next_wave[diagonal + 2] = max(next_wave[diagonal + 2], Some(i));
            }
        }

        edits += 1;
        curr_wave = next_wave;
    }
}

/// Levenshtein distance between two structure strings, as a float for use in compound distances.
/// # Examples
/// ```rust
/// use subopt_con::string_distance::string_ed;
/// assert_eq!(string_ed("((...))", "((...))"), 0.0);
/// assert_eq!(string_ed("((...))", "(.....)"), 2.0);
/// ```
pub fn string_ed(s1: &str, s2: &str) -> f64 {
    levenshtein(s1.as_bytes(), s2.as_bytes()) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Textbook quadratic version to compare against
    fn dp_levenshtein(v1: &[u8], v2: &[u8]) -> usize {
        let mut previous: Vec<usize> = (0..=v2.len()).collect();
        for (i, &c1) in v1.iter().enumerate() {
            let mut current = vec![i + 1; v2.len() + 1];
            for (j, &c2) in v2.iter().enumerate() {
                let mismatch = previous[j] + usize::from(c1 != c2);
                current[j + 1] = mismatch.min(previous[j + 1] + 1).min(current[j] + 1);
            }
            previous = current;
        }
        previous[v2.len()]
    }

    #[test]
    fn test_basic_distances() {
        assert_eq!(levenshtein(b"", b""), 0);
        assert_eq!(levenshtein(b"abc", b""), 3);
        assert_eq!(levenshtein(b"", b"abc"), 3);
        assert_eq!(levenshtein(b"kitten", b"sitting"), 3);
        assert_eq!(levenshtein(b"flaw", b"lawn"), 2);
        assert_eq!(levenshtein(b"((((...))))", b"((((...))))"), 0);
    }

    #[test]
    fn test_matches_dynamic_programming() {
        let structures: [&[u8]; 8] = [
            b"",
            b".",
            b"(.)",
            b"((..))",
            b"(....)",
            b"..((((...))))...((...))..",
            b"((..((...))..((...))..))",
            b")))(((",
        ];
        for s1 in structures.iter() {
            for s2 in structures.iter() {
                assert_eq!(levenshtein(s1, s2), dp_levenshtein(s1, s2), "{s1:?} {s2:?}");
            }
        }
    }

    #[test]
    fn test_string_ed() {
        assert_eq!(string_ed("((..))", "(....)"), 2.0);
        assert_eq!(string_ed("(....)", "((..))"), 2.0);
    }
}
