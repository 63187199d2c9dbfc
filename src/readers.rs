
use log::debug;
use simple_error::bail;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Symbols that can start and make up a structure line
const STRUCTURE_SYMBOLS: [char; 3] = ['(', ')', '.'];

/// Parses grouped sub-optimal structures.
/// Lines starting with `>` open a new group.
/// Lines starting with `(`, `)`, or `.` are structures, and only their leading run of those symbols is kept so trailing energies or notes are dropped.
/// Everything else (sequence lines, blank lines) is ignored.
/// A header with no structures yields an empty group rather than being skipped, so the gap surfaces later as `ConsensusError::EmptyRange` instead of silently shifting group indices.
/// # Arguments
/// * `reader` - the buffered input
/// # Errors
/// * if reading fails
/// * if the input contains no groups at all
pub fn parse_grouped_structures<R: BufRead>(reader: R) -> Result<Vec<Vec<String>>, Box<dyn std::error::Error>> {
    let mut groups: Vec<Vec<String>> = vec![];
    for line in reader.lines() {
        let line = line?;
        if line.starts_with('>') {
            groups.push(vec![]);
        } else if line.starts_with(STRUCTURE_SYMBOLS) {
            let end = line.find(|c: char| !STRUCTURE_SYMBOLS.contains(&c))
                .unwrap_or(line.len());
            if groups.is_empty() {
                // structures before the first header still form a group
                groups.push(vec![]);
            }
            if let Some(current) = groups.last_mut() {
                current.push(line[..end].to_string());
            }
        }
    }

    if groups.is_empty() {
        bail!("No structure groups were found in the input");
    }
    debug!("Parsed {} structure groups", groups.len());
    Ok(groups)
}

/// Opens `path` and parses it with `parse_grouped_structures`.
/// # Errors
/// * if the file cannot be opened or parsed
pub fn read_grouped_structures(path: &Path) -> Result<Vec<Vec<String>>, Box<dyn std::error::Error>> {
    let file = File::open(path)?;
    parse_grouped_structures(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::consensus_problem::ConsensusProblem;
    use crate::error::ConsensusError;
    use std::path::PathBuf;

    #[test]
    fn test_read_fixture() {
        let groups = read_grouped_structures(&PathBuf::from("./tests/three_groups.marna")).unwrap();
        assert_eq!(groups, vec![
            vec!["((((...))))".to_string(), "((((....))))".to_string(), "......".to_string()],
            vec!["((((...))))".to_string(), "...(...)...".to_string()],
            vec!["((((...))))".to_string()]
        ]);
    }

    #[test]
    fn test_empty_header_block() {
        let text = ">a\nACGU\n(...) -1.0\n>b\nACGU\n>c\n.... 0.0\n";
        let groups = parse_grouped_structures(text.as_bytes()).unwrap();
        assert_eq!(groups, vec![
            vec!["(...)".to_string()],
            vec![],
            vec!["....".to_string()]
        ]);
    }

    #[test]
    fn test_empty_header_block_is_kept() {
        let text = ">a\n(...)\n>b\n>c\n(....)\n";
        let groups = parse_grouped_structures(text.as_bytes()).unwrap();
        assert_eq!(groups.len(), 3);
        let result = ConsensusProblem::new(groups, |_a: &String, _b: &String| Ok(1.0));
        assert_eq!(result.err(), Some(ConsensusError::EmptyRange(1)));
    }

    #[test]
    fn test_structures_without_header() {
        let text = "((...))\n\n>next\n(....)\n";
        let groups = parse_grouped_structures(text.as_bytes()).unwrap();
        assert_eq!(groups, vec![
            vec!["((...))".to_string()],
            vec!["(....)".to_string()]
        ]);
    }

    #[test]
    fn test_no_groups() {
        assert!(parse_grouped_structures("ACGU\n\n".as_bytes()).is_err());
        assert!(parse_grouped_structures("".as_bytes()).is_err());
        assert!(read_grouped_structures(&PathBuf::from("./tests/does_not_exist.marna")).is_err());
    }
}
