//! Display-name similarity for cross-source identity matching
//!
//! Names are scored with the Indel ratio: twice the longest common
//! subsequence over the summed lengths, on a 0-100 scale.

/// Minimum score (0-100) for two names to count as the same person
pub const NAME_MATCH_THRESHOLD: f64 = 85.0;

/// Case-insensitive Indel similarity on a 0-100 scale
pub fn name_similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    200.0 * longest_common_subsequence(&a, &b) as f64 / total as f64
}

/// Whether two names clear [`NAME_MATCH_THRESHOLD`]; a score exactly at the
/// threshold matches
pub fn names_match(a: &str, b: &str) -> bool {
    name_similarity(a, b) >= NAME_MATCH_THRESHOLD
}

fn longest_common_subsequence(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut row = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            row[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                row[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut row);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn middle_initial_matches() {
        assert!(names_match("Alice M Johnson", "Alice Johnson"));
        assert_eq!(name_similarity("Bob Smith", "Bob J Smith"), 90.0);
        assert!(names_match("Bob Smith", "Bob J Smith"));
    }

    #[test]
    fn score_exactly_at_threshold_matches() {
        // 17 shared characters out of 20 + 20
        let score = name_similarity("abcdefghijklmnopqrst", "abcdefghijklmnopqxyz");
        assert_eq!(score, NAME_MATCH_THRESHOLD);
        assert!(names_match("abcdefghijklmnopqrst", "abcdefghijklmnopqxyz"));
    }

    #[test]
    fn abbreviated_first_name_stays_apart() {
        // "a. johnson" keeps only "a" and " johnson" in order
        let score = name_similarity("A. Johnson", "Alice Johnson");
        assert!((score - 1800.0 / 23.0).abs() < 1e-9);
        assert!(!names_match("A. Johnson", "Alice Johnson"));
    }

    #[test]
    fn different_names_do_not_match() {
        assert!(!names_match("Alice", "Bob"));
        assert_eq!(name_similarity("Alice", "Bob"), 0.0);
    }

    #[test]
    fn case_is_ignored() {
        assert_eq!(name_similarity("ALICE JOHNSON", "alice johnson"), 100.0);
    }

    #[test]
    fn empty_names() {
        assert_eq!(name_similarity("", ""), 100.0);
        assert_eq!(name_similarity("", "Alice"), 0.0);
    }

    #[test]
    fn first_name_alone_is_too_far() {
        assert!(!names_match("Alice", "Alice Johnson"));
    }
}
