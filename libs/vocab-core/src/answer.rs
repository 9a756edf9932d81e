//! Answer comparison for typed and chosen answers.

use serde::{Deserialize, Serialize};

/// Result of comparing a typed answer to the expected word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrittenMatch {
    /// Whether the answer is considered correct.
    pub is_correct: bool,
    /// Normalized typed answer (for display).
    pub typed_normalized: String,
    /// Normalized expected answer (for display).
    pub expected_normalized: String,
}

/// Compare a typed answer: trimmed on both sides, case-insensitive, no fuzziness.
pub fn compare_written(typed: &str, expected: &str) -> WrittenMatch {
    let typed_normalized = normalize(typed);
    let expected_normalized = normalize(expected);

    WrittenMatch {
        is_correct: typed_normalized == expected_normalized,
        typed_normalized,
        expected_normalized,
    }
}

/// Multiple-choice options are compared verbatim.
pub fn compare_choice(chosen: &str, expected: &str) -> bool {
    chosen == expected
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive() {
        assert!(compare_written("Airport", "airport").is_correct);
        assert!(compare_written("FLUGHAFEN", "Flughafen").is_correct);
    }

    #[test]
    fn test_trims_both_sides() {
        let result = compare_written("  airport \n", " airport ");
        assert!(result.is_correct);
        assert_eq!(result.typed_normalized, "airport");
        assert_eq!(result.expected_normalized, "airport");
    }

    #[test]
    fn test_no_partial_credit() {
        assert!(!compare_written("airprot", "airport").is_correct);
        assert!(!compare_written("air port", "airport").is_correct);
        assert!(!compare_written("", "airport").is_correct);
    }

    #[test]
    fn test_non_ascii_case_folding() {
        assert!(compare_written("ÇAY", "çay").is_correct);
    }

    #[test]
    fn test_choice_is_verbatim() {
        assert!(compare_choice("bilet", "bilet"));
        assert!(!compare_choice("Bilet", "bilet"));
    }
}
