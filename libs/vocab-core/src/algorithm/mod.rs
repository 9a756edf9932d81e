//! Review scheduling for words that have left the session pipeline.

pub mod mastery;

use crate::types::LearnedWord;
use chrono::{DateTime, Utc};

/// Trait for review scheduling algorithms.
pub trait ReviewAlgorithm: Send + Sync {
    /// Algorithm identifier.
    fn name(&self) -> &'static str;

    /// Fold one review into a word's history. `previous` is `None` on first review.
    fn review(
        &self,
        previous: Option<&LearnedWord>,
        word_id: &str,
        category: &str,
        correct: bool,
        now: DateTime<Utc>,
    ) -> LearnedWord;
}

/// Get algorithm by name.
pub fn get_algorithm(name: &str) -> Option<Box<dyn ReviewAlgorithm>> {
    match name {
        "mastery" => Some(Box::new(mastery::Mastery::default())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looks_up_by_name() {
        assert_eq!(get_algorithm("mastery").map(|a| a.name()), Some("mastery"));
        assert!(get_algorithm("sm2").is_none());
    }
}
