//! Accuracy-based mastery with fixed review steps.
//!
//! Mastery blends answer accuracy (up to 50 points) with review volume
//! (5 points per review, capped at 50). The next review is pushed further
//! out as mastery grows.

use super::ReviewAlgorithm;
use crate::types::LearnedWord;
use chrono::{DateTime, Duration, Utc};

/// Mastery assigned after a word's first review.
pub const FIRST_REVIEW_MASTERY: u32 = 20;

/// Mastery-based scheduler with configurable steps.
#[derive(Debug, Clone)]
pub struct Mastery {
    /// `(minimum mastery, days until next review)`, highest threshold first.
    pub steps: Vec<(u32, i64)>,
    /// Days until next review below every threshold.
    pub fallback_days: i64,
}

impl Default for Mastery {
    fn default() -> Self {
        Self {
            steps: vec![(90, 30), (70, 14), (50, 7), (30, 3)],
            fallback_days: 1,
        }
    }
}

/// Mastery score (0-100) for a review history.
pub fn mastery(correct: u32, incorrect: u32) -> u32 {
    let total = correct + incorrect;
    if total == 0 {
        return 0;
    }
    let accuracy = f64::from(correct) / f64::from(total);
    let volume = (f64::from(total) * 5.0).min(50.0);
    ((accuracy * 50.0 + volume).round() as u32).min(100)
}

impl Mastery {
    /// Days until the next review at `mastery`.
    pub fn interval_days(&self, mastery: u32) -> i64 {
        self.steps
            .iter()
            .find(|(threshold, _)| mastery >= *threshold)
            .map_or(self.fallback_days, |(_, days)| *days)
    }
}

impl ReviewAlgorithm for Mastery {
    fn name(&self) -> &'static str {
        "mastery"
    }

    fn review(
        &self,
        previous: Option<&LearnedWord>,
        word_id: &str,
        category: &str,
        correct: bool,
        now: DateTime<Utc>,
    ) -> LearnedWord {
        match previous {
            Some(prev) => {
                let mut word = prev.clone();
                if correct {
                    word.correct_count += 1;
                } else {
                    word.incorrect_count += 1;
                }
                word.last_reviewed_at = now;
                word.mastery = mastery(word.correct_count, word.incorrect_count);
                word.next_review_at = now + Duration::days(self.interval_days(word.mastery));
                word
            }
            None => {
                let score = if correct { FIRST_REVIEW_MASTERY } else { 0 };
                LearnedWord {
                    word_id: word_id.to_string(),
                    category: category.to_string(),
                    learned_at: now,
                    correct_count: u32::from(correct),
                    incorrect_count: u32::from(!correct),
                    last_reviewed_at: now,
                    next_review_at: now + Duration::days(self.interval_days(score)),
                    mastery: score,
                }
            }
        }
    }
}
