//! Core types for the learning session engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of words a learner picks before the exercises begin.
pub const REQUIRED_WORDS: usize = 5;

/// A catalog word projected onto one learning/native language pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    pub id: String,
    /// Surface form in the learning language.
    pub word: String,
    /// Gloss in the learner's native language.
    pub translation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pronunciation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_translation: Option<String>,
    pub category: String,
}

/// Word difficulty level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WordLevel {
    Beginner,
    Elementary,
    Intermediate,
    Advanced,
}

impl WordLevel {
    /// Get the level name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Elementary => "elementary",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "beginner" => Some(Self::Beginner),
            "elementary" => Some(Self::Elementary),
            "intermediate" => Some(Self::Intermediate),
            "advanced" => Some(Self::Advanced),
            _ => None,
        }
    }
}

/// One of the six exercise stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Exercise {
    Flashcard,
    Matching,
    Listening,
    Writing,
    ReverseTranslation,
    Pronunciation,
}

impl Exercise {
    /// Pipeline order.
    pub const ALL: [Exercise; 6] = [
        Exercise::Flashcard,
        Exercise::Matching,
        Exercise::Listening,
        Exercise::Writing,
        Exercise::ReverseTranslation,
        Exercise::Pronunciation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flashcard => "flashcard",
            Self::Matching => "matching",
            Self::Listening => "listening",
            Self::Writing => "writing",
            Self::ReverseTranslation => "reverseTranslation",
            Self::Pronunciation => "pronunciation",
        }
    }

    /// Whether the prompt is answered by picking one of several options.
    pub fn is_multiple_choice(&self) -> bool {
        matches!(
            self,
            Self::Flashcard | Self::Listening | Self::ReverseTranslation
        )
    }
}

/// Session phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    #[default]
    Selection,
    Flashcard,
    Matching,
    Listening,
    Writing,
    ReverseTranslation,
    Pronunciation,
    Complete,
}

impl Phase {
    /// The exercise played in this phase, if any.
    pub fn exercise(self) -> Option<Exercise> {
        match self {
            Self::Flashcard => Some(Exercise::Flashcard),
            Self::Matching => Some(Exercise::Matching),
            Self::Listening => Some(Exercise::Listening),
            Self::Writing => Some(Exercise::Writing),
            Self::ReverseTranslation => Some(Exercise::ReverseTranslation),
            Self::Pronunciation => Some(Exercise::Pronunciation),
            Self::Selection | Self::Complete => None,
        }
    }

    /// The phase that follows this one. `Complete` has no successor.
    pub fn next(self) -> Option<Phase> {
        match self {
            Self::Selection => Some(Self::Flashcard),
            Self::Flashcard => Some(Self::Matching),
            Self::Matching => Some(Self::Listening),
            Self::Listening => Some(Self::Writing),
            Self::Writing => Some(Self::ReverseTranslation),
            Self::ReverseTranslation => Some(Self::Pronunciation),
            Self::Pronunciation => Some(Self::Complete),
            Self::Complete => None,
        }
    }
}

impl From<Exercise> for Phase {
    fn from(exercise: Exercise) -> Self {
        match exercise {
            Exercise::Flashcard => Self::Flashcard,
            Exercise::Matching => Self::Matching,
            Exercise::Listening => Self::Listening,
            Exercise::Writing => Self::Writing,
            Exercise::ReverseTranslation => Self::ReverseTranslation,
            Exercise::Pronunciation => Self::Pronunciation,
        }
    }
}

/// Correct and skipped counts for one exercise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTally {
    pub correct: u32,
    pub skipped: u32,
}

/// Per-exercise tallies shown on the summary screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseResults {
    pub flashcard: PhaseTally,
    pub matching: PhaseTally,
    pub listening: PhaseTally,
    pub writing: PhaseTally,
    pub reverse_translation: PhaseTally,
    pub pronunciation: PhaseTally,
}

impl ExerciseResults {
    pub fn get(&self, exercise: Exercise) -> PhaseTally {
        match exercise {
            Exercise::Flashcard => self.flashcard,
            Exercise::Matching => self.matching,
            Exercise::Listening => self.listening,
            Exercise::Writing => self.writing,
            Exercise::ReverseTranslation => self.reverse_translation,
            Exercise::Pronunciation => self.pronunciation,
        }
    }

    pub fn get_mut(&mut self, exercise: Exercise) -> &mut PhaseTally {
        match exercise {
            Exercise::Flashcard => &mut self.flashcard,
            Exercise::Matching => &mut self.matching,
            Exercise::Listening => &mut self.listening,
            Exercise::Writing => &mut self.writing,
            Exercise::ReverseTranslation => &mut self.reverse_translation,
            Exercise::Pronunciation => &mut self.pronunciation,
        }
    }
}

/// Running score across every phase of a session pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionScore {
    pub correct: u32,
    pub total: u32,
    pub skipped: u32,
}

/// Which exercises a single word has passed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordResults {
    pub flashcard: bool,
    pub matching: bool,
    pub listening: bool,
    pub writing: bool,
    pub reverse_translation: bool,
    pub pronunciation: bool,
}

impl WordResults {
    pub fn get(&self, exercise: Exercise) -> bool {
        match exercise {
            Exercise::Flashcard => self.flashcard,
            Exercise::Matching => self.matching,
            Exercise::Listening => self.listening,
            Exercise::Writing => self.writing,
            Exercise::ReverseTranslation => self.reverse_translation,
            Exercise::Pronunciation => self.pronunciation,
        }
    }

    fn set(&mut self, exercise: Exercise) {
        match exercise {
            Exercise::Flashcard => self.flashcard = true,
            Exercise::Matching => self.matching = true,
            Exercise::Listening => self.listening = true,
            Exercise::Writing => self.writing = true,
            Exercise::ReverseTranslation => self.reverse_translation = true,
            Exercise::Pronunciation => self.pronunciation = true,
        }
    }

    /// A word is learned once every exercise has been passed.
    pub fn is_learned(&self) -> bool {
        Exercise::ALL.iter().all(|exercise| self.get(*exercise))
    }
}

/// Per-word, per-exercise pass flags for one session pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordResultMatrix {
    entries: BTreeMap<String, WordResults>,
}

impl WordResultMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `word_id` passed `exercise`. Flags are never cleared individually.
    pub fn mark_passed(&mut self, word_id: &str, exercise: Exercise) {
        self.entries
            .entry(word_id.to_string())
            .or_default()
            .set(exercise);
    }

    pub fn get(&self, word_id: &str) -> Option<&WordResults> {
        self.entries.get(word_id)
    }

    pub fn passed(&self, word_id: &str, exercise: Exercise) -> bool {
        self.get(word_id).map(|r| r.get(exercise)).unwrap_or(false)
    }

    pub fn is_learned(&self, word_id: &str) -> bool {
        self.get(word_id).map(WordResults::is_learned).unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Per-word detail returned by pronunciation scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordAssessment {
    pub word: String,
    pub accuracy_score: f64,
    pub error_type: String,
}

/// Result of a pronunciation assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PronunciationResult {
    pub accuracy_score: f64,
    pub fluency_score: f64,
    pub completeness_score: f64,
    pub pronunciation_score: f64,
    pub recognized_text: String,
    pub words: Vec<WordAssessment>,
}

impl PronunciationResult {
    /// Result used when nothing was recognised.
    pub fn empty() -> Self {
        Self {
            accuracy_score: 0.0,
            fluency_score: 0.0,
            completeness_score: 0.0,
            pronunciation_score: 0.0,
            recognized_text: String::new(),
            words: Vec::new(),
        }
    }
}

/// Identifies the category and language pair a session runs against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    pub category: String,
    pub learning_language: String,
    pub native_language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<WordLevel>,
}

/// Review history of one word, kept by the review scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnedWord {
    pub word_id: String,
    pub category: String,
    pub learned_at: DateTime<Utc>,
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub last_reviewed_at: DateTime<Utc>,
    pub next_review_at: DateTime<Utc>,
    /// 0-100.
    pub mastery: u32,
}

/// Aggregate review statistics for a category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStats {
    pub total_words: usize,
    pub learned_words: usize,
    pub mastered_words: usize,
    pub average_mastery: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_run_in_pipeline_order() {
        let mut phase = Phase::default();
        assert_eq!(phase, Phase::Selection);
        let mut seen = vec![phase];
        while let Some(next) = phase.next() {
            seen.push(next);
            phase = next;
        }
        assert_eq!(seen.len(), 8);
        assert_eq!(seen.last(), Some(&Phase::Complete));
        let exercises: Vec<_> = seen.iter().filter_map(|p| p.exercise()).collect();
        assert_eq!(exercises, Exercise::ALL.to_vec());
    }

    #[test]
    fn word_is_learned_only_with_all_six_flags() {
        let mut matrix = WordResultMatrix::new();
        for exercise in &Exercise::ALL[..5] {
            matrix.mark_passed("w1", *exercise);
        }
        assert!(!matrix.is_learned("w1"));
        matrix.mark_passed("w1", Exercise::Pronunciation);
        assert!(matrix.is_learned("w1"));
        assert!(!matrix.is_learned("missing"));
    }

    #[test]
    fn phase_serializes_camel_case() {
        let json = serde_json::to_string(&Phase::ReverseTranslation).unwrap();
        assert_eq!(json, "\"reverseTranslation\"");
    }

    #[test]
    fn level_round_trips_through_str() {
        for level in [
            WordLevel::Beginner,
            WordLevel::Elementary,
            WordLevel::Intermediate,
            WordLevel::Advanced,
        ] {
            assert_eq!(WordLevel::from_str(level.as_str()), Some(level));
        }
        assert_eq!(WordLevel::from_str("expert"), None);
    }
}
