//! End-of-session summary and persistence.

use crate::progress::{local_today, ProgressStore};
use crate::store::KeyValueStore;
use crate::types::{
    ExerciseResults, SessionContext, SessionScore, Word, WordResultMatrix,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Encouragement tier shown on the summary screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Motivation {
    Excellent,
    Great,
    Good,
    KeepTrying,
}

impl Motivation {
    pub fn for_counts(learned: usize, total: usize) -> Self {
        if learned == total {
            Self::Excellent
        } else if learned >= 3 {
            Self::Great
        } else if learned >= 1 {
            Self::Good
        } else {
            Self::KeepTrying
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Great => "great",
            Self::Good => "good",
            Self::KeepTrying => "keepTrying",
        }
    }
}

/// Outcome of one pass through the exercise pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub context: SessionContext,
    /// Selected words that passed all six exercises, in selection order.
    pub learned: Vec<Word>,
    pub needs_practice: Vec<Word>,
    pub results: ExerciseResults,
    pub score: SessionScore,
    pub motivation: Motivation,
}

impl SessionSummary {
    pub fn learned_ids(&self) -> Vec<String> {
        self.learned.iter().map(|w| w.id.clone()).collect()
    }
}

pub struct SessionSummarizer;

impl SessionSummarizer {
    /// Split the selected words into learned and needs-practice.
    pub fn summarize(
        context: &SessionContext,
        selected: &[Word],
        matrix: &WordResultMatrix,
        results: &ExerciseResults,
        score: SessionScore,
    ) -> SessionSummary {
        let (learned, needs_practice): (Vec<Word>, Vec<Word>) = selected
            .iter()
            .cloned()
            .partition(|w| matrix.is_learned(&w.id));

        let motivation = Motivation::for_counts(learned.len(), selected.len());

        SessionSummary {
            context: context.clone(),
            learned,
            needs_practice,
            results: results.clone(),
            score,
            motivation,
        }
    }

    /// Save learned words with stats. Nothing is written when no word was learned.
    pub fn persist<S: KeyValueStore>(summary: &SessionSummary, progress: &ProgressStore<S>) {
        Self::persist_on(summary, progress, local_today());
    }

    pub fn persist_on<S: KeyValueStore>(
        summary: &SessionSummary,
        progress: &ProgressStore<S>,
        today: NaiveDate,
    ) {
        if summary.learned.is_empty() {
            tracing::info!(category = %summary.context.category, "session finished with no learned words");
            return;
        }

        progress.mark_mastered_on(
            &summary.context.learning_language,
            &summary.context.category,
            &summary.learned_ids(),
            true,
            today,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::Exercise;
    use pretty_assertions::assert_eq;

    fn context() -> SessionContext {
        SessionContext {
            category: "food".into(),
            learning_language: "tr".into(),
            native_language: "en".into(),
            level: None,
        }
    }

    fn words() -> Vec<Word> {
        (0..5)
            .map(|i| Word {
                id: format!("w{i}"),
                word: format!("kelime{i}"),
                translation: format!("word{i}"),
                pronunciation: None,
                example: None,
                example_translation: None,
                category: "food".into(),
            })
            .collect()
    }

    fn matrix_with_learned(ids: &[&str]) -> WordResultMatrix {
        let mut matrix = WordResultMatrix::new();
        for id in ids {
            for exercise in Exercise::ALL {
                matrix.mark_passed(id, exercise);
            }
        }
        matrix
    }

    #[test]
    fn splits_learned_from_needs_practice() {
        let mut matrix = matrix_with_learned(&["w0", "w3"]);
        matrix.mark_passed("w1", Exercise::Flashcard);

        let summary = SessionSummarizer::summarize(
            &context(),
            &words(),
            &matrix,
            &ExerciseResults::default(),
            SessionScore::default(),
        );

        assert_eq!(summary.learned_ids(), vec!["w0".to_string(), "w3".to_string()]);
        let practice: Vec<_> = summary.needs_practice.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(practice, vec!["w1", "w2", "w4"]);
        assert_eq!(summary.motivation, Motivation::Good);
    }

    #[test]
    fn motivation_tiers() {
        assert_eq!(Motivation::for_counts(5, 5), Motivation::Excellent);
        assert_eq!(Motivation::for_counts(3, 5), Motivation::Great);
        assert_eq!(Motivation::for_counts(1, 5), Motivation::Good);
        assert_eq!(Motivation::for_counts(0, 5), Motivation::KeepTrying);
    }

    #[test]
    fn persist_counts_learned_words() {
        let progress = ProgressStore::new(MemoryStore::new());
        let today = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
        let summary = SessionSummarizer::summarize(
            &context(),
            &words(),
            &matrix_with_learned(&["w0", "w1"]),
            &ExerciseResults::default(),
            SessionScore::default(),
        );

        SessionSummarizer::persist_on(&summary, &progress, today);

        assert_eq!(progress.mastered_words("tr", "food"), summary.learned_ids());
        assert_eq!(progress.words_learned_on("tr", today), 2);
        assert_eq!(progress.streak("tr").streak, 1);
    }

    #[test]
    fn persist_skips_empty_sessions() {
        let progress = ProgressStore::new(MemoryStore::new());
        let today = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
        let summary = SessionSummarizer::summarize(
            &context(),
            &words(),
            &WordResultMatrix::new(),
            &ExerciseResults::default(),
            SessionScore::default(),
        );

        SessionSummarizer::persist_on(&summary, &progress, today);

        assert!(progress.store().is_empty());
        assert_eq!(summary.motivation, Motivation::KeepTrying);
    }
}
