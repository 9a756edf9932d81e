//! Exercise engine: option generation, answer checking and skip bookkeeping.

use crate::answer::{compare_choice, compare_written};
use crate::types::{
    Exercise, ExerciseResults, PronunciationResult, SessionScore, Word, WordResultMatrix,
};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Maximum number of wrong options shown next to the correct one.
pub const MAX_DISTRACTORS: usize = 3;

/// Default pronunciation score needed to pass.
pub const PRONUNCIATION_PASS_MARK: f64 = 60.0;

/// A learner's answer to the current prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    /// Picked option text (flashcard, listening, reverse translation).
    Choice(String),
    /// Free text (writing).
    Text(String),
    /// Translation tile the word tile was matched against.
    Match { translation_id: String },
    /// Outcome of pronunciation scoring; `None` when scoring failed or was unavailable.
    Pronunciation(Option<PronunciationResult>),
}

/// Outcome of a checked answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerCheck {
    pub correct: bool,
}

/// Feedback band for a pronunciation score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PronunciationFeedback {
    Excellent,
    Great,
    Good,
    NeedsWork,
    TryAgain,
}

/// Map a 0-100 pronunciation score to a feedback band.
pub fn pronunciation_feedback(score: f64) -> PronunciationFeedback {
    if score >= 90.0 {
        PronunciationFeedback::Excellent
    } else if score >= 75.0 {
        PronunciationFeedback::Great
    } else if score >= 60.0 {
        PronunciationFeedback::Good
    } else if score >= 40.0 {
        PronunciationFeedback::NeedsWork
    } else {
        PronunciationFeedback::TryAgain
    }
}

/// Text a word is shown as when it is the answer to `exercise`.
fn answer_text(exercise: Exercise, word: &Word) -> &str {
    match exercise {
        Exercise::ReverseTranslation => &word.translation,
        _ => &word.word,
    }
}

/// Scores answers for one session pass.
#[derive(Debug, Clone)]
pub struct ExerciseEngine {
    results: ExerciseResults,
    matrix: WordResultMatrix,
    score: SessionScore,
    pass_mark: f64,
}

impl Default for ExerciseEngine {
    fn default() -> Self {
        Self::new(PRONUNCIATION_PASS_MARK)
    }
}

impl ExerciseEngine {
    pub fn new(pass_mark: f64) -> Self {
        Self {
            results: ExerciseResults::default(),
            matrix: WordResultMatrix::new(),
            score: SessionScore::default(),
            pass_mark,
        }
    }

    /// Build the option list for a multiple-choice prompt.
    ///
    /// Up to [`MAX_DISTRACTORS`] other words from `pool` are sampled without
    /// replacement, combined with the correct answer and shuffled. Texts equal
    /// to the correct answer, or already offered, are never used twice.
    pub fn generate_options<R: Rng + ?Sized>(
        exercise: Exercise,
        correct: &Word,
        pool: &[Word],
        rng: &mut R,
    ) -> Vec<String> {
        let answer = answer_text(exercise, correct);

        let mut others: Vec<&Word> = pool.iter().filter(|w| w.id != correct.id).collect();
        others.shuffle(rng);

        let mut options = vec![answer.to_string()];
        for word in others {
            if options.len() > MAX_DISTRACTORS {
                break;
            }
            let text = answer_text(exercise, word);
            if !options.iter().any(|o| o == text) {
                options.push(text.to_string());
            }
        }

        options.shuffle(rng);
        options
    }

    /// Check an answer for `word` and record the attempt.
    pub fn check_answer(&mut self, exercise: Exercise, word: &Word, answer: &Answer) -> AnswerCheck {
        let correct = match (exercise, answer) {
            (Exercise::Flashcard | Exercise::Listening | Exercise::ReverseTranslation, Answer::Choice(chosen)) => {
                compare_choice(chosen, answer_text(exercise, word))
            }
            (Exercise::Writing, Answer::Text(typed)) => compare_written(typed, &word.word).is_correct,
            (Exercise::Matching, Answer::Match { translation_id }) => *translation_id == word.id,
            (Exercise::Pronunciation, Answer::Pronunciation(result)) => result
                .as_ref()
                .map_or(false, |r| r.pronunciation_score >= self.pass_mark),
            _ => {
                tracing::debug!(exercise = exercise.as_str(), ?answer, "answer kind does not fit exercise");
                false
            }
        };

        self.score.total += 1;
        if correct {
            self.score.correct += 1;
            self.results.get_mut(exercise).correct += 1;
            self.matrix.mark_passed(&word.id, exercise);
        }

        AnswerCheck { correct }
    }

    /// Count a skipped prompt. Never marks the word as passed.
    pub fn record_skip(&mut self, exercise: Exercise, word_id: &str) {
        self.results.get_mut(exercise).skipped += 1;
        self.score.skipped += 1;
        tracing::debug!(exercise = exercise.as_str(), word_id, "prompt skipped");
    }

    pub fn results(&self) -> &ExerciseResults {
        &self.results
    }

    pub fn matrix(&self) -> &WordResultMatrix {
        &self.matrix
    }

    pub fn score(&self) -> SessionScore {
        self.score
    }

    pub fn pass_mark(&self) -> f64 {
        self.pass_mark
    }

    /// Forget everything recorded in this pass.
    pub fn reset(&mut self) {
        self.results = ExerciseResults::default();
        self.matrix.clear();
        self.score = SessionScore::default();
    }
}

/// A word tile and a translation tile that were matched wrongly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrongMatch {
    pub translation_id: String,
    pub word_id: String,
    /// Distinguishes successive wrong attempts so a late reset cannot clear a newer one.
    pub attempt: u32,
}

/// Outcome of tapping a word tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    Ignored,
    Correct { word_id: String, board_complete: bool },
    Wrong(WrongMatch),
}

/// State of the matching exercise.
#[derive(Debug, Clone)]
pub struct MatchingBoard {
    translations: Vec<Word>,
    words: Vec<Word>,
    selected_translation: Option<String>,
    matched: Vec<String>,
    wrong: Option<WrongMatch>,
    attempts: u32,
}

impl MatchingBoard {
    /// Lay out two independently shuffled columns.
    pub fn new<R: Rng + ?Sized>(words: &[Word], rng: &mut R) -> Self {
        let mut translations = words.to_vec();
        let mut word_tiles = words.to_vec();
        translations.shuffle(rng);
        word_tiles.shuffle(rng);
        Self {
            translations,
            words: word_tiles,
            selected_translation: None,
            matched: Vec::new(),
            wrong: None,
            attempts: 0,
        }
    }

    pub fn translations(&self) -> &[Word] {
        &self.translations
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn selected_translation(&self) -> Option<&str> {
        self.selected_translation.as_deref()
    }

    pub fn matched(&self) -> &[String] {
        &self.matched
    }

    pub fn wrong(&self) -> Option<&WrongMatch> {
        self.wrong.as_ref()
    }

    pub fn is_matched(&self, word_id: &str) -> bool {
        self.matched.iter().any(|id| id == word_id)
    }

    pub fn is_complete(&self) -> bool {
        self.matched.len() >= self.words.len()
    }

    /// Word IDs not yet matched, in word-column order.
    pub fn unmatched(&self) -> Vec<String> {
        self.words
            .iter()
            .filter(|w| !self.is_matched(&w.id))
            .map(|w| w.id.clone())
            .collect()
    }

    /// Select a translation tile. Returns false if the tile is unknown or locked.
    pub fn select_translation(&mut self, word_id: &str) -> bool {
        if self.is_matched(word_id) || !self.translations.iter().any(|w| w.id == word_id) {
            return false;
        }
        self.selected_translation = Some(word_id.to_string());
        self.wrong = None;
        true
    }

    /// Tap a word tile against the selected translation.
    pub fn select_word(&mut self, word_id: &str) -> MatchOutcome {
        if self.is_matched(word_id) || self.wrong.is_some() {
            return MatchOutcome::Ignored;
        }
        let Some(translation_id) = self.selected_translation.clone() else {
            return MatchOutcome::Ignored;
        };

        if translation_id == word_id {
            self.matched.push(word_id.to_string());
            self.selected_translation = None;
            MatchOutcome::Correct {
                word_id: word_id.to_string(),
                board_complete: self.is_complete(),
            }
        } else {
            self.attempts += 1;
            let wrong = WrongMatch {
                translation_id,
                word_id: word_id.to_string(),
                attempt: self.attempts,
            };
            self.wrong = Some(wrong.clone());
            MatchOutcome::Wrong(wrong)
        }
    }

    /// Clear the wrong flag and selection if `attempt` is still the latest one.
    pub fn clear_wrong(&mut self, attempt: u32) -> bool {
        match &self.wrong {
            Some(wrong) if wrong.attempt == attempt => {
                self.wrong = None;
                self.selected_translation = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    fn word(i: usize) -> Word {
        Word {
            id: format!("w{i}"),
            word: format!("word{i}"),
            translation: format!("translation{i}"),
            pronunciation: None,
            example: None,
            example_translation: None,
            category: "food".into(),
        }
    }

    fn words(n: usize) -> Vec<Word> {
        (0..n).map(word).collect()
    }

    fn pronunciation(score: f64) -> Answer {
        Answer::Pronunciation(Some(PronunciationResult {
            pronunciation_score: score,
            ..PronunciationResult::empty()
        }))
    }

    #[test]
    fn five_words_give_four_distinct_options_with_answer_once() {
        let pool = words(5);
        for seed in 0..50 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            for exercise in [Exercise::Flashcard, Exercise::Listening, Exercise::ReverseTranslation] {
                let options = ExerciseEngine::generate_options(exercise, &pool[2], &pool, &mut rng);
                assert_eq!(options.len(), 4);
                let expected = answer_text(exercise, &pool[2]);
                assert_eq!(options.iter().filter(|o| o.as_str() == expected).count(), 1);
                let unique: HashSet<_> = options.iter().collect();
                assert_eq!(unique.len(), 4);
            }
        }
    }

    #[test]
    fn reverse_translation_offers_translations() {
        let pool = words(5);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let options =
            ExerciseEngine::generate_options(Exercise::ReverseTranslation, &pool[0], &pool, &mut rng);
        assert!(options.iter().all(|o| o.starts_with("translation")));
    }

    #[test]
    fn small_pool_degrades_option_count() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for n in 1..=4 {
            let pool = words(n);
            let options = ExerciseEngine::generate_options(Exercise::Flashcard, &pool[0], &pool, &mut rng);
            assert_eq!(options.len(), n.min(4));
        }
    }

    #[test]
    fn duplicate_surface_forms_are_not_offered_twice() {
        let mut pool = words(5);
        pool[3].word = pool[0].word.clone();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let options = ExerciseEngine::generate_options(Exercise::Flashcard, &pool[0], &pool, &mut rng);
        let unique: HashSet<_> = options.iter().collect();
        assert_eq!(unique.len(), options.len());
        assert_eq!(options.len(), 4);
    }

    #[test]
    fn correct_choice_marks_matrix_and_tallies() {
        let mut engine = ExerciseEngine::default();
        let w = word(1);
        let check = engine.check_answer(Exercise::Flashcard, &w, &Answer::Choice("word1".into()));
        assert!(check.correct);
        assert!(engine.matrix().passed("w1", Exercise::Flashcard));
        assert_eq!(engine.results().flashcard.correct, 1);
        assert_eq!(engine.score(), SessionScore { correct: 1, total: 1, skipped: 0 });
    }

    #[test]
    fn wrong_choice_only_counts_total() {
        let mut engine = ExerciseEngine::default();
        let check = engine.check_answer(Exercise::Listening, &word(1), &Answer::Choice("word2".into()));
        assert!(!check.correct);
        assert!(engine.matrix().is_empty());
        assert_eq!(engine.score(), SessionScore { correct: 0, total: 1, skipped: 0 });
    }

    #[test]
    fn writing_is_trimmed_and_case_insensitive() {
        let mut engine = ExerciseEngine::default();
        let check = engine.check_answer(Exercise::Writing, &word(4), &Answer::Text("  WORD4 ".into()));
        assert!(check.correct);
    }

    #[test]
    fn pronunciation_pass_mark_is_inclusive() {
        let mut engine = ExerciseEngine::default();
        assert!(engine.check_answer(Exercise::Pronunciation, &word(1), &pronunciation(60.0)).correct);
        assert!(!engine.check_answer(Exercise::Pronunciation, &word(2), &pronunciation(59.9)).correct);
        assert!(!engine.check_answer(Exercise::Pronunciation, &word(3), &Answer::Pronunciation(None)).correct);
        assert_eq!(engine.score().total, 3);
    }

    #[test]
    fn mismatched_answer_kind_is_incorrect() {
        let mut engine = ExerciseEngine::default();
        let check = engine.check_answer(Exercise::Writing, &word(1), &Answer::Choice("word1".into()));
        assert!(!check.correct);
    }

    #[test]
    fn skip_never_sets_a_flag() {
        let mut engine = ExerciseEngine::default();
        for exercise in Exercise::ALL {
            engine.record_skip(exercise, "w1");
        }
        assert!(engine.matrix().get("w1").is_none());
        assert_eq!(engine.score().skipped, 6);
        assert_eq!(engine.results().writing.skipped, 1);
    }

    #[test]
    fn reset_clears_everything() {
        let mut engine = ExerciseEngine::default();
        engine.check_answer(Exercise::Flashcard, &word(1), &Answer::Choice("word1".into()));
        engine.record_skip(Exercise::Matching, "w2");
        engine.reset();
        assert!(engine.matrix().is_empty());
        assert_eq!(engine.results(), &ExerciseResults::default());
        assert_eq!(engine.score(), SessionScore::default());
    }

    #[test]
    fn feedback_bands() {
        assert_eq!(pronunciation_feedback(95.0), PronunciationFeedback::Excellent);
        assert_eq!(pronunciation_feedback(75.0), PronunciationFeedback::Great);
        assert_eq!(pronunciation_feedback(60.0), PronunciationFeedback::Good);
        assert_eq!(pronunciation_feedback(40.0), PronunciationFeedback::NeedsWork);
        assert_eq!(pronunciation_feedback(10.0), PronunciationFeedback::TryAgain);
    }

    #[test]
    fn board_matches_and_completes() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut board = MatchingBoard::new(&words(2), &mut rng);
        assert_eq!(board.select_word("w0"), MatchOutcome::Ignored);

        assert!(board.select_translation("w0"));
        assert_eq!(
            board.select_word("w0"),
            MatchOutcome::Correct { word_id: "w0".into(), board_complete: false }
        );
        assert!(!board.select_translation("w0"));

        board.select_translation("w1");
        assert_eq!(
            board.select_word("w1"),
            MatchOutcome::Correct { word_id: "w1".into(), board_complete: true }
        );
        assert!(board.unmatched().is_empty());
    }

    #[test]
    fn wrong_match_blocks_until_cleared() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut board = MatchingBoard::new(&words(3), &mut rng);
        board.select_translation("w0");
        let MatchOutcome::Wrong(wrong) = board.select_word("w1") else {
            panic!("expected wrong match");
        };
        assert_eq!(board.select_word("w0"), MatchOutcome::Ignored);
        assert!(board.clear_wrong(wrong.attempt));
        assert!(board.selected_translation().is_none());
        assert!(board.wrong().is_none());
    }

    #[test]
    fn stale_clear_does_not_touch_newer_attempt() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut board = MatchingBoard::new(&words(3), &mut rng);
        board.select_translation("w0");
        let MatchOutcome::Wrong(first) = board.select_word("w1") else {
            panic!("expected wrong match");
        };
        board.select_translation("w2");
        let MatchOutcome::Wrong(second) = board.select_word("w0") else {
            panic!("expected wrong match");
        };
        assert!(!board.clear_wrong(first.attempt));
        assert_eq!(board.wrong(), Some(&second));
        assert!(board.clear_wrong(second.attempt));
    }
}
