//! Session state machine.
//!
//! [`SessionController`] owns every piece of session state. The host feeds
//! it [`Event`]s (learner input, timer expiries and collaborator
//! completions) and executes the [`Effect`]s it returns. Events that make
//! no sense in the current state are ignored and logged at `debug`.
//!
//! Phase order:
//! `selection → flashcard → matching → listening → writing → reverseTranslation → pronunciation → complete`

use crate::curator::{CurationSignal, SwipeDirection, WordCurator};
use crate::exercise::{
    pronunciation_feedback, Answer, ExerciseEngine, MatchOutcome, MatchingBoard,
    PronunciationFeedback, PRONUNCIATION_PASS_MARK,
};
use crate::scheduler::{ManualScheduler, Scheduler, Timer, Timings};
use crate::summary::{SessionSummarizer, SessionSummary};
use crate::types::{
    Exercise, ExerciseResults, Phase, PronunciationResult, SessionContext, SessionScore, Word,
    WordResultMatrix, REQUIRED_WORDS,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for one session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    pub required_words: usize,
    pub timings: Timings,
    pub pass_mark: f64,
    /// Whether recorded audio is sent for pronunciation scoring.
    pub scoring_enabled: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            required_words: REQUIRED_WORDS,
            timings: Timings::default(),
            pass_mark: PRONUNCIATION_PASS_MARK,
            scoring_enabled: true,
        }
    }
}

/// Input to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Right swipe: "I already know this".
    KnowWord,
    /// Left swipe: "I want to learn this".
    LearnWord,
    SelectOption(String),
    SelectTranslation(String),
    SelectWord(String),
    SubmitWriting(String),
    StartRecording,
    StopRecording,
    /// The recorder handed over the audio for `attempt`.
    RecordingStopped { attempt: u32, audio_uri: String },
    RecordingFailed { attempt: u32 },
    AnalysisResolved {
        word_id: String,
        result: Option<PronunciationResult>,
    },
    RetryPronunciation,
    Next,
    Skip,
    ReviewAgain,
    Speak(String),
    SpeechFinished,
    ConnectivityChanged(bool),
    TimerFired(Timer),
}

/// Work the host must carry out.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Persist a word the learner already knows, without touching stats.
    MarkKnown { word_id: String },
    /// The pipeline reached `complete`.
    SessionCompleted(SessionSummary),
    Speak { text: String, language: String },
    /// Open the microphone; replies must carry the same `attempt`.
    StartRecording { attempt: u32 },
    StopRecording { attempt: u32 },
    AssessPronunciation {
        word_id: String,
        audio_uri: String,
        reference_text: String,
        language: String,
    },
}

/// Microphone state for the pronunciation prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecorderState {
    #[default]
    Idle,
    Recording,
    /// Stop requested; waiting for the recorder to hand over the audio.
    Stopping,
}

/// Transient state of the current prompt, reset on every word and phase change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromptState {
    pub options: Vec<String>,
    pub chosen: Option<String>,
    pub typed: Option<String>,
    pub correct: Option<bool>,
    pub recorder: RecorderState,
    /// Attempt tag of the recording started on this prompt.
    pub recording: Option<u32>,
    pub has_recorded: bool,
    pub audio_uri: Option<String>,
    pub analyzing: bool,
    pub pronunciation: Option<PronunciationResult>,
}

/// Drives one learning session from selection to summary.
pub struct SessionController<S: Scheduler> {
    config: SessionConfig,
    context: SessionContext,
    scheduler: S,
    rng: StdRng,
    curator: WordCurator,
    engine: ExerciseEngine,
    phase: Phase,
    current_index: usize,
    prompt: PromptState,
    board: Option<MatchingBoard>,
    skip_locked: bool,
    connected: bool,
    speaking: bool,
    recording_attempt: u32,
    summary: Option<SessionSummary>,
}

impl<S: Scheduler> SessionController<S> {
    /// Start a session over `words`, hiding `mastered_ids` from the pool.
    pub fn new(
        context: SessionContext,
        words: Vec<Word>,
        mastered_ids: &[String],
        config: SessionConfig,
        scheduler: S,
    ) -> Self {
        Self::with_rng(context, words, mastered_ids, config, scheduler, StdRng::from_entropy())
    }

    /// Same as [`new`](Self::new) with a reproducible shuffle.
    pub fn with_seed(
        context: SessionContext,
        words: Vec<Word>,
        mastered_ids: &[String],
        config: SessionConfig,
        scheduler: S,
        seed: u64,
    ) -> Self {
        Self::with_rng(context, words, mastered_ids, config, scheduler, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        context: SessionContext,
        words: Vec<Word>,
        mastered_ids: &[String],
        config: SessionConfig,
        scheduler: S,
        mut rng: StdRng,
    ) -> Self {
        let curator = WordCurator::initialize(words, mastered_ids, config.required_words, &mut rng);
        tracing::info!(
            category = %context.category,
            learning = %context.learning_language,
            native = %context.native_language,
            pool = curator.pool_len(),
            "session started"
        );

        Self {
            config,
            context,
            scheduler,
            rng,
            curator,
            engine: ExerciseEngine::new(config.pass_mark),
            phase: Phase::Selection,
            current_index: 0,
            prompt: PromptState::default(),
            board: None,
            skip_locked: false,
            connected: true,
            speaking: false,
            recording_attempt: 0,
            summary: None,
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Word of the current prompt; the pool head during selection.
    pub fn current_word(&self) -> Option<&Word> {
        match self.phase {
            Phase::Selection => self.curator.head(),
            Phase::Complete | Phase::Matching => None,
            _ => self.curator.selected().get(self.current_index),
        }
    }

    pub fn selected_words(&self) -> &[Word] {
        self.curator.selected()
    }

    pub fn curator(&self) -> &WordCurator {
        &self.curator
    }

    /// True when the pool ran dry before enough words were picked.
    pub fn selection_exhausted(&self) -> bool {
        self.phase == Phase::Selection && self.curator.is_exhausted()
    }

    pub fn prompt(&self) -> &PromptState {
        &self.prompt
    }

    pub fn options(&self) -> &[String] {
        &self.prompt.options
    }

    pub fn board(&self) -> Option<&MatchingBoard> {
        self.board.as_ref()
    }

    pub fn score(&self) -> SessionScore {
        self.engine.score()
    }

    pub fn results(&self) -> &ExerciseResults {
        self.engine.results()
    }

    pub fn matrix(&self) -> &WordResultMatrix {
        self.engine.matrix()
    }

    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    /// Feedback band for the current pronunciation result.
    pub fn pronunciation_feedback(&self) -> Option<PronunciationFeedback> {
        self.prompt
            .pronunciation
            .as_ref()
            .map(|r| pronunciation_feedback(r.pronunciation_score))
    }

    pub fn is_skip_locked(&self) -> bool {
        self.skip_locked
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Apply one event and return the effects it produced.
    pub fn handle(&mut self, event: Event) -> Vec<Effect> {
        let mut effects = Vec::new();
        match event {
            Event::KnowWord => self.on_know_word(&mut effects),
            Event::LearnWord => self.on_learn_word(),
            Event::SelectOption(option) => self.on_select_option(option),
            Event::SelectTranslation(word_id) => self.on_select_translation(&word_id),
            Event::SelectWord(word_id) => self.on_select_word(&word_id),
            Event::SubmitWriting(text) => self.on_submit_writing(text),
            Event::StartRecording => self.on_start_recording(&mut effects),
            Event::StopRecording => self.on_stop_recording(&mut effects),
            Event::RecordingStopped { attempt, audio_uri } => {
                self.on_recording_stopped(attempt, audio_uri, &mut effects)
            }
            Event::RecordingFailed { attempt } => self.on_recording_failed(attempt),
            Event::AnalysisResolved { word_id, result } => self.on_analysis_resolved(&word_id, result),
            Event::RetryPronunciation => self.on_retry_pronunciation(),
            Event::Next => self.on_next(&mut effects),
            Event::Skip => self.on_skip(&mut effects),
            Event::ReviewAgain => self.on_review_again(),
            Event::Speak(text) => self.on_speak(text, &mut effects),
            Event::SpeechFinished => self.speaking = false,
            Event::ConnectivityChanged(connected) => {
                tracing::debug!(connected, "connectivity changed");
                self.connected = connected;
            }
            Event::TimerFired(timer) => self.on_timer(timer, &mut effects),
        }
        effects
    }

    fn schedule(&mut self, timer: Timer) {
        let delay = self.config.timings.delay(&timer);
        self.scheduler.schedule(delay, timer);
    }

    fn ignore(&self, event: &'static str, reason: &'static str) {
        tracing::debug!(phase = ?self.phase, event, reason, "event ignored");
    }

    fn on_know_word(&mut self, effects: &mut Vec<Effect>) {
        if self.phase != Phase::Selection {
            return self.ignore("know_word", "not selecting");
        }
        if self.curator.is_locked() {
            return self.ignore("know_word", "swipe in flight");
        }
        let Some(head) = self.curator.head() else {
            return self.ignore("know_word", "pool empty");
        };
        effects.push(Effect::MarkKnown {
            word_id: head.id.clone(),
        });

        if self.curator.pool_len() <= 1 {
            match self.curator.accept() {
                CurationSignal::Advance => self.enter_exercises(),
                CurationSignal::Exhausted => self.log_exhausted(),
                CurationSignal::Continue => {}
            }
            return;
        }

        self.curator.lock(SwipeDirection::Right);
        self.schedule(Timer::SwipeExit {
            direction: SwipeDirection::Right,
        });
    }

    fn on_learn_word(&mut self) {
        if self.phase != Phase::Selection {
            return self.ignore("learn_word", "not selecting");
        }
        if self.curator.is_locked() {
            return self.ignore("learn_word", "swipe in flight");
        }
        if self.curator.is_full() {
            return self.ignore("learn_word", "selection full");
        }
        if self.curator.head().is_none() {
            return self.ignore("learn_word", "pool empty");
        }

        self.curator.lock(SwipeDirection::Left);
        self.schedule(Timer::SwipeExit {
            direction: SwipeDirection::Left,
        });
    }

    fn on_swipe_exit(&mut self, direction: SwipeDirection) {
        if self.phase != Phase::Selection {
            self.curator.release();
            return;
        }

        let signal = match direction {
            SwipeDirection::Right => self.curator.accept(),
            SwipeDirection::Left => {
                let was_full = self.curator.is_full();
                let signal = self.curator.reject();
                if signal == CurationSignal::Advance && !was_full {
                    self.schedule(Timer::BeginExercises);
                }
                signal
            }
        };
        if signal == CurationSignal::Exhausted {
            self.log_exhausted();
        }

        self.schedule(Timer::GestureRelease);
    }

    fn log_exhausted(&self) {
        tracing::info!(
            selected = self.curator.selected().len(),
            required = self.curator.required(),
            "selection pool exhausted"
        );
    }

    fn enter_exercises(&mut self) {
        self.engine.reset();
        self.curator.release();
        self.enter_phase(Phase::Flashcard, &mut Vec::new());
    }

    fn enter_phase(&mut self, phase: Phase, effects: &mut Vec<Effect>) {
        tracing::info!(from = ?self.phase, to = ?phase, "phase changed");
        self.phase = phase;
        self.current_index = 0;
        self.prompt = PromptState::default();
        self.board = None;

        match phase {
            Phase::Matching => {
                self.board = Some(MatchingBoard::new(self.curator.selected(), &mut self.rng));
            }
            Phase::Complete => self.complete(effects),
            _ => self.prepare_prompt(),
        }
    }

    fn prepare_prompt(&mut self) {
        self.prompt = PromptState::default();
        let Some(exercise) = self.phase.exercise().filter(Exercise::is_multiple_choice) else {
            return;
        };
        let Some(word) = self.curator.selected().get(self.current_index) else {
            return;
        };
        self.prompt.options =
            ExerciseEngine::generate_options(exercise, word, self.curator.selected(), &mut self.rng);
    }

    fn advance_word(&mut self, effects: &mut Vec<Effect>) {
        if self.current_index + 1 < self.curator.selected().len() {
            self.current_index += 1;
            self.prepare_prompt();
        } else if let Some(next) = self.phase.next() {
            self.enter_phase(next, effects);
        }
    }

    fn complete(&mut self, effects: &mut Vec<Effect>) {
        let summary = SessionSummarizer::summarize(
            &self.context,
            self.curator.selected(),
            self.engine.matrix(),
            self.engine.results(),
            self.engine.score(),
        );
        tracing::info!(
            learned = summary.learned.len(),
            needs_practice = summary.needs_practice.len(),
            correct = summary.score.correct,
            total = summary.score.total,
            "session complete"
        );
        self.summary = Some(summary.clone());
        effects.push(Effect::SessionCompleted(summary));
    }

    fn current_exercise_word(&self) -> Option<(Exercise, Word)> {
        let exercise = self.phase.exercise()?;
        let word = self.curator.selected().get(self.current_index)?.clone();
        Some((exercise, word))
    }

    fn on_select_option(&mut self, option: String) {
        let Some((exercise, word)) = self.current_exercise_word() else {
            return self.ignore("select_option", "no prompt");
        };
        if !exercise.is_multiple_choice() {
            return self.ignore("select_option", "not multiple choice");
        }
        if self.prompt.chosen.is_some() {
            return self.ignore("select_option", "already answered");
        }
        if !self.prompt.options.contains(&option) {
            return self.ignore("select_option", "unknown option");
        }

        let check = self
            .engine
            .check_answer(exercise, &word, &Answer::Choice(option.clone()));
        self.prompt.chosen = Some(option);
        self.prompt.correct = Some(check.correct);
    }

    fn on_submit_writing(&mut self, text: String) {
        let Some((exercise, word)) = self.current_exercise_word() else {
            return self.ignore("submit_writing", "no prompt");
        };
        if exercise != Exercise::Writing {
            return self.ignore("submit_writing", "not writing");
        }
        if self.prompt.correct.is_some() {
            return self.ignore("submit_writing", "already answered");
        }

        let check = self
            .engine
            .check_answer(exercise, &word, &Answer::Text(text.clone()));
        self.prompt.typed = Some(text);
        self.prompt.correct = Some(check.correct);
    }

    fn on_select_translation(&mut self, word_id: &str) {
        if self.phase != Phase::Matching {
            return self.ignore("select_translation", "not matching");
        }
        let accepted = self
            .board
            .as_mut()
            .map_or(false, |board| board.select_translation(word_id));
        if !accepted {
            self.ignore("select_translation", "tile unavailable");
        }
    }

    fn on_select_word(&mut self, word_id: &str) {
        if self.phase != Phase::Matching {
            return self.ignore("select_word", "not matching");
        }
        let Some(word) = self.curator.selected().iter().find(|w| w.id == word_id).cloned() else {
            return self.ignore("select_word", "unknown word");
        };
        let Some(board) = self.board.as_mut() else {
            return self.ignore("select_word", "no board");
        };

        match board.select_word(word_id) {
            MatchOutcome::Ignored => self.ignore("select_word", "tile unavailable"),
            MatchOutcome::Correct { board_complete, .. } => {
                self.engine.check_answer(
                    Exercise::Matching,
                    &word,
                    &Answer::Match {
                        translation_id: word.id.clone(),
                    },
                );
                if board_complete {
                    self.schedule(Timer::MatchingComplete);
                }
            }
            MatchOutcome::Wrong(wrong) => {
                self.engine.check_answer(
                    Exercise::Matching,
                    &word,
                    &Answer::Match {
                        translation_id: wrong.translation_id.clone(),
                    },
                );
                self.schedule(Timer::ClearWrongMatch {
                    attempt: wrong.attempt,
                });
            }
        }
    }

    fn on_start_recording(&mut self, effects: &mut Vec<Effect>) {
        if self.phase != Phase::Pronunciation {
            return self.ignore("start_recording", "not pronouncing");
        }
        if !self.connected {
            return self.ignore("start_recording", "offline");
        }
        if self.prompt.recorder != RecorderState::Idle || self.prompt.analyzing {
            return self.ignore("start_recording", "recorder busy");
        }

        self.recording_attempt = self.recording_attempt.wrapping_add(1);
        let attempt = self.recording_attempt;
        self.prompt.recorder = RecorderState::Recording;
        self.prompt.recording = Some(attempt);
        self.prompt.has_recorded = false;
        self.prompt.audio_uri = None;
        self.prompt.pronunciation = None;
        effects.push(Effect::StartRecording { attempt });
    }

    fn on_stop_recording(&mut self, effects: &mut Vec<Effect>) {
        if self.phase != Phase::Pronunciation || self.prompt.recorder != RecorderState::Recording {
            return self.ignore("stop_recording", "not recording");
        }
        let Some(attempt) = self.prompt.recording else {
            return self.ignore("stop_recording", "no attempt");
        };
        self.prompt.recorder = RecorderState::Stopping;
        effects.push(Effect::StopRecording { attempt });
    }

    /// True when a recorder reply belongs to the live recording of this prompt.
    fn owns_recording(&self, attempt: u32) -> bool {
        self.phase == Phase::Pronunciation && self.prompt.recording == Some(attempt)
    }

    fn on_recording_stopped(&mut self, attempt: u32, audio_uri: String, effects: &mut Vec<Effect>) {
        if !self.owns_recording(attempt) {
            tracing::debug!(attempt, "stale recording dropped");
            return;
        }
        if self.prompt.recorder != RecorderState::Stopping {
            return self.ignore("recording_stopped", "no stop pending");
        }
        let Some((_, word)) = self.current_exercise_word() else {
            return self.ignore("recording_stopped", "no prompt");
        };

        self.prompt.recorder = RecorderState::Idle;
        self.prompt.has_recorded = true;
        self.prompt.audio_uri = Some(audio_uri.clone());

        if self.config.scoring_enabled && self.connected {
            self.prompt.analyzing = true;
            effects.push(Effect::AssessPronunciation {
                word_id: word.id,
                audio_uri,
                reference_text: word.word,
                language: self.context.learning_language.clone(),
            });
        } else {
            tracing::debug!(word_id = %word.id, "pronunciation scoring unavailable");
        }
    }

    fn on_recording_failed(&mut self, attempt: u32) {
        if !self.owns_recording(attempt) {
            tracing::debug!(attempt, "stale recording failure dropped");
            return;
        }
        if self.prompt.recorder == RecorderState::Idle {
            return self.ignore("recording_failed", "not recording");
        }
        tracing::warn!(attempt, "recording failed");
        self.prompt.recorder = RecorderState::Idle;
        self.prompt.has_recorded = false;
    }

    fn on_analysis_resolved(&mut self, word_id: &str, result: Option<PronunciationResult>) {
        let is_current = self.phase == Phase::Pronunciation
            && self.current_word().map_or(false, |w| w.id == word_id);
        if !is_current || !self.prompt.analyzing {
            tracing::debug!(word_id, "stale pronunciation result dropped");
            return;
        }
        self.prompt.analyzing = false;
        self.prompt.pronunciation = result;
    }

    fn on_retry_pronunciation(&mut self) {
        if self.phase != Phase::Pronunciation {
            return self.ignore("retry_pronunciation", "not pronouncing");
        }
        if self.prompt.recorder != RecorderState::Idle || self.prompt.analyzing {
            return self.ignore("retry_pronunciation", "recorder busy");
        }
        self.prompt.has_recorded = false;
        self.prompt.audio_uri = None;
        self.prompt.pronunciation = None;
    }

    /// Whether the current prompt has been answered far enough for Next.
    pub fn can_advance(&self) -> bool {
        match self.phase.exercise() {
            Some(Exercise::Flashcard | Exercise::Listening | Exercise::ReverseTranslation) => {
                self.prompt.chosen.is_some()
            }
            Some(Exercise::Writing) => self.prompt.correct.is_some(),
            Some(Exercise::Pronunciation) => {
                self.prompt.has_recorded
                    && self.prompt.recorder == RecorderState::Idle
                    && !self.prompt.analyzing
            }
            Some(Exercise::Matching) | None => false,
        }
    }

    fn on_next(&mut self, effects: &mut Vec<Effect>) {
        if !self.can_advance() {
            return self.ignore("next", "prompt not answered");
        }

        if let Some((Exercise::Pronunciation, word)) = self.current_exercise_word() {
            let answer = Answer::Pronunciation(self.prompt.pronunciation.clone());
            let check = self.engine.check_answer(Exercise::Pronunciation, &word, &answer);
            tracing::debug!(word_id = %word.id, correct = check.correct, "pronunciation graded");
        }

        self.advance_word(effects);
    }

    fn on_skip(&mut self, effects: &mut Vec<Effect>) {
        let Some(exercise) = self.phase.exercise() else {
            return self.ignore("skip", "no exercise");
        };
        if self.skip_locked {
            return self.ignore("skip", "skip locked");
        }

        if exercise == Exercise::Matching {
            let remaining = self.board.as_ref().map(MatchingBoard::unmatched).unwrap_or_default();
            for word_id in &remaining {
                self.engine.record_skip(Exercise::Matching, word_id);
            }
            self.enter_phase(Phase::Listening, effects);
        } else {
            let Some(word_id) = self.current_word().map(|w| w.id.clone()) else {
                return self.ignore("skip", "no prompt");
            };
            if self.prompt.recorder == RecorderState::Recording {
                if let Some(attempt) = self.prompt.recording {
                    effects.push(Effect::StopRecording { attempt });
                }
            }
            self.engine.record_skip(exercise, &word_id);
            self.advance_word(effects);
        }

        self.skip_locked = true;
        self.schedule(Timer::SkipRelease);
    }

    fn on_review_again(&mut self) {
        if self.phase != Phase::Complete {
            return self.ignore("review_again", "session not complete");
        }
        tracing::info!("reviewing selected words again");
        self.summary = None;
        self.enter_exercises();
    }

    fn on_speak(&mut self, text: String, effects: &mut Vec<Effect>) {
        if text.trim().is_empty() {
            return self.ignore("speak", "empty text");
        }
        if self.speaking {
            return self.ignore("speak", "already speaking");
        }
        if !self.connected {
            return self.ignore("speak", "offline");
        }
        self.speaking = true;
        effects.push(Effect::Speak {
            text,
            language: self.context.learning_language.clone(),
        });
    }

    fn on_timer(&mut self, timer: Timer, effects: &mut Vec<Effect>) {
        match timer {
            Timer::SwipeExit { direction } => self.on_swipe_exit(direction),
            Timer::GestureRelease => self.curator.release(),
            Timer::BeginExercises => {
                if self.phase == Phase::Selection && self.curator.is_full() {
                    self.enter_exercises();
                }
            }
            Timer::MatchingComplete => {
                let complete = self.board.as_ref().map_or(false, MatchingBoard::is_complete);
                if self.phase == Phase::Matching && complete {
                    self.enter_phase(Phase::Listening, effects);
                }
            }
            Timer::ClearWrongMatch { attempt } => {
                if let Some(board) = self.board.as_mut() {
                    board.clear_wrong(attempt);
                }
            }
            Timer::SkipRelease => self.skip_locked = false,
        }
    }
}

impl SessionController<ManualScheduler> {
    /// Move the virtual clock forward, firing every timer that comes due.
    pub fn advance_clock(&mut self, by: Duration) -> Vec<Effect> {
        let until = self.scheduler.now() + by;
        let mut effects = Vec::new();
        while let Some(timer) = self.scheduler.pop_due(until) {
            effects.extend(self.handle(Event::TimerFired(timer)));
        }
        let rest = until.saturating_sub(self.scheduler.now());
        self.scheduler.advance(rest);
        effects
    }

    /// Fire every pending timer, including ones scheduled along the way.
    pub fn settle(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        while let Some(timer) = self.scheduler.pop_next() {
            effects.extend(self.handle(Event::TimerFired(timer)));
        }
        effects
    }
}
