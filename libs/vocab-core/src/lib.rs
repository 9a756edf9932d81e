//! Vocabulary learning session engine shared by host applications.
//!
//! Provides:
//! - Word catalog loading and language-pair projection
//! - Selection pool curation (know / learn swipes)
//! - The six-stage exercise pipeline as an event-driven state machine
//! - Progress persistence over a pluggable key-value store
//! - Mastery-based review scheduling

pub mod algorithm;
pub mod answer;
pub mod catalog;
pub mod curator;
pub mod error;
pub mod exercise;
pub mod language;
pub mod progress;
pub mod scheduler;
pub mod session;
pub mod store;
pub mod summary;
pub mod types;

pub use algorithm::{get_algorithm, ReviewAlgorithm};
pub use catalog::{JsonCatalog, WordCatalog};
pub use curator::{CurationSignal, SwipeDirection, WordCurator};
pub use error::{CatalogError, CatalogResult, StoreError, StoreResult};
pub use exercise::{Answer, AnswerCheck, ExerciseEngine, MatchingBoard, PronunciationFeedback};
pub use progress::{ProgressStore, StreakRecord, WeeklyProgress};
pub use scheduler::{ManualScheduler, Scheduler, Timer, Timings};
pub use session::{Effect, Event, SessionConfig, SessionController};
pub use store::{KeyValueStore, MemoryStore};
pub use summary::{Motivation, SessionSummarizer, SessionSummary};
pub use types::{
    CategoryStats, Exercise, ExerciseResults, LearnedWord, Phase, PronunciationResult,
    SessionContext, SessionScore, Word, WordLevel, WordResultMatrix, REQUIRED_WORDS,
};
