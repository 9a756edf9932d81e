//! Selection pool curation.
//!
//! The learner walks the shuffled pool one head word at a time: a right swipe
//! ("I know this") drops the word, a left swipe ("I want to learn this") moves
//! it into the selected set. While a swipe is in flight the pool is locked and
//! further swipes are ignored.

use crate::types::Word;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// Direction of a selection swipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwipeDirection {
    /// "I want to learn this."
    Left,
    /// "I already know this."
    Right,
}

/// What the caller should do after a curation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurationSignal {
    /// Keep selecting.
    Continue,
    /// The selected set is full; move on to the exercises.
    Advance,
    /// The pool ran dry before the selected set filled up.
    Exhausted,
}

/// Shuffled candidate words plus the learner's picks.
#[derive(Debug, Clone)]
pub struct WordCurator {
    pool: VecDeque<Word>,
    selected: Vec<Word>,
    required: usize,
    in_flight: Option<SwipeDirection>,
}

impl WordCurator {
    /// Build the pool from catalog output minus mastered IDs, then shuffle.
    ///
    /// When every word is already mastered the whole catalog is offered again.
    pub fn initialize<R: Rng + ?Sized>(
        catalog: Vec<Word>,
        mastered_ids: &[String],
        required: usize,
        rng: &mut R,
    ) -> Self {
        let mastered: HashSet<&str> = mastered_ids.iter().map(String::as_str).collect();
        let total = catalog.len();
        let unmastered: Vec<Word> = catalog
            .iter()
            .filter(|w| !mastered.contains(w.id.as_str()))
            .cloned()
            .collect();

        let mut candidates = if unmastered.is_empty() {
            catalog
        } else {
            unmastered
        };
        candidates.shuffle(rng);

        tracing::debug!(
            total,
            mastered = mastered.len(),
            pool = candidates.len(),
            "selection pool initialized"
        );

        Self {
            pool: candidates.into(),
            selected: Vec::with_capacity(required),
            required,
            in_flight: None,
        }
    }

    /// Word currently offered to the learner.
    pub fn head(&self) -> Option<&Word> {
        self.pool.front()
    }

    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }

    pub fn pool(&self) -> impl Iterator<Item = &Word> {
        self.pool.iter()
    }

    pub fn selected(&self) -> &[Word] {
        &self.selected
    }

    pub fn required(&self) -> usize {
        self.required
    }

    pub fn is_full(&self) -> bool {
        self.selected.len() >= self.required
    }

    /// True when no more selection input can change the outcome.
    pub fn is_exhausted(&self) -> bool {
        self.pool.is_empty() && !self.is_full()
    }

    /// Swipe currently animating, if any.
    pub fn in_flight(&self) -> Option<SwipeDirection> {
        self.in_flight
    }

    pub fn is_locked(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Take the gesture lock. Returns false if a swipe is already in flight.
    pub fn lock(&mut self, direction: SwipeDirection) -> bool {
        if self.in_flight.is_some() {
            return false;
        }
        self.in_flight = Some(direction);
        true
    }

    pub fn release(&mut self) {
        self.in_flight = None;
    }

    /// Drop the head word ("I know this").
    pub fn accept(&mut self) -> CurationSignal {
        self.pool.pop_front();
        self.signal()
    }

    /// Move the head word into the selected set ("I want to learn this").
    pub fn reject(&mut self) -> CurationSignal {
        if self.is_full() {
            return CurationSignal::Advance;
        }
        if let Some(word) = self.pool.pop_front() {
            self.selected.push(word);
        }
        self.signal()
    }

    fn signal(&self) -> CurationSignal {
        if self.is_full() {
            CurationSignal::Advance
        } else if self.pool.is_empty() {
            CurationSignal::Exhausted
        } else {
            CurationSignal::Continue
        }
    }
}
