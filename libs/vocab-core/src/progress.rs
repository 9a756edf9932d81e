//! Learner progress persisted through a [`KeyValueStore`].
//!
//! Every write re-reads the stored value first and merges into it, so two
//! writers racing on the same key lose at most a counter increment, never a
//! mastered word. Public operations never fail: storage errors are logged
//! and defaults are substituted.
//!
//! Keys are kept compatible with existing installs:
//!
//! | Key | Value |
//! |---|---|
//! | `learned_{lang}_{category}` | JSON array of word IDs |
//! | `today_words_{lang}_{YYYY-MM-DD}` | integer string |
//! | `streak_{lang}` | integer string |
//! | `last_active_{lang}` | `YYYY-MM-DD` |
//! | `weekly_progress_{lang}` | JSON array of `{day, words}` |
//! | `weekly_progress_week_{lang}` | ISO week key, `YYYY-Www` |
//! | `learned_words` | JSON array of review records |

use crate::algorithm::ReviewAlgorithm;
use crate::error::{StoreError, StoreResult};
use crate::store::KeyValueStore;
use crate::types::{CategoryStats, LearnedWord};
use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Weekday slot names, Monday first.
pub const WEEKDAYS: [&str; 7] = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];

/// Mastery at or above which a reviewed word counts as mastered.
pub const MASTERED_THRESHOLD: u32 = 80;

/// Storage key builders.
pub mod keys {
    use chrono::NaiveDate;

    pub const LEARNED_WORDS: &str = "learned_words";

    pub fn mastered(lang: &str, category: &str) -> String {
        format!("learned_{lang}_{category}")
    }

    pub fn daily(lang: &str, date: NaiveDate) -> String {
        format!("today_words_{lang}_{}", date.format(super::DATE_FORMAT))
    }

    pub fn streak(lang: &str) -> String {
        format!("streak_{lang}")
    }

    pub fn last_active(lang: &str) -> String {
        format!("last_active_{lang}")
    }

    pub fn weekly(lang: &str) -> String {
        format!("weekly_progress_{lang}")
    }

    pub fn weekly_week(lang: &str) -> String {
        format!("weekly_progress_week_{lang}")
    }
}

/// ISO week key for `date`, e.g. `2025-W03`.
pub fn week_key(date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

/// Local calendar date.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Consecutive-day activity for one language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakRecord {
    pub streak: u32,
    pub last_active: Option<NaiveDate>,
}

/// One weekday slot of the weekly chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayProgress {
    pub day: String,
    pub words: u32,
}

/// Words learned per weekday in one ISO week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyProgress {
    pub week: String,
    pub days: Vec<DayProgress>,
}

impl WeeklyProgress {
    /// All-zero week.
    pub fn empty(week: String) -> Self {
        Self {
            week,
            days: WEEKDAYS
                .iter()
                .map(|day| DayProgress {
                    day: (*day).to_string(),
                    words: 0,
                })
                .collect(),
        }
    }

    pub fn total(&self) -> u32 {
        self.days.iter().fold(0u32, |sum, d| sum.saturating_add(d.words))
    }

    /// Words for a weekday, Monday = 0.
    pub fn words_on(&self, index: usize) -> u32 {
        self.days.get(index).map_or(0, |d| d.words)
    }
}

/// Typed progress accessors over a key-value store.
#[derive(Debug, Clone)]
pub struct ProgressStore<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> ProgressStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mastered word IDs for a language and category, in insertion order.
    pub fn mastered_words(&self, lang: &str, category: &str) -> Vec<String> {
        self.try_mastered_words(lang, category).unwrap_or_else(|e| {
            tracing::warn!(error = %e, lang, category, "failed to read mastered words");
            Vec::new()
        })
    }

    /// Union `ids` into the persisted set.
    pub fn merge_mastered_words(&self, lang: &str, category: &str, ids: &[String]) {
        if let Err(e) = self.try_merge_mastered_words(lang, category, ids) {
            tracing::warn!(error = %e, lang, category, "failed to save mastered words");
        }
    }

    /// Merge `ids` and, when `update_stats` is set, count them towards today,
    /// the streak and the weekly chart.
    pub fn mark_mastered(&self, lang: &str, category: &str, ids: &[String], update_stats: bool) {
        self.mark_mastered_on(lang, category, ids, update_stats, local_today());
    }

    pub fn mark_mastered_on(
        &self,
        lang: &str,
        category: &str,
        ids: &[String],
        update_stats: bool,
        today: NaiveDate,
    ) {
        self.merge_mastered_words(lang, category, ids);
        if !update_stats {
            return;
        }

        let count = u32::try_from(ids.len()).unwrap_or(u32::MAX);
        if let Err(e) = self.try_add_daily(lang, count, today) {
            tracing::warn!(error = %e, lang, "failed to update today's word count");
        }
        self.update_streak_on(lang, today);
        self.update_weekly_progress_on(lang, count, today);

        tracing::info!(lang, category, count, "mastered words recorded");
    }

    fn try_mastered_words(&self, lang: &str, category: &str) -> StoreResult<Vec<String>> {
        match self.store.get(&keys::mastered(lang, category))? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    fn try_merge_mastered_words(&self, lang: &str, category: &str, ids: &[String]) -> StoreResult<()> {
        let existing = self.try_mastered_words(lang, category).unwrap_or_else(|e| {
            tracing::warn!(error = %e, lang, category, "discarding unreadable mastered words");
            Vec::new()
        });

        let mut seen: HashSet<String> = HashSet::new();
        let merged: Vec<String> = existing
            .into_iter()
            .chain(ids.iter().cloned())
            .filter(|id| seen.insert(id.clone()))
            .collect();

        self.store
            .set(&keys::mastered(lang, category), &serde_json::to_string(&merged)?)
    }

    pub fn words_learned_today(&self, lang: &str) -> u32 {
        self.words_learned_on(lang, local_today())
    }

    pub fn words_learned_on(&self, lang: &str, date: NaiveDate) -> u32 {
        self.read_count(&keys::daily(lang, date))
    }

    fn try_add_daily(&self, lang: &str, count: u32, date: NaiveDate) -> StoreResult<()> {
        let key = keys::daily(lang, date);
        let current = self.read_count(&key);
        self.store.set(&key, &current.saturating_add(count).to_string())
    }

    pub fn streak(&self, lang: &str) -> StreakRecord {
        StreakRecord {
            streak: self.read_count(&keys::streak(lang)),
            last_active: self.read_date(&keys::last_active(lang)),
        }
    }

    pub fn update_streak(&self, lang: &str) {
        self.update_streak_on(lang, local_today());
    }

    /// Same day: unchanged. Day after last activity: +1. Anything else: 1.
    pub fn update_streak_on(&self, lang: &str, today: NaiveDate) {
        if let Err(e) = self.try_update_streak(lang, today) {
            tracing::warn!(error = %e, lang, "failed to update streak");
        }
    }

    fn try_update_streak(&self, lang: &str, today: NaiveDate) -> StoreResult<()> {
        let record = self.streak(lang);
        if record.last_active == Some(today) {
            return Ok(());
        }

        let streak = match record.last_active {
            Some(last) if last + Duration::days(1) == today => record.streak.saturating_add(1),
            _ => 1,
        };

        self.store.set(&keys::streak(lang), &streak.to_string())?;
        self.store
            .set(&keys::last_active(lang), &today.format(DATE_FORMAT).to_string())?;
        tracing::debug!(lang, streak, "streak updated");
        Ok(())
    }

    /// Weekly chart for the current week. A stale stored week reads as zeros.
    pub fn weekly_progress(&self, lang: &str) -> WeeklyProgress {
        self.weekly_progress_on(lang, local_today())
    }

    pub fn weekly_progress_on(&self, lang: &str, today: NaiveDate) -> WeeklyProgress {
        let current = week_key(today);
        let stored_week = self.read_string(&keys::weekly_week(lang));
        if stored_week.as_deref() != Some(current.as_str()) {
            return WeeklyProgress::empty(current);
        }
        self.read_week_days(lang, current)
    }

    pub fn update_weekly_progress(&self, lang: &str, count: u32) {
        self.update_weekly_progress_on(lang, count, local_today());
    }

    pub fn update_weekly_progress_on(&self, lang: &str, count: u32, today: NaiveDate) {
        if let Err(e) = self.try_update_weekly(lang, count, today) {
            tracing::warn!(error = %e, lang, "failed to update weekly progress");
        }
    }

    fn try_update_weekly(&self, lang: &str, count: u32, today: NaiveDate) -> StoreResult<()> {
        let current = week_key(today);
        let stored_week = self.read_string(&keys::weekly_week(lang));

        let mut progress = if stored_week.as_deref() == Some(current.as_str()) {
            self.read_week_days(lang, current)
        } else {
            self.store.set(&keys::weekly_week(lang), &current)?;
            WeeklyProgress::empty(current)
        };

        let index = today.weekday().num_days_from_monday() as usize;
        if let Some(slot) = progress.days.get_mut(index) {
            slot.words = slot.words.saturating_add(count);
        }

        self.store
            .set(&keys::weekly(lang), &serde_json::to_string(&progress.days)?)
    }

    fn read_week_days(&self, lang: &str, week: String) -> WeeklyProgress {
        let days: Option<Vec<DayProgress>> = self
            .read_string(&keys::weekly(lang))
            .and_then(|raw| match serde_json::from_str(&raw) {
                Ok(days) => Some(days),
                Err(e) => {
                    tracing::warn!(error = %e, lang, "discarding unreadable weekly progress");
                    None
                }
            });

        match days {
            Some(days) if days.len() == WEEKDAYS.len() => WeeklyProgress { week, days },
            _ => WeeklyProgress::empty(week),
        }
    }

    /// Every word with review history.
    pub fn learned_words(&self) -> Vec<LearnedWord> {
        self.try_learned_words().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to read learned words");
            Vec::new()
        })
    }

    /// Fold one review into the stored history of `word_id`.
    pub fn record_review(
        &self,
        algorithm: &dyn ReviewAlgorithm,
        word_id: &str,
        category: &str,
        correct: bool,
        now: DateTime<Utc>,
    ) {
        if let Err(e) = self.try_record_review(algorithm, word_id, category, correct, now) {
            tracing::warn!(error = %e, word_id, "failed to record review");
        }
    }

    /// Words whose next review is at or before `now`.
    pub fn words_due_for_review(&self, now: DateTime<Utc>) -> Vec<LearnedWord> {
        self.learned_words()
            .into_iter()
            .filter(|w| w.next_review_at <= now)
            .collect()
    }

    /// Review statistics for `category`, which holds `total_words` catalog words.
    pub fn category_stats(&self, category: &str, total_words: usize) -> CategoryStats {
        let words: Vec<LearnedWord> = self
            .learned_words()
            .into_iter()
            .filter(|w| w.category == category)
            .collect();

        let mastered_words = words
            .iter()
            .filter(|w| w.mastery >= MASTERED_THRESHOLD)
            .count();
        let average_mastery = if words.is_empty() {
            0
        } else {
            let sum: u32 = words.iter().map(|w| w.mastery).sum();
            (f64::from(sum) / words.len() as f64).round() as u32
        };

        CategoryStats {
            total_words,
            learned_words: words.len(),
            mastered_words,
            average_mastery,
        }
    }

    fn try_learned_words(&self) -> StoreResult<Vec<LearnedWord>> {
        match self.store.get(keys::LEARNED_WORDS)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    fn try_record_review(
        &self,
        algorithm: &dyn ReviewAlgorithm,
        word_id: &str,
        category: &str,
        correct: bool,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut words = self.try_learned_words()?;
        match words.iter().position(|w| w.word_id == word_id) {
            Some(index) => {
                let updated = algorithm.review(Some(&words[index]), word_id, category, correct, now);
                words[index] = updated;
            }
            None => words.push(algorithm.review(None, word_id, category, correct, now)),
        }
        self.store
            .set(keys::LEARNED_WORDS, &serde_json::to_string(&words)?)
    }

    fn read_string(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, key, "failed to read key");
                None
            }
        }
    }

    /// Stored value run through `parse`; a value it rejects is [`StoreError::InvalidData`].
    fn try_read_parsed<T>(
        &self,
        key: &str,
        parse: impl FnOnce(&str) -> Option<T>,
    ) -> StoreResult<Option<T>> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(None);
        };
        match parse(raw.trim()) {
            Some(value) => Ok(Some(value)),
            None => Err(StoreError::InvalidData {
                key: key.to_string(),
                value: raw,
            }),
        }
    }

    fn read_parsed<T>(&self, key: &str, parse: impl FnOnce(&str) -> Option<T>) -> Option<T> {
        self.try_read_parsed(key, parse).unwrap_or_else(|e| {
            tracing::warn!(error = %e, key, "failed to read key");
            None
        })
    }

    /// Integer-string value; missing or unparsable reads as 0.
    fn read_count(&self, key: &str) -> u32 {
        self.read_parsed(key, |raw| raw.parse().ok()).unwrap_or(0)
    }

    fn read_date(&self, key: &str) -> Option<NaiveDate> {
        self.read_parsed(key, |raw| NaiveDate::parse_from_str(raw, DATE_FORMAT).ok())
    }
}
