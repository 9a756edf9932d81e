//! Deferred transitions.
//!
//! The controller never sleeps. It asks a [`Scheduler`] to deliver a
//! [`Timer`] after a delay, and the host feeds the timer back in as
//! `Event::TimerFired` when it expires.

use crate::curator::SwipeDirection;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A deferred controller transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timer {
    /// Swipe exit animation finished; apply the swipe to the pool.
    SwipeExit { direction: SwipeDirection },
    /// Release the selection gesture lock.
    GestureRelease,
    /// Selection is full; start the exercises.
    BeginExercises,
    /// Every pair is matched; leave the matching board.
    MatchingComplete,
    /// Hide the wrong-match flag of the given attempt.
    ClearWrongMatch { attempt: u32 },
    /// Accept skips again.
    SkipRelease,
}

/// Delay settings for every timer, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timings {
    pub swipe_exit_ms: u64,
    pub gesture_release_ms: u64,
    pub begin_exercises_ms: u64,
    pub match_result_ms: u64,
    pub matching_grace_ms: u64,
    pub skip_lock_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            swipe_exit_ms: 300,
            gesture_release_ms: 100,
            begin_exercises_ms: 500,
            match_result_ms: 800,
            matching_grace_ms: 800,
            skip_lock_ms: 500,
        }
    }
}

impl Timings {
    /// Delay for `timer`.
    pub fn delay(&self, timer: &Timer) -> Duration {
        let ms = match timer {
            Timer::SwipeExit { .. } => self.swipe_exit_ms,
            Timer::GestureRelease => self.gesture_release_ms,
            Timer::BeginExercises => self.begin_exercises_ms,
            Timer::MatchingComplete => self.matching_grace_ms,
            Timer::ClearWrongMatch { .. } => self.match_result_ms,
            Timer::SkipRelease => self.skip_lock_ms,
        };
        Duration::from_millis(ms)
    }
}

/// Delivers timers back to the controller after a delay.
pub trait Scheduler {
    fn schedule(&mut self, delay: Duration, timer: Timer);
}

impl<T: Scheduler + ?Sized> Scheduler for Box<T> {
    fn schedule(&mut self, delay: Duration, timer: Timer) {
        (**self).schedule(delay, timer);
    }
}

#[derive(Debug, Clone)]
struct Pending {
    due: Duration,
    seq: u64,
    timer: Timer,
}

/// Virtual-clock scheduler. Time only moves when [`ManualScheduler::advance`] is called.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    now: Duration,
    seq: u64,
    pending: Vec<Pending>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed on the virtual clock.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Timers waiting to fire, earliest first.
    pub fn pending(&self) -> Vec<Timer> {
        let mut pending = self.pending.clone();
        pending.sort_by_key(|p| (p.due, p.seq));
        pending.into_iter().map(|p| p.timer).collect()
    }

    /// Move the clock forward and return every timer that came due, in due order.
    pub fn advance(&mut self, by: Duration) -> Vec<Timer> {
        self.now += by;
        let now = self.now;

        let (mut due, rest): (Vec<Pending>, Vec<Pending>) =
            self.pending.drain(..).partition(|p| p.due <= now);
        self.pending = rest;

        due.sort_by_key(|p| (p.due, p.seq));
        due.into_iter().map(|p| p.timer).collect()
    }

    /// Earliest pending timer, moving the clock to its due time.
    pub fn pop_next(&mut self) -> Option<Timer> {
        self.pop_due(Duration::MAX)
    }

    /// Earliest pending timer due at or before `until`, moving the clock to its due time.
    ///
    /// Unlike [`advance`](Self::advance), timers scheduled in response to a
    /// popped timer are seen by the next call.
    pub fn pop_due(&mut self, until: Duration) -> Option<Timer> {
        let index = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due <= until)
            .min_by_key(|(_, p)| (p.due, p.seq))
            .map(|(i, _)| i)?;
        let next = self.pending.remove(index);
        if next.due > self.now {
            self.now = next.due;
        }
        Some(next.timer)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, delay: Duration, timer: Timer) {
        self.seq += 1;
        self.pending.push(Pending {
            due: self.now + delay,
            seq: self.seq,
            timer,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn timers_fire_in_due_order() {
        let mut scheduler = ManualScheduler::new();
        scheduler.schedule(ms(500), Timer::BeginExercises);
        scheduler.schedule(ms(100), Timer::GestureRelease);
        scheduler.schedule(ms(300), Timer::SkipRelease);

        assert_eq!(scheduler.advance(ms(299)), vec![Timer::GestureRelease]);
        assert_eq!(scheduler.advance(ms(1)), vec![Timer::SkipRelease]);
        assert_eq!(scheduler.pending_count(), 1);
        assert_eq!(scheduler.advance(ms(1000)), vec![Timer::BeginExercises]);
        assert_eq!(scheduler.now(), ms(1300));
    }

    #[test]
    fn equal_due_times_keep_schedule_order() {
        let mut scheduler = ManualScheduler::new();
        scheduler.schedule(ms(100), Timer::SkipRelease);
        scheduler.schedule(ms(100), Timer::GestureRelease);
        assert_eq!(
            scheduler.advance(ms(100)),
            vec![Timer::SkipRelease, Timer::GestureRelease]
        );
    }

    #[test]
    fn pop_next_moves_clock() {
        let mut scheduler = ManualScheduler::new();
        scheduler.schedule(ms(800), Timer::MatchingComplete);
        assert_eq!(scheduler.pop_next(), Some(Timer::MatchingComplete));
        assert_eq!(scheduler.now(), ms(800));
        assert_eq!(scheduler.pop_next(), None);
    }

    #[test]
    fn pop_due_sees_chained_timers() {
        let mut scheduler = ManualScheduler::new();
        scheduler.schedule(ms(300), Timer::SwipeExit { direction: SwipeDirection::Right });
        assert_eq!(
            scheduler.pop_due(ms(1000)),
            Some(Timer::SwipeExit { direction: SwipeDirection::Right })
        );
        scheduler.schedule(ms(100), Timer::GestureRelease);
        assert_eq!(scheduler.pop_due(ms(1000)), Some(Timer::GestureRelease));
        assert_eq!(scheduler.now(), ms(400));
        assert_eq!(scheduler.pop_due(ms(1000)), None);
    }

    #[test]
    fn default_delays() {
        let timings = Timings::default();
        assert_eq!(
            timings.delay(&Timer::SwipeExit { direction: SwipeDirection::Left }),
            ms(300)
        );
        assert_eq!(timings.delay(&Timer::ClearWrongMatch { attempt: 1 }), ms(800));
        assert_eq!(timings.delay(&Timer::BeginExercises), ms(500));
    }
}
