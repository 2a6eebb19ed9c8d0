//! Phase scheduler state machine.
//!
//! ```text
//! Pending -> Running(0) -> Running(1) -> ... -> Running(n-1) -> Running(0) -> ... -> Ended
//! ```
//!
//! Each phase gets two timers armed from the moment it is entered: a
//! one-shot transition timer (authoritative) and a fast display timer
//! that only refreshes `phase_elapsed`. Zero-length phases are never
//! entered; the cursor steps over them.

use serde::{Deserialize, Serialize};

use super::timers::{TimerId, TimerKind, TimerSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum SchedulerState {
    Pending,
    Running { phase_index: usize },
    Ended,
}

#[derive(Debug)]
pub struct PhaseScheduler {
    durations_ms: Vec<u64>,
    display_tick_ms: u64,
    state: SchedulerState,
    phase_index: usize,
    phase_entry_ms: u64,
    phase_elapsed_ms: u64,
    transition: Option<TimerId>,
    display: Option<TimerId>,
}

impl PhaseScheduler {
    pub fn new(durations_ms: Vec<u64>, display_tick_ms: u64) -> Self {
        let mut scheduler = Self {
            durations_ms,
            display_tick_ms: display_tick_ms.max(1),
            state: SchedulerState::Pending,
            phase_index: 0,
            phase_entry_ms: 0,
            phase_elapsed_ms: 0,
            transition: None,
            display: None,
        };
        scheduler.phase_index = scheduler.first_index();
        scheduler
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Index of the current phase. While pending this is the phase the
    /// session will open on.
    pub fn phase_index(&self) -> usize {
        self.phase_index
    }

    pub fn phase_duration_ms(&self) -> u64 {
        self.durations_ms.get(self.phase_index).copied().unwrap_or(0)
    }

    pub fn phase_elapsed_ms(&self) -> u64 {
        self.phase_elapsed_ms
    }

    pub fn phase_remaining_ms(&self) -> u64 {
        self.phase_duration_ms().saturating_sub(self.phase_elapsed_ms)
    }

    /// Phase the session opens on.
    pub fn first_index(&self) -> usize {
        if self.durations_ms.first().copied().unwrap_or(0) > 0 {
            0
        } else {
            self.following(0)
        }
    }

    /// Phase that will be entered when the current one ends.
    pub fn upcoming_index(&self) -> usize {
        self.following(self.phase_index)
    }

    /// Next phase after `index` with a non-zero length, wrapping around.
    /// A single-phase technique follows itself.
    fn following(&self, index: usize) -> usize {
        let len = self.durations_ms.len();
        if len == 0 {
            return 0;
        }
        let mut next = (index + 1) % len;
        for _ in 0..len {
            if self.durations_ms[next] > 0 {
                return next;
            }
            next = (next + 1) % len;
        }
        (index + 1) % len
    }

    /// Make `index` the current phase as of `at_ms` and re-arm both phase timers.
    pub fn enter(&mut self, index: usize, timers: &mut TimerSet, at_ms: u64) {
        self.disarm(timers);
        self.state = SchedulerState::Running { phase_index: index };
        self.phase_index = index;
        self.phase_entry_ms = at_ms;
        self.phase_elapsed_ms = 0;

        let duration = self.phase_duration_ms();
        self.transition = Some(timers.once(TimerKind::PhaseTransition, at_ms + duration));
        self.display = Some(timers.every(
            TimerKind::PhaseDisplay,
            at_ms + self.display_tick_ms,
            self.display_tick_ms,
        ));
    }

    /// Display refresh: recompute elapsed time from phase entry.
    pub fn refresh(&mut self, now_ms: u64) -> u64 {
        let since_entry = now_ms.saturating_sub(self.phase_entry_ms);
        self.phase_elapsed_ms = since_entry.min(self.phase_duration_ms());
        self.phase_elapsed_ms
    }

    /// Terminal transition. Phase timers are disarmed; the caller owns the rest.
    pub fn end(&mut self, timers: &mut TimerSet) {
        self.disarm(timers);
        self.state = SchedulerState::Ended;
    }

    fn disarm(&mut self, timers: &mut TimerSet) {
        if let Some(id) = self.transition.take() {
            timers.cancel(id);
        }
        if let Some(id) = self.display.take() {
            timers.cancel(id);
        }
    }
}
