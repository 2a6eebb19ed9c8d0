//! Timer set for one session.
//!
//! Timers live on the session's virtual clock (milliseconds since the
//! session was created). Nothing here sleeps or spawns: the owner asks
//! for due timers with [`TimerSet::pop_due`] after moving its clock.
//!
//! Due timers come out ordered by due time, then by creation order.
//! Repeating timers are re-armed from their own due time, not from the
//! time they were popped, so late polling never shifts later ticks.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    /// One-shot delay between session start and the first phase.
    Settle,
    /// 1s session countdown.
    Countdown,
    /// One-shot end of the current phase.
    PhaseTransition,
    /// Fast repeating refresh of the phase countdown.
    PhaseDisplay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug, Clone)]
struct Timer {
    id: TimerId,
    kind: TimerKind,
    due_ms: u64,
    period_ms: Option<u64>,
}

/// A timer that came due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    pub id: TimerId,
    pub kind: TimerKind,
    pub due_ms: u64,
}

#[derive(Debug, Default)]
pub struct TimerSet {
    next_id: u64,
    timers: Vec<Timer>,
}

impl TimerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a one-shot timer due at `due_ms`.
    pub fn once(&mut self, kind: TimerKind, due_ms: u64) -> TimerId {
        self.push(kind, due_ms, None)
    }

    /// Arm a repeating timer, first due at `first_due_ms`.
    pub fn every(&mut self, kind: TimerKind, first_due_ms: u64, period_ms: u64) -> TimerId {
        self.push(kind, first_due_ms, Some(period_ms.max(1)))
    }

    fn push(&mut self, kind: TimerKind, due_ms: u64, period_ms: Option<u64>) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer {
            id,
            kind,
            due_ms,
            period_ms,
        });
        id
    }

    /// Disarm one timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != id);
        self.timers.len() != before
    }

    /// Disarm everything. Returns how many timers were live.
    pub fn cancel_all(&mut self) -> usize {
        let n = self.timers.len();
        self.timers.clear();
        n
    }

    #[cfg(test)]
    pub fn is_armed(&self, id: TimerId) -> bool {
        self.timers.iter().any(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Number of live timers of `kind`.
    pub fn count(&self, kind: TimerKind) -> usize {
        self.timers.iter().filter(|t| t.kind == kind).count()
    }

    pub fn next_due_ms(&self) -> Option<u64> {
        self.timers.iter().map(|t| t.due_ms).min()
    }

    /// Take the earliest timer due at or before `now_ms`.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<Fired> {
        let pos = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due_ms <= now_ms)
            .min_by_key(|(_, t)| (t.due_ms, t.id))
            .map(|(i, _)| i)?;

        let timer = &mut self.timers[pos];
        let fired = Fired {
            id: timer.id,
            kind: timer.kind,
            due_ms: timer.due_ms,
        };
        match timer.period_ms {
            Some(period) => timer.due_ms += period,
            None => {
                self.timers.swap_remove(pos);
            }
        }
        Some(fired)
    }
}

impl Drop for TimerSet {
    fn drop(&mut self) {
        if !self.timers.is_empty() {
            tracing::debug!(live = self.timers.len(), "releasing armed timers");
        }
    }
}
