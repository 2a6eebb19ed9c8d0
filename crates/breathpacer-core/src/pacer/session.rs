//! One timed run of a technique.
//!
//! A session owns every timer it arms. They are all released together
//! when the session ends (naturally or through [`Session::end`]) or is
//! dropped, so nothing keeps ticking after the caller moves on.
//!
//! ## Usage
//!
//! ```ignore
//! let mut session = Session::new(technique, 300, SessionOptions::default(), Box::new(SilentPlayer))?;
//! session.start(|reason| println!("done: {reason:?}"));
//! // In a loop, with the session clock in ms:
//! for event in session.advance_to(now_ms) { /* render */ }
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::scheduler::{PhaseScheduler, SchedulerState};
use super::timers::{TimerId, TimerKind, TimerSet};
use crate::audio::{CueDispatcher, CueOutcome, CuePlayer, DEFAULT_VOLUME};
use crate::error::ValidationError;
use crate::events::Event;
use crate::technique::{Phase, Technique};
use crate::view::{ceil_secs, format_countdown, CycleProgress, PacerView};
use crate::visual::{Visual, VisualTable};

/// Delay before the first phase, so the orb does not jump on open.
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 50;

/// Refresh cadence of the on-screen phase countdown.
pub const DEFAULT_DISPLAY_TICK_MS: u64 = 100;

/// Session countdown cadence. `elapsed_whole` counts these.
pub const COUNTDOWN_TICK_MS: u64 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionOptions {
    pub settle_delay_ms: u64,
    pub display_tick_ms: u64,
    pub volume: f64,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            display_tick_ms: DEFAULT_DISPLAY_TICK_MS,
            volume: DEFAULT_VOLUME,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// The full duration elapsed.
    Completed,
    /// The user stopped before the duration elapsed.
    EndedEarly,
}

/// Called exactly once when a started session ends.
pub type EndCallback = Box<dyn FnOnce(EndReason)>;

pub struct Session {
    technique: Technique,
    visuals: VisualTable,
    total_secs: u32,
    elapsed_whole: u32,
    settle_delay_ms: u64,
    clock_ms: u64,
    scheduler: PhaseScheduler,
    timers: TimerSet,
    countdown: Option<TimerId>,
    cues: CueDispatcher,
    started: bool,
    on_end: Option<EndCallback>,
    end_reason: Option<EndReason>,
}

impl Session {
    /// Build a pending session. No timer is armed until [`Session::start`].
    pub fn new(
        technique: Technique,
        duration_secs: u32,
        options: SessionOptions,
        player: Box<dyn CuePlayer>,
    ) -> Result<Self, ValidationError> {
        technique.validate()?;
        if duration_secs == 0 {
            return Err(ValidationError::invalid(
                "duration_secs",
                "session duration must be greater than zero",
            ));
        }
        if options.display_tick_ms == 0 {
            return Err(ValidationError::invalid(
                "display_tick_ms",
                "display tick must be at least 1ms",
            ));
        }

        let durations = technique.phases.iter().map(Phase::duration_ms).collect();
        let visuals = VisualTable::resolve(&technique);
        Ok(Self {
            scheduler: PhaseScheduler::new(durations, options.display_tick_ms),
            visuals,
            technique,
            total_secs: duration_secs,
            elapsed_whole: 0,
            settle_delay_ms: options.settle_delay_ms,
            clock_ms: 0,
            timers: TimerSet::new(),
            countdown: None,
            cues: CueDispatcher::new(player, options.volume),
            started: false,
            on_end: None,
            end_reason: None,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn technique(&self) -> &Technique {
        &self.technique
    }

    pub fn state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state(), SchedulerState::Running { .. })
    }

    pub fn is_ended(&self) -> bool {
        self.end_reason.is_some()
    }

    pub fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    pub fn phase_index(&self) -> usize {
        self.scheduler.phase_index()
    }

    pub fn current_phase(&self) -> &Phase {
        &self.technique.phases[self.scheduler.phase_index()]
    }

    /// Time into the current phase as of the last display refresh.
    pub fn phase_elapsed_ms(&self) -> u64 {
        self.scheduler.phase_elapsed_ms()
    }

    pub fn phase_remaining_ms(&self) -> u64 {
        self.scheduler.phase_remaining_ms()
    }

    pub fn total_secs(&self) -> u32 {
        self.total_secs
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_whole
    }

    pub fn remaining_secs(&self) -> u32 {
        self.total_secs.saturating_sub(self.elapsed_whole)
    }

    /// Session clock, ms since the session was created.
    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    /// Earliest armed deadline on the session clock.
    pub fn next_due_ms(&self) -> Option<u64> {
        self.timers.next_due_ms()
    }

    /// Number of armed timers (settle, countdown, phase transition, display).
    pub fn armed_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn armed(&self, kind: TimerKind) -> usize {
        self.timers.count(kind)
    }

    pub fn volume(&self) -> f64 {
        self.cues.volume()
    }

    pub fn cycle_progress(&self) -> Option<CycleProgress> {
        let cycle_secs = self.technique.cycle_ms() as f64 / 1000.0;
        CycleProgress::compute(self.elapsed_whole, self.total_secs, cycle_secs)
    }

    /// Orb look for the current state.
    pub fn visual(&self) -> Visual {
        let pending = self.state() == SchedulerState::Pending;
        self.visuals.visual(self.current_phase().name, pending)
    }

    pub fn view(&self) -> PacerView {
        let phase = self.current_phase();
        let visual = self.visual();
        let shows = phase.name.shows_instruction();
        PacerView {
            technique_name: self.technique.name.clone(),
            countdown: format_countdown(self.remaining_secs()),
            phase: phase.name,
            instruction: shows.then(|| phase.instruction.clone()),
            phase_seconds_left: shows.then(|| ceil_secs(self.phase_remaining_ms())),
            cycle: self.cycle_progress(),
            scale: visual.scale,
            tone: visual.tone,
            transition_secs: phase.duration_secs,
            volume: self.volume(),
        }
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.state(),
            technique_id: self.technique.id.clone(),
            phase_index: self.phase_index(),
            phase: self.current_phase().name,
            phase_remaining_ms: self.phase_remaining_ms(),
            remaining_secs: self.remaining_secs(),
            cycle: self.cycle_progress(),
            volume: self.volume(),
            at_ms: self.clock_ms,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Arm the settle timer. `on_end` runs once when the session ends.
    ///
    /// With a zero settle delay the first phase is entered before this
    /// returns.
    pub fn start(&mut self, on_end: impl FnOnce(EndReason) + 'static) -> Vec<Event> {
        if self.started || self.is_ended() {
            tracing::warn!(technique = %self.technique.id, "start ignored: session already started");
            return Vec::new();
        }
        self.started = true;
        self.on_end = Some(Box::new(on_end));
        tracing::info!(
            technique = %self.technique.id,
            duration_secs = self.total_secs,
            "session started"
        );

        let mut events = vec![Event::SessionStarted {
            technique_id: self.technique.id.clone(),
            duration_secs: self.total_secs,
            settle_delay_ms: self.settle_delay_ms,
            at: Utc::now(),
        }];
        self.timers
            .once(TimerKind::Settle, self.clock_ms + self.settle_delay_ms);
        if self.settle_delay_ms == 0 {
            events.extend(self.advance_to(self.clock_ms));
        }
        events
    }

    /// Stop before the duration elapses. Returns `None` if already ended.
    pub fn end(&mut self) -> Option<Event> {
        if self.is_ended() {
            return None;
        }
        let mut events = Vec::with_capacity(1);
        self.finish(EndReason::EndedEarly, &mut events);
        events.pop()
    }

    /// Set the volume used by the next cue; returns the applied value.
    pub fn set_volume(&mut self, volume: f64) -> f64 {
        self.cues.set_volume(volume)
    }

    /// Move the session clock to `now_ms`, firing every timer due on the way.
    pub fn advance_to(&mut self, now_ms: u64) -> Vec<Event> {
        let mut events = Vec::new();
        if now_ms < self.clock_ms {
            tracing::debug!(now_ms, clock_ms = self.clock_ms, "clock went backwards; ignored");
            return events;
        }
        while let Some(fired) = self.timers.pop_due(now_ms) {
            self.clock_ms = fired.due_ms;
            match fired.kind {
                TimerKind::Settle => self.begin_running(&mut events),
                TimerKind::Countdown => self.on_countdown(&mut events),
                TimerKind::PhaseTransition => self.on_phase_end(&mut events),
                TimerKind::PhaseDisplay => self.on_display(&mut events),
            }
            if self.is_ended() {
                return events;
            }
        }
        self.clock_ms = now_ms;
        events
    }

    pub fn advance_by(&mut self, delta_ms: u64) -> Vec<Event> {
        self.advance_to(self.clock_ms.saturating_add(delta_ms))
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn begin_running(&mut self, events: &mut Vec<Event>) {
        // Armed before the first phase so it fires first on shared deadlines.
        self.countdown = Some(self.timers.every(
            TimerKind::Countdown,
            self.clock_ms + COUNTDOWN_TICK_MS,
            COUNTDOWN_TICK_MS,
        ));
        let first = self.scheduler.first_index();
        self.announce(first, events);
        self.enter_phase(first, events);
    }

    fn on_phase_end(&mut self, events: &mut Vec<Event>) {
        let next = self.scheduler.upcoming_index();
        self.announce(next, events);
        self.enter_phase(next, events);
    }

    fn on_display(&mut self, events: &mut Vec<Event>) {
        let elapsed = self.scheduler.refresh(self.clock_ms);
        events.push(Event::DisplayTick {
            phase_index: self.scheduler.phase_index(),
            phase_elapsed_ms: elapsed,
            at_ms: self.clock_ms,
        });
    }

    fn on_countdown(&mut self, events: &mut Vec<Event>) {
        self.elapsed_whole = (self.elapsed_whole + 1).min(self.total_secs);
        let remaining = self.remaining_secs();
        events.push(Event::CountdownTick {
            elapsed_secs: self.elapsed_whole,
            remaining_secs: remaining,
            at_ms: self.clock_ms,
        });
        if remaining == 0 {
            self.finish(EndReason::Completed, events);
        }
    }

    fn announce(&mut self, index: usize, events: &mut Vec<Event>) {
        let name = self.technique.phases[index].name;
        match self.cues.announce(name) {
            CueOutcome::Silent => {}
            CueOutcome::Played(cue) => events.push(Event::CuePlayed {
                cue,
                volume: self.cues.volume(),
                at_ms: self.clock_ms,
            }),
            CueOutcome::Failed(cue, e) => events.push(Event::CueFailed {
                cue,
                error: e.to_string(),
                at_ms: self.clock_ms,
            }),
        }
    }

    fn enter_phase(&mut self, index: usize, events: &mut Vec<Event>) {
        self.scheduler.enter(index, &mut self.timers, self.clock_ms);
        let phase = &self.technique.phases[index];
        let visual = self.visuals.get(phase.name);
        tracing::debug!(phase_index = index, phase = %phase.name, at_ms = self.clock_ms, "phase entered");
        events.push(Event::PhaseEntered {
            phase_index: index,
            phase: phase.name,
            duration_ms: phase.duration_ms(),
            scale: visual.scale,
            tone: visual.tone,
            at_ms: self.clock_ms,
        });
    }

    fn finish(&mut self, reason: EndReason, events: &mut Vec<Event>) {
        self.scheduler.end(&mut self.timers);
        if let Some(id) = self.countdown.take() {
            self.timers.cancel(id);
        }
        // Settle timer, if the session never got past pending.
        let released = self.timers.cancel_all();
        self.end_reason = Some(reason);
        tracing::info!(
            technique = %self.technique.id,
            ?reason,
            elapsed_secs = self.elapsed_whole,
            released,
            "session ended"
        );
        events.push(Event::SessionEnded {
            reason,
            elapsed_secs: self.elapsed_whole,
            at_ms: self.clock_ms,
            at: Utc::now(),
        });
        if let Some(on_end) = self.on_end.take() {
            on_end(reason);
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.is_ended() {
            self.scheduler.end(&mut self.timers);
            let released = self.timers.cancel_all();
            tracing::debug!(technique = %self.technique.id, released, "session discarded before it ended");
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("technique", &self.technique.id)
            .field("state", &self.state())
            .field("total_secs", &self.total_secs)
            .field("elapsed_whole", &self.elapsed_whole)
            .field("clock_ms", &self.clock_ms)
            .field("armed_timers", &self.timers.len())
            .field("cues", &self.cues)
            .finish()
    }
}
