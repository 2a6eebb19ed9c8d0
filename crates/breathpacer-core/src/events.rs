use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::audio::Cue;
use crate::pacer::{EndReason, SchedulerState};
use crate::technique::PhaseName;
use crate::view::CycleProgress;
use crate::visual::OrbTone;

/// Every state change of a session produces an Event.
/// `at_ms` is the session clock (ms since the session was created).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        technique_id: String,
        duration_secs: u32,
        settle_delay_ms: u64,
        at: DateTime<Utc>,
    },
    PhaseEntered {
        phase_index: usize,
        phase: PhaseName,
        duration_ms: u64,
        /// Orb target for this phase; the animation runs for `duration_ms`.
        scale: f64,
        tone: OrbTone,
        at_ms: u64,
    },
    CuePlayed {
        cue: Cue,
        volume: f64,
        at_ms: u64,
    },
    /// Playback was rejected. The session carries on.
    CueFailed {
        cue: Cue,
        error: String,
        at_ms: u64,
    },
    CountdownTick {
        elapsed_secs: u32,
        remaining_secs: u32,
        at_ms: u64,
    },
    DisplayTick {
        phase_index: usize,
        phase_elapsed_ms: u64,
        at_ms: u64,
    },
    SessionEnded {
        reason: EndReason,
        elapsed_secs: u32,
        at_ms: u64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: SchedulerState,
        technique_id: String,
        phase_index: usize,
        phase: PhaseName,
        phase_remaining_ms: u64,
        remaining_secs: u32,
        cycle: Option<CycleProgress>,
        volume: f64,
        at_ms: u64,
    },
}

impl Event {
    /// High-frequency display refreshes are usually filtered from logs.
    pub fn is_display_tick(&self) -> bool {
        matches!(self, Event::DisplayTick { .. })
    }
}
