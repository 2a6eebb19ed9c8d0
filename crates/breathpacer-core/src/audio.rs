//! Audio cue dispatch.
//!
//! Two cues exist: one announcing an inflating phase, one announcing a
//! releasing phase. Playback goes through the [`CuePlayer`] trait and is
//! fire-and-forget: a failed play is logged and reported as an event but
//! never reaches the scheduler.

use serde::{Deserialize, Serialize};

use crate::error::CueError;
use crate::technique::PhaseName;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cue {
    Inhale,
    Exhale,
}

impl Cue {
    pub fn as_str(self) -> &'static str {
        match self {
            Cue::Inhale => "inhale",
            Cue::Exhale => "exhale",
        }
    }
}

/// Default volume for a new session.
pub const DEFAULT_VOLUME: f64 = 0.5;

/// Plays one of the two cues.
///
/// Implementations restart the cue from the beginning on every call,
/// even if it is still sounding from a previous call.
pub trait CuePlayer {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Start `cue` at `volume` (0.0 ..= 1.0). Must not block.
    fn play(&mut self, cue: Cue, volume: f64) -> Result<(), CueError>;
}

/// Player that accepts every cue and produces no sound.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentPlayer;

impl CuePlayer for SilentPlayer {
    fn name(&self) -> &str {
        "silent"
    }

    fn play(&mut self, _cue: Cue, _volume: f64) -> Result<(), CueError> {
        Ok(())
    }
}

/// Result of asking the dispatcher to announce a phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CueOutcome {
    /// The phase has no cue.
    Silent,
    Played(Cue),
    Failed(Cue, CueError),
}

/// Owns the player and the session volume.
pub struct CueDispatcher {
    player: Box<dyn CuePlayer>,
    volume: f64,
}

impl CueDispatcher {
    pub fn new(player: Box<dyn CuePlayer>, volume: f64) -> Self {
        Self {
            player,
            volume: clamp_volume(volume).unwrap_or(DEFAULT_VOLUME),
        }
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Set the volume used by the next cue. Values are clamped to
    /// `0.0..=1.0`; NaN leaves the volume unchanged.
    pub fn set_volume(&mut self, volume: f64) -> f64 {
        match clamp_volume(volume) {
            Some(v) => self.volume = v,
            None => tracing::warn!("ignoring non-numeric volume {}", volume),
        }
        self.volume
    }

    /// Play the cue belonging to `phase`, if any.
    pub fn announce(&mut self, phase: PhaseName) -> CueOutcome {
        let Some(cue) = phase.cue() else {
            return CueOutcome::Silent;
        };
        match self.player.play(cue, self.volume) {
            Ok(()) => {
                tracing::debug!(cue = cue.as_str(), player = self.player.name(), "cue played");
                CueOutcome::Played(cue)
            }
            Err(e) => {
                tracing::warn!(cue = cue.as_str(), player = self.player.name(), "cue playback failed: {e}");
                CueOutcome::Failed(cue, e)
            }
        }
    }
}

impl std::fmt::Debug for CueDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CueDispatcher")
            .field("player", &self.player.name())
            .field("volume", &self.volume)
            .finish()
    }
}

fn clamp_volume(volume: f64) -> Option<f64> {
    if volume.is_nan() {
        None
    } else {
        Some(volume.clamp(0.0, 1.0))
    }
}
