use serde::{Deserialize, Serialize};

use crate::audio::Cue;

/// The kind of breath a phase asks for.
///
/// Serialized with the labels shown on screen ("Sip Inhale", not
/// `SipInhale`) so hand-written technique files read naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PhaseName {
    Inhale,
    Exhale,
    #[serde(rename = "Sip Inhale")]
    SipInhale,
    Hum,
    #[serde(rename = "Inhale Pause")]
    InhalePause,
}

impl PhaseName {
    pub const ALL: [PhaseName; 5] = [
        PhaseName::Inhale,
        PhaseName::Exhale,
        PhaseName::SipInhale,
        PhaseName::Hum,
        PhaseName::InhalePause,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PhaseName::Inhale => "Inhale",
            PhaseName::Exhale => "Exhale",
            PhaseName::SipInhale => "Sip Inhale",
            PhaseName::Hum => "Hum",
            PhaseName::InhalePause => "Inhale Pause",
        }
    }

    /// Whether the lungs are filling (or held full) during this phase.
    pub fn is_inflating(self) -> bool {
        matches!(
            self,
            PhaseName::Inhale | PhaseName::SipInhale | PhaseName::InhalePause
        )
    }

    /// Cue announcing this phase. A held pause is silent.
    pub fn cue(self) -> Option<Cue> {
        match self {
            PhaseName::Inhale | PhaseName::SipInhale => Some(Cue::Inhale),
            PhaseName::Exhale | PhaseName::Hum => Some(Cue::Exhale),
            PhaseName::InhalePause => None,
        }
    }

    /// Pauses show no instruction or countdown inside the orb.
    pub fn shows_instruction(self) -> bool {
        self != PhaseName::InhalePause
    }
}

impl std::fmt::Display for PhaseName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    pub name: PhaseName,
    #[serde(default)]
    pub instruction: String,
    /// Duration in seconds. Fractional values are allowed (0.5s pause).
    pub duration_secs: f64,
}

impl Phase {
    pub fn new(name: PhaseName, instruction: impl Into<String>, duration_secs: f64) -> Self {
        Self {
            name,
            instruction: instruction.into(),
            duration_secs,
        }
    }

    /// Duration in whole milliseconds, rounded to the nearest ms.
    ///
    /// Negative or non-finite durations collapse to zero; validation
    /// rejects them before a session ever sees them.
    pub fn duration_ms(&self) -> u64 {
        if self.duration_secs.is_finite() && self.duration_secs > 0.0 {
            (self.duration_secs * 1000.0).round() as u64
        } else {
            0
        }
    }
}
