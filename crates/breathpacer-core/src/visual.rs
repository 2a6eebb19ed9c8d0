//! Orb appearance per phase.
//!
//! The look of every phase is resolved once, when a session is created,
//! into a [`VisualTable`]: defaults by breath direction, then the
//! technique's own overrides on top.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::technique::{PhaseName, Technique};

/// Scale of the orb before the first phase starts.
pub const PENDING_SCALE: f64 = 0.6;

/// Fully expanded orb.
pub const EXPANDED_SCALE: f64 = 1.0;

/// Contracted orb.
pub const CONTRACTED_SCALE: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrbTone {
    /// Dark teal.
    Inhale,
    /// Dark purple.
    Exhale,
    /// Dark pink, used for the second "sip" of a double inhale.
    Sip,
}

impl OrbTone {
    pub fn hex(self) -> &'static str {
        match self {
            OrbTone::Inhale => "#2D6B7A",
            OrbTone::Exhale => "#4C3B7A",
            OrbTone::Sip => "#99345D",
        }
    }

    /// (r, g, b) of [`OrbTone::hex`].
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            OrbTone::Inhale => (0x2D, 0x6B, 0x7A),
            OrbTone::Exhale => (0x4C, 0x3B, 0x7A),
            OrbTone::Sip => (0x99, 0x34, 0x5D),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Visual {
    pub scale: f64,
    pub tone: OrbTone,
}

impl Visual {
    /// Look used when a technique has no override for `phase`.
    pub fn default_for(phase: PhaseName) -> Self {
        if phase.is_inflating() {
            Visual {
                scale: EXPANDED_SCALE,
                tone: OrbTone::Inhale,
            }
        } else {
            Visual {
                scale: CONTRACTED_SCALE,
                tone: OrbTone::Exhale,
            }
        }
    }
}

/// Phase name -> look, fixed for the lifetime of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualTable {
    entries: BTreeMap<PhaseName, Visual>,
}

impl VisualTable {
    pub fn resolve(technique: &Technique) -> Self {
        let mut entries: BTreeMap<PhaseName, Visual> = PhaseName::ALL
            .iter()
            .map(|&name| (name, Visual::default_for(name)))
            .collect();
        for o in &technique.visual_overrides {
            entries.insert(o.phase, o.visual);
        }
        Self { entries }
    }

    pub fn get(&self, phase: PhaseName) -> Visual {
        self.entries
            .get(&phase)
            .copied()
            .unwrap_or_else(|| Visual::default_for(phase))
    }

    /// Look for `phase`, with the pre-start contraction applied when
    /// `pending` is set. The tone is kept so the orb does not flash.
    pub fn visual(&self, phase: PhaseName, pending: bool) -> Visual {
        let v = self.get(phase);
        if pending {
            Visual {
                scale: PENDING_SCALE,
                ..v
            }
        } else {
            v
        }
    }
}
