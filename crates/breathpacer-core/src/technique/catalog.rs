//! Built-in technique catalog.
//!
//! The built-ins are immutable at runtime. User techniques from the
//! config file are appended after validation and may not reuse a
//! built-in id.

use std::collections::HashSet;

use super::{Citation, Phase, PhaseName, Technique, VisualOverride};
use crate::error::ValidationError;
use crate::visual::{OrbTone, Visual};

/// A selectable session length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationPreset {
    pub label: &'static str,
    pub secs: u32,
}

/// Session lengths offered next to every technique.
pub const DURATION_PRESETS: [DurationPreset; 3] = [
    DurationPreset { label: "2 min", secs: 120 },
    DurationPreset { label: "5 min", secs: 300 },
    DurationPreset { label: "10 min", secs: 600 },
];

#[derive(Debug, Clone)]
pub struct Catalog {
    techniques: Vec<Technique>,
}

impl Catalog {
    /// The four techniques shipped with the app.
    pub fn builtin() -> Self {
        Self {
            techniques: vec![
                extended_exhale(),
                coherent(),
                cyclic_sighing(),
                humming_breath(),
            ],
        }
    }

    /// Built-ins followed by `custom`, each validated.
    pub fn with_custom(custom: Vec<Technique>) -> Result<Self, ValidationError> {
        let mut catalog = Self::builtin();
        let mut seen: HashSet<String> = catalog.techniques.iter().map(|t| t.id.clone()).collect();
        for technique in custom {
            technique.validate()?;
            if !seen.insert(technique.id.clone()) {
                return Err(ValidationError::DuplicateTechnique(technique.id));
            }
            catalog.techniques.push(technique);
        }
        Ok(catalog)
    }

    pub fn get(&self, id: &str) -> Option<&Technique> {
        self.techniques.iter().find(|t| t.id == id)
    }

    pub fn require(&self, id: &str) -> Result<&Technique, ValidationError> {
        self.get(id)
            .ok_or_else(|| ValidationError::UnknownTechnique(id.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Technique> {
        self.techniques.iter()
    }

    pub fn len(&self) -> usize {
        self.techniques.len()
    }

    pub fn is_empty(&self) -> bool {
        self.techniques.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn extended_exhale() -> Technique {
    Technique {
        id: "4-8".into(),
        name: "4-8 Extended Exhale".into(),
        tagline: "Deep calm & sleep prep".into(),
        best_for: strings(&["Sleep prep", "Anxiety downshift", "Post-stress calm"]),
        instructions: strings(&[
            "Posture neutral; shoulders soft.",
            "Inhale for 4s through the nose.",
            "Exhale for 8s through pursed lips (steady, quiet).",
            "No breath holds. Keep volume low and effortless.",
        ]),
        phases: vec![
            Phase::new(PhaseName::Inhale, "Breathe In...", 4.0),
            Phase::new(PhaseName::Exhale, "Breathe Out...", 8.0),
        ],
        why_it_works: "Longer exhale increases parasympathetic (rest-and-digest) drive. \
            Pursed lips gently raise airway pressure, slowing breath flow and promoting relaxation."
            .into(),
        evidence: vec![
            Citation::pmc("Komori et al., 2018", 6037091),
            Citation::pmc("Meehan & Shaffer, 2024", 11310264),
            Citation::pubmed("Bae et al., 2021", 34289128),
        ],
        visual_overrides: Vec::new(),
    }
}

fn coherent() -> Technique {
    Technique {
        id: "5-5".into(),
        name: "5-5 Coherent Breathing".into(),
        tagline: "Steady focus & balance".into(),
        best_for: strings(&["BP support", "HRV training", "Steady focus"]),
        instructions: strings(&[
            "Sit or lie; jaw and throat relaxed.",
            "Inhale for 5s through the nose.",
            "Exhale for 5s through the nose.",
            "Maintain a smooth, light, continuous rhythm.",
        ]),
        phases: vec![
            Phase::new(PhaseName::Inhale, "Breathe In...", 5.0),
            Phase::new(PhaseName::Exhale, "Breathe Out...", 5.0),
        ],
        why_it_works: "Breathing at a rhythm of ~6 breaths/min couples with the body's baroreflex \
            rhythm, improving heart rate variability (HRV) and promoting balanced alertness."
            .into(),
        evidence: vec![
            Citation::pmc("Chaitanya et al., 2022", 8924557),
            Citation::pmc("Steffen et al., 2017", 5575449),
            Citation::pmc("Garg et al., 2023", 10765252),
        ],
        visual_overrides: Vec::new(),
    }
}

fn cyclic_sighing() -> Technique {
    let look = |phase, scale, tone| VisualOverride {
        phase,
        visual: Visual { scale, tone },
    };
    Technique {
        id: "cyclic-sighing".into(),
        name: "Cyclic Sighing".into(),
        tagline: "Fast reset for anxiety".into(),
        best_for: strings(&["Acute anxiety relief", "Quick reset", "Emotional release"]),
        instructions: strings(&[
            "Inhale through the nose, filling about 2/3 of your lungs.",
            "Take a short, second sip of air to fully inflate the lungs.",
            "Let go with a long, unforced exhale through the mouth.",
        ]),
        phases: vec![
            Phase::new(PhaseName::Inhale, "Breathe In...", 3.0),
            Phase::new(PhaseName::InhalePause, "", 0.5),
            Phase::new(PhaseName::SipInhale, "Sip more air...", 2.0),
            Phase::new(PhaseName::Exhale, "Long sigh out...", 6.0),
        ],
        why_it_works: "The double inhale helps to reinflate tiny air sacs (alveoli) in the lungs. \
            The long exhale then triggers a strong parasympathetic response, leading to a quick \
            drop in arousal and stress."
            .into(),
        evidence: vec![Citation::pmc("Balban et al., 2023", 9873947)],
        visual_overrides: vec![
            look(PhaseName::Inhale, 0.8, OrbTone::Inhale),
            look(PhaseName::InhalePause, 0.8, OrbTone::Inhale),
            look(PhaseName::SipInhale, 1.0, OrbTone::Sip),
            look(PhaseName::Exhale, 0.6, OrbTone::Exhale),
        ],
    }
}

fn humming_breath() -> Technique {
    Technique {
        id: "humming-breath".into(),
        name: "Humming Breath".into(),
        tagline: "Gentle calm & mood lift".into(),
        best_for: strings(&["Mood lift", "Vagal tone", "Sinus/sleep support"]),
        instructions: strings(&[
            "Inhale gently through the nose.",
            "Exhale with a soft, continuous \"mmm\" hum.",
            "Keep your mouth closed and jaw relaxed.",
            "Avoid straining your throat or ears.",
        ]),
        phases: vec![
            Phase::new(PhaseName::Inhale, "Breathe In...", 4.0),
            Phase::new(PhaseName::Hum, "Hum Out...", 6.0),
        ],
        why_it_works: "Humming boosts nasal nitric oxide, a molecule that helps with circulation \
            and respiration. The vibration also provides gentle stimulation to the vagus nerve, \
            promoting a calm, clear state."
            .into(),
        evidence: vec![
            Citation::pubmed("Weitzberg & Lundberg, 2002", 12119224),
            Citation::pmc("Upadhyay et al., 2023", 10388195),
        ],
        visual_overrides: Vec::new(),
    }
}
