//! Breathing techniques: ordered, cyclic phase sequences plus the
//! descriptive material shown when picking one.

mod catalog;
mod phase;

pub use catalog::{Catalog, DurationPreset, DURATION_PRESETS};
pub use phase::{Phase, PhaseName};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::visual::Visual;

/// Where a cited study can be looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum CitationSource {
    Pmc(u32),
    Pubmed(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Author/year label, e.g. "Balban et al., 2023".
    pub label: String,
    pub source: CitationSource,
}

impl Citation {
    pub fn pmc(label: impl Into<String>, id: u32) -> Self {
        Self {
            label: label.into(),
            source: CitationSource::Pmc(id),
        }
    }

    pub fn pubmed(label: impl Into<String>, id: u32) -> Self {
        Self {
            label: label.into(),
            source: CitationSource::Pubmed(id),
        }
    }

    pub fn url(&self) -> String {
        match self.source {
            CitationSource::Pmc(id) => format!("https://www.ncbi.nlm.nih.gov/pmc/articles/PMC{id}/"),
            CitationSource::Pubmed(id) => format!("https://pubmed.ncbi.nlm.nih.gov/{id}/"),
        }
    }

    /// Reference as printed after the label: "PMC9873947" / "PubMed 12119224".
    pub fn reference(&self) -> String {
        match self.source {
            CitationSource::Pmc(id) => format!("PMC{id}"),
            CitationSource::Pubmed(id) => format!("PubMed {id}"),
        }
    }
}

/// Replaces the default look of one phase for a specific technique.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisualOverride {
    pub phase: PhaseName,
    #[serde(flatten)]
    pub visual: Visual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Technique {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub best_for: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
    pub phases: Vec<Phase>,
    #[serde(default)]
    pub why_it_works: String,
    #[serde(default)]
    pub evidence: Vec<Citation>,
    #[serde(default)]
    pub visual_overrides: Vec<VisualOverride>,
}

impl Technique {
    /// Minimal technique with only an id, a name and its phases.
    pub fn new(id: impl Into<String>, name: impl Into<String>, phases: Vec<Phase>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            tagline: String::new(),
            best_for: Vec::new(),
            instructions: Vec::new(),
            phases,
            why_it_works: String::new(),
            evidence: Vec::new(),
            visual_overrides: Vec::new(),
        }
    }

    pub fn with_overrides(mut self, overrides: Vec<VisualOverride>) -> Self {
        self.visual_overrides = overrides;
        self
    }

    /// Sum of phase durations in seconds.
    pub fn cycle_secs(&self) -> f64 {
        self.phases.iter().map(|p| p.duration_secs).sum()
    }

    /// Sum of phase durations in milliseconds.
    pub fn cycle_ms(&self) -> u64 {
        self.phases.iter().map(Phase::duration_ms).sum()
    }

    /// Check that this technique can drive a session.
    ///
    /// Zero-length phases are accepted (the pacer passes through them);
    /// a cycle made only of zero-length phases is not.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::invalid("id", "technique id is empty"));
        }
        if self.phases.is_empty() {
            return Err(ValidationError::EmptyCollection(format!(
                "technique '{}' has no phases",
                self.id
            )));
        }
        for (i, phase) in self.phases.iter().enumerate() {
            if !phase.duration_secs.is_finite() || phase.duration_secs < 0.0 {
                return Err(ValidationError::invalid(
                    format!("phases[{i}].duration_secs"),
                    format!("must be a finite number >= 0, got {}", phase.duration_secs),
                ));
            }
        }
        if self.cycle_ms() == 0 {
            return Err(ValidationError::invalid(
                "phases",
                format!("technique '{}' has a zero-length cycle", self.id),
            ));
        }
        for o in &self.visual_overrides {
            if !o.visual.scale.is_finite() || o.visual.scale <= 0.0 {
                return Err(ValidationError::invalid(
                    format!("visual_overrides.{}", o.phase),
                    "scale must be a positive number",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_phase(a: f64, b: f64) -> Technique {
        Technique::new(
            "t",
            "Test",
            vec![
                Phase::new(PhaseName::Inhale, "In", a),
                Phase::new(PhaseName::Exhale, "Out", b),
            ],
        )
    }

    #[test]
    fn cycle_length_sums_phases() {
        let t = two_phase(4.0, 8.0);
        assert_eq!(t.cycle_secs(), 12.0);
        assert_eq!(t.cycle_ms(), 12_000);
    }

    #[test]
    fn validate_rejects_empty_phases() {
        let t = Technique::new("t", "Test", vec![]);
        assert!(matches!(t.validate(), Err(ValidationError::EmptyCollection(_))));
    }

    #[test]
    fn validate_rejects_negative_and_nan_durations() {
        assert!(two_phase(-1.0, 4.0).validate().is_err());
        assert!(two_phase(f64::NAN, 4.0).validate().is_err());
        assert!(two_phase(f64::INFINITY, 4.0).validate().is_err());
    }

    #[test]
    fn validate_accepts_zero_phase_but_not_zero_cycle() {
        assert!(two_phase(0.0, 4.0).validate().is_ok());
        assert!(two_phase(0.0, 0.0).validate().is_err());
    }

    #[test]
    fn citation_urls() {
        assert_eq!(
            Citation::pmc("Balban et al., 2023", 9873947).url(),
            "https://www.ncbi.nlm.nih.gov/pmc/articles/PMC9873947/"
        );
        let c = Citation::pubmed("Weitzberg & Lundberg, 2002", 12119224);
        assert_eq!(c.url(), "https://pubmed.ncbi.nlm.nih.gov/12119224/");
        assert_eq!(c.reference(), "PubMed 12119224");
    }
}
