//! Presentation state handed to a renderer.

use serde::{Deserialize, Serialize};

use crate::technique::PhaseName;
use crate::visual::OrbTone;

/// `M:SS`, minutes unpadded.
pub fn format_countdown(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Which breathing cycle the user is in, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleProgress {
    pub current: u32,
    pub total: u32,
}

impl CycleProgress {
    /// `None` when the cycle length is zero. `current` never exceeds
    /// `total`, so the final frame of a session reads "N/N".
    pub fn compute(elapsed_secs: u32, total_secs: u32, cycle_secs: f64) -> Option<Self> {
        if cycle_secs.is_nan() || cycle_secs <= 0.0 {
            return None;
        }
        let total = (f64::from(total_secs) / cycle_secs).ceil() as u32;
        let current = ((f64::from(elapsed_secs) / cycle_secs).floor() as u32 + 1).min(total.max(1));
        Some(Self { current, total })
    }

    /// Label used when the cycle length is unknown.
    pub const STARTING: &'static str = "Starting...";
}

impl std::fmt::Display for CycleProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} cycles", self.current, self.total)
    }
}

/// Everything a frame of the pacer shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacerView {
    pub technique_name: String,
    /// Session time left, `M:SS`.
    pub countdown: String,
    pub phase: PhaseName,
    /// Hidden during a held pause.
    pub instruction: Option<String>,
    /// Whole seconds left in the phase, rounded up.
    pub phase_seconds_left: Option<u32>,
    pub cycle: Option<CycleProgress>,
    pub scale: f64,
    pub tone: OrbTone,
    /// How long the orb takes to reach `scale`.
    pub transition_secs: f64,
    pub volume: f64,
}

impl PacerView {
    pub fn cycle_label(&self) -> String {
        match self.cycle {
            Some(c) => c.to_string(),
            None => CycleProgress::STARTING.to_string(),
        }
    }
}

/// Whole seconds, rounded up, of a millisecond span.
pub fn ceil_secs(ms: u64) -> u32 {
    ms.div_ceil(1000) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_format() {
        assert_eq!(format_countdown(300), "5:00");
        assert_eq!(format_countdown(65), "1:05");
        assert_eq!(format_countdown(9), "0:09");
        assert_eq!(format_countdown(0), "0:00");
        assert_eq!(format_countdown(600), "10:00");
    }

    #[test]
    fn cycle_progress_for_coherent_breathing() {
        let c = CycleProgress::compute(0, 300, 10.0).unwrap();
        assert_eq!(c.to_string(), "1/30 cycles");
        let c = CycleProgress::compute(95, 300, 10.0).unwrap();
        assert_eq!(c.to_string(), "10/30 cycles");
    }

    #[test]
    fn cycle_progress_rounds_total_up() {
        // 120s of an 11.5s cycle is 10.43 cycles.
        let c = CycleProgress::compute(0, 120, 11.5).unwrap();
        assert_eq!(c.total, 11);
    }

    #[test]
    fn cycle_progress_is_capped_at_the_end() {
        let c = CycleProgress::compute(300, 300, 10.0).unwrap();
        assert_eq!(c.to_string(), "30/30 cycles");
        let c = CycleProgress::compute(120, 120, 11.5).unwrap();
        assert_eq!(c.to_string(), "11/11 cycles");
    }

    #[test]
    fn zero_cycle_has_no_progress() {
        assert!(CycleProgress::compute(10, 300, 0.0).is_none());
    }

    #[test]
    fn ceil_secs_rounds_up() {
        assert_eq!(ceil_secs(0), 0);
        assert_eq!(ceil_secs(1), 1);
        assert_eq!(ceil_secs(4_000), 4);
        assert_eq!(ceil_secs(4_001), 5);
    }
}
