//! Terminal bell cue player.
//!
//! A terminal has one sound, so both cues ring the bell once. The bell
//! cannot be made quieter; volume 0 is treated as muted.

use std::io::Write;

use breathpacer_core::{Cue, CueError, CuePlayer};

pub struct BellPlayer<W: Write> {
    out: W,
}

impl BellPlayer<std::io::Stderr> {
    /// Rings on stderr so it never interleaves with `--json` output.
    pub fn stderr() -> Self {
        Self {
            out: std::io::stderr(),
        }
    }
}

impl<W: Write> BellPlayer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> CuePlayer for BellPlayer<W> {
    fn name(&self) -> &str {
        "bell"
    }

    fn play(&mut self, _cue: Cue, volume: f64) -> Result<(), CueError> {
        if volume <= 0.0 {
            return Ok(());
        }
        self.out
            .write_all(b"\x07")
            .and_then(|()| self.out.flush())
            .map_err(|e| CueError::Unavailable(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Closed;

    impl Write for Closed {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn rings_once_per_cue() {
        let mut bell = BellPlayer::new(Vec::new());
        bell.play(Cue::Inhale, 0.5).unwrap();
        bell.play(Cue::Exhale, 1.0).unwrap();
        assert_eq!(bell.out, b"\x07\x07");
    }

    #[test]
    fn zero_volume_is_muted() {
        let mut bell = BellPlayer::new(Vec::new());
        bell.play(Cue::Inhale, 0.0).unwrap();
        assert!(bell.out.is_empty());
    }

    #[test]
    fn write_failure_maps_to_cue_error() {
        let mut bell = BellPlayer::new(Closed);
        assert!(matches!(
            bell.play(Cue::Exhale, 0.5),
            Err(CueError::Unavailable(_))
        ));
    }
}
