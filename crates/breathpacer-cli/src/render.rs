//! Terminal output for running sessions.

use std::io::{self, Write};

use crossterm::cursor;
use crossterm::queue;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{self, ClearType};

use breathpacer_core::{EndReason, Event, PacerView, Session};

/// Widest orb, at scale 1.0.
const ORB_WIDTH: usize = 24;

pub struct Renderer {
    pub color: bool,
    pub show_cycles: bool,
    pub json: bool,
    /// Include display ticks in JSON output.
    pub ticks: bool,
    /// Redraw a single status line instead of printing one line per event.
    pub live: bool,
}

impl Renderer {
    pub fn handle(&mut self, event: &Event, session: &Session) {
        let mut out = io::stdout().lock();
        if let Err(e) = self.render(&mut out, event, session).and_then(|()| out.flush()) {
            tracing::warn!("failed to write output: {e}");
        }
    }

    pub fn render(&self, out: &mut impl Write, event: &Event, session: &Session) -> io::Result<()> {
        if self.json {
            if self.ticks || !event.is_display_tick() {
                let line = serde_json::to_string(event).map_err(io::Error::other)?;
                writeln!(out, "{line}")?;
            }
            return Ok(());
        }

        if !self.live {
            if let Some(line) = event_line(event) {
                writeln!(out, "{line}")?;
            }
            return Ok(());
        }

        match event {
            // "\r\n" so the line break also works in raw mode.
            Event::SessionEnded { reason, elapsed_secs, .. } => queue!(
                out,
                Print("\r\n"),
                Print(ended_line(*reason, *elapsed_secs)),
                Print("\r\n")
            ),
            Event::SessionStarted { .. } | Event::CuePlayed { .. } | Event::CueFailed { .. } => Ok(()),
            _ => draw_status(out, &session.view(), self.color, self.show_cycles),
        }
    }
}

/// Orb drawn as a bar whose width follows the scale.
pub fn orb(scale: f64) -> String {
    let filled = (scale.clamp(0.0, 1.0) * ORB_WIDTH as f64).round() as usize;
    let pad = (ORB_WIDTH - filled) / 2;
    format!(
        "{}{}{}",
        " ".repeat(pad),
        "●".repeat(filled),
        " ".repeat(ORB_WIDTH - filled - pad)
    )
}

/// Everything right of the orb: phase text, cycles, volume.
pub fn status_text(view: &PacerView, show_cycles: bool) -> String {
    let phase = match (&view.instruction, view.phase_seconds_left) {
        (Some(text), Some(secs)) => format!("{text} {secs}"),
        _ => String::new(),
    };
    let mut text = format!("{phase:<22}");
    if show_cycles {
        text.push_str(&format!("{:<14}", view.cycle_label()));
    }
    text.push_str(&format!("vol {:.0}%", view.volume * 100.0));
    text
}

/// Overwrite the current terminal line with the pacer status.
pub fn draw_status(
    out: &mut impl Write,
    view: &PacerView,
    color: bool,
    show_cycles: bool,
) -> io::Result<()> {
    queue!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(format!("{} [", view.countdown))
    )?;
    if color {
        let (r, g, b) = view.tone.rgb();
        queue!(
            out,
            SetForegroundColor(Color::Rgb { r, g, b }),
            Print(orb(view.scale)),
            ResetColor
        )?;
    } else {
        queue!(out, Print(orb(view.scale)))?;
    }
    queue!(out, Print("] "), Print(status_text(view, show_cycles)))
}

fn ended_line(reason: EndReason, elapsed_secs: u32) -> String {
    let what = match reason {
        EndReason::Completed => "Session complete",
        EndReason::EndedEarly => "Session ended",
    };
    format!("{what} after {}", breathpacer_core::format_countdown(elapsed_secs))
}

/// One line per event for non-live output. Display ticks are skipped.
pub fn event_line(event: &Event) -> Option<String> {
    let line = match event {
        Event::SessionStarted { technique_id, duration_secs, .. } => {
            format!("start     {technique_id} for {duration_secs}s")
        }
        Event::PhaseEntered { at_ms, phase_index, phase, duration_ms, scale, tone, .. } => format!(
            "{:>9} phase {phase_index} {phase} ({}s) scale {scale:.1} {}",
            stamp(*at_ms),
            *duration_ms as f64 / 1000.0,
            tone.hex()
        ),
        Event::CuePlayed { at_ms, cue, .. } => format!("{:>9} cue {}", stamp(*at_ms), cue.as_str()),
        Event::CueFailed { at_ms, cue, error } => {
            format!("{:>9} cue {} failed: {error}", stamp(*at_ms), cue.as_str())
        }
        Event::CountdownTick { at_ms, remaining_secs, .. } => format!(
            "{:>9} {}",
            stamp(*at_ms),
            breathpacer_core::format_countdown(*remaining_secs)
        ),
        Event::SessionEnded { at_ms, reason, elapsed_secs, .. } => {
            format!("{:>9} {}", stamp(*at_ms), ended_line(*reason, *elapsed_secs))
        }
        Event::DisplayTick { .. } | Event::StateSnapshot { .. } => return None,
    };
    Some(line)
}

fn stamp(at_ms: u64) -> String {
    format!("{}.{:03}s", at_ms / 1000, at_ms % 1000)
}
