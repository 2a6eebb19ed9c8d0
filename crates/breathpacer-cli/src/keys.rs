//! Keyboard controls for a live session.
//!
//! Keys are read on a plain thread (crossterm's reader blocks) and sent to
//! the driver as [`Control`]s. The terminal is in raw mode meanwhile, so
//! Ctrl-C arrives as a key rather than a signal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use tokio::sync::mpsc::UnboundedSender;

use breathpacer_core::pacer::driver::Control;

/// Volume change per key press.
pub const VOLUME_STEP: f64 = 0.1;

pub const HELP: &str = "+/- volume | m mute | q quit";

/// Map a key press to a session control.
pub fn control_for(key: KeyEvent) -> Option<Control> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Control::End);
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Some(Control::End),
        KeyCode::Char('+') | KeyCode::Char('=') | KeyCode::Up => {
            Some(Control::AdjustVolume(VOLUME_STEP))
        }
        KeyCode::Char('-') | KeyCode::Down => Some(Control::AdjustVolume(-VOLUME_STEP)),
        KeyCode::Char('m') => Some(Control::SetVolume(0.0)),
        _ => None,
    }
}

/// Raw mode for as long as the guard lives.
pub struct RawMode;

impl RawMode {
    pub fn enable() -> std::io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            tracing::warn!("failed to restore terminal: {e}");
        }
    }
}

/// Key reader thread. Stops when `stop` is set or the driver hangs up.
pub struct KeyReader {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl KeyReader {
    pub fn spawn(tx: UnboundedSender<Control>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let handle = std::thread::spawn(move || {
            while !flag.load(Ordering::Relaxed) {
                // Poll with a timeout so `stop` is noticed.
                match event::poll(Duration::from_millis(100)) {
                    Ok(false) => continue,
                    Ok(true) => {}
                    Err(e) => {
                        tracing::warn!("event poll failed: {e}");
                        break;
                    }
                }
                let key = match event::read() {
                    Ok(Event::Key(key)) => key,
                    Ok(_) => continue,
                    Err(e) => {
                        tracing::warn!("event read failed: {e}");
                        break;
                    }
                };
                if let Some(control) = control_for(key) {
                    if tx.send(control).is_err() {
                        break;
                    }
                }
            }
        });
        Self {
            stop,
            handle: Some(handle),
        }
    }
}

impl Drop for KeyReader {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("key reader panicked");
            }
        }
    }
}
