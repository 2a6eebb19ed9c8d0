//! Real-time driver.
//!
//! Maps the session clock onto `tokio::time` and sleeps until the next
//! armed deadline, so ticks land on time without polling. Runs on the
//! caller's task; no spawning, nothing needs to be `Send`.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::Instant;

use super::session::{EndReason, Session};
use crate::events::Event;

/// User input applied to a running session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Control {
    /// Set the cue volume.
    SetVolume(f64),
    /// Change the cue volume by this much.
    AdjustVolume(f64),
    /// Stop before the duration elapses.
    End,
}

/// Drive `session` until it completes or `shutdown` resolves.
///
/// The session must already be started. Every event is handed to `sink`
/// in firing order, together with the session as it stands after the
/// batch the event belongs to. When `shutdown` wins, the session is
/// ended early and its `SessionEnded` event is delivered too.
pub async fn run<S, F>(session: &mut Session, shutdown: S, sink: F) -> Option<EndReason>
where
    S: Future<Output = ()>,
    F: FnMut(&Event, &Session),
{
    let (_tx, controls) = tokio::sync::mpsc::unbounded_channel();
    run_with_controls(session, shutdown, controls, sink).await
}

/// [`run`], also applying [`Control`]s as they arrive.
///
/// A volume change is followed by a `StateSnapshot` event so the sink can
/// show the new value. Once every sender is dropped, controls are no
/// longer polled.
pub async fn run_with_controls<S, F>(
    session: &mut Session,
    shutdown: S,
    mut controls: UnboundedReceiver<Control>,
    mut sink: F,
) -> Option<EndReason>
where
    S: Future<Output = ()>,
    F: FnMut(&Event, &Session),
{
    let origin = Instant::now() - Duration::from_millis(session.clock_ms());
    let mut listening = true;
    tokio::pin!(shutdown);

    while !session.is_ended() {
        let Some(due_ms) = session.next_due_ms() else {
            tracing::warn!("session has no armed timers; driver stopping");
            break;
        };
        let deadline = origin + Duration::from_millis(due_ms);

        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => {
                let now_ms = origin.elapsed().as_millis() as u64;
                let events = session.advance_to(now_ms.max(due_ms));
                for event in &events {
                    sink(event, session);
                }
            }
            control = controls.recv(), if listening => match control {
                Some(control) => {
                    // Bring the clock up to now so the snapshot is current.
                    let now_ms = (origin.elapsed().as_millis() as u64).min(due_ms.saturating_sub(1));
                    for event in &session.advance_to(now_ms) {
                        sink(event, session);
                    }
                    if let Some(event) = apply(session, control) {
                        sink(&event, session);
                    }
                }
                None => listening = false,
            },
            _ = &mut shutdown => {
                tracing::info!("shutdown requested; ending session early");
                if let Some(event) = session.end() {
                    sink(&event, session);
                }
            }
        }
    }

    session.end_reason()
}

fn apply(session: &mut Session, control: Control) -> Option<Event> {
    match control {
        Control::SetVolume(volume) => {
            let applied = session.set_volume(volume);
            tracing::debug!(volume = applied, "volume set");
            Some(session.snapshot())
        }
        Control::AdjustVolume(delta) => {
            let applied = session.set_volume(session.volume() + delta);
            tracing::debug!(volume = applied, "volume adjusted");
            Some(session.snapshot())
        }
        Control::End => {
            tracing::info!("end requested; ending session early");
            session.end()
        }
    }
}
