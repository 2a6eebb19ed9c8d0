//! End-to-end pacer sessions on simulated time.
//!
//! Each test drives a session through its virtual clock and checks the
//! observable behaviour: cues, phase order, countdown, visuals, and the
//! end-of-session callback.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use breathpacer_core::pacer::TimerKind;
use breathpacer_core::{
    Catalog, Cue, CueError, CuePlayer, EndReason, Event, OrbTone, Phase, PhaseName,
    SchedulerState, Session, SessionOptions, Technique,
};

// ============================================================================
// Test Helpers
// ============================================================================

#[derive(Clone, Default)]
struct RecordingPlayer {
    played: Rc<RefCell<Vec<Cue>>>,
    reject: Rc<Cell<bool>>,
}

impl CuePlayer for RecordingPlayer {
    fn name(&self) -> &str {
        "recording"
    }

    fn play(&mut self, cue: Cue, _volume: f64) -> Result<(), CueError> {
        if self.reject.get() {
            return Err(CueError::Playback("play() request was blocked".into()));
        }
        self.played.borrow_mut().push(cue);
        Ok(())
    }
}

fn builtin(id: &str) -> Technique {
    Catalog::builtin().get(id).unwrap().clone()
}

fn no_settle() -> SessionOptions {
    SessionOptions {
        settle_delay_ms: 0,
        ..SessionOptions::default()
    }
}

fn entered(events: &[Event]) -> Vec<(usize, PhaseName)> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::PhaseEntered {
                phase_index, phase, ..
            } => Some((*phase_index, *phase)),
            _ => None,
        })
        .collect()
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn session_ends_exactly_at_duration() {
    let calls = Rc::new(Cell::new(0u32));
    let mut session = Session::new(
        builtin("4-8"),
        120,
        SessionOptions::default(),
        Box::new(RecordingPlayer::default()),
    )
    .unwrap();
    let c = Rc::clone(&calls);
    session.start(move |_| c.set(c.get() + 1));

    // Settle (50ms) + 120s - 1ms: still running.
    session.advance_to(50 + 120_000 - 1);
    assert_eq!(calls.get(), 0);
    assert_eq!(session.remaining_secs(), 1);

    let events = session.advance_to(50 + 120_000);
    assert_eq!(calls.get(), 1);
    assert!(matches!(
        events.last(),
        Some(Event::SessionEnded {
            reason: EndReason::Completed,
            elapsed_secs: 120,
            ..
        })
    ));
    assert_eq!(session.view().countdown, "0:00");
}

#[test]
fn early_end_stops_all_ticks() {
    let calls = Rc::new(Cell::new(0u32));
    let mut session = Session::new(
        builtin("humming-breath"),
        300,
        no_settle(),
        Box::new(RecordingPlayer::default()),
    )
    .unwrap();
    let c = Rc::clone(&calls);
    session.start(move |reason| {
        assert_eq!(reason, EndReason::EndedEarly);
        c.set(c.get() + 1);
    });
    session.advance_to(42_300);
    assert_eq!(session.armed(TimerKind::Countdown), 1);
    assert_eq!(session.armed(TimerKind::PhaseTransition), 1);
    assert_eq!(session.armed(TimerKind::PhaseDisplay), 1);

    session.end();
    session.end();
    assert_eq!(calls.get(), 1);
    assert_eq!(session.armed_timers(), 0);

    let after = session.advance_to(400_000);
    assert!(
        after.iter().all(|e| !matches!(e, Event::CountdownTick { .. })),
        "countdown ticked after end: {after:?}"
    );
    assert!(after.is_empty());
    assert_eq!(session.elapsed_secs(), 42);
    assert_eq!(session.state(), SchedulerState::Ended);
}

#[test]
fn dropping_a_session_does_not_call_back() {
    let calls = Rc::new(Cell::new(0u32));
    {
        let mut session = Session::new(
            builtin("5-5"),
            300,
            no_settle(),
            Box::new(RecordingPlayer::default()),
        )
        .unwrap();
        let c = Rc::clone(&calls);
        session.start(move |_| c.set(c.get() + 1));
        session.advance_to(12_000);
    }
    assert_eq!(calls.get(), 0);
}

// ============================================================================
// Phase progression
// ============================================================================

#[test]
fn phase_index_returns_after_full_cycle() {
    let mut session = Session::new(
        builtin("cyclic-sighing"),
        600,
        no_settle(),
        Box::new(RecordingPlayer::default()),
    )
    .unwrap();
    session.start(|_| {});
    let start = session.phase_index();

    // Phases: 3s, 0.5s, 2s, 6s.
    let order = entered(&session.advance_to(11_500));
    assert_eq!(
        order,
        vec![
            (1, PhaseName::InhalePause),
            (2, PhaseName::SipInhale),
            (3, PhaseName::Exhale),
            (0, PhaseName::Inhale),
        ]
    );
    assert_eq!(session.phase_index(), start);
}

#[test]
fn phase_elapsed_is_zero_after_transition_and_bounded() {
    let mut session = Session::new(
        builtin("4-8"),
        600,
        no_settle(),
        Box::new(RecordingPlayer::default()),
    )
    .unwrap();
    session.start(|_| {});

    session.advance_to(3_950);
    assert_eq!(session.phase_elapsed_ms(), 3_900);

    session.advance_to(4_000);
    assert_eq!(session.phase_index(), 1);
    assert_eq!(session.phase_elapsed_ms(), 0);

    for t in (4_000..40_000).step_by(37) {
        session.advance_to(t);
        let dur = session.current_phase().duration_secs * 1000.0;
        assert!(session.phase_elapsed_ms() as f64 <= dur);
    }
}

#[test]
fn single_phase_technique_cycles_to_itself() {
    let hum = Technique::new(
        "hum-only",
        "Hum Only",
        vec![Phase::new(PhaseName::Hum, "Hum...", 2.0)],
    );
    let player = RecordingPlayer::default();
    let played = Rc::clone(&player.played);
    let mut session = Session::new(hum, 10, no_settle(), Box::new(player)).unwrap();
    session.start(|_| {});
    let events = session.advance_to(4_000);

    assert_eq!(entered(&events), vec![(0, PhaseName::Hum), (0, PhaseName::Hum)]);
    assert_eq!(session.phase_elapsed_ms(), 0);
    // Start cue plus one per re-entry.
    assert_eq!(*played.borrow(), vec![Cue::Exhale; 3]);
}

#[test]
fn zero_length_phase_is_skipped_in_the_same_tick() {
    let technique = Technique::new(
        "gap",
        "Gap",
        vec![
            Phase::new(PhaseName::Inhale, "In", 2.0),
            Phase::new(PhaseName::InhalePause, "", 0.0),
            Phase::new(PhaseName::Exhale, "Out", 2.0),
        ],
    );
    let mut session = Session::new(
        technique,
        60,
        no_settle(),
        Box::new(RecordingPlayer::default()),
    )
    .unwrap();
    session.start(|_| {});
    let events = session.advance_to(2_000);
    assert_eq!(entered(&events), vec![(2, PhaseName::Exhale)]);
    let events = session.advance_to(4_000);
    assert_eq!(entered(&events), vec![(0, PhaseName::Inhale)]);
}

#[test]
fn zero_length_first_phase_opens_on_the_next_one() {
    let technique = Technique::new(
        "late-start",
        "Late Start",
        vec![
            Phase::new(PhaseName::InhalePause, "", 0.0),
            Phase::new(PhaseName::Exhale, "Out", 3.0),
        ],
    );
    let mut session = Session::new(
        technique,
        60,
        no_settle(),
        Box::new(RecordingPlayer::default()),
    )
    .unwrap();
    let events = session.start(|_| {});
    assert_eq!(entered(&events), vec![(1, PhaseName::Exhale)]);
}

#[test]
fn zero_length_cycle_is_rejected() {
    let technique = Technique::new(
        "nothing",
        "Nothing",
        vec![Phase::new(PhaseName::Inhale, "In", 0.0)],
    );
    assert!(Session::new(
        technique,
        60,
        no_settle(),
        Box::new(RecordingPlayer::default())
    )
    .is_err());
}

// ============================================================================
// Cues
// ============================================================================

#[test]
fn first_phase_cue_plays_at_start() {
    let player = RecordingPlayer::default();
    let played = Rc::clone(&player.played);
    let mut session = Session::new(
        builtin("4-8"),
        60,
        SessionOptions::default(),
        Box::new(player),
    )
    .unwrap();
    session.start(|_| {});
    assert!(played.borrow().is_empty(), "no cue before settle");

    session.advance_to(50);
    assert_eq!(*played.borrow(), vec![Cue::Inhale]);
}

#[test]
fn cyclic_sighing_cue_sequence() {
    let player = RecordingPlayer::default();
    let played = Rc::clone(&player.played);
    let mut session = Session::new(builtin("cyclic-sighing"), 60, no_settle(), Box::new(player))
        .unwrap();
    session.start(|_| {});
    session.advance_to(11_500);
    // Start Inhale, (pause is silent), Sip Inhale, Exhale, Inhale.
    assert_eq!(
        *played.borrow(),
        vec![Cue::Inhale, Cue::Inhale, Cue::Exhale, Cue::Inhale]
    );
}

#[test]
fn rejected_playback_never_stops_the_pacer() {
    let player = RecordingPlayer::default();
    player.reject.set(true);
    let mut session = Session::new(builtin("5-5"), 30, no_settle(), Box::new(player)).unwrap();
    let events = session.start(|_| {});
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::CueFailed { cue: Cue::Inhale, .. })));

    let events = session.advance_to(30_000);
    let failures = events
        .iter()
        .filter(|e| matches!(e, Event::CueFailed { .. }))
        .count();
    // Transitions at 5, 10, 15, 20, 25s; the one at 30s loses to the countdown.
    assert_eq!(failures, 5);
    assert_eq!(session.end_reason(), Some(EndReason::Completed));
}

// ============================================================================
// Presentation
// ============================================================================

#[test]
fn coherent_breathing_cycle_display() {
    let mut session = Session::new(
        builtin("5-5"),
        300,
        no_settle(),
        Box::new(RecordingPlayer::default()),
    )
    .unwrap();
    session.start(|_| {});
    assert_eq!(session.view().cycle_label(), "1/30 cycles");

    session.advance_to(95_000);
    assert_eq!(session.elapsed_secs(), 95);
    assert_eq!(session.view().cycle_label(), "10/30 cycles");
    assert_eq!(session.view().countdown, "3:25");
}

#[test]
fn final_frame_shows_last_cycle() {
    let mut session = Session::new(
        builtin("5-5"),
        300,
        no_settle(),
        Box::new(RecordingPlayer::default()),
    )
    .unwrap();
    session.start(|_| {});
    let events = session.advance_to(300_000);

    assert!(matches!(
        events.iter().rev().nth(1),
        Some(Event::CountdownTick { remaining_secs: 0, .. })
    ));
    let view = session.view();
    assert_eq!(view.countdown, "0:00");
    assert_eq!(view.cycle_label(), "30/30 cycles");
}

#[test]
fn sip_inhale_is_always_full_scale_pink() {
    let mut session = Session::new(
        builtin("cyclic-sighing"),
        600,
        no_settle(),
        Box::new(RecordingPlayer::default()),
    )
    .unwrap();
    session.start(|_| {});

    let mut seen = 0;
    for event in session.advance_to(300_000) {
        if let Event::PhaseEntered {
            phase, scale, tone, ..
        } = event
        {
            if phase == PhaseName::SipInhale {
                assert_eq!(scale, 1.0);
                assert_eq!(tone, OrbTone::Sip);
                seen += 1;
            }
        }
    }
    assert!(seen > 20);
}

#[test]
fn pending_view_is_contracted() {
    let mut session = Session::new(
        builtin("humming-breath"),
        120,
        SessionOptions::default(),
        Box::new(RecordingPlayer::default()),
    )
    .unwrap();
    session.start(|_| {});
    let view = session.view();
    assert_eq!(view.scale, 0.6);
    assert_eq!(view.tone, OrbTone::Inhale);
    assert_eq!(view.countdown, "2:00");
    assert_eq!(view.phase_seconds_left, Some(4));

    session.advance_to(50);
    assert_eq!(session.view().scale, 1.0);
    assert_eq!(session.view().transition_secs, 4.0);
}

#[test]
fn events_serialize_with_type_tag() {
    let mut session = Session::new(
        builtin("5-5"),
        60,
        no_settle(),
        Box::new(RecordingPlayer::default()),
    )
    .unwrap();
    let events = session.start(|_| {});
    let json = serde_json::to_value(&events[0]).unwrap();
    assert_eq!(json["type"], "SessionStarted");
    assert_eq!(json["technique_id"], "5-5");

    let snap = serde_json::to_value(session.snapshot()).unwrap();
    assert_eq!(snap["type"], "StateSnapshot");
    assert_eq!(snap["state"]["state"], "running");
    assert_eq!(snap["phase"], "Inhale");
}
