//! The pacer: a session state machine on a caller-driven clock, plus an
//! async driver that maps that clock onto real time.
//!
//! The timer set and phase scheduler are internal; callers see only
//! [`Session`] and the types its API hands out.

pub mod driver;
mod scheduler;
mod session;
mod timers;

pub use scheduler::SchedulerState;
pub use session::{
    EndCallback, EndReason, Session, SessionOptions, COUNTDOWN_TICK_MS, DEFAULT_DISPLAY_TICK_MS,
    DEFAULT_SETTLE_DELAY_MS,
};
pub use timers::TimerKind;
