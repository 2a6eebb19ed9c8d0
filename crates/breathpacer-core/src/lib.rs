//! # breathpacer Core Library
//!
//! This library provides the core logic for the breathpacer guided-breathing
//! timer. Everything the terminal front-end does goes through this crate; the
//! CLI only renders events and forwards user input.
//!
//! ## Architecture
//!
//! - **Techniques**: Declarative, cyclic phase sequences plus a built-in catalog
//! - **Pacer**: A session state machine on a caller-driven virtual clock, with
//!   independent countdown, phase-transition and display timers
//! - **Audio**: Cue dispatch through a pluggable player; failures never stop the pacer
//! - **Visual**: Per-technique orb scale/colour table resolved once per session
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`Session`]: One timed run of a technique
//! - [`Catalog`]: Built-in and user techniques
//! - [`Config`]: Application configuration management
//! - [`CuePlayer`]: Trait for cue playback back-ends

pub mod audio;
pub mod error;
pub mod events;
pub mod pacer;
pub mod storage;
pub mod technique;
pub mod view;
pub mod visual;

pub use audio::{Cue, CueDispatcher, CuePlayer, SilentPlayer};
pub use error::{ConfigError, CoreError, CueError, ValidationError};
pub use events::Event;
pub use pacer::{EndReason, SchedulerState, Session, SessionOptions};
pub use storage::Config;
pub use technique::{Catalog, Phase, PhaseName, Technique};
pub use view::{format_countdown, CycleProgress, PacerView};
pub use visual::{OrbTone, Visual, VisualTable};
