use std::io::IsTerminal;

use clap::Args;

use breathpacer_core::pacer::driver;
use breathpacer_core::{Config, CuePlayer, Event, Session, SilentPlayer};

use crate::bell::BellPlayer;
use crate::keys::{self, KeyReader, RawMode};
use crate::render::Renderer;

#[derive(Args)]
pub struct SessionArgs {
    /// Technique id (defaults to session.default_technique)
    pub technique: Option<String>,
    /// Session length in seconds
    #[arg(long, short, conflicts_with = "minutes")]
    pub duration: Option<u32>,
    /// Session length in minutes
    #[arg(long, short)]
    pub minutes: Option<u32>,
    /// Cue volume (0.0 - 1.0)
    #[arg(long)]
    pub volume: Option<f64>,
    /// Disable audio cues
    #[arg(long)]
    pub mute: bool,
    /// Print events as JSON lines
    #[arg(long)]
    pub json: bool,
}

struct Prepared {
    session: Session,
    renderer: Renderer,
}

fn prepare(
    args: &SessionArgs,
    config: &Config,
    player: Box<dyn CuePlayer>,
    live: bool,
    ticks: bool,
) -> Result<Prepared, Box<dyn std::error::Error>> {
    let technique = config.technique(args.technique.as_deref())?;

    let duration_secs = match (args.duration, args.minutes) {
        (Some(secs), _) => secs,
        (None, Some(min)) => min.saturating_mul(60),
        (None, None) => config.session.default_duration_secs,
    };

    let mut options = config.session_options();
    if let Some(volume) = args.volume {
        options.volume = volume;
    }

    let session = Session::new(technique, duration_secs, options, player)?;
    let renderer = Renderer {
        color: config.ui.color,
        show_cycles: config.ui.show_cycles,
        json: args.json,
        ticks,
        live,
    };
    Ok(Prepared { session, renderer })
}

/// `start`: run a session against the wall clock until it completes, a
/// quit key is pressed, or Ctrl-C.
pub fn start(args: SessionArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let player: Box<dyn CuePlayer> = if config.audio.enabled && !args.mute {
        Box::new(BellPlayer::stderr())
    } else {
        Box::new(SilentPlayer)
    };
    let Prepared {
        mut session,
        mut renderer,
    } = prepare(&args, &config, player, !args.json, false)?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let interactive = !args.json && std::io::stdin().is_terminal();
    if interactive {
        println!("{}: {}", session.technique().name, keys::HELP);
    }
    let (tx, controls) = tokio::sync::mpsc::unbounded_channel();
    let _raw = interactive.then(RawMode::enable).transpose()?;
    let reader = interactive.then(|| KeyReader::spawn(tx));

    let reason = rt.block_on(async {
        for event in session.start(|reason| tracing::info!(?reason, "session finished")) {
            renderer.handle(&event, &session);
        }
        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("failed to listen for Ctrl-C: {e}");
                std::future::pending::<()>().await;
            }
        };
        driver::run_with_controls(&mut session, shutdown, controls, |event, s| {
            renderer.handle(event, s)
        })
        .await
    });
    drop(reader);

    if reason.is_none() {
        return Err("session stopped without ending".into());
    }
    Ok(())
}

#[derive(Args)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub session: SessionArgs,
    /// End the session early after this many seconds of running time
    #[arg(long, value_name = "SECS")]
    pub stop_at: Option<f64>,
    /// Include display ticks in the output
    #[arg(long)]
    pub ticks: bool,
}

/// `simulate`: run a session in virtual time and print every event.
pub fn simulate(args: SimulateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let Prepared {
        mut session,
        mut renderer,
    } = prepare(&args.session, &config, Box::new(SilentPlayer), false, args.ticks)?;

    let stop_ms = args
        .stop_at
        .filter(|s| s.is_finite() && *s >= 0.0)
        .map(|s| config.session.settle_delay_ms + (s * 1000.0).round() as u64);

    for event in &session.start(|_| {}) {
        renderer.handle(event, &session);
    }
    run_virtual(&mut session, stop_ms, |event, s| renderer.handle(event, s));

    if session.end_reason().is_none() {
        return Err("session stopped without ending".into());
    }
    Ok(())
}

/// Jump from deadline to deadline until the session ends. With `stop_ms`,
/// the session is ended early at that instant of its clock.
fn run_virtual(session: &mut Session, stop_ms: Option<u64>, mut sink: impl FnMut(&Event, &Session)) {
    while !session.is_ended() {
        let Some(due) = session.next_due_ms() else {
            break;
        };
        if let Some(stop) = stop_ms.filter(|&stop| stop < due) {
            session.advance_to(stop);
            if let Some(event) = session.end() {
                sink(&event, session);
            }
            break;
        }
        for event in &session.advance_to(due) {
            sink(event, session);
        }
    }
}
