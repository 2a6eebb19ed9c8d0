use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing_subscriber::EnvFilter;

mod bell;
mod commands;
mod keys;
mod render;

#[derive(Parser)]
#[command(name = "breathpacer", version, about = "Guided breathing pacer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available techniques
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show instructions and evidence for one technique
    Show {
        /// Technique id (e.g. "cyclic-sighing")
        id: String,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run a live session (+/- volume, q or Ctrl-C ends early)
    Start(commands::session::SessionArgs),
    /// Run a session in virtual time and print its events
    Simulate(commands::session::SimulateArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Generate shell completions
    Completions {
        shell: Shell,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("BREATHPACER_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::List { json } => commands::technique::list(json),
        Commands::Show { id, json } => commands::technique::show(&id, json),
        Commands::Start(args) => commands::session::start(args),
        Commands::Simulate(args) => commands::session::simulate(args),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "breathpacer", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
