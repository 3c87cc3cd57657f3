use std::io;
use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use sacn_keypad::levels::DisplayMode;
use sacn_keypad::{config, console, session};

/// Set DMX levels from a lighting console style command line.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Configuration file (YAML, or JSON with a .json extension).
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Level units: percent, decimal or hex. Overrides the configuration.
    #[arg(short, long)]
    display_mode: Option<DisplayMode>,
}

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let mut config_root = match &args.config {
        Some(path) => config::read_config(path)?,
        None => {
            info!("No configuration given, using defaults");
            config::Root::default()
        }
    };
    if let Some(display_mode) = args.display_mode {
        config_root.settings.display_mode = display_mode;
    }

    let mut session = session::Session::from_config(&config_root).map_err(|err| {
        error!("{}", err);
        io::Error::other(err.to_string())
    })?;

    let stdin = io::stdin();
    console::serve(&mut session, stdin.lock(), io::stdout())?;

    Ok(())
}
