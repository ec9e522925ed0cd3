use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

use ptyrelay::attach;
use ptyrelay::cli::{Cli, Mode};
use ptyrelay::head;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.mode {
        Mode::Head { socket } => head::run(&socket)
            .with_context(|| format!("head failed on {}", socket.display())),
        Mode::Run {
            socket,
            command,
            args,
        } => match attach::run(&socket, &command, &args) {
            Ok(never) => match never {},
            Err(err) => {
                Err(err).with_context(|| format!("could not attach {command} via {}", socket.display()))
            }
        },
    }
}

/// Initialize tracing with optional file output.
///
/// The head shares its terminal with the relayed session, so nothing may
/// be logged to it: set `PTYRELAY_LOG` to a file path to enable logging.
///
/// Log files get unique names (`{path}.{timestamp}.{pid}`) so concurrent
/// instances never write over each other.
fn init_tracing(verbose: bool) {
    let Some(log_path) = std::env::var("PTYRELAY_LOG").ok() else {
        return;
    };

    let pid = std::process::id();
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let unique_path = format!("{}.{}.{}", log_path, timestamp, pid);

    let default_filter = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let Ok(file) = std::fs::File::create(&unique_path) else {
        eprintln!("Warning: failed to create log file: {}", unique_path);
        return;
    };

    let file_layer = fmt::layer()
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .with_target(true)
        .with_level(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .init();
}
