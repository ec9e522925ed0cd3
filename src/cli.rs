use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Reattach detached terminal sessions through a relay head.
#[derive(Debug, Parser)]
#[command(name = "ptyrelay", version, about, long_about = None)]
pub struct Cli {
    /// Log at debug level when RUST_LOG is not set
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub mode: Mode,
}

#[derive(Debug, Subcommand)]
pub enum Mode {
    /// Serve as the interactive proxy: accept a pty over the socket and
    /// relay it to this terminal
    Head {
        /// Path of the listening socket
        socket: PathBuf,
    },
    /// Allocate a pty, hand its master to a running head, and exec a
    /// command on the slave side
    Run {
        /// Path of the head's socket
        socket: PathBuf,
        /// Program to exec on the pty slave
        command: String,
        /// Arguments passed through to the program
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}
