//! Error types for the relay.
//!
//! One enum covers every failing operation, each variant keeping the
//! underlying OS error so the binary boundary can report the full chain.

use std::io;
use std::path::PathBuf;

use nix::errno::Errno;
use thiserror::Error;

/// Errors that can occur while relaying a session or attaching to one.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Peer closed the descriptor channel before sending anything
    #[error("Connection closed before a descriptor arrived")]
    ChannelClosed,

    /// Descriptor message arrived but did not carry exactly one descriptor
    #[error("Descriptor message malformed: {detail}")]
    Protocol { detail: &'static str },

    /// Sending or receiving on the descriptor channel failed
    #[error("Descriptor transfer failed during {op}")]
    Transport {
        op: &'static str,
        #[source]
        source: Errno,
    },

    /// Creating the listening socket failed
    #[error("Unable to listen on {}", path.display())]
    Bind {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reaching a running head failed
    #[error("Unable to connect to {}", path.display())]
    Connect {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Accepting the next attacher failed
    #[error("Accept failed on the listening socket")]
    Accept {
        #[source]
        source: io::Error,
    },

    /// Installing the window-resize signal hook failed
    #[error("Unable to install the resize signal hook")]
    SignalHook {
        #[source]
        source: io::Error,
    },

    /// Reading the current terminal attributes failed; the session cannot
    /// safely enter raw mode without a snapshot to restore
    #[error("Unable to read terminal attributes")]
    TermSnapshot {
        #[source]
        source: Errno,
    },

    /// Applying the raw configuration failed
    #[error("Unable to set terminal attributes")]
    TermRawApply {
        #[source]
        source: Errno,
    },

    /// Restoring the saved attributes failed with something other than an
    /// interrupted call
    #[error("Unable to restore terminal attributes")]
    TermRestore {
        #[source]
        source: Errno,
    },

    /// One of the pty allocation steps failed
    #[error("Unable to allocate a new pseudo-terminal ({op})")]
    PtyAllocate {
        op: &'static str,
        #[source]
        source: Errno,
    },

    /// Becoming a session leader failed
    #[error("Unable to start a new session")]
    SessionLead {
        #[source]
        source: Errno,
    },

    /// Opening the pty slave for the new standard streams failed
    #[error("Unable to open pty slave {}", path.display())]
    SlaveOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Duplicating the slave onto a standard stream failed
    #[error("Unable to redirect {target} to the pty slave")]
    StdioRedirect {
        target: &'static str,
        #[source]
        source: Errno,
    },

    /// The command or an argument cannot be passed to exec as a C string
    #[error("Command contains an interior NUL byte: {command:?}")]
    BadCommand { command: String },

    /// Replacing the process image failed
    #[error("Unable to exec {command:?}")]
    Exec {
        command: String,
        #[source]
        source: Errno,
    },

    /// A poll or write inside the proxy loop failed
    #[error("Relay I/O failed during {op}")]
    Relay {
        op: &'static str,
        #[source]
        source: Errno,
    },
}

impl RelayError {
    /// Whether the head process must exit, as opposed to ending the current
    /// session and accepting the next attacher.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            RelayError::TermSnapshot { .. } | RelayError::Relay { .. }
        )
    }
}
