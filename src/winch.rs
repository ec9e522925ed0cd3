//! Window-resize observation and propagation.
//!
//! The signal handler does exactly two async-signal-safe things: set a
//! sticky flag and write one byte to a non-blocking self-pipe. The pipe's
//! read side is polled alongside the data descriptors, so a resize that
//! lands between checking the flag and blocking still wakes the next wait.

use std::io::{self, Read};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd};
use std::os::unix::net::UnixStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use nix::errno::Errno;
use nix::pty::Winsize;
use tracing::debug;

use crate::error::RelayError;

/// Applied to the pty when the controlling side is not a terminal.
const FALLBACK_SIZE: Winsize = Winsize {
    ws_row: 30,
    ws_col: 80,
    ws_xpixel: 640,
    ws_ypixel: 480,
};

pub struct WinchWatcher {
    pending: Arc<AtomicBool>,
    wake_rx: UnixStream,
}

impl WinchWatcher {
    /// Register the SIGWINCH hook for the lifetime of the process.
    pub fn install() -> Result<Self, RelayError> {
        let (wake_rx, wake_tx) =
            UnixStream::pair().map_err(|source| RelayError::SignalHook { source })?;
        wake_rx
            .set_nonblocking(true)
            .map_err(|source| RelayError::SignalHook { source })?;
        wake_tx
            .set_nonblocking(true)
            .map_err(|source| RelayError::SignalHook { source })?;

        let pending = Arc::new(AtomicBool::new(false));
        signal_hook::flag::register(signal_hook::consts::SIGWINCH, Arc::clone(&pending))
            .map_err(|source| RelayError::SignalHook { source })?;
        signal_hook::low_level::pipe::register(signal_hook::consts::SIGWINCH, wake_tx)
            .map_err(|source| RelayError::SignalHook { source })?;

        Ok(Self { pending, wake_rx })
    }

    /// Read side of the self-pipe, for inclusion in the proxy loop's poll
    /// set.
    pub fn wake_fd(&self) -> BorrowedFd<'_> {
        self.wake_rx.as_fd()
    }

    /// Whether a resize arrived since the last call. Clears the flag and
    /// drains the wake pipe, so a burst of notifications reports true once.
    pub fn take_pending(&self) -> bool {
        self.drain_wake();
        self.pending.swap(false, Ordering::Relaxed)
    }

    /// Discard anything pending, e.g. leftovers from between sessions.
    pub fn reset(&self) {
        self.drain_wake();
        self.pending.store(false, Ordering::Relaxed);
    }

    fn drain_wake(&self) {
        let mut sink = [0u8; 64];
        let mut pipe = &self.wake_rx;
        loop {
            match pipe.read(&mut sink) {
                Ok(0) => break,
                Ok(_) => continue,
                Err(ref err) if err.kind() == io::ErrorKind::WouldBlock => break,
                Err(ref err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
    }
}

/// Mirror the controlling terminal's current size onto the pty. `ENOTTY`
/// from the query gets the fixed fallback; any other query failure skips
/// the resize. Apply failures are logged and otherwise ignored.
pub fn apply_size(term: BorrowedFd<'_>, pty: BorrowedFd<'_>) {
    let size = match query_size(term) {
        Ok(size) => size,
        Err(Errno::ENOTTY) => FALLBACK_SIZE,
        Err(err) => {
            debug!(%err, "window size query failed, skipping resize");
            return;
        }
    };
    if let Err(err) = set_size(pty, &size) {
        debug!(%err, "window size apply failed");
    }
}

pub fn query_size(term: BorrowedFd<'_>) -> Result<Winsize, Errno> {
    let mut size: Winsize = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::ioctl(term.as_raw_fd(), libc::TIOCGWINSZ, &mut size) };
    if rc < 0 {
        Err(Errno::last())
    } else {
        Ok(size)
    }
}

fn set_size(pty: BorrowedFd<'_>, size: &Winsize) -> Result<(), Errno> {
    let rc = unsafe { libc::ioctl(pty.as_raw_fd(), libc::TIOCSWINSZ, size) };
    if rc < 0 {
        Err(Errno::last())
    } else {
        Ok(())
    }
}
