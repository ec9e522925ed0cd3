//! Raw-mode guard for the controlling terminal.

use std::os::fd::BorrowedFd;

use nix::errno::Errno;
use nix::sys::termios::{self, SetArg, Termios};

use crate::error::RelayError;

/// Holds the attribute snapshot taken before entering raw mode and puts it
/// back exactly once: either through [`RawGuard::restore`], which reports
/// failures, or through `Drop` as a best-effort backstop when the session
/// unwinds some other way.
pub struct RawGuard<'a> {
    term: BorrowedFd<'a>,
    saved: Option<Termios>,
}

impl<'a> RawGuard<'a> {
    /// Snapshot the terminal's attributes and switch it to raw mode. A
    /// failed snapshot leaves the terminal untouched; the caller must end
    /// the session rather than proxy without a state to restore.
    pub fn enter(term: BorrowedFd<'a>) -> Result<Self, RelayError> {
        let saved =
            termios::tcgetattr(term).map_err(|source| RelayError::TermSnapshot { source })?;
        let mut raw = saved.clone();
        termios::cfmakeraw(&mut raw);
        termios::tcsetattr(term, SetArg::TCSANOW, &raw)
            .map_err(|source| RelayError::TermRawApply { source })?;
        Ok(Self {
            term,
            saved: Some(saved),
        })
    }

    /// Put the saved attributes back. Interrupted calls are retried; any
    /// other failure is reported and the terminal state is unknown.
    pub fn restore(mut self) -> Result<(), RelayError> {
        match self.saved.take() {
            Some(saved) => reapply(self.term, &saved)
                .map_err(|source| RelayError::TermRestore { source }),
            None => Ok(()),
        }
    }
}

impl Drop for RawGuard<'_> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            let _ = reapply(self.term, &saved);
        }
    }
}

fn reapply(term: BorrowedFd<'_>, saved: &Termios) -> Result<(), Errno> {
    loop {
        match termios::tcsetattr(term, SetArg::TCSANOW, saved) {
            Err(Errno::EINTR) => continue,
            other => return other,
        }
    }
}
