//! Head mode: own the interactive side and serve one attach at a time.

use std::io;
use std::os::fd::{AsFd, OwnedFd};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::channel;
use crate::error::RelayError;
use crate::notify;
use crate::relay::{self, SessionEnd};
use crate::socket;
use crate::term::RawGuard;
use crate::winch::{self, WinchWatcher};

/// Accept attachers on `socket_path` forever. Returns only on a fatal
/// error; session-scoped failures are logged and the next attacher is
/// served.
pub fn run(socket_path: &Path) -> Result<(), RelayError> {
    let listener = socket::bind(socket_path)?;
    let winch = WinchWatcher::install()?;

    match notify::notify_ready() {
        Ok(true) => debug!("supervisor notified"),
        Ok(false) => {}
        Err(err) => warn!(%err, "readiness notification failed"),
    }
    info!(socket = %socket_path.display(), "waiting for attachers");

    loop {
        let (conn, _) = listener
            .accept()
            .map_err(|source| RelayError::Accept { source })?;
        // A channel failure here is fatal: no descriptor arrived, so there
        // is no session to scope the failure to.
        let master = channel::recv_fd(&conn)?;
        drop(conn);
        debug!("descriptor received, session starting");

        match run_session(&master, &winch) {
            Ok(SessionEnd::Detached) => info!("session ended: terminal input closed"),
            Ok(SessionEnd::ChildGone) => info!("session ended: program finished"),
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => warn!(%err, "session failed"),
        }
        // The received master drops here, closing our copy before the next
        // accept.
    }
}

fn run_session(master: &OwnedFd, winch: &WinchWatcher) -> Result<SessionEnd, RelayError> {
    let stdin = io::stdin();
    let stdout = io::stdout();

    let guard = RawGuard::enter(stdin.as_fd())?;
    winch.reset();
    winch::apply_size(stdin.as_fd(), master.as_fd());

    let outcome = relay::run(stdin.as_fd(), stdout.as_fd(), master.as_fd(), winch);

    // Restore before surfacing any relay error; a failed restore outranks
    // it.
    guard.restore()?;
    outcome
}
