//! The proxy loop: byte-transparent relay between the controlling terminal
//! and a pty master, with resize propagation folded into the wait.

use std::os::fd::BorrowedFd;

use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use nix::unistd::{read, write};

use crate::error::RelayError;
use crate::winch::{self, WinchWatcher};

const BUF_SIZE: usize = 4096;

/// Which side ended an otherwise healthy session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The controlling terminal's input failed; the user detached.
    Detached,
    /// The pty reported EOF or an error; the attached program is gone.
    ChildGone,
}

/// Copy bytes between the terminal and the pty until one side ends the
/// session. Returns `Ok` for both normal endings; `Err` only for faults in
/// the relay itself (a failed poll or write), which end the session without
/// taking down a head.
pub fn run(
    tty_in: BorrowedFd<'_>,
    tty_out: BorrowedFd<'_>,
    pty: BorrowedFd<'_>,
    winch: &WinchWatcher,
) -> Result<SessionEnd, RelayError> {
    let mut buf = [0u8; BUF_SIZE];
    loop {
        if winch.take_pending() {
            winch::apply_size(tty_in, pty);
        }

        let mut fds = [
            PollFd::new(tty_in, PollFlags::POLLIN),
            PollFd::new(pty, PollFlags::POLLIN),
            PollFd::new(winch.wake_fd(), PollFlags::POLLIN),
        ];
        match poll(&mut fds, PollTimeout::NONE) {
            Ok(_) => {}
            Err(Errno::EINTR) => continue,
            Err(source) => return Err(RelayError::Relay { op: "poll", source }),
        }

        if readable(&fds[2]) {
            // Resize wake; handle it at the top before moving any bytes.
            continue;
        }

        if readable(&fds[0]) {
            match read_retry(tty_in, &mut buf) {
                // Zero-length reads are relayed as a no-op; only a read
                // error means the user side is gone.
                Ok(n) => {
                    write_all(pty, &buf[..n]).map_err(|source| RelayError::Relay {
                        op: "write to pty",
                        source,
                    })?;
                }
                Err(_) => return Ok(SessionEnd::Detached),
            }
        }

        if readable(&fds[1]) {
            match read_retry(pty, &mut buf) {
                Ok(0) | Err(_) => return Ok(SessionEnd::ChildGone),
                Ok(n) => {
                    write_all(tty_out, &buf[..n]).map_err(|source| RelayError::Relay {
                        op: "write to terminal",
                        source,
                    })?;
                }
            }
        }
    }
}

fn readable(fd: &PollFd) -> bool {
    fd.revents().is_some_and(|revents| {
        revents.intersects(PollFlags::POLLIN | PollFlags::POLLHUP | PollFlags::POLLERR)
    })
}

fn read_retry(fd: BorrowedFd<'_>, buf: &mut [u8]) -> Result<usize, Errno> {
    loop {
        match read(fd, buf) {
            Err(Errno::EINTR) => continue,
            other => return other,
        }
    }
}

fn write_all(fd: BorrowedFd<'_>, data: &[u8]) -> Result<(), Errno> {
    let mut written = 0;
    while written < data.len() {
        match write(fd, &data[written..]) {
            Ok(n) => written += n,
            Err(Errno::EINTR) => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(())
}
