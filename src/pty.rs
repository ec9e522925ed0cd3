//! Pseudo-terminal allocation.

use std::os::fd::{FromRawFd, IntoRawFd, OwnedFd};
use std::path::PathBuf;

use nix::fcntl::OFlag;
use nix::pty::{grantpt, posix_openpt, unlockpt, PtyMaster};

use crate::error::RelayError;

/// A freshly allocated pty: the master as an owned descriptor plus the path
/// a process opens to sit on the slave side.
pub struct PtyHandle {
    pub master: OwnedFd,
    pub slave_path: PathBuf,
}

/// Open a new pty master, run the grant/unlock sequence, and resolve the
/// slave path.
pub fn allocate() -> Result<PtyHandle, RelayError> {
    let master = posix_openpt(OFlag::O_RDWR | OFlag::O_NOCTTY).map_err(|source| {
        RelayError::PtyAllocate {
            op: "posix_openpt",
            source,
        }
    })?;
    grantpt(&master).map_err(|source| RelayError::PtyAllocate {
        op: "grantpt",
        source,
    })?;
    unlockpt(&master).map_err(|source| RelayError::PtyAllocate {
        op: "unlockpt",
        source,
    })?;
    let slave_path = PathBuf::from(slave_name(&master)?);

    // The grant/unlock steps needed the PtyMaster type; from here on the
    // master is just a descriptor to own, pass, and poll.
    let master = unsafe { OwnedFd::from_raw_fd(master.into_raw_fd()) };
    Ok(PtyHandle { master, slave_path })
}

#[cfg(target_os = "linux")]
fn slave_name(master: &PtyMaster) -> Result<String, RelayError> {
    nix::pty::ptsname_r(master).map_err(|source| RelayError::PtyAllocate {
        op: "ptsname_r",
        source,
    })
}

#[cfg(not(target_os = "linux"))]
fn slave_name(master: &PtyMaster) -> Result<String, RelayError> {
    // Single-threaded caller; the shared ptsname buffer is not a hazard.
    unsafe { nix::pty::ptsname(master) }.map_err(|source| RelayError::PtyAllocate {
        op: "ptsname",
        source,
    })
}
