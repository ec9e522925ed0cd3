//! Descriptor passing over a connected local socket.
//!
//! One message carries one payload byte and exactly one `SCM_RIGHTS`
//! descriptor. The payload byte has no meaning; POSIX just requires some
//! regular data to accompany ancillary data.

use std::io::{IoSlice, IoSliceMut};
use std::os::fd::{AsRawFd, BorrowedFd, FromRawFd, OwnedFd, RawFd};
use std::os::unix::net::UnixStream;

use nix::sys::socket::{recvmsg, sendmsg, ControlMessage, ControlMessageOwned, MsgFlags};

use crate::error::RelayError;

const PAYLOAD: [u8; 1] = [b' '];

/// Transmit one open descriptor to the peer. The caller keeps ownership of
/// its copy; the peer receives an independent descriptor for the same open
/// file.
pub fn send_fd(endpoint: &UnixStream, fd: BorrowedFd<'_>) -> Result<(), RelayError> {
    let iov = [IoSlice::new(&PAYLOAD)];
    let fds = [fd.as_raw_fd()];
    let cmsgs = [ControlMessage::ScmRights(&fds)];
    sendmsg::<()>(
        endpoint.as_raw_fd(),
        &iov,
        &cmsgs,
        MsgFlags::empty(),
        None,
    )
    .map_err(|source| RelayError::Transport {
        op: "sendmsg",
        source,
    })?;
    Ok(())
}

/// Block until the peer sends a descriptor and return it. A message that
/// does not carry exactly one descriptor is rejected, and any descriptors
/// it did carry are closed rather than leaked.
pub fn recv_fd(endpoint: &UnixStream) -> Result<OwnedFd, RelayError> {
    let mut payload = [0u8; 1];
    let mut iov = [IoSliceMut::new(&mut payload)];
    // Room for two descriptors so an overstuffed message is seen as such
    // instead of being silently truncated by the kernel.
    let mut cmsg_space = nix::cmsg_space!([RawFd; 2]);

    let msg = recvmsg::<()>(
        endpoint.as_raw_fd(),
        &mut iov,
        Some(&mut cmsg_space),
        MsgFlags::empty(),
    )
    .map_err(|source| RelayError::Transport {
        op: "recvmsg",
        source,
    })?;

    let mut received: Vec<OwnedFd> = Vec::new();
    let mut foreign = false;
    for cmsg in msg.cmsgs().map_err(|source| RelayError::Transport {
        op: "control message parse",
        source,
    })? {
        match cmsg {
            ControlMessageOwned::ScmRights(fds) => {
                received.extend(
                    fds.into_iter()
                        .map(|fd| unsafe { OwnedFd::from_raw_fd(fd) }),
                );
            }
            _ => foreign = true,
        }
    }

    if msg.bytes == 0 && received.is_empty() {
        return Err(RelayError::ChannelClosed);
    }
    if msg.flags.contains(MsgFlags::MSG_CTRUNC) {
        return Err(RelayError::Protocol {
            detail: "ancillary data truncated",
        });
    }
    if foreign {
        return Err(RelayError::Protocol {
            detail: "unexpected control message type",
        });
    }
    if received.len() > 1 {
        return Err(RelayError::Protocol {
            detail: "more than one descriptor in one message",
        });
    }
    received.pop().ok_or(RelayError::Protocol {
        detail: "no descriptor in message",
    })
}
