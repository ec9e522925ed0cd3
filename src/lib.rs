//! Detach and reattach terminal sessions through a relay head.
//!
//! One process (`head`) owns the interactive side: it accepts a connection
//! on a Unix socket, receives a pseudo-terminal master over it, and relays
//! bytes between its own controlling terminal and that pty until the
//! attached program exits. The other process (`run`) allocates the pty,
//! hands the master to the head, moves itself onto the slave, and execs
//! the target command there.

pub mod attach;
pub mod channel;
pub mod cli;
pub mod error;
pub mod head;
pub mod notify;
pub mod pty;
pub mod relay;
pub mod socket;
pub mod term;
pub mod winch;
