//! Attacher mode: hand a fresh pty to the head, move onto its slave side,
//! and become the target program.

use std::convert::Infallible;
use std::env;
use std::ffi::CString;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::fd::{AsFd, AsRawFd};
use std::path::Path;

use nix::errno::Errno;
use nix::unistd::{execvp, getppid, setpgid, setsid, Pid};
use tracing::debug;

use crate::channel;
use crate::error::RelayError;
use crate::pty;
use crate::socket;

/// Environment variable carrying the slave path into the target program.
pub const PTY_ENV: &str = "PTYRELAY_PTY";

/// Connect to the head, send it a new pty master, reattach this process to
/// the slave, and exec `command`. Never returns on success.
pub fn run(socket_path: &Path, command: &str, args: &[String]) -> Result<Infallible, RelayError> {
    let conn = socket::connect(socket_path)?;
    let handle = pty::allocate()?;

    // Announced before stdio moves to the slave, so it lands on the
    // invoking terminal where the user can read it.
    println!("Opened a new pty: {}", handle.slave_path.display());
    let _ = io::stdout().flush();

    channel::send_fd(&conn, handle.master.as_fd())?;
    debug!(slave = %handle.slave_path.display(), "master handed to head");

    env::set_var(PTY_ENV, &handle.slave_path);
    adopt_slave_stdio(&handle.slave_path)?;
    drop(handle.master);
    drop(conn);

    exec(command, args)
}

/// Become a session leader on the pty slave with all three standard
/// streams pointing at it.
fn adopt_slave_stdio(slave_path: &Path) -> Result<(), RelayError> {
    // Leave our own process group first; a group leader cannot start a new
    // session.
    let _ = setpgid(Pid::from_raw(0), getppid());
    setsid().map_err(|source| RelayError::SessionLead { source })?;

    // The first terminal opened by the new session leader becomes its
    // controlling terminal, so these opens must not pass O_NOCTTY.
    let slave_in = File::open(slave_path).map_err(|source| RelayError::SlaveOpen {
        path: slave_path.to_owned(),
        source,
    })?;
    redirect(&slave_in, libc::STDIN_FILENO, "stdin")?;

    let slave_out = OpenOptions::new()
        .write(true)
        .open(slave_path)
        .map_err(|source| RelayError::SlaveOpen {
            path: slave_path.to_owned(),
            source,
        })?;
    redirect(&slave_out, libc::STDOUT_FILENO, "stdout")?;
    redirect(&slave_out, libc::STDERR_FILENO, "stderr")?;
    Ok(())
}

fn redirect(file: &File, target: libc::c_int, name: &'static str) -> Result<(), RelayError> {
    // dup2 leaves the duplicate without close-on-exec, which is exactly
    // what the standard streams need here.
    let rc = unsafe { libc::dup2(file.as_raw_fd(), target) };
    if rc < 0 {
        return Err(RelayError::StdioRedirect {
            target: name,
            source: Errno::last(),
        });
    }
    Ok(())
}

fn exec(command: &str, args: &[String]) -> Result<Infallible, RelayError> {
    let program = CString::new(command).map_err(|_| RelayError::BadCommand {
        command: command.to_owned(),
    })?;
    let mut argv = Vec::with_capacity(args.len() + 1);
    argv.push(program.clone());
    for arg in args {
        argv.push(CString::new(arg.as_str()).map_err(|_| RelayError::BadCommand {
            command: arg.clone(),
        })?);
    }
    execvp(&program, &argv).map_err(|source| RelayError::Exec {
        command: command.to_owned(),
        source,
    })
}
