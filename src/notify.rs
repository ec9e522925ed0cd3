//! Supervisor readiness notification, systemd style.

use std::env;
use std::ffi::OsStr;
use std::io;
use std::os::unix::net::UnixDatagram;
use std::path::Path;

/// Environment variable naming the supervisor's notification socket.
pub const NOTIFY_SOCKET: &str = "NOTIFY_SOCKET";

/// Announce liveness and our pid to a supervising process, if one asked for
/// it. Returns `Ok(false)` when no notification socket is configured;
/// that is the normal unsupervised case, not an error.
pub fn notify_ready() -> io::Result<bool> {
    let Some(addr) = env::var_os(NOTIFY_SOCKET) else {
        return Ok(false);
    };
    let message = format!("READY=1\nMAINPID={}", std::process::id());
    let socket = UnixDatagram::unbound()?;
    send_to(&socket, &addr, message.as_bytes())?;
    Ok(true)
}

fn send_to(socket: &UnixDatagram, addr: &OsStr, payload: &[u8]) -> io::Result<()> {
    // A leading '@' names an abstract-namespace socket.
    #[cfg(target_os = "linux")]
    if let Some(name) = addr.to_str().and_then(|a| a.strip_prefix('@')) {
        use std::os::linux::net::SocketAddrExt;
        let target = std::os::unix::net::SocketAddr::from_abstract_name(name.as_bytes())?;
        socket.send_to_addr(payload, &target)?;
        return Ok(());
    }
    socket.send_to(payload, Path::new(addr))?;
    Ok(())
}
