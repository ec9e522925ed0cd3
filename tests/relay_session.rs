#[cfg(unix)]
mod relay_session {
    use std::error::Error;
    use std::fs::File;
    use std::io::{Read, Write};
    use std::os::fd::{AsFd, OwnedFd};
    use std::os::unix::net::UnixStream;
    use std::thread;

    use nix::pty::openpty;
    use nix::unistd::pipe;

    use ptyrelay::error::RelayError;
    use ptyrelay::relay::{self, SessionEnd};
    use ptyrelay::winch::WinchWatcher;

    /// Run the proxy loop on its own thread over the given descriptors.
    fn spawn_relay(
        tty_in: OwnedFd,
        tty_out: OwnedFd,
        pty: OwnedFd,
    ) -> thread::JoinHandle<Result<SessionEnd, RelayError>> {
        thread::spawn(move || {
            let winch = WinchWatcher::install().expect("install watcher");
            relay::run(tty_in.as_fd(), tty_out.as_fd(), pty.as_fd(), &winch)
        })
    }

    #[test]
    fn bytes_cross_in_both_directions_unmodified() -> Result<(), Box<dyn Error>> {
        let (tty_in_read, tty_in_write) = pipe()?;
        let (tty_out_read, tty_out_write) = pipe()?;
        let (pty_end, pty_peer) = UnixStream::pair()?;

        let relay_thread = spawn_relay(tty_in_read, tty_out_write, pty_end.into());

        // Terminal keystrokes surface on the pty side.
        let mut keyboard = File::from(tty_in_write);
        keyboard.write_all(b"keys \x1b[A \x00\xff")?;
        let mut buf = [0u8; 11];
        (&pty_peer).read_exact(&mut buf)?;
        assert_eq!(&buf, b"keys \x1b[A \x00\xff");

        // Program output surfaces on the terminal side.
        (&pty_peer).write_all(b"output bytes")?;
        let mut screen = File::from(tty_out_read);
        let mut buf = [0u8; 12];
        screen.read_exact(&mut buf)?;
        assert_eq!(&buf, b"output bytes");

        // The far program going away ends the session cleanly.
        drop(pty_peer);
        let end = relay_thread.join().expect("join relay")?;
        assert_eq!(end, SessionEnd::ChildGone);
        Ok(())
    }

    #[test]
    fn pty_close_terminates_within_one_wait() -> Result<(), Box<dyn Error>> {
        let (tty_in_read, _tty_in_write) = pipe()?;
        let (_tty_out_read, tty_out_write) = pipe()?;
        let (pty_end, pty_peer) = UnixStream::pair()?;

        drop(pty_peer);
        let relay_thread = spawn_relay(tty_in_read, tty_out_write, pty_end.into());

        let end = relay_thread.join().expect("join relay")?;
        assert_eq!(end, SessionEnd::ChildGone);
        Ok(())
    }

    #[test]
    fn terminal_input_error_reads_as_detach() -> Result<(), Box<dyn Error>> {
        // A pty master whose slave side is gone makes reads fail, which is
        // what a vanished controlling terminal looks like.
        let tty = openpty(None, None)?;
        drop(tty.slave);

        let (_tty_out_read, tty_out_write) = pipe()?;
        let (pty_end, pty_peer) = UnixStream::pair()?;

        let relay_thread = spawn_relay(tty.master, tty_out_write, pty_end.into());

        let end = relay_thread.join().expect("join relay")?;
        assert_eq!(end, SessionEnd::Detached);
        drop(pty_peer);
        Ok(())
    }

    #[test]
    fn terminal_eof_keeps_the_session_alive() -> Result<(), Box<dyn Error>> {
        let (tty_in_read, tty_in_write) = pipe()?;
        let (tty_out_read, tty_out_write) = pipe()?;
        let (pty_end, pty_peer) = UnixStream::pair()?;

        let relay_thread = spawn_relay(tty_in_read, tty_out_write, pty_end.into());

        // EOF on the input side is not a detach; the pty direction keeps
        // flowing.
        drop(tty_in_write);
        (&pty_peer).write_all(b"still here")?;

        let mut screen = File::from(tty_out_read);
        let mut buf = [0u8; 10];
        screen.read_exact(&mut buf)?;
        assert_eq!(&buf, b"still here");

        drop(pty_peer);
        let end = relay_thread.join().expect("join relay")?;
        assert_eq!(end, SessionEnd::ChildGone);
        Ok(())
    }
}
