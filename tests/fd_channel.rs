#[cfg(unix)]
mod fd_channel {
    use std::error::Error;
    use std::io::{IoSlice, Write};
    use std::os::fd::{AsFd, AsRawFd};
    use std::os::unix::net::UnixStream;

    use nix::sys::socket::{sendmsg, ControlMessage, MsgFlags};
    use nix::unistd::pipe;

    use ptyrelay::channel::{recv_fd, send_fd};
    use ptyrelay::error::RelayError;

    #[test]
    fn transferred_descriptor_is_the_same_open_file() -> Result<(), Box<dyn Error>> {
        let (sender, receiver) = UnixStream::pair()?;
        let (pipe_read, pipe_write) = pipe()?;

        // Data written through the original descriptor before the transfer
        // must be readable through the received one.
        nix::unistd::write(&pipe_write, b"before")?;
        send_fd(&sender, pipe_read.as_fd())?;
        let received = recv_fd(&receiver)?;
        assert_ne!(received.as_raw_fd(), pipe_read.as_raw_fd());

        let mut buf = [0u8; 16];
        let n = nix::unistd::read(received.as_fd(), &mut buf)?;
        assert_eq!(&buf[..n], b"before");

        // And the two descriptors keep referring to the same pipe afterwards.
        nix::unistd::write(&pipe_write, b"after")?;
        let n = nix::unistd::read(received.as_fd(), &mut buf)?;
        assert_eq!(&buf[..n], b"after");
        Ok(())
    }

    #[test]
    fn message_without_a_descriptor_is_a_protocol_error() -> Result<(), Box<dyn Error>> {
        let (sender, receiver) = UnixStream::pair()?;
        (&sender).write_all(b" ")?;

        match recv_fd(&receiver) {
            Err(RelayError::Protocol { .. }) => Ok(()),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn peer_closing_first_is_channel_closed() -> Result<(), Box<dyn Error>> {
        let (sender, receiver) = UnixStream::pair()?;
        drop(sender);

        match recv_fd(&receiver) {
            Err(RelayError::ChannelClosed) => Ok(()),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn two_descriptors_in_one_message_are_rejected() -> Result<(), Box<dyn Error>> {
        let (sender, receiver) = UnixStream::pair()?;
        let (pipe_read, pipe_write) = pipe()?;

        let payload = [b' '];
        let iov = [IoSlice::new(&payload)];
        let fds = [pipe_read.as_raw_fd(), pipe_write.as_raw_fd()];
        let cmsgs = [ControlMessage::ScmRights(&fds)];
        sendmsg::<()>(
            sender.as_raw_fd(),
            &iov,
            &cmsgs,
            MsgFlags::empty(),
            None,
        )?;

        match recv_fd(&receiver) {
            Err(RelayError::Protocol { .. }) => Ok(()),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn descriptors_queue_across_sequential_sends() -> Result<(), Box<dyn Error>> {
        let (sender, receiver) = UnixStream::pair()?;
        let (first_read, first_write) = pipe()?;
        let (second_read, second_write) = pipe()?;

        nix::unistd::write(&first_write, b"1")?;
        nix::unistd::write(&second_write, b"2")?;
        send_fd(&sender, first_read.as_fd())?;
        send_fd(&sender, second_read.as_fd())?;

        let mut buf = [0u8; 1];
        let first = recv_fd(&receiver)?;
        nix::unistd::read(first.as_fd(), &mut buf)?;
        assert_eq!(&buf, b"1");

        let second = recv_fd(&receiver)?;
        nix::unistd::read(second.as_fd(), &mut buf)?;
        assert_eq!(&buf, b"2");
        Ok(())
    }
}
