//! Unix-socket transport with SCM_RIGHTS descriptor passing.

use std::io::{IoSlice, IoSliceMut};
use std::os::fd::{AsFd, BorrowedFd, OwnedFd};
use std::os::unix::net::UnixStream;

use rustix::net::{
    recvmsg, sendmsg, RecvAncillaryBuffer, RecvAncillaryMessage, RecvFlags, SendAncillaryBuffer,
    SendAncillaryMessage, SendFlags,
};

use crate::core::errors::CoreError;
use crate::prelude::*;

/// Matches the protocol's descriptor-per-message ceiling.
const MAX_FDS_PER_MESSAGE: usize = 28;

/// One receive attempt's result, with read timeouts surfaced as `Idle`
/// rather than as errors: nothing arriving is the loop's normal case.
#[derive(Debug, PartialEq, Eq)]
pub enum RecvOutcome {
    Data(usize),
    Idle,
    Closed,
}

/// Receive bytes and any descriptors riding alongside them. Received fds
/// are appended to `fds` in arrival order.
pub fn recv_with_fds(
    socket: &UnixStream,
    buf: &mut [u8],
    fds: &mut VecDeque<OwnedFd>,
) -> Result<RecvOutcome> {
    let mut cmsg_space = [0u8; rustix::cmsg_space!(ScmRights(MAX_FDS_PER_MESSAGE))];
    let mut cmsg_buffer = RecvAncillaryBuffer::new(&mut cmsg_space);
    let mut iov = [IoSliceMut::new(buf)];

    let msg = match recvmsg(socket.as_fd(), &mut iov[..], &mut cmsg_buffer, RecvFlags::empty()) {
        Ok(msg) => msg,
        Err(rustix::io::Errno::AGAIN) | Err(rustix::io::Errno::INTR) => {
            return Ok(RecvOutcome::Idle)
        }
        Err(e) => return Err(CoreError::transport(format!("recvmsg: {}", e))),
    };

    for cmsg in cmsg_buffer.drain() {
        if let RecvAncillaryMessage::ScmRights(received) = cmsg {
            for fd in received {
                fds.push_back(fd);
            }
        }
    }

    if msg.bytes == 0 {
        return Ok(RecvOutcome::Closed);
    }
    Ok(RecvOutcome::Data(msg.bytes))
}

/// Send one encoded event, with its descriptor as SCM_RIGHTS when present.
pub fn send_with_fd(socket: &UnixStream, buf: &[u8], fd: Option<&OwnedFd>) -> Result<()> {
    let iov = [IoSlice::new(buf)];
    let result = match fd {
        None => {
            let mut empty = [0u8; 0];
            let mut cmsg_buffer = SendAncillaryBuffer::new(&mut empty);
            sendmsg(socket.as_fd(), &iov, &mut cmsg_buffer, SendFlags::empty())
        }
        Some(fd) => {
            let borrowed: [BorrowedFd; 1] = [fd.as_fd()];
            let mut cmsg_space = [0u8; rustix::cmsg_space!(ScmRights(1))];
            let mut cmsg_buffer = SendAncillaryBuffer::new(&mut cmsg_space);
            cmsg_buffer.push(SendAncillaryMessage::ScmRights(&borrowed));
            sendmsg(socket.as_fd(), &iov, &mut cmsg_buffer, SendFlags::empty())
        }
    };
    match result {
        Ok(sent) if sent == buf.len() => Ok(()),
        Ok(sent) => Err(CoreError::transport(format!(
            "short send: {} of {} bytes",
            sent,
            buf.len()
        ))),
        Err(e) => Err(CoreError::transport(format!("sendmsg: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::testfd::memfd_with_bytes;
    use std::io::Read;
    use std::time::Duration;

    #[test]
    fn bytes_and_fd_travel_together() {
        let (a, b) = UnixStream::pair().unwrap();
        let fd = memfd_with_bytes(b"shared");
        send_with_fd(&a, b"hello", Some(&fd)).unwrap();

        let mut buf = [0u8; 16];
        let mut fds = VecDeque::new();
        let outcome = recv_with_fds(&b, &mut buf, &mut fds).unwrap();
        assert_eq!(outcome, RecvOutcome::Data(5));
        assert_eq!(&buf[..5], b"hello");
        assert_eq!(fds.len(), 1);

        let mut contents = String::new();
        let mut file = std::fs::File::from(fds.pop_front().unwrap());
        use std::io::Seek;
        file.rewind().unwrap();
        file.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "shared");
    }

    #[test]
    fn read_timeout_is_idle_not_error() {
        let (a, _b) = UnixStream::pair().unwrap();
        a.set_read_timeout(Some(Duration::from_millis(1))).unwrap();
        let mut buf = [0u8; 16];
        let mut fds = VecDeque::new();
        let outcome = recv_with_fds(&a, &mut buf, &mut fds).unwrap();
        assert_eq!(outcome, RecvOutcome::Idle);
    }

    #[test]
    fn peer_close_reports_closed() {
        let (a, b) = UnixStream::pair().unwrap();
        drop(b);
        let mut buf = [0u8; 16];
        let mut fds = VecDeque::new();
        let outcome = recv_with_fds(&a, &mut buf, &mut fds).unwrap();
        assert_eq!(outcome, RecvOutcome::Closed);
    }
}
