use std::{
    os::fd::{AsFd, AsRawFd, OwnedFd, RawFd},
    time::Duration,
};

use nix::{
    errno::Errno,
    sys::socket::{recvfrom, sendto, setsockopt, sockopt, MsgFlags, SetSockOpt, SockaddrStorage},
};
use tracing::{debug, error, info};

use super::{addr, socket, Error, Received, Result, Socket, DEFAULT_RECV_SIZE};

const CHUNK_SIZE: usize = 1024;

/// A [UdpSocket] represents one blocking, connectionless endpoint tied to a fixed remote
/// destination. [Socket::open] resolves the destination once and caches it; every subsequent
/// send and receive reuses that cached address, and no handshake is ever attempted, so opening
/// succeeds whether or not anything is listening on the other side.
///
/// Receives accept whatever datagram the kernel hands over; sender identity is not checked
/// against the configured destination.
pub struct UdpSocket {
    addr: String,
    port: u16,
    fd: Option<OwnedFd>,
    dest: Option<SockaddrStorage>,
}

impl UdpSocket {
    /// Create a new [UdpSocket] aimed at the given destination. No resolution happens until
    /// [Socket::open].
    pub fn new(addr: impl Into<String>, port: u16) -> UdpSocket {
        UdpSocket {
            addr: addr.into(),
            port,
            fd: None,
            dest: None,
        }
    }

    /// Resolve the destination, cache it and acquire a datagram handle. Fails only on
    /// resolution or local resource errors; peer reachability is never checked.
    pub fn try_open(&mut self) -> Result<()> {
        self.fd = None;
        self.dest = None;

        let remote = addr::resolve(&self.addr, self.port)?;
        let fd = socket::dgram_socket(&remote)?;

        self.dest = Some(SockaddrStorage::from(remote));
        self.fd = Some(fd);
        Ok(())
    }

    /// Send the whole buffer to the cached destination, retrying would-block and interrupted
    /// writes.
    pub fn try_send(&mut self, data: &[u8]) -> Result<()> {
        let (fd, dest) = match (self.fd.as_ref(), self.dest.as_ref()) {
            (Some(fd), Some(dest)) => (fd.as_raw_fd(), dest),
            _ => return Err(Error::NotOpen),
        };

        if data.is_empty() {
            return Ok(());
        }

        let mut total_sent = 0;
        while total_sent < data.len() {
            match sendto(fd, &data[total_sent..], dest, MsgFlags::MSG_NOSIGNAL) {
                Ok(sent) => total_sent += sent,
                // Socket buffer full or interrupted, try again.
                Err(Errno::EAGAIN) | Err(Errno::EINTR) => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Ok(())
    }

    /// Perform one blocking receive of at most `max_size` bytes. A zero-length datagram is a
    /// valid [Received::Data] with no bytes, not a close; datagram sockets never report
    /// [Received::Closed].
    pub fn try_recv(&mut self, max_size: usize) -> Result<Received> {
        let fd = self.fd.as_ref().ok_or(Error::NotOpen)?.as_raw_fd();

        let mut buf = vec![0u8; max_size];
        match recvfrom::<SockaddrStorage>(fd, &mut buf) {
            Ok((n, _sender)) => {
                buf.truncate(n);
                Ok(Received::Data(buf))
            }
            Err(Errno::EAGAIN) => Ok(Received::Empty),
            Err(e) => Err(e.into()),
        }
    }

    /// Single blocking receive of at most `max_size` bytes; empty on no-data or failure.
    pub fn recv(&mut self, max_size: usize) -> Vec<u8> {
        match self.try_recv(max_size) {
            Ok(Received::Data(buf)) => buf,
            Ok(Received::Empty) | Ok(Received::Closed) => Vec::new(),
            Err(e) => {
                error!("recvfrom failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Wait up to `timeout` for a datagram, then perform one [UdpSocket::recv].
    pub fn recv_timeout(&mut self, timeout: Duration, max_size: usize) -> Vec<u8> {
        let ready = match self.fd.as_ref() {
            Some(fd) => socket::poll_readable(fd.as_fd(), timeout),
            None => Err(Error::NotOpen),
        };

        match ready {
            Ok(true) => self.recv(max_size),
            Ok(false) => {
                debug!("receive timed out after {:?}", timeout);
                Vec::new()
            }
            Err(e) => {
                error!("readiness poll failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Accumulate datagram payloads until the buffer contains `delimiter`, returning everything
    /// up to and including its first occurrence, or exactly `max_size` bytes if it never shows
    /// up. Datagrams from any sender are appended; a read failure returns whatever has
    /// accumulated.
    pub fn recv_until(&mut self, delimiter: &[u8], max_size: usize) -> Vec<u8> {
        let Some(fd) = self.fd.as_ref().map(|fd| fd.as_raw_fd()) else {
            error!("recv_until on a socket that is not open");
            return Vec::new();
        };

        let mut result = Vec::with_capacity(CHUNK_SIZE);
        let mut chunk = [0u8; CHUNK_SIZE];

        while result.len() < max_size {
            let want = CHUNK_SIZE.min(max_size - result.len());
            let n = match recvfrom::<SockaddrStorage>(fd, &mut chunk[..want]) {
                Ok((n, _sender)) => n,
                Err(Errno::EAGAIN) | Err(Errno::EINTR) => continue,
                Err(e) => {
                    error!("recvfrom failed: {}", e);
                    break;
                }
            };

            result.extend_from_slice(&chunk[..n]);

            if let Some(end) = socket::delimiter_end(&result, n, delimiter) {
                result.truncate(end);
                return result;
            }
        }

        result
    }

    /// Apply an arbitrary socket option to the underlying handle.
    pub fn set_option<O>(&self, opt: O, val: &O::Val) -> bool
    where
        O: SetSockOpt,
    {
        let Some(fd) = self.fd.as_ref() else {
            error!("cannot configure a socket that is not open");
            return false;
        };

        match setsockopt(fd, opt, val) {
            Ok(()) => true,
            Err(e) => {
                error!("setsockopt failed: {}", e);
                false
            }
        }
    }

    /// Bound every subsequent blocking receive by `timeout` at the OS level.
    pub fn set_recv_timeout(&self, timeout: Duration) -> bool {
        self.set_option(sockopt::ReceiveTimeout, &socket::timeval(timeout))
    }

    /// Bound every subsequent blocking send by `timeout` at the OS level.
    pub fn set_send_timeout(&self, timeout: Duration) -> bool {
        self.set_option(sockopt::SendTimeout, &socket::timeval(timeout))
    }

    /// True from a successful [Socket::open] until [Socket::close]. UDP has no handshake, so
    /// this reflects only that the handle exists.
    pub fn is_connected(&self) -> bool {
        self.fd.is_some()
    }

    /// The remote address this socket was constructed with.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// The remote port this socket was constructed with.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The raw OS handle, or -1 when the socket is closed. Pairs with
    /// [super::is_socket_healthy].
    pub fn raw_fd(&self) -> RawFd {
        self.fd.as_ref().map_or(-1, |fd| fd.as_raw_fd())
    }
}

impl Socket for UdpSocket {
    fn open(&mut self) -> bool {
        match self.try_open() {
            Ok(()) => {
                info!("datagram socket ready for {}:{}", self.addr, self.port);
                true
            }
            Err(e) => {
                error!(
                    "failed to open datagram socket for {}:{}: {}",
                    self.addr, self.port, e
                );
                false
            }
        }
    }

    fn close(&mut self) {
        if self.fd.take().is_some() {
            debug!("datagram socket closed");
        }
    }

    fn send(&mut self, data: &[u8]) -> bool {
        match self.try_send(data) {
            Ok(()) => true,
            Err(e) => {
                error!("sendto failed: {}", e);
                false
            }
        }
    }

    fn receive(&mut self) -> Vec<u8> {
        self.recv(DEFAULT_RECV_SIZE)
    }
}
