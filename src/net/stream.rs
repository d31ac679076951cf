use std::{
    os::fd::{AsFd, AsRawFd, OwnedFd, RawFd},
    time::Duration,
};

use nix::{
    errno::Errno,
    sys::socket::{connect, recv, send, setsockopt, sockopt, MsgFlags, SetSockOpt, SockaddrStorage},
};
use tracing::{debug, error, info};

use super::{addr, socket, Error, Received, Result, Socket, DEFAULT_RECV_SIZE};

/// Chunk size for the accumulating reads behind [TcpSocket::recv_until].
const CHUNK_SIZE: usize = 1024;

/// A [TcpSocket] represents one blocking, connection-oriented endpoint tied to a single remote
/// destination. Constructing it performs no I/O; [Socket::open] resolves the destination,
/// acquires the handle and runs the blocking connect handshake. From then on every send and
/// receive is a direct system call on the caller's thread, with transient short writes retried
/// internally so a successful [Socket::send] always delivered the whole buffer.
///
/// The handle is exclusively owned: it exists exactly while the socket is open, and both
/// [Socket::close] and dropping the value release it.
pub struct TcpSocket {
    addr: String,
    port: u16,
    fd: Option<OwnedFd>,
}

impl TcpSocket {
    /// Create a new [TcpSocket] aimed at the given destination. No resolution or connection is
    /// attempted until [Socket::open].
    pub fn new(addr: impl Into<String>, port: u16) -> TcpSocket {
        TcpSocket {
            addr: addr.into(),
            port,
            fd: None,
        }
    }

    /// Resolve the destination, acquire a fresh handle and perform the blocking connect
    /// handshake. Any previously held handle is released first, so at most one handle is ever
    /// alive per instance. On failure the partially-acquired handle is released and the socket
    /// stays closed.
    pub fn try_open(&mut self) -> Result<()> {
        self.fd = None;

        let remote = addr::resolve(&self.addr, self.port)?;
        let fd = socket::stream_socket(&remote)?;

        // A connect failure drops `fd` on the way out, so no handle leaks.
        connect(fd.as_raw_fd(), &SockaddrStorage::from(remote))?;

        self.fd = Some(fd);
        Ok(())
    }

    /// Deliver the whole buffer, retrying would-block and interrupted writes until every byte
    /// has been accepted by the kernel. A zero-byte write means the peer went away mid-send.
    pub fn try_send(&mut self, data: &[u8]) -> Result<()> {
        let fd = self.fd.as_ref().ok_or(Error::NotOpen)?.as_raw_fd();

        if data.is_empty() {
            return Ok(());
        }

        let mut total_sent = 0;
        while total_sent < data.len() {
            match send(fd, &data[total_sent..], MsgFlags::MSG_NOSIGNAL) {
                Ok(0) => return Err(Error::Disconnected),
                Ok(sent) => total_sent += sent,
                // Socket buffer full or interrupted, try again.
                Err(Errno::EAGAIN) | Err(Errno::EINTR) => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Ok(())
    }

    /// Perform one blocking read of at most `max_size` bytes, keeping would-block and orderly
    /// peer shutdown distinguishable instead of folding both into an empty buffer.
    pub fn try_recv(&mut self, max_size: usize) -> Result<Received> {
        let fd = self.fd.as_ref().ok_or(Error::NotOpen)?.as_raw_fd();

        let mut buf = vec![0u8; max_size];
        match recv(fd, &mut buf, MsgFlags::empty()) {
            Ok(0) => Ok(Received::Closed),
            Ok(n) => {
                buf.truncate(n);
                Ok(Received::Data(buf))
            }
            Err(Errno::EAGAIN) => Ok(Received::Empty),
            Err(e) => Err(e.into()),
        }
    }

    /// Single blocking read of at most `max_size` bytes into a fresh buffer. The empty result
    /// covers "no data right now", "peer closed" and "read failed" alike; use
    /// [TcpSocket::try_recv] to tell them apart.
    pub fn recv(&mut self, max_size: usize) -> Vec<u8> {
        match self.try_recv(max_size) {
            Ok(Received::Data(buf)) => buf,
            Ok(Received::Empty) => Vec::new(),
            Ok(Received::Closed) => {
                debug!("connection closed by peer");
                Vec::new()
            }
            Err(e) => {
                error!("recv failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Wait up to `timeout` for the socket to become readable, then perform one
    /// [TcpSocket::recv]. An empty result means timeout expiry just as much as "no data".
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

    /// Accumulate blocking reads until the buffer contains `delimiter`, returning everything up
    /// to and including its first occurrence. If the delimiter never shows up the result caps
    /// at exactly `max_size` bytes; a read failure or peer close returns whatever has
    /// accumulated by then.
    pub fn recv_until(&mut self, delimiter: &[u8], max_size: usize) -> Vec<u8> {
        let Some(fd) = self.fd.as_ref().map(|fd| fd.as_raw_fd()) else {
            error!("recv_until on a socket that is not open");
            return Vec::new();
        };

        let mut result = Vec::with_capacity(CHUNK_SIZE);
        let mut chunk = [0u8; CHUNK_SIZE];

        while result.len() < max_size {
            let want = CHUNK_SIZE.min(max_size - result.len());
            let n = match recv(fd, &mut chunk[..want], MsgFlags::empty()) {
                Ok(0) => {
                    debug!("connection closed by peer");
                    break;
                }
                Ok(n) => n,
                Err(Errno::EAGAIN) | Err(Errno::EINTR) => continue,
                Err(e) => {
                    error!("recv failed: {}", e);
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

    /// Enable or disable TCP keep-alive probing on the connection.
    pub fn set_keep_alive(&self, enable: bool) -> bool {
        self.set_option(sockopt::KeepAlive, &enable)
    }

    /// Bound every subsequent blocking receive by `timeout` at the OS level.
    pub fn set_recv_timeout(&self, timeout: Duration) -> bool {
        self.set_option(sockopt::ReceiveTimeout, &socket::timeval(timeout))
    }

    /// Bound every subsequent blocking send by `timeout` at the OS level.
    pub fn set_send_timeout(&self, timeout: Duration) -> bool {
        self.set_option(sockopt::SendTimeout, &socket::timeval(timeout))
    }

    /// True while this instance holds an open handle. This is a liveness proxy; it does not
    /// probe the peer.
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

impl Socket for TcpSocket {
    fn open(&mut self) -> bool {
        match self.try_open() {
            Ok(()) => {
                info!("stream connection established to {}:{}", self.addr, self.port);
                true
            }
            Err(e) => {
                error!(
                    "failed to open stream socket to {}:{}: {}",
                    self.addr, self.port, e
                );
                false
            }
        }
    }

    fn close(&mut self) {
        if self.fd.take().is_some() {
            debug!("stream socket closed");
        }
    }

    fn send(&mut self, data: &[u8]) -> bool {
        match self.try_send(data) {
            Ok(()) => true,
            Err(e) => {
                error!("send failed: {}", e);
                false
            }
        }
    }

    fn receive(&mut self) -> Vec<u8> {
        self.recv(DEFAULT_RECV_SIZE)
    }
}
