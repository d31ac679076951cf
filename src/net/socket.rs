use std::{
    io,
    net::SocketAddr,
    os::fd::{BorrowedFd, OwnedFd},
    time::Duration,
};

use memchr::memmem;
use nix::{
    poll::{poll, PollFd, PollFlags, PollTimeout},
    sys::{
        socket::{socket, AddressFamily, SockFlag, SockType},
        time::{TimeVal, TimeValLike},
    },
};

use super::Result;

/// Number of bytes a single [Socket::receive] call will pull off the wire.
pub const DEFAULT_RECV_SIZE: usize = 4096;

/// The uniform contract shared by every socket kind.
///
/// A caller constructs a concrete socket with a destination, calls [Socket::open] to acquire the
/// OS handle, issues any number of [Socket::send]/[Socket::receive] operations and finally
/// [Socket::close]. Dropping the value closes implicitly. Failures never panic and never surface
/// structured errors through this trait; they degrade to a `false` or an empty buffer, with the
/// diagnostic detail reported through [tracing]. The concrete types expose richer `try_*`
/// variants for callers that need to tell failure modes apart.
pub trait Socket {
    /// Acquire the OS handle and make the endpoint ready for I/O. For stream sockets this
    /// performs the blocking connection handshake; for datagram sockets it only resolves and
    /// caches the destination. Returns `false` and leaves the instance closed on any failure,
    /// releasing any handle acquired along the way.
    fn open(&mut self) -> bool;

    /// Release the handle if one is open. Safe to call any number of times.
    fn close(&mut self);

    /// Blocking delivery of the full byte sequence. Empty input on an open socket trivially
    /// succeeds without touching the wire. Transient would-block conditions are retried
    /// transparently; on `false` the completion state is undefined and the caller should treat
    /// the socket as unusable.
    fn send(&mut self, data: &[u8]) -> bool;

    /// Convenience receive of at most [DEFAULT_RECV_SIZE] bytes.
    fn receive(&mut self) -> Vec<u8>;
}

/// Outcome of a single receive attempt that did not hard-fail.
///
/// The sentinel-style receive calls collapse all three of these into "some bytes or none"; this
/// type is what keeps would-block and orderly peer shutdown distinguishable for callers that
/// want the difference.
#[derive(Debug, PartialEq, Eq)]
pub enum Received {
    /// Bytes read off the wire. A datagram socket reports a zero-length datagram as zero bytes
    /// here; that is a valid receive, not a close.
    Data(Vec<u8>),
    /// Nothing is available right now (would-block). Not an error and not a close.
    Empty,
    /// The peer performed an orderly shutdown. Stream sockets only.
    Closed,
}

fn family(addr: &SocketAddr) -> AddressFamily {
    if addr.is_ipv4() {
        AddressFamily::Inet
    } else {
        AddressFamily::Inet6
    }
}

pub(super) fn stream_socket(addr: &SocketAddr) -> io::Result<OwnedFd> {
    socket(family(addr), SockType::Stream, SockFlag::empty(), None).map_err(io::Error::from)
}

pub(super) fn dgram_socket(addr: &SocketAddr) -> io::Result<OwnedFd> {
    socket(family(addr), SockType::Datagram, SockFlag::empty(), None).map_err(io::Error::from)
}

/// Wait up to `timeout` for the handle to become readable. `Ok(false)` means the wait expired
/// with nothing to read.
pub(super) fn poll_readable(fd: BorrowedFd<'_>, timeout: Duration) -> Result<bool> {
    let millis = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
    let timeout = PollTimeout::try_from(millis).unwrap_or(PollTimeout::MAX);

    let mut fds = [PollFd::new(fd, PollFlags::POLLIN)];
    let ready = poll(&mut fds, timeout)?;

    Ok(ready > 0 && fds[0].revents().is_some_and(|events| !events.is_empty()))
}

pub(super) fn timeval(value: Duration) -> TimeVal {
    TimeVal::microseconds(i64::try_from(value.as_micros()).unwrap_or(i64::MAX))
}

/// Scan an accumulating buffer for a delimiter after `appended` new bytes landed at its tail,
/// returning the index one past the first occurrence. Only the new suffix plus
/// `delimiter.len() - 1` bytes of overlap are examined, so a delimiter split across two reads
/// is still found without rescanning the whole buffer every time.
pub(super) fn delimiter_end(buf: &[u8], appended: usize, delimiter: &[u8]) -> Option<usize> {
    let overlap = delimiter.len().saturating_sub(1);
    let start = buf.len().saturating_sub(appended + overlap);

    memmem::find(&buf[start..], delimiter).map(|pos| start + pos + delimiter.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_delimiter_spanning_two_reads() {
        // "AB" splits across the appends; the overlap scan must still see it.
        let mut buf = b"xxA".to_vec();
        buf.extend_from_slice(b"Byy");
        assert_eq!(delimiter_end(&buf, 3, b"AB"), Some(4));
    }

    #[test]
    fn reports_first_occurrence_only() {
        let buf = b"a|b|c".to_vec();
        assert_eq!(delimiter_end(&buf, buf.len(), b"|"), Some(2));
    }

    #[test]
    fn misses_absent_delimiter() {
        let buf = b"abcdef".to_vec();
        assert_eq!(delimiter_end(&buf, 6, b"\r\n"), None);
    }

    #[test]
    fn empty_delimiter_matches_immediately() {
        let buf = b"abc".to_vec();
        assert_eq!(delimiter_end(&buf, 3, b""), Some(0));
    }
}
