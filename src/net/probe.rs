use std::os::fd::{BorrowedFd, RawFd};

use nix::sys::socket::{getsockopt, sockopt};

/// Report whether a raw socket handle looks healthy: the handle is non-negative, the kernel
/// accepts an `SO_ERROR` query against it, and no error is pending.
///
/// Historically this check was known as "is port busy", but it never inspected port occupancy
/// at all; the behavior is kept as-is and only the name corrects the record. Callers use it
/// defensively before reusing a handle they obtained earlier.
pub fn is_socket_healthy(fd: RawFd) -> bool {
    if fd < 0 {
        return false;
    }

    // SAFETY: the fd is borrowed only for the duration of the getsockopt call; a stale or
    // foreign fd makes the kernel return an error, which reads as unhealthy.
    let fd = unsafe { BorrowedFd::borrow_raw(fd) };
    matches!(getsockopt(&fd, sockopt::SocketError), Ok(0))
}
