//! The [self] package handles all logic relating to opening and driving point-to-point network
//! sockets. It exposes a small set of blocking socket implementations behind one capability
//! contract, so simple client networking looks the same across transport kinds.
//!
//! This module primarily exposes the following objects:
//! - [Socket] which is the uniform open/close/send/receive contract.
//! - [TcpSocket] which represents a blocking connection-oriented stream socket.
//! - [UdpSocket] which represents a blocking connectionless datagram socket.
//!
//! Every operation is a direct blocking system call on the caller's thread; there is no
//! internal scheduling of any kind, and each instance is meant to be driven by one logical flow
//! of control at a time. Only [TcpSocket::recv_timeout] and [UdpSocket::recv_timeout] bound
//! their own waiting; the per-handle OS timeouts set through `set_recv_timeout` and
//! `set_send_timeout` are the opt-in bound for everything else.

mod addr;
mod dgram;
mod error;
mod probe;
mod socket;
mod stream;

pub use dgram::UdpSocket;
pub use error::{Error, Result};
pub use probe::is_socket_healthy;
pub use socket::{Received, Socket, DEFAULT_RECV_SIZE};
pub use stream::TcpSocket;
