//! # libsock
//!
//! This is a small blocking socket toolkit tailored for simple point-to-point networking on
//! linux. It wraps connection-oriented (TCP) and connectionless (UDP) endpoints behind one
//! uniform open/send/receive/close contract, layering partial-I/O retries, bounded waits and
//! delimiter framing on top of plain blocking system calls. There is no executor and no event
//! loop; every call runs to completion on the caller's thread, which keeps each socket a
//! single-connection, single-flow object.
//!
//! At a high level a TCP exchange works as you would expect:
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use libsock::net::{Socket, TcpSocket};
//!
//! let mut client = TcpSocket::new("127.0.0.1", 9091);
//!
//! if !client.open() {
//!     eprintln!("failed to reach remote server");
//!     return;
//! }
//!
//! client.set_keep_alive(true);
//!
//! if client.send(b"Hello from client!") {
//!     let response = client.recv_timeout(Duration::from_secs(3), 4096);
//!     println!("Server response: {}", String::from_utf8_lossy(&response));
//! }
//!
//! client.close();
//! ```
//!
//! Datagram endpoints follow the same shape, the only difference being that opening one never
//! performs a handshake and therefore only fails on local errors:
//!
//! ```no_run
//! use libsock::net::{Socket, UdpSocket};
//!
//! let mut socket = UdpSocket::new("127.0.0.1", 9092);
//!
//! if socket.open() {
//!     socket.send(b"ping");
//!     let reply = socket.receive();
//!     println!("Reply: {}", String::from_utf8_lossy(&reply));
//!     socket.close();
//! }
//! ```
//!
//! Failures never cross the contract as structured errors: operations answer with a boolean or
//! an empty buffer and the diagnostic detail goes to [tracing]. Callers that need to tell "no
//! data" from "peer closed" from "hard error" can use the `try_*` variants on the concrete
//! types, which expose the [net::Received] tri-state and a structured [net::Error].

pub mod net;
