use std::net::{SocketAddr, ToSocketAddrs};

use super::{Error, Result};

/// Resolve a remote endpoint into a concrete [SocketAddr].
///
/// Accepts dotted-quad IPv4 literals as well as anything the system resolver can turn into an
/// address. IPv4 results are preferred when present so behavior stays stable on dual-stack
/// hosts, but a v6-only resolution is still usable. Port 0 is never a valid remote port and is
/// rejected up front.
pub(super) fn resolve(host: &str, port: u16) -> Result<SocketAddr> {
    if port == 0 {
        return Err(Error::InvalidAddress(format!("{}:{}", host, port)));
    }

    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|_| Error::InvalidAddress(format!("{}:{}", host, port)))?
        .collect();

    addrs
        .iter()
        .find(|addr| addr.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
        .ok_or_else(|| Error::InvalidAddress(format!("{}:{}", host, port)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_loopback_literal() {
        let addr = resolve("127.0.0.1", 8080).unwrap();
        assert!(addr.is_ipv4());
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn rejects_port_zero() {
        assert!(resolve("127.0.0.1", 0).is_err());
    }

    #[test]
    fn rejects_garbage_host() {
        assert!(resolve("not an address", 8080).is_err());
    }

    #[test]
    fn carries_requested_port_through_resolution() {
        // "localhost" may resolve to ::1, 127.0.0.1 or both depending on the host setup;
        // whichever address wins must carry the requested port.
        if let Ok(addr) = resolve("localhost", 9091) {
            assert_eq!(addr.port(), 9091);
        }
    }
}
