#![allow(dead_code)]

use std::{
    io::{Read, Write},
    net::{TcpListener, UdpSocket},
    thread,
    time::Duration,
};

/// Tag every echo collaborator prefixes onto its responses.
pub const ECHO_PREFIX: &[u8] = b"Echo: ";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Spawn a TCP echo server handling `clients` sequential connections: read once, respond with
/// the payload wrapped in [ECHO_PREFIX], close the client. Returns the bound port.
pub fn tcp_echo_server(clients: usize) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind echo listener");
    let port = listener.local_addr().expect("listener addr").port();

    thread::spawn(move || {
        for stream in listener.incoming().take(clients) {
            let Ok(mut stream) = stream else { break };
            let mut buf = [0u8; 1024];
            let n = stream.read(&mut buf).unwrap_or(0);
            if n > 0 {
                let mut response = ECHO_PREFIX.to_vec();
                response.extend_from_slice(&buf[..n]);
                let _ = stream.write_all(&response);
            }
        }
    });

    port
}

/// Spawn a TCP server that accepts one client and dribbles `payload` out one byte at a time,
/// then closes. Exercises reassembly across maximally fragmented reads.
pub fn tcp_drip_server(payload: Vec<u8>) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind drip listener");
    let port = listener.local_addr().expect("listener addr").port();

    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            for byte in payload {
                if stream.write_all(&[byte]).is_err() {
                    break;
                }
                let _ = stream.flush();
                thread::sleep(Duration::from_millis(1));
            }
        }
    });

    port
}

/// Spawn a TCP server that accepts one client and then stays silent until the client hangs up.
pub fn tcp_silent_server() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind silent listener");
    let port = listener.local_addr().expect("listener addr").port();

    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            // Hold the connection open; the client side is expected to time out and drop.
            let mut buf = [0u8; 16];
            let _ = stream.read(&mut buf);
        }
    });

    port
}

/// Spawn a UDP echo server answering `messages` datagrams, each response wrapped in
/// [ECHO_PREFIX] and sent back to the datagram's origin.
pub fn udp_echo_server(messages: usize) -> u16 {
    let socket = UdpSocket::bind("127.0.0.1:0").expect("bind echo socket");
    let port = socket.local_addr().expect("socket addr").port();

    thread::spawn(move || {
        let mut buf = [0u8; 1024];
        for _ in 0..messages {
            let Ok((n, origin)) = socket.recv_from(&mut buf) else {
                break;
            };
            let mut response = ECHO_PREFIX.to_vec();
            response.extend_from_slice(&buf[..n]);
            let _ = socket.send_to(&response, origin);
        }
    });

    port
}

/// Spawn a UDP server that waits for one datagram to learn the client's address, then sends the
/// given replies back in order.
pub fn udp_burst_server(replies: Vec<Vec<u8>>) -> u16 {
    let socket = UdpSocket::bind("127.0.0.1:0").expect("bind burst socket");
    let port = socket.local_addr().expect("socket addr").port();

    thread::spawn(move || {
        let mut buf = [0u8; 1024];
        if let Ok((_, origin)) = socket.recv_from(&mut buf) {
            for reply in replies {
                let _ = socket.send_to(&reply, origin);
                thread::sleep(Duration::from_millis(1));
            }
        }
    });

    port
}
