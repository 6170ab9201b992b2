//! In-process syslog receivers for integration tests.

use std::{
    io::Read,
    net::{SocketAddr, TcpListener},
    sync::mpsc,
    thread,
};

/// Accept `connections` TCP clients in turn, reporting each client's bytes
/// once it disconnects.
pub fn spawn_tcp_collector(connections: usize) -> (SocketAddr, mpsc::Receiver<Vec<u8>>) {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind ephemeral listener");
    let addr = listener.local_addr().expect("listener has address");
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for _ in 0..connections {
            let (mut stream, _) = listener.accept().expect("accept connection");
            let mut received = Vec::new();
            // A reset peer still reports what arrived before the reset.
            let _ = stream.read_to_end(&mut received);
            if tx.send(received).is_err() {
                return;
            }
        }
    });
    (addr, rx)
}

/// Split an octet-counted stream into its messages.
pub fn split_octet_frames(mut stream: &[u8]) -> Vec<String> {
    let mut frames = Vec::new();
    while !stream.is_empty() {
        let space = stream
            .iter()
            .position(|b| *b == b' ')
            .expect("frame has a length prefix");
        let len: usize = std::str::from_utf8(&stream[..space])
            .expect("ascii length")
            .parse()
            .expect("numeric length");
        let body = &stream[space + 1..space + 1 + len];
        frames.push(String::from_utf8(body.to_vec()).expect("utf-8 frame"));
        stream = &stream[space + 1 + len..];
    }
    frames
}
