//! Tests for the syslog output connection manager.

use std::{
    io::Read,
    net::{SocketAddr, TcpListener, UdpSocket},
    sync::mpsc,
    thread,
    time::Duration,
};

use chrono::{DateTime, TimeZone, Utc};
use rstest::{fixture, rstest};

use crate::{
    builder::SyslogOutputBuilder,
    error::SyslogError,
    framing::{Framing, Trailer},
    mapper::{SdidConfig, StaticHost, SyslogMapper},
    metric::Metric,
    test_utils::recording_dialer::RecordingDialer,
};

use super::{NetDialer, SyslogOutput};

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

#[fixture]
fn timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2010, 11, 10, 23, 0, 0).unwrap()
}

#[fixture]
fn tcp_listener() -> TcpListener {
    TcpListener::bind(("127.0.0.1", 0)).expect("bind ephemeral listener")
}

fn metric(name: &str, timestamp: DateTime<Utc>) -> Metric {
    Metric::new(name, timestamp).with_field("value", 1_u64)
}

fn recording_output(framing: Framing) -> (SyslogOutput<RecordingDialer>, RecordingDialer) {
    let dialer = RecordingDialer::new();
    let mapper = SyslogMapper::with_host(SdidConfig::default(), StaticHost::new("localbox"));
    let output = SyslogOutput::new(mapper, framing, Trailer::Lf, dialer.clone());
    (output, dialer)
}

fn net_output(address: &str, framing: Framing) -> SyslogOutput<NetDialer> {
    let builder = SyslogOutputBuilder::new()
        .with_address(address)
        .with_framing(framing)
        .with_trailer(Trailer::Lf)
        .with_connect_timeout_ms(1_000);
    let dialer = builder.build_dialer().expect("valid address");
    builder
        .build_with(StaticHost::new("localbox"), dialer)
        .expect("valid config")
}

/// Accept `connections` clients in turn and report everything each one sent.
fn spawn_collecting_server(
    listener: TcpListener,
    connections: usize,
) -> (SocketAddr, mpsc::Receiver<Vec<u8>>) {
    let addr = listener.local_addr().expect("listener has address");
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for _ in 0..connections {
            let (mut stream, _) = listener.accept().expect("accept connection");
            let mut received = Vec::new();
            stream.read_to_end(&mut received).expect("read stream");
            tx.send(received).expect("send payload");
        }
    });
    (addr, rx)
}

#[rstest]
fn writes_frames_over_tcp(tcp_listener: TcpListener, timestamp: DateTime<Utc>) {
    let (addr, rx) = spawn_collecting_server(tcp_listener, 1);
    let mut output = net_output(&format!("tcp://{addr}"), Framing::OctetCounting);
    let metrics = [metric("first", timestamp), metric("second", timestamp)];

    output.write(&metrics).expect("write succeeds");
    assert!(output.is_connected());
    let expected: Vec<u8> = metrics
        .iter()
        .flat_map(|m| output.frame_metric(m).unwrap())
        .collect();
    drop(output);

    let received = rx.recv_timeout(RECV_TIMEOUT).expect("server received data");
    assert_eq!(received, expected);
    assert!(received.starts_with(b"53 <0>1 2010-11-10T23:00:00Z localbox Telegraf - first -"));
}

#[rstest]
fn reconnects_after_close(tcp_listener: TcpListener, timestamp: DateTime<Utc>) {
    let (addr, rx) = spawn_collecting_server(tcp_listener, 2);
    let mut output = net_output(&format!("tcp://{addr}"), Framing::NonTransparent);

    output.write(&[metric("before", timestamp)]).unwrap();
    output.close();
    assert!(!output.is_connected());
    let first = rx.recv_timeout(RECV_TIMEOUT).expect("first connection");
    assert!(first.ends_with(b"before -\n"));

    output.write(&[metric("after", timestamp)]).unwrap();
    assert!(output.is_connected());
    drop(output);
    let second = rx.recv_timeout(RECV_TIMEOUT).expect("second connection");
    assert!(second.ends_with(b"after -\n"));
}

#[rstest]
fn connect_failure_leaves_output_disconnected(tcp_listener: TcpListener) {
    let addr = tcp_listener.local_addr().unwrap();
    drop(tcp_listener);
    let mut output = net_output(&format!("tcp://{addr}"), Framing::OctetCounting);

    let err = output.connect().expect_err("nothing is listening");
    assert!(matches!(&err, SyslogError::Connect { address, .. } if address.contains(&addr.port().to_string())));
    assert!(err.is_transport());
    assert!(!output.is_connected());
}

#[rstest]
fn writes_datagrams_over_udp(timestamp: DateTime<Utc>) {
    let server = UdpSocket::bind(("127.0.0.1", 0)).expect("bind udp socket");
    server.set_read_timeout(Some(RECV_TIMEOUT)).unwrap();
    let addr = server.local_addr().unwrap();
    let mut output = net_output(&format!("udp://{addr}"), Framing::NonTransparent);
    let sent = metric("udp", timestamp);

    output.write(std::slice::from_ref(&sent)).expect("send datagram");

    let mut buf = [0u8; 2048];
    let (len, _) = server.recv_from(&mut buf).expect("receive datagram");
    assert_eq!(&buf[..len], output.frame_metric(&sent).unwrap().as_slice());
}

#[cfg(unix)]
#[rstest]
fn writes_frames_over_unix_stream(timestamp: DateTime<Utc>) {
    use std::os::unix::net::UnixListener;

    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("syslog.sock");
    let listener = UnixListener::bind(&path).expect("bind unix listener");
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept unix client");
        let mut received = Vec::new();
        stream.read_to_end(&mut received).expect("read unix stream");
        received
    });

    let mut output = net_output(&format!("unix://{}", path.display()), Framing::OctetCounting);
    let sent = metric("local", timestamp);
    output.write(std::slice::from_ref(&sent)).unwrap();
    let expected = output.frame_metric(&sent).unwrap();
    drop(output);

    assert_eq!(handle.join().expect("server thread"), expected);
}

#[rstest]
fn empty_batch_does_not_dial() {
    let (mut output, dialer) = recording_output(Framing::OctetCounting);
    output.write(&[]).unwrap();
    assert_eq!(dialer.dials(), 0);
    assert!(!output.is_connected());
}

#[rstest]
fn dials_once_for_a_batch(timestamp: DateTime<Utc>) {
    let (mut output, dialer) = recording_output(Framing::OctetCounting);
    let metrics = [metric("a", timestamp), metric("b", timestamp), metric("c", timestamp)];
    output.write(&metrics).unwrap();
    assert_eq!(dialer.dials(), 1);
    let expected: Vec<Vec<u8>> = metrics
        .iter()
        .map(|m| output.frame_metric(m).unwrap())
        .collect();
    assert_eq!(dialer.frames(), expected);
}

#[rstest]
fn send_failure_disconnects_and_next_write_redials(timestamp: DateTime<Utc>) {
    let (mut output, dialer) = recording_output(Framing::NonTransparent);
    dialer.fail_next_sends(1);

    let err = output
        .write(&[metric("lost", timestamp), metric("skipped", timestamp)])
        .expect_err("send fails");
    assert!(matches!(err, SyslogError::Write(_)));
    assert!(!output.is_connected());
    assert_eq!(dialer.shutdowns(), 1);
    assert!(dialer.frames().is_empty(), "rest of the batch is not attempted");

    output.write(&[metric("retry", timestamp)]).unwrap();
    assert!(output.is_connected());
    assert_eq!(dialer.dials(), 2);
    assert_eq!(dialer.frames().len(), 1);
}

#[rstest]
fn dial_failure_is_reported_and_retried_on_next_write(timestamp: DateTime<Utc>) {
    let (mut output, dialer) = recording_output(Framing::OctetCounting);
    dialer.fail_next_dials(1);

    let err = output.write(&[metric("m", timestamp)]).expect_err("dial fails");
    assert!(matches!(&err, SyslogError::Connect { address, .. } if address == "memory://recording"));
    assert!(!output.is_connected());

    output.write(&[metric("m", timestamp)]).unwrap();
    assert_eq!(dialer.dials(), 2);
    assert_eq!(dialer.frames().len(), 1);
}

#[rstest]
fn mapping_failure_keeps_connection(timestamp: DateTime<Utc>) {
    let (mut output, dialer) = recording_output(Framing::OctetCounting);
    let bad = Metric::new("bad", timestamp).with_field("PRI", -1_i64);

    let err = output
        .write(&[metric("good", timestamp), bad, metric("never", timestamp)])
        .expect_err("negative PRI");
    assert!(matches!(err, SyslogError::Mapping(_)));
    assert!(!err.is_transport());
    assert!(output.is_connected());
    assert_eq!(dialer.frames().len(), 1);
    assert_eq!(dialer.shutdowns(), 0);
}

#[rstest]
fn out_of_range_priority_does_not_abort_batch(timestamp: DateTime<Utc>) {
    let (mut output, dialer) = recording_output(Framing::NonTransparent);
    let loud = Metric::new("loud", timestamp).with_field("PRI", 500_u64);

    output
        .write(&[loud, metric("after", timestamp)])
        .expect("batch delivered");
    let frames = dialer.frames();
    assert_eq!(frames.len(), 2);
    assert!(frames[0].starts_with(b"<0>1 2010-11-10T23:00:00Z localbox Telegraf - loud -"));
}

#[rstest]
fn connect_replaces_existing_connection() {
    let (mut output, dialer) = recording_output(Framing::OctetCounting);
    output.connect().unwrap();
    output.connect().unwrap();
    assert_eq!(dialer.dials(), 2);
    assert_eq!(dialer.shutdowns(), 1);
    assert!(output.is_connected());
}

#[rstest]
fn close_is_idempotent_and_drop_closes() {
    let (mut output, dialer) = recording_output(Framing::OctetCounting);
    output.close();
    assert_eq!(dialer.shutdowns(), 0);

    output.connect().unwrap();
    output.close();
    output.close();
    assert_eq!(dialer.shutdowns(), 1);

    output.connect().unwrap();
    drop(output);
    assert_eq!(dialer.shutdowns(), 2);
}
