//! `ScribeClient` shipping over the bundled framed TCP transport.

mod test_utils;

use std::{
    io::Read,
    net::{TcpListener, TcpStream},
    sync::mpsc,
    thread,
};

use rstest::rstest;
use scribe_rs::{LogEntry, ScribeClient, ScribeConfigBuilder, test_utils::wait_until};
use test_utils::{WAIT, fast_builder};

fn read_batch(stream: &mut TcpStream) -> Option<Vec<LogEntry>> {
    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf).ok()?;
    let mut payload = vec![0u8; u32::from_be_bytes(len_buf) as usize];
    stream.read_exact(&mut payload).ok()?;
    rmp_serde::from_slice(&payload).ok()
}

/// Accept one connection and forward every decoded batch.
fn spawn_collector(listener: TcpListener) -> mpsc::Receiver<Vec<LogEntry>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept connection");
        while let Some(batch) = read_batch(&mut stream) {
            if tx.send(batch).is_err() {
                break;
            }
        }
    });
    rx
}

#[rstest]
fn ships_entries_to_a_tcp_collector() {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind ephemeral listener");
    let address = listener.local_addr().expect("listener has address").to_string();
    let batches = spawn_collector(listener);

    let config = fast_builder(&address, 2, 16).build().expect("valid config");
    let client = ScribeClient::new(config);
    assert!(wait_until(WAIT, || client.is_open()));

    client.log("Debug", "Test Message");
    client.log("Audit", "second");
    client.log("Audit", "third");

    let mut received = Vec::new();
    while received.len() < 3 {
        let batch = batches.recv_timeout(WAIT).expect("batch should arrive");
        assert!(batch.len() <= 2, "batch of {} exceeds limit", batch.len());
        received.extend(batch);
    }
    assert_eq!(
        received,
        vec![
            LogEntry::new("Debug", "Test Message"),
            LogEntry::new("Audit", "second"),
            LogEntry::new("Audit", "third"),
        ]
    );

    client.shutdown();
}

#[rstest]
fn connects_once_the_collector_starts_listening() {
    let probe = TcpListener::bind(("127.0.0.1", 0)).expect("bind ephemeral listener");
    let address = probe.local_addr().expect("listener has address");
    drop(probe);

    let builder: ScribeConfigBuilder = fast_builder(&address.to_string(), 2, 16);
    let client = ScribeClient::new(builder.build().expect("valid config"));
    thread::sleep(std::time::Duration::from_millis(50));
    assert!(!client.is_open());

    let listener = TcpListener::bind(address).expect("rebind collector port");
    let batches = spawn_collector(listener);
    assert!(wait_until(WAIT, || client.is_open()));

    client.log("Debug", "late start");
    let batch = batches.recv_timeout(WAIT).expect("batch should arrive");
    assert_eq!(batch, vec![LogEntry::new("Debug", "late start")]);

    client.shutdown();
}
