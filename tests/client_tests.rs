//! End-to-end behaviour of `ScribeClient` against a recording transport.

mod test_utils;

use std::{
    thread,
    time::{Duration, Instant},
};

use rstest::rstest;
use scribe_rs::{
    ScribeClient, ScribeConfigBuilder, SendFailurePolicy,
    test_utils::{RecordingTransport, wait_until},
};
use test_utils::{FAST_RECONNECT, WAIT, fast_builder};

fn start(builder: ScribeConfigBuilder, transport: &RecordingTransport) -> ScribeClient {
    let config = builder.build().expect("valid config");
    ScribeClient::with_transport(config, transport.clone())
}

fn batch_sizes(transport: &RecordingTransport) -> Vec<usize> {
    transport.batches().iter().map(Vec::len).collect()
}

#[rstest]
fn is_open_flips_after_first_successful_connect(fast_builder: ScribeConfigBuilder) {
    let transport = RecordingTransport::offline();
    let client = start(fast_builder, &transport);

    assert!(!client.is_open());
    assert!(transport.wait_for_attempts(2, WAIT));
    assert!(!client.is_open());

    transport.go_online();
    assert!(wait_until(WAIT, || client.is_open()));
    assert!(transport.batches().is_empty(), "connecting must not need a log call");

    client.shutdown();
}

#[rstest]
#[case(1)]
#[case(4)]
fn stops_retrying_after_first_success(
    fast_builder: ScribeConfigBuilder,
    #[case] failures: usize,
) {
    let transport = RecordingTransport::failing_first(failures);
    let client = start(fast_builder, &transport);

    assert!(wait_until(WAIT, || client.is_open()));
    thread::sleep(FAST_RECONNECT * 5);
    assert_eq!(transport.attempts(), failures + 1);
    assert_eq!(transport.connections(), 1);

    client.shutdown();
}

#[rstest]
fn backlog_ships_in_bounded_batches_once_connected(
    #[with("collector.internal:1463", 2)] fast_builder: ScribeConfigBuilder,
) {
    let transport = RecordingTransport::offline();
    let client = start(fast_builder, &transport);

    for n in 1..=5 {
        client.log("Debug", &n.to_string());
    }
    thread::sleep(Duration::from_millis(50));
    assert!(!client.is_open());
    assert!(transport.batches().is_empty());
    assert_eq!(client.pending(), 5);

    transport.go_online();
    assert!(transport.wait_for_delivered(5, WAIT));
    assert_eq!(batch_sizes(&transport), vec![2, 2, 1]);
    assert_eq!(transport.delivered_messages(), vec!["1", "2", "3", "4", "5"]);
    assert_eq!(client.pending(), 0);

    client.shutdown();
}

#[rstest]
fn overflow_keeps_the_oldest_entries(
    #[with("collector.internal:1463", 10, 3)] fast_builder: ScribeConfigBuilder,
) {
    let transport = RecordingTransport::offline();
    let client = start(fast_builder, &transport);

    for n in 1..=5 {
        client.log("Debug", &format!("entry {n}"));
    }
    assert_eq!(client.pending(), 3);

    transport.go_online();
    assert!(transport.wait_for_delivered(3, WAIT));
    thread::sleep(Duration::from_millis(20));
    assert_eq!(
        transport.delivered_messages(),
        vec!["entry 1", "entry 2", "entry 3"]
    );

    client.shutdown();
}

#[rstest]
fn log_never_blocks_on_a_full_queue(
    #[with("collector.internal:1463", 2, 1)] fast_builder: ScribeConfigBuilder,
) {
    let transport = RecordingTransport::offline();
    let client = start(fast_builder, &transport);

    let start = Instant::now();
    for n in 0..10_000 {
        client.log("Debug", &n.to_string());
    }
    assert!(start.elapsed() < Duration::from_secs(1), "log blocked for {:?}", start.elapsed());
    assert_eq!(client.pending(), 1);

    client.shutdown();
}

#[rstest]
fn failed_send_is_dropped_and_later_batches_flow(fast_builder: ScribeConfigBuilder) {
    let transport = RecordingTransport::new();
    transport.fail_next_sends(1);
    let client = start(fast_builder, &transport);
    assert!(wait_until(WAIT, || client.is_open()));

    client.log("Debug", "lost");
    assert!(transport.wait_for_failed(1, WAIT));
    client.log("Debug", "kept");
    assert!(transport.wait_for_delivered(1, WAIT));

    assert_eq!(transport.delivered_messages(), vec!["kept"]);
    assert_eq!(transport.connections(), 1);
    assert!(client.is_open());

    client.shutdown();
}

#[rstest]
fn reconnect_policy_opens_a_fresh_connection(fast_builder: ScribeConfigBuilder) {
    let transport = RecordingTransport::new();
    transport.fail_next_sends(1);
    let client = start(
        fast_builder.with_send_failure_policy(SendFailurePolicy::Reconnect),
        &transport,
    );
    assert!(wait_until(WAIT, || client.is_open()));

    client.log("Debug", "lost");
    assert!(transport.wait_for_failed(1, WAIT));
    assert!(wait_until(WAIT, || transport.connections() == 2));
    assert!(wait_until(WAIT, || client.is_open()));

    client.log("Debug", "after reconnect");
    assert!(transport.wait_for_delivered(1, WAIT));
    assert_eq!(transport.delivered_messages(), vec!["after reconnect"]);

    client.shutdown();
}

#[rstest]
fn shutdown_drains_and_ignores_later_logs(fast_builder: ScribeConfigBuilder) {
    let transport = RecordingTransport::new();
    let client = start(fast_builder, &transport);
    assert!(wait_until(WAIT, || client.is_open()));

    for n in 1..=4 {
        client.log("Debug", &n.to_string());
    }
    client.shutdown();
    assert_eq!(transport.delivered_messages(), vec!["1", "2", "3", "4"]);

    client.log("Debug", "too late");
    assert_eq!(client.pending(), 0);
    client.shutdown();
}

#[rstest]
fn shutdown_interrupts_reconnect_delay(fast_builder: ScribeConfigBuilder) {
    let transport = RecordingTransport::offline();
    let client = start(
        fast_builder.with_reconnect_timeout_secs(3600),
        &transport,
    );
    assert!(transport.wait_for_attempts(1, WAIT));

    let start = Instant::now();
    client.shutdown();
    assert!(start.elapsed() < WAIT, "shutdown took {:?}", start.elapsed());
    assert_eq!(transport.attempts(), 1);
}

#[rstest]
fn dropping_the_client_keeps_workers_running(fast_builder: ScribeConfigBuilder) {
    let transport = RecordingTransport::offline();
    let client = start(fast_builder, &transport);
    assert!(transport.wait_for_attempts(2, WAIT));
    client.log("Debug", "queued before drop");
    drop(client);

    let attempts = transport.attempts();
    assert!(transport.wait_for_attempts(attempts + 3, WAIT));

    transport.go_online();
    assert!(transport.wait_for_delivered(1, WAIT));
    assert_eq!(transport.delivered_messages(), vec!["queued before drop"]);
}
