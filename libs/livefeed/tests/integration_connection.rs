//! Integration tests for connection lifecycle and event delivery
//!
//! These tests drive a real FeedClient against a local mock feed server.

mod common;

use common::{next_event, next_state, MockFeedServer};
use livefeed::{ConnectionState, FeedClient};
use std::time::Duration;

fn record(probability: f64, amount: f64) -> String {
    format!(
        concat!(
            r#"{{"transaction":{{"Amount":{}}},"#,
            r#""prediction":{{"is_fraud":false,"fraud_probability":{},"top_features":[]}},"#,
            r#""actual_class":"Legitimate"}}"#
        ),
        amount, probability
    )
}

#[tokio::test(flavor = "multi_thread")]
async fn test_connect_and_receive_events_in_order() {
    let server = MockFeedServer::start().await;
    let client = FeedClient::builder()
        .endpoint(server.ws_url())
        .build()
        .unwrap();

    let subscription = client.subscribe();
    assert!(subscription.snapshot.is_empty());

    client.start();

    let state = next_state(&subscription.signals, Duration::from_secs(5)).await;
    assert_eq!(state, Some(ConnectionState::Connecting));
    let state = next_state(&subscription.signals, Duration::from_secs(5)).await;
    assert_eq!(state, Some(ConnectionState::Open));

    server.send_record(&record(0.10, 10.0));
    let first = next_event(&subscription.signals, Duration::from_secs(5))
        .await
        .expect("first event");
    assert_eq!(first.classification.probability, 0.10);

    server.send_record(&record(0.20, 20.0));
    let second = next_event(&subscription.signals, Duration::from_secs(5))
        .await
        .expect("second event");
    assert_eq!(second.classification.probability, 0.20);

    // buffer is newest first and consistent with delivery order
    let snapshot = client.snapshot();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot[0].id, second.id);
    assert_eq!(snapshot[1].id, first.id);

    client.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_malformed_message_is_dropped_and_connection_survives() {
    let server = MockFeedServer::start().await;
    let client = FeedClient::builder()
        .endpoint(server.ws_url())
        .build()
        .unwrap();

    let subscription = client.subscribe();
    client.start();

    assert_eq!(
        next_state(&subscription.signals, Duration::from_secs(5)).await,
        Some(ConnectionState::Connecting)
    );
    assert_eq!(
        next_state(&subscription.signals, Duration::from_secs(5)).await,
        Some(ConnectionState::Open)
    );

    // garbage, then a record missing its verdict, then a well-formed record
    server.send_record("this is not json");
    server.send_record(r#"{"prediction":{"fraud_probability":0.4}}"#);
    server.send_record(&record(0.30, 30.0));

    let event = next_event(&subscription.signals, Duration::from_secs(5))
        .await
        .expect("well-formed event still delivered");
    assert_eq!(event.classification.probability, 0.30);

    // the malformed messages neither reached the buffer nor moved the state
    assert_eq!(client.snapshot().len(), 1);
    assert_eq!(client.state(), ConnectionState::Open);
    assert_eq!(client.metrics().events_dropped, 2);
    assert_eq!(client.metrics().events_received, 3);

    client.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_stop_while_open_keeps_snapshot_and_goes_silent() {
    let server = MockFeedServer::start().await;
    let client = FeedClient::builder()
        .endpoint(server.ws_url())
        .build()
        .unwrap();

    let subscription = client.subscribe();
    client.start();

    assert_eq!(
        next_state(&subscription.signals, Duration::from_secs(5)).await,
        Some(ConnectionState::Connecting)
    );
    assert_eq!(
        next_state(&subscription.signals, Duration::from_secs(5)).await,
        Some(ConnectionState::Open)
    );

    for i in 0..3 {
        server.send_record(&record(0.1 * (i + 1) as f64, 5.0));
        next_event(&subscription.signals, Duration::from_secs(5))
            .await
            .expect("event");
    }

    let before_stop = client.snapshot();
    assert_eq!(before_stop.len(), 3);

    client.stop().await;
    assert_eq!(client.state(), ConnectionState::Idle);

    // a record pushed after stop never reaches this client
    server.send_record(&record(0.99, 999.0));
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(subscription.signals.try_recv().is_err());
    assert_eq!(client.snapshot().len(), 3);

    // stop is idempotent
    client.stop().await;
    assert_eq!(client.state(), ConnectionState::Idle);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_server_clean_close_is_terminal_and_not_a_failure() {
    let server = MockFeedServer::start().await;
    let client = FeedClient::builder()
        .endpoint(server.ws_url())
        .build()
        .unwrap();

    let subscription = client.subscribe();
    client.start();

    assert_eq!(
        next_state(&subscription.signals, Duration::from_secs(5)).await,
        Some(ConnectionState::Connecting)
    );
    assert_eq!(
        next_state(&subscription.signals, Duration::from_secs(5)).await,
        Some(ConnectionState::Open)
    );

    server.close_clean();

    // terminal Idle, with no Backoff/Connecting/Failed in between
    let state = next_state(&subscription.signals, Duration::from_secs(5)).await;
    assert_eq!(state, Some(ConnectionState::Idle));

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(subscription.signals.try_recv().is_err());
    assert_eq!(client.state(), ConnectionState::Idle);

    client.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_late_subscriber_gets_snapshot_not_history() {
    let server = MockFeedServer::start().await;
    let client = FeedClient::builder()
        .endpoint(server.ws_url())
        .buffer_capacity(2)
        .build()
        .unwrap();

    let early = client.subscribe();
    client.start();

    assert_eq!(
        next_state(&early.signals, Duration::from_secs(5)).await,
        Some(ConnectionState::Connecting)
    );
    assert_eq!(
        next_state(&early.signals, Duration::from_secs(5)).await,
        Some(ConnectionState::Open)
    );

    for i in 0..3 {
        server.send_record(&record(0.2, i as f64));
        next_event(&early.signals, Duration::from_secs(5))
            .await
            .expect("event");
    }

    // capacity 2: the late subscriber sees only what the buffer retains
    let late = client.subscribe();
    assert_eq!(late.snapshot.len(), 2);
    // and no replayed notifications
    assert!(matches!(
        late.signals.try_recv(),
        Err(crossbeam_channel::TryRecvError::Empty)
    ));

    // both subscribers receive new events
    server.send_record(&record(0.5, 50.0));
    let from_early = next_event(&early.signals, Duration::from_secs(5)).await.unwrap();
    let from_late = next_event(&late.signals, Duration::from_secs(5)).await.unwrap();
    assert_eq!(from_early.id, from_late.id);

    client.stop().await;
}
