//! Common test utilities for livefeed integration tests
//!
//! Provides a scriptable mock feed server and helpers for draining
//! subscription channels from async tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, Notify};

use livefeed::{ConnectionState, FeedSignal};

/// Macro for verbose test output (controlled by TEST_VERBOSE env var)
#[macro_export]
macro_rules! verbose_println {
    ($($arg:tt)*) => {
        if std::env::var("TEST_VERBOSE").is_ok() {
            println!($($arg)*);
        }
    };
}

/// A scriptable mock feed server
///
/// Can be told to sabotage the first N connection attempts (the socket is
/// accepted and immediately dropped, failing the WebSocket handshake), to
/// push records to every live connection, to close cleanly with a normal
/// close frame, or to vanish abruptly.
pub struct MockFeedServer {
    pub addr: SocketAddr,
    shutdown: Arc<Notify>,
    records: broadcast::Sender<String>,
    clean_close: broadcast::Sender<()>,
}

impl MockFeedServer {
    /// Start a server that accepts every connection
    pub async fn start() -> Self {
        Self::start_with_failures(0).await
    }

    /// Start a server that fails the first `fail_first` connection attempts
    pub async fn start_with_failures(fail_first: usize) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let (records, _) = broadcast::channel(64);
        let (clean_close, _) = broadcast::channel(4);
        let remaining_failures = Arc::new(AtomicUsize::new(fail_first));

        let shutdown_accept = Arc::clone(&shutdown);
        let records_accept = records.clone();
        let clean_accept = clean_close.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        match result {
                            Ok((stream, _)) => {
                                if remaining_failures
                                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                                        n.checked_sub(1)
                                    })
                                    .is_ok()
                                {
                                    // sabotage: kill the socket before the handshake
                                    drop(stream);
                                    continue;
                                }
                                let shutdown = Arc::clone(&shutdown_accept);
                                let records_rx = records_accept.subscribe();
                                let clean_rx = clean_accept.subscribe();
                                tokio::spawn(async move {
                                    Self::handle_connection(stream, shutdown, records_rx, clean_rx)
                                        .await;
                                });
                            }
                            Err(e) => {
                                eprintln!("Accept error: {}", e);
                                break;
                            }
                        }
                    }
                    _ = shutdown_accept.notified() => {
                        break;
                    }
                }
            }
        });

        Self {
            addr,
            shutdown,
            records,
            clean_close,
        }
    }

    async fn handle_connection(
        stream: TcpStream,
        shutdown: Arc<Notify>,
        mut records_rx: broadcast::Receiver<String>,
        mut clean_rx: broadcast::Receiver<()>,
    ) {
        use futures_util::{SinkExt, StreamExt};
        use tokio_tungstenite::accept_async;
        use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
        use tokio_tungstenite::tungstenite::protocol::CloseFrame;
        use tokio_tungstenite::tungstenite::Message;

        let ws_stream = match accept_async(stream).await {
            Ok(ws) => ws,
            Err(e) => {
                eprintln!("WebSocket handshake failed: {}", e);
                return;
            }
        };

        let (mut write, mut read) = ws_stream.split();

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(msg)) if msg.is_close() => break,
                        Some(Ok(_)) => {}
                        Some(Err(_)) | None => break,
                    }
                }
                record = records_rx.recv() => {
                    match record {
                        Ok(text) => {
                            if write.send(Message::Text(text)).await.is_err() {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
                _ = clean_rx.recv() => {
                    let close = Message::Close(Some(CloseFrame {
                        code: CloseCode::Normal,
                        reason: "server done".into(),
                    }));
                    let _ = write.send(close).await;
                    break;
                }
                _ = shutdown.notified() => {
                    // abrupt exit, no close frame
                    break;
                }
            }
        }
    }

    /// Get the WebSocket URL for this server
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Push one record to every live connection
    pub fn send_record(&self, record: &str) {
        let _ = self.records.send(record.to_string());
    }

    /// Close every live connection with a normal close frame
    pub fn close_clean(&self) {
        let _ = self.clean_close.send(());
    }

    /// Tear the server down abruptly
    pub fn shutdown(&self) {
        self.shutdown.notify_waiters();
    }
}

impl Drop for MockFeedServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// A ws:// URL that nothing is listening on
pub async fn unreachable_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("ws://{}", addr)
}

/// Drain the next signal, polling so the client task can make progress
pub async fn next_signal(
    rx: &crossbeam_channel::Receiver<FeedSignal>,
    timeout: Duration,
) -> Option<FeedSignal> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if let Ok(signal) = rx.try_recv() {
            return Some(signal);
        }
        if tokio::time::Instant::now() >= deadline {
            return None;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Next state-change notification, skipping event notifications
pub async fn next_state(
    rx: &crossbeam_channel::Receiver<FeedSignal>,
    timeout: Duration,
) -> Option<ConnectionState> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        match next_signal(rx, remaining).await? {
            FeedSignal::State(state) => return Some(state),
            FeedSignal::Event(_) => continue,
        }
    }
}

/// Next event notification, skipping state changes
pub async fn next_event(
    rx: &crossbeam_channel::Receiver<FeedSignal>,
    timeout: Duration,
) -> Option<livefeed::CanonicalEvent> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        match next_signal(rx, remaining).await? {
            FeedSignal::Event(event) => return Some(event),
            FeedSignal::State(_) => continue,
        }
    }
}
