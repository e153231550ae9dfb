use crate::buffer::EventBuffer;
use crate::config::FeedConfig;
use crate::connection_state::{AtomicMetrics, ConnectionState, Signal, StateMachine};
use crate::normalize::{CanonicalEvent, Normalizer};
use crate::traits::*;
use crossbeam_channel::{unbounded, Receiver, Sender};
use futures::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Notify;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

/// Notification delivered to subscribers
#[derive(Debug, Clone)]
pub enum FeedSignal {
    /// The connection state changed
    State(ConnectionState),
    /// A normalized event was accepted into the buffer
    Event(CanonicalEvent),
}

/// Handle returned by [`FeedClient::subscribe`]
pub struct Subscription {
    /// Buffer contents at registration time, newest first. This is the only
    /// history a new subscriber receives.
    pub snapshot: Vec<CanonicalEvent>,
    /// Live notifications, in transition order
    pub signals: Receiver<FeedSignal>,
}

/// Client metrics snapshot
#[derive(Debug, Clone)]
pub struct Metrics {
    pub events_received: u64,
    pub events_dropped: u64,
    pub reconnect_count: u64,
    pub connection_state: ConnectionState,
}

/// State shared between the client handle and its run task
///
/// Written only from the run task (and from `subscribe`, which holds the
/// same write lock), so buffer contents and subscriber registration are
/// always consistent with the most recently processed event.
struct FeedShared {
    state: ConnectionState,
    buffer: EventBuffer,
    subscribers: Vec<Sender<FeedSignal>>,
}

impl FeedShared {
    fn broadcast(&mut self, signal: FeedSignal) {
        self.subscribers.retain(|tx| tx.send(signal.clone()).is_ok());
    }
}

struct RunHandle {
    shutdown: Arc<AtomicBool>,
    stop_notify: Arc<Notify>,
    task: tokio::task::JoinHandle<()>,
}

/// Resilient live-feed client
///
/// Maintains one long-lived streaming connection, survives disconnects up to
/// a retry budget, and hands normalized events to subscribers under a fixed
/// memory bound. Construct one instance per logical stream; nothing is
/// shared between instances.
///
/// All asynchronous failures surface through the subscription channel as
/// state notifications; `start` and `stop` never report transport errors to
/// the caller.
pub struct FeedClient {
    config: Arc<FeedConfig>,
    shared: Arc<RwLock<FeedShared>>,
    normalizer: Arc<Normalizer>,
    metrics: Arc<AtomicMetrics>,
    run: Mutex<Option<RunHandle>>,
}

impl FeedClient {
    /// Create a new builder instance
    pub fn builder() -> crate::builder::FeedClientBuilder<crate::builder::states::NoEndpoint> {
        crate::builder::FeedClientBuilder::new()
    }

    pub(crate) fn new(config: FeedConfig) -> Self {
        let shared = FeedShared {
            state: ConnectionState::Idle,
            buffer: EventBuffer::new(config.buffer_capacity),
            subscribers: Vec::new(),
        };

        Self {
            normalizer: Arc::new(Normalizer::new(Arc::clone(&config.clock))),
            config: Arc::new(config),
            shared: Arc::new(RwLock::new(shared)),
            metrics: Arc::new(AtomicMetrics::new()),
            run: Mutex::new(None),
        }
    }

    /// Start the feed
    ///
    /// Spawns the client task if none is running; a no-op while the client
    /// is already active. Must be called within a tokio runtime. Connection
    /// failures never surface here — watch the subscription channel.
    pub fn start(&self) {
        let mut run = self.run.lock();
        if let Some(handle) = run.as_ref() {
            if !handle.task.is_finished() {
                debug!("start() ignored, client already active");
                return;
            }
        }

        let shutdown = Arc::new(AtomicBool::new(true));
        let stop_notify = Arc::new(Notify::new());

        let task = tokio::spawn(run_feed(
            Arc::clone(&self.config),
            Arc::clone(&self.shared),
            Arc::clone(&self.normalizer),
            Arc::clone(&self.metrics),
            Arc::clone(&shutdown),
            Arc::clone(&stop_notify),
        ));

        *run = Some(RunHandle {
            shutdown,
            stop_notify,
            task,
        });
    }

    /// Stop the feed
    ///
    /// Aborts an in-flight connection attempt, cancels a pending backoff
    /// timer, closes a live transport with the normal-closure code, and
    /// waits for the client task to wind down. Safe to call from any state,
    /// any number of times. No notification is delivered after this
    /// returns; late transport completions are discarded.
    pub async fn stop(&self) {
        let handle = self.run.lock().take();
        if let Some(handle) = handle {
            handle.shutdown.store(false, Ordering::Release);
            handle.stop_notify.notify_one();
            let _ = handle.task.await;
        }
        self.shared.write().state = ConnectionState::Idle;
    }

    /// Register a subscriber
    ///
    /// Returns the current buffer snapshot plus a channel that receives
    /// every state change and event from this point on, in transition
    /// order. Dropping the receiver unregisters the subscriber.
    pub fn subscribe(&self) -> Subscription {
        let mut shared = self.shared.write();
        let (tx, rx) = unbounded();
        shared.subscribers.push(tx);
        Subscription {
            snapshot: shared.buffer.snapshot(),
            signals: rx,
        }
    }

    /// Point-in-time copy of the event buffer, newest first
    pub fn snapshot(&self) -> Vec<CanonicalEvent> {
        self.shared.read().buffer.snapshot()
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        self.shared.read().state.clone()
    }

    /// Current metrics
    pub fn metrics(&self) -> Metrics {
        Metrics {
            events_received: self.metrics.events_received(),
            events_dropped: self.metrics.events_dropped(),
            reconnect_count: self.metrics.reconnect_count(),
            connection_state: self.state(),
        }
    }

    /// Client configuration
    pub fn config(&self) -> &FeedConfig {
        &self.config
    }
}

impl Drop for FeedClient {
    fn drop(&mut self) {
        // render the task inert; it discards everything once the flag flips
        if let Some(handle) = self.run.get_mut().take() {
            handle.shutdown.store(false, Ordering::Release);
            handle.stop_notify.notify_one();
        }
    }
}

/// How an open session ended
enum SessionEnd {
    /// `stop()` was called
    Stopped,
    /// The peer closed the stream; `normal` is the close policy's verdict
    Closed { normal: bool },
    /// Connection-level failure
    Error(String),
}

/// Main client task loop
///
/// Sole owner of the state machine: every transition happens here, so
/// transitions are serialized and notifications go out in transition order.
async fn run_feed(
    config: Arc<FeedConfig>,
    shared: Arc<RwLock<FeedShared>>,
    normalizer: Arc<Normalizer>,
    metrics: Arc<AtomicMetrics>,
    shutdown: Arc<AtomicBool>,
    stop_notify: Arc<Notify>,
) {
    let mut machine = StateMachine::new(config.max_retries);
    let strategy = config.reconnect_strategy.as_ref();
    let mut wait_for: Option<Duration> = None;

    machine.on_signal(Signal::Start, strategy, config.clock.now());
    announce(&shared, &shutdown, machine.state());

    loop {
        if !shutdown.load(Ordering::Acquire) {
            break;
        }

        match machine.state().clone() {
            ConnectionState::Connecting => {
                debug!("connecting to {}", config.endpoint());

                let outcome = tokio::select! {
                    result = tokio::time::timeout(
                        config.connect_timeout,
                        connect_async(config.endpoint()),
                    ) => Some(result),
                    _ = stop_notify.notified() => None,
                };

                // stopped mid-attempt: dropping the future tears the socket down
                let Some(result) = outcome else { break };

                if !shutdown.load(Ordering::Acquire) {
                    // stop() raced with completion; discard the late transport
                    if let Ok(Ok((mut ws, _))) = result {
                        let _ = ws.close(None).await;
                    }
                    break;
                }

                match result {
                    Ok(Ok((ws, _))) => {
                        info!("connected to {}", config.endpoint());
                        machine.on_signal(Signal::TransportOpen, strategy, config.clock.now());
                        announce(&shared, &shutdown, machine.state());

                        let end = run_session(
                            ws,
                            &config,
                            &shared,
                            &normalizer,
                            &metrics,
                            &shutdown,
                            &stop_notify,
                        )
                        .await;

                        match end {
                            SessionEnd::Stopped => break,
                            SessionEnd::Closed { normal: true } => {
                                info!("stream closed cleanly, not reconnecting");
                                machine.on_signal(
                                    Signal::TransportClosed { normal: true },
                                    strategy,
                                    config.clock.now(),
                                );
                                announce(&shared, &shutdown, machine.state());
                                break;
                            }
                            SessionEnd::Closed { normal: false } => {
                                warn!("stream closed abnormally");
                                let step = machine.on_signal(
                                    Signal::TransportClosed { normal: false },
                                    strategy,
                                    config.clock.now(),
                                );
                                wait_for = step_delay(step);
                                announce(&shared, &shutdown, machine.state());
                            }
                            SessionEnd::Error(e) => {
                                warn!("transport error: {}", e);
                                let step = machine.on_signal(
                                    Signal::TransportError,
                                    strategy,
                                    config.clock.now(),
                                );
                                wait_for = step_delay(step);
                                announce(&shared, &shutdown, machine.state());
                            }
                        }
                    }
                    Ok(Err(e)) => {
                        warn!("failed to connect: {}", e);
                        let step =
                            machine.on_signal(Signal::TransportError, strategy, config.clock.now());
                        wait_for = step_delay(step);
                        announce(&shared, &shutdown, machine.state());
                    }
                    Err(_) => {
                        warn!(
                            "connection attempt timed out after {:?}",
                            config.connect_timeout
                        );
                        let step =
                            machine.on_signal(Signal::TransportError, strategy, config.clock.now());
                        wait_for = step_delay(step);
                        announce(&shared, &shutdown, machine.state());
                    }
                }
            }

            ConnectionState::Backoff { attempt, .. } => {
                let delay = wait_for.take().unwrap_or_default();
                info!("reconnecting in {:?} (attempt {})", delay, attempt);

                let elapsed = tokio::select! {
                    _ = tokio::time::sleep(delay) => true,
                    _ = stop_notify.notified() => false,
                };

                if !elapsed || !shutdown.load(Ordering::Acquire) {
                    break;
                }

                metrics.increment_reconnects();
                machine.on_signal(Signal::BackoffElapsed, strategy, config.clock.now());
                announce(&shared, &shutdown, machine.state());
            }

            ConnectionState::Failed => {
                warn!("retry budget exhausted, giving up");
                break;
            }

            // Idle here means a clean close was already announced; Open and
            // Closing never appear at the loop top.
            _ => break,
        }
    }

    // A user stop parks the client at Idle without a notification; any
    // other exit leaves the announced terminal state in place.
    if !shutdown.load(Ordering::Acquire) {
        shared.write().state = ConnectionState::Idle;
    }

    debug!("client task exiting");
}

fn step_delay(step: crate::connection_state::Step) -> Option<Duration> {
    match step {
        crate::connection_state::Step::Wait(delay) => Some(delay),
        _ => None,
    }
}

/// Pump one open connection until it ends
async fn run_session(
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    config: &FeedConfig,
    shared: &RwLock<FeedShared>,
    normalizer: &Normalizer,
    metrics: &AtomicMetrics,
    shutdown: &AtomicBool,
    stop_notify: &Notify,
) -> SessionEnd {
    let (mut write, mut read) = ws.split();

    loop {
        tokio::select! {
            msg = read.next() => {
                if !shutdown.load(Ordering::Acquire) {
                    return SessionEnd::Stopped;
                }
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        handle_inbound(&text, shared, normalizer, metrics);
                    }
                    Some(Ok(Message::Binary(data))) => {
                        match std::str::from_utf8(&data) {
                            Ok(text) => handle_inbound(text, shared, normalizer, metrics),
                            Err(_) => {
                                warn!("dropping non-UTF-8 binary frame");
                                metrics.increment_dropped();
                            }
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let code = frame.map(|f| u16::from(f.code));
                        let normal = config.close_policy.is_normal(code);
                        debug!("close frame received (code {:?}, normal: {})", code, normal);
                        return SessionEnd::Closed { normal };
                    }
                    // ping/pong handled by the transport layer
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return SessionEnd::Error(e.to_string()),
                    None => return SessionEnd::Closed { normal: false },
                }
            }
            _ = stop_notify.notified() => {
                let close = Message::Close(Some(CloseFrame {
                    code: CloseCode::Normal,
                    reason: "client stop".into(),
                }));
                let _ = write.send(close).await;
                let _ = write.close().await;
                return SessionEnd::Stopped;
            }
        }
    }
}

/// Normalize one inbound message and publish it
///
/// Malformed messages are dropped with a diagnostic; the connection is not
/// touched. Buffer mutation and the event notification happen under one
/// write lock, so subscribers never observe a partial update.
fn handle_inbound(
    text: &str,
    shared: &RwLock<FeedShared>,
    normalizer: &Normalizer,
    metrics: &AtomicMetrics,
) {
    metrics.increment_received();

    let normalized = serde_json::from_str(text)
        .map_err(|e| FeedError::MalformedEvent(e.to_string()))
        .and_then(|value| normalizer.normalize(value));

    let event = match normalized {
        Ok(event) => event,
        Err(e) => {
            warn!("dropping inbound message: {}", e);
            metrics.increment_dropped();
            return;
        }
    };

    let mut guard = shared.write();
    guard.buffer.push(event.clone());
    guard.broadcast(FeedSignal::Event(event));
}

/// Publish a state change, unless the client is already stopping
fn announce(shared: &RwLock<FeedShared>, shutdown: &AtomicBool, state: &ConnectionState) {
    if !shutdown.load(Ordering::Acquire) {
        return;
    }
    let mut guard = shared.write();
    guard.state = state.clone();
    guard.broadcast(FeedSignal::State(state.clone()));
}
