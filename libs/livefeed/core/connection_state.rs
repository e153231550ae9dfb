//! Connection lifecycle state machine
//!
//! The machine owns the connection state and the retry budget. It is purely
//! synchronous: lifecycle signals go in, a [`Step`] comes out telling the
//! caller what side effect to perform. All I/O, timers, and channels live in
//! the client task, which is the machine's single caller — transitions are
//! therefore never interleaved.

use crate::traits::ReconnectionStrategy;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Connection lifecycle state
///
/// Exactly one instance exists per feed client; it is the sole source of
/// truth for whether network I/O may be attempted.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionState {
    /// No connection, no pending retry
    Idle,
    /// Connection attempt in flight
    Connecting,
    /// Connected; messages flow
    Open,
    /// Deliberate close in progress
    Closing,
    /// Waiting out a retry delay
    Backoff {
        /// 1-based consecutive-failure count
        attempt: u32,
        /// When the next attempt is due
        resume_at: DateTime<Utc>,
    },
    /// Retry budget exhausted; will not self-resume
    Failed,
}

impl ConnectionState {
    pub fn is_active(&self) -> bool {
        !matches!(self, ConnectionState::Idle | ConnectionState::Failed)
    }
}

/// Lifecycle signal fed into the state machine
///
/// Transport callbacks, the retry timer, and the public start/stop calls are
/// all reframed as these discrete signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// `start()` was called
    Start,
    /// The transport handshake completed
    TransportOpen,
    /// Connection-level failure (refused, reset, handshake timeout)
    TransportError,
    /// The transport closed; `normal` is the close policy's verdict
    TransportClosed { normal: bool },
    /// The backoff timer fired
    BackoffElapsed,
    /// `stop()` was called
    Stop,
}

/// Side effect the caller must perform after a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Open the underlying transport
    Connect,
    /// Wait out the given delay, then feed in `BackoffElapsed`
    Wait(Duration),
    /// Close the transport with the normal-closure code
    CloseTransport,
    /// Terminal failure: notify subscribers, attempt nothing further
    GiveUp,
    /// Nothing to do
    None,
}

/// Consecutive-failure counter with a hard ceiling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryBudget {
    attempts: u32,
    max: u32,
}

impl RetryBudget {
    pub fn new(max: u32) -> Self {
        Self { attempts: 0, max }
    }

    /// 1-based count of consecutive failures since the last successful open
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    /// True once `max` consecutive failures have been recorded
    pub fn exhausted(&self) -> bool {
        self.attempts >= self.max
    }

    /// Record one failure; the count never exceeds `max`
    pub fn record_failure(&mut self) {
        if self.attempts < self.max {
            self.attempts += 1;
        }
    }

    /// Reset after a successful open
    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}

/// The connection state machine
///
/// Owns exactly one logical connection's state at a time. The reconnection
/// strategy is passed into [`StateMachine::on_signal`] rather than owned, so
/// the machine stays plain data and the scheduler stays independently
/// testable.
#[derive(Debug)]
pub struct StateMachine {
    state: ConnectionState,
    budget: RetryBudget,
}

impl StateMachine {
    pub fn new(max_retries: u32) -> Self {
        Self {
            state: ConnectionState::Idle,
            budget: RetryBudget::new(max_retries),
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn budget(&self) -> &RetryBudget {
        &self.budget
    }

    /// Apply one lifecycle signal
    ///
    /// Returns the side effect the caller must perform. The caller is the
    /// single serialized owner of this machine; feeding signals from more
    /// than one task breaks the transition-ordering guarantee.
    pub fn on_signal(
        &mut self,
        signal: Signal,
        strategy: &dyn ReconnectionStrategy,
        now: DateTime<Utc>,
    ) -> Step {
        use ConnectionState::*;

        match (self.state.clone(), signal) {
            (Idle, Signal::Start) => {
                self.state = Connecting;
                Step::Connect
            }
            (Failed, Signal::Start) => {
                self.budget.reset();
                self.state = Connecting;
                Step::Connect
            }
            // start() while already active is a no-op
            (Connecting | Open | Backoff { .. } | Closing, Signal::Start) => Step::None,

            (Connecting, Signal::TransportOpen) => {
                self.budget.reset();
                self.state = Open;
                Step::None
            }
            (Connecting, Signal::TransportError)
            | (Connecting, Signal::TransportClosed { .. }) => self.fail(strategy, now),

            (Open, Signal::TransportError)
            | (Open, Signal::TransportClosed { normal: false }) => self.fail(strategy, now),
            // A clean close is terminal and silent: no reconnect, no failure
            (Open, Signal::TransportClosed { normal: true }) => {
                self.state = Idle;
                Step::None
            }
            (Open, Signal::Stop) => {
                self.state = Closing;
                Step::CloseTransport
            }

            (Closing, Signal::TransportClosed { .. })
            | (Closing, Signal::TransportError) => {
                self.state = Idle;
                Step::None
            }

            (Backoff { .. }, Signal::BackoffElapsed) => {
                self.state = Connecting;
                Step::Connect
            }

            // stop() from any remaining state tears down to Idle, idempotently
            (Idle | Connecting | Closing | Backoff { .. } | Failed, Signal::Stop) => {
                self.state = Idle;
                Step::None
            }

            // Late or out-of-order signals are discarded
            _ => Step::None,
        }
    }

    fn fail(&mut self, strategy: &dyn ReconnectionStrategy, now: DateTime<Utc>) -> Step {
        if self.budget.exhausted() {
            self.state = ConnectionState::Failed;
            return Step::GiveUp;
        }

        self.budget.record_failure();
        let attempt = self.budget.attempts();

        match strategy.next_delay(attempt) {
            Some(delay) => {
                let resume_at =
                    now + chrono::Duration::milliseconds(delay.as_millis().min(i64::MAX as u128) as i64);
                self.state = ConnectionState::Backoff { attempt, resume_at };
                Step::Wait(delay)
            }
            None => {
                self.state = ConnectionState::Failed;
                Step::GiveUp
            }
        }
    }
}

/// Lock-free counters for feed activity
#[derive(Debug, Default)]
pub struct AtomicMetrics {
    events_received: AtomicU64,
    events_dropped: AtomicU64,
    reconnect_count: AtomicU64,
}

impl AtomicMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_received(&self) {
        self.events_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_dropped(&self) {
        self.events_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_reconnects(&self) {
        self.reconnect_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn events_received(&self) -> u64 {
        self.events_received.load(Ordering::Relaxed)
    }

    pub fn events_dropped(&self) -> u64 {
        self.events_dropped.load(Ordering::Relaxed)
    }

    pub fn reconnect_count(&self) -> u64 {
        self.reconnect_count.load(Ordering::Relaxed)
    }
}
