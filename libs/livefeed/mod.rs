//! # LiveFeed
//!
//! A resilient streaming client for the fraud-detection live feed.
//!
//! ## Features
//!
//! - **Explicit state machine**: connection lifecycle owned by one
//!   serialized transition loop, independently testable without a socket
//! - **Bounded buffering**: newest-first event buffer with a hard capacity,
//!   snapshots handed to readers as owned copies
//! - **Pluggable resilience**: reconnection strategies, close-code policy,
//!   and clock are all injection points
//! - **Type-state builder**: the endpoint is required at compile time
//! - **Silent cancellation**: `stop()` aborts in-flight connects and pending
//!   backoff timers; late transport completions are discarded, not delivered

pub mod core;
pub mod traits;

// Re-export all traits
pub use traits::*;

// Re-export core client functionality
pub use self::core::{
    builder, buffer, client, config, connection_state, normalize,
    builder::{states, FeedClientBuilder},
    buffer::EventBuffer,
    client::{FeedClient, FeedSignal, Metrics, Subscription},
    config::FeedConfig,
    connection_state::{AtomicMetrics, ConnectionState, RetryBudget, Signal, StateMachine, Step},
    normalize::{CanonicalEvent, Classification, Normalizer, RankedFactor},
};

// The factor direction is shared with the request/response wire types
pub use fraudapi::ImpactDirection;

/// Type alias for Result with FeedError
pub type Result<T> = std::result::Result<T, traits::FeedError>;
