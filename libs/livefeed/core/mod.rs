//! # LiveFeed core
//!
//! The feed client and its parts: normalization, bounded buffering, the
//! connection state machine, and the orchestrating client task.
//!
//! ## Example
//!
//! ```rust,ignore
//! use livefeed::{FeedClient, FeedSignal};
//!
//! #[tokio::main]
//! async fn main() -> livefeed::Result<()> {
//!     let client = FeedClient::builder()
//!         .endpoint("ws://localhost:8000/ws/live_feed")
//!         .buffer_capacity(10)
//!         .max_retries(5)
//!         .build()?;
//!
//!     let subscription = client.subscribe();
//!     client.start();
//!
//!     while let Ok(signal) = subscription.signals.recv() {
//!         match signal {
//!             FeedSignal::State(state) => println!("state: {:?}", state),
//!             FeedSignal::Event(event) => println!("event: {}", event.id),
//!         }
//!     }
//!
//!     client.stop().await;
//!     Ok(())
//! }
//! ```

pub mod buffer;
pub mod builder;
pub mod client;
pub mod config;
pub mod connection_state;
pub mod normalize;

// Re-export main types
pub use buffer::EventBuffer;
pub use builder::{states, FeedClientBuilder};
pub use client::{FeedClient, FeedSignal, Metrics, Subscription};
pub use config::FeedConfig;
pub use connection_state::{
    AtomicMetrics, ConnectionState, RetryBudget, Signal, StateMachine, Step,
};
pub use normalize::{CanonicalEvent, Classification, Normalizer, RankedFactor};

// Re-export traits for convenience
pub use crate::traits::*;

/// Create a new feed client builder
///
/// This is a convenience function for starting the builder pattern.
pub fn builder() -> FeedClientBuilder<states::NoEndpoint> {
    FeedClientBuilder::new()
}
