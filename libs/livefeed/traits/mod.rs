//! # LiveFeed Traits
//!
//! Core traits and types for the live-feed client.
//!
//! These are the injection points of the crate:
//!
//! - **ReconnectionStrategy**: control retry pacing and the retry ceiling
//! - **ClosePolicy**: decide whether a close code means a deliberate close
//! - **Clock**: injectable time source for normalization and backoff stamps

pub mod clock;
pub mod close_policy;
pub mod error;
pub mod reconnect;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use close_policy::{ClosePolicy, StandardClosePolicy};
pub use error::{FeedError, Result};
pub use reconnect::{ExponentialBackoff, FixedDelay, NeverReconnect, ReconnectionStrategy};
