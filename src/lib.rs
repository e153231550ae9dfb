//! FraudLens - Live Fraud-Detection Feed - Main Library
//!
//! This crate ties the workspace together for the binary executables.
//!
//! ## Architecture
//!
//! - **bin_common**: Common utilities for binary executables (logging, env)
//! - **livefeed**: Resilient streaming client (re-exported from workspace)
//! - **fraudapi**: Backend wire types and HTTP client (re-exported from
//!   workspace)
//!
//! ## Usage in Binaries
//!
//! ```rust
//! use fraudlens::bin_common::{init_tracing, live_feed_endpoint};
//! use fraudlens::livefeed::FeedClient;
//! ```

// Re-export workspace libraries for convenience
pub use fraudapi;
pub use livefeed;

// Binary common utilities
pub mod bin_common {
    //! Common utilities for binary executables

    pub mod env;
    pub mod logging;

    pub use env::{api_base_url, feed_ws_url, live_feed_endpoint};
    pub use logging::init_tracing;
}
