//! Endpoint resolution for binaries
//!
//! Handles environment variables and defaults for the backend URLs.

/// Base URL for the one-shot prediction API
///
/// Reads `FRAUD_API_URL`, defaulting to the local development backend.
pub fn api_base_url() -> String {
    std::env::var("FRAUD_API_URL").unwrap_or_else(|_| "http://localhost:8000".to_string())
}

/// Base WebSocket URL for the streaming backend
///
/// Reads `FEED_WS_URL`, defaulting to the local development backend.
pub fn feed_ws_url() -> String {
    std::env::var("FEED_WS_URL").unwrap_or_else(|_| "ws://localhost:8000".to_string())
}

/// Full live-feed endpoint including the stream path
pub fn live_feed_endpoint() -> String {
    format!("{}/ws/live_feed", feed_ws_url())
}
