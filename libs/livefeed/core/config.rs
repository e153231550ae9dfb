//! Feed client configuration

use crate::traits::{Clock, ClosePolicy, ReconnectionStrategy};
use std::sync::Arc;
use std::time::Duration;

/// Configuration for a feed client
///
/// Built via the type-state builder; the endpoint is the only required
/// field. Everything else defaults to the values the backend dashboard
/// shipped with.
pub struct FeedConfig {
    /// WebSocket endpoint (ws:// or wss://)
    pub(crate) endpoint: String,

    /// Event buffer capacity
    pub(crate) buffer_capacity: usize,

    /// Maximum consecutive failed attempts before the terminal Failed state
    pub(crate) max_retries: u32,

    /// How long a connection attempt may hang before it is forced into the
    /// backoff path
    pub(crate) connect_timeout: Duration,

    /// Retry pacing policy
    pub(crate) reconnect_strategy: Box<dyn ReconnectionStrategy>,

    /// Normal-vs-abnormal close discrimination
    pub(crate) close_policy: Arc<dyn ClosePolicy>,

    /// Time source for event stamps and backoff deadlines
    pub(crate) clock: Arc<dyn Clock>,
}

impl FeedConfig {
    /// Get a reference to the endpoint URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn buffer_capacity(&self) -> usize {
        self.buffer_capacity
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }
}
