pub mod states;

use crate::client::FeedClient;
use crate::config::FeedConfig;
use crate::traits::*;
use states::*;
use std::sync::Arc;
use std::time::Duration;

/// Type-state builder for [`FeedClient`]
///
/// This builder uses Rust's type system to enforce that the endpoint is set
/// before the client can be built. All other knobs carry defaults.
pub struct FeedClientBuilder<E>
where
    E: EndpointState,
{
    _state: TypeState<E>,
    endpoint: Option<String>,
    buffer_capacity: usize,
    max_retries: u32,
    base_delay: Duration,
    cap_delay: Duration,
    connect_timeout: Duration,
    reconnect_strategy: Option<Box<dyn ReconnectionStrategy>>,
    close_policy: Option<Arc<dyn ClosePolicy>>,
    clock: Option<Arc<dyn Clock>>,
}

impl FeedClientBuilder<NoEndpoint> {
    /// Create a new builder instance
    pub fn new() -> Self {
        Self {
            _state: TypeState::new(),
            endpoint: None,
            buffer_capacity: 10,
            max_retries: 5,
            base_delay: Duration::from_millis(1000),
            cap_delay: Duration::from_millis(30_000),
            connect_timeout: Duration::from_secs(10),
            reconnect_strategy: None,
            close_policy: None,
            clock: None,
        }
    }

    pub fn endpoint(self, endpoint: impl Into<String>) -> FeedClientBuilder<HasEndpoint> {
        FeedClientBuilder {
            _state: TypeState::new(),
            endpoint: Some(endpoint.into()),
            buffer_capacity: self.buffer_capacity,
            max_retries: self.max_retries,
            base_delay: self.base_delay,
            cap_delay: self.cap_delay,
            connect_timeout: self.connect_timeout,
            reconnect_strategy: self.reconnect_strategy,
            close_policy: self.close_policy,
            clock: self.clock,
        }
    }
}

impl Default for FeedClientBuilder<NoEndpoint> {
    fn default() -> Self {
        Self::new()
    }
}

// Optional configuration methods
impl<E> FeedClientBuilder<E>
where
    E: EndpointState,
{
    /// Event buffer capacity (default 10)
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    /// Maximum consecutive failed attempts before Failed (default 5)
    pub fn max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    /// First retry delay for the default exponential strategy (default 1s)
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Retry delay ceiling for the default exponential strategy (default 30s)
    pub fn cap_delay(mut self, cap: Duration) -> Self {
        self.cap_delay = cap;
        self
    }

    /// How long a connection attempt may hang before it counts as a
    /// transport error (default 10s)
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Replace the default exponential backoff wholesale
    pub fn reconnect_strategy(mut self, strategy: impl ReconnectionStrategy + 'static) -> Self {
        self.reconnect_strategy = Some(Box::new(strategy));
        self
    }

    /// Override normal-closure detection for transports with a nonstandard
    /// sentinel code
    pub fn close_policy(mut self, policy: impl ClosePolicy + 'static) -> Self {
        self.close_policy = Some(Arc::new(policy));
        self
    }

    /// Inject a time source (tests pin this)
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }
}

// Build method - only available once the endpoint is set
impl FeedClientBuilder<HasEndpoint> {
    pub fn build(self) -> Result<FeedClient> {
        let endpoint = self
            .endpoint
            .ok_or_else(|| FeedError::Configuration("endpoint must be set".into()))?;

        let parsed = url::Url::parse(&endpoint)
            .map_err(|e| FeedError::Configuration(format!("invalid endpoint: {}", e)))?;
        if parsed.scheme() != "ws" && parsed.scheme() != "wss" {
            return Err(FeedError::Configuration(format!(
                "endpoint scheme must be ws or wss, got {}",
                parsed.scheme()
            )));
        }

        let reconnect_strategy = self.reconnect_strategy.unwrap_or_else(|| {
            Box::new(ExponentialBackoff::new(
                self.base_delay,
                self.cap_delay,
                Some(self.max_retries),
            ))
        });

        let config = FeedConfig {
            endpoint,
            buffer_capacity: self.buffer_capacity,
            max_retries: self.max_retries,
            connect_timeout: self.connect_timeout,
            reconnect_strategy,
            close_policy: self
                .close_policy
                .unwrap_or_else(|| Arc::new(StandardClosePolicy)),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
        };

        Ok(FeedClient::new(config))
    }
}
