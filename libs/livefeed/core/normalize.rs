//! Event normalization
//!
//! Converts one raw inbound feed message into the canonical record handed to
//! consumers. Rejection is per-message: a malformed record is reported as
//! [`FeedError::MalformedEvent`] and the connection stays untouched.

use crate::traits::{Clock, FeedError};
use chrono::{DateTime, Utc};
use fraudapi::{ImpactDirection, LiveFeedRecord};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Verdict plus model confidence
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub is_fraud: bool,
    /// Model probability, always within [0, 1]
    pub probability: f64,
}

/// One entry of the ranked feature attribution, in source order
#[derive(Debug, Clone, PartialEq)]
pub struct RankedFactor {
    pub name: String,
    pub direction: ImpactDirection,
    pub weight: f64,
}

/// The normalized unit handed to consumers
///
/// Created once per inbound message, immutable thereafter, destroyed by
/// eviction from the event buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalEvent {
    /// Opaque unique identifier, distinct even for events normalized in the
    /// same instant
    pub id: String,
    pub occurred_at: DateTime<Utc>,
    pub classification: Classification,
    /// Source order preserved; the feed pre-ranks by importance
    pub ranked_factors: Vec<RankedFactor>,
    /// The source record, verbatim, for downstream display
    pub payload: Value,
}

/// Converts raw feed messages into [`CanonicalEvent`]s
///
/// Holds no connection state. The sequence counter only disambiguates ids
/// minted within the same clock millisecond; output is deterministic given
/// the injected clock and the counter position.
pub struct Normalizer {
    clock: Arc<dyn Clock>,
    sequence: AtomicU64,
}

impl Normalizer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            sequence: AtomicU64::new(0),
        }
    }

    /// Normalize one deserialized feed message
    ///
    /// The required fields are the verdict and the probability; a record
    /// missing either, or carrying a probability outside [0, 1], is
    /// malformed. A missing or unparseable timestamp falls back to the
    /// injected clock; missing factors yield an empty list.
    pub fn normalize(&self, payload: Value) -> Result<CanonicalEvent, FeedError> {
        let record: LiveFeedRecord = serde_json::from_value(payload.clone())
            .map_err(|e| FeedError::MalformedEvent(e.to_string()))?;

        let prediction = record
            .prediction
            .ok_or_else(|| FeedError::MalformedEvent("prediction block missing".into()))?;

        let is_fraud = prediction
            .is_fraud
            .ok_or_else(|| FeedError::MalformedEvent("verdict missing".into()))?;

        let probability = prediction
            .fraud_probability
            .ok_or_else(|| FeedError::MalformedEvent("probability missing".into()))?;
        if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
            return Err(FeedError::MalformedEvent(format!(
                "probability {} outside [0, 1]",
                probability
            )));
        }

        let now = self.clock.now();
        let occurred_at = record
            .timestamp
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|ts| ts.with_timezone(&Utc))
            .unwrap_or(now);

        let ranked_factors = prediction
            .top_features
            .unwrap_or_default()
            .into_iter()
            .map(|f| RankedFactor {
                name: f.feature,
                direction: f.impact_on_fraud,
                weight: f.importance,
            })
            .collect();

        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);

        Ok(CanonicalEvent {
            id: format!("{}-{}", now.timestamp_millis(), sequence),
            occurred_at,
            classification: Classification {
                is_fraud,
                probability,
            },
            ranked_factors,
            payload,
        })
    }
}
