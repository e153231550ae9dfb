//! # FraudAPI
//!
//! Wire types and the request/response client for the fraud-detection
//! backend.
//!
//! The backend exposes two surfaces: a WebSocket stream of scored
//! transactions (consumed by the `livefeed` crate) and a small set of
//! one-shot HTTP endpoints for on-demand predictions. Both speak the
//! same record shapes, so the types live here and are shared.

pub mod client;
pub mod types;

pub use client::{ApiError, FraudApiClient, TransactionKind};
pub use types::{
    ActualClass, FeatureImportance, ImpactDirection, LiveFeedRecord, PredictionResponse,
    RandomTransactionResponse, RawPrediction, Transaction,
};

/// Type alias for Result with ApiError
pub type Result<T> = std::result::Result<T, ApiError>;
