//! One-shot prediction client for the fraud-detection backend.

use crate::types::{PredictionResponse, RandomTransactionResponse, Transaction};
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Deserialization failed: {0}")]
    DeserializeFailed(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// Which population to sample a replayed transaction from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Legitimate,
    Fraud,
    Any,
}

impl TransactionKind {
    fn as_query_value(&self) -> &'static str {
        match self {
            TransactionKind::Legitimate => "legitimate",
            TransactionKind::Fraud => "fraud",
            TransactionKind::Any => "any",
        }
    }
}

/// Fraud-detection backend API client
pub struct FraudApiClient {
    base_url: String,
    client: Client,
}

impl FraudApiClient {
    /// Create a new API client
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: Client::new(),
        }
    }

    /// Score a single transaction against the deployed model
    pub async fn predict(&self, transaction: &Transaction) -> Result<PredictionResponse> {
        let url = format!("{}/predict_original", self.base_url);
        debug!("POST {}", url);

        let response = self.client.post(&url).json(transaction).send().await?;

        if !response.status().is_success() {
            return Err(ApiError::ApiError(format!(
                "predict returned status {}",
                response.status()
            )));
        }

        response
            .json::<PredictionResponse>()
            .await
            .map_err(|e| ApiError::DeserializeFailed(e.to_string()))
    }

    /// Fetch a random replayed transaction of the requested kind
    pub async fn random_transaction(
        &self,
        kind: TransactionKind,
    ) -> Result<RandomTransactionResponse> {
        let url = format!("{}/random_transaction", self.base_url);
        debug!("GET {} (transaction_type={})", url, kind.as_query_value());

        let response = self
            .client
            .get(&url)
            .query(&[("transaction_type", kind.as_query_value())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::ApiError(format!(
                "random_transaction returned status {}",
                response.status()
            )));
        }

        response
            .json::<RandomTransactionResponse>()
            .await
            .map_err(|e| ApiError::DeserializeFailed(e.to_string()))
    }

    /// Fetch a random transaction and score it in one round trip pair
    pub async fn test_prediction(
        &self,
        kind: TransactionKind,
    ) -> Result<(RandomTransactionResponse, PredictionResponse)> {
        let sample = self.random_transaction(kind).await?;
        let prediction = self.predict(&sample.transaction).await?;
        Ok((sample, prediction))
    }

    /// Probe backend availability via the random-transaction endpoint
    pub async fn health_check(&self) -> Result<()> {
        let sample = self.random_transaction(TransactionKind::Any).await?;
        info!(
            "backend healthy, model serving (sample class: {:?})",
            sample.actual_class
        );
        Ok(())
    }
}
