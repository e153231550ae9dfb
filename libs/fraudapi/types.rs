//! Record shapes shared by the streaming and request/response paths.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A transaction as the model sees it: an optional time offset, an amount,
/// and the anonymized principal components (V1..V28) carried as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "Time", skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
    #[serde(rename = "Amount")]
    pub amount: f64,
    /// Remaining model inputs (V1..V28), passed through untouched.
    #[serde(flatten)]
    pub components: serde_json::Map<String, Value>,
}

/// Direction a feature pushes the fraud verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImpactDirection {
    #[serde(rename = "INCREASES")]
    Increases,
    #[serde(rename = "DECREASES")]
    Decreases,
}

/// One entry of the model's ranked feature attribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
    pub impact_on_fraud: ImpactDirection,
}

/// Ground-truth label attached to replayed transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActualClass {
    Fraud,
    Legitimate,
}

/// Response of the one-shot prediction endpoint. All fields are required
/// here; the HTTP path fails loudly on a malformed body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub is_fraud: bool,
    pub fraud_probability: f64,
    #[serde(default)]
    pub top_features: Vec<FeatureImportance>,
}

/// Response of the random-transaction endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomTransactionResponse {
    pub transaction: Transaction,
    pub actual_class: ActualClass,
}

/// Prediction block as it arrives on the stream.
///
/// Deliberately lenient: every field is optional so that an incomplete
/// record still deserializes and can be rejected by the normalizer with a
/// precise diagnostic instead of a serde error for the whole message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPrediction {
    #[serde(default)]
    pub is_fraud: Option<bool>,
    #[serde(default)]
    pub fraud_probability: Option<f64>,
    #[serde(default)]
    pub top_features: Option<Vec<FeatureImportance>>,
}

/// One message of the live feed, as deserialized off the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LiveFeedRecord {
    #[serde(default)]
    pub transaction: Value,
    #[serde(default)]
    pub prediction: Option<RawPrediction>,
    #[serde(default)]
    pub actual_class: Option<ActualClass>,
    #[serde(default)]
    pub timestamp: Option<String>,
}
