//! One-shot prediction round trip
//!
//! Samples a random replayed transaction from the backend, scores it, and
//! prints the verdict with the top attributed features.

use anyhow::Result;
use fraudapi::{FraudApiClient, TransactionKind};
use fraudlens::bin_common::{api_base_url, init_tracing};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let api = FraudApiClient::new(api_base_url());
    let (sample, prediction) = api.test_prediction(TransactionKind::Any).await?;

    println!(
        "Sampled transaction: amount ${:.2} (actual: {:?})",
        sample.transaction.amount, sample.actual_class
    );
    println!(
        "Model verdict: {} (p = {:.4})",
        if prediction.is_fraud { "FRAUD" } else { "LEGITIMATE" },
        prediction.fraud_probability
    );
    for feature in prediction.top_features.iter().take(5) {
        println!(
            "  {:>8} {:?} importance {:.1}",
            feature.feature, feature.impact_on_fraud, feature.importance
        );
    }

    Ok(())
}
