//! Console tail for the live fraud-detection feed
//!
//! Connects to the backend live-feed WebSocket and prints every state
//! change and scored transaction until interrupted.

use anyhow::Result;
use fraudlens::bin_common::{init_tracing, live_feed_endpoint};
use livefeed::{FeedClient, FeedSignal};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let endpoint = live_feed_endpoint();
    let client = FeedClient::builder().endpoint(&endpoint).build()?;
    let subscription = client.subscribe();
    client.start();

    println!("Tailing live feed at {}", endpoint);
    println!("Press Ctrl+C to stop\n");

    tokio::task::spawn_blocking(move || {
        while let Ok(signal) = subscription.signals.recv() {
            match signal {
                FeedSignal::State(state) => println!("-- state: {:?}", state),
                FeedSignal::Event(event) => {
                    let verdict = if event.classification.is_fraud {
                        "FRAUD"
                    } else {
                        "ok"
                    };
                    let top_factor = event
                        .ranked_factors
                        .first()
                        .map(|f| f.name.as_str())
                        .unwrap_or("-")
                        .to_string();
                    println!(
                        "{} [{:>5}] p={:.3} top_factor={}",
                        event.occurred_at.to_rfc3339(),
                        verdict,
                        event.classification.probability,
                        top_factor
                    );
                }
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    println!("\nShutting down...");
    client.stop().await;
    println!("Shutdown complete");
    Ok(())
}
