//! Score a handful of transfers and print the assessments.
//!
//! ```text
//! RUST_LOG=txguard_sdk=debug cargo run -p txguard-sdk --example assess_transfer
//! ```

use anyhow::Result;
use chrono::{Duration, Utc};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use txguard_sdk::{
    DeviceContext, HistoryQuery, RiskEngineBuilder, TransactionInput, UserContext,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    let engine = RiskEngineBuilder::new().build()?;

    let user = UserContext::new("user-42")
        .with_country("US")
        .with_created_at(Utc::now() - Duration::days(120));
    let phone = DeviceContext::new(
        "Mozilla/5.0 (iPhone; CPU iPhone OS 17_2 like Mac OS X)",
        "203.0.113.54",
    )
    .with_screen_resolution("1179x2556")
    .with_timezone("America/Chicago")
    .with_language("en-US");

    let transfers = [
        TransactionInput::new("txn-1001", "user-42", 320.0)
            .with_recipient_country("MX")
            .with_kyc_verified(true),
        TransactionInput::new("txn-1002", "user-42", 12_000.0)
            .with_recipient_country("PH")
            .with_kyc_verified(true),
        TransactionInput::new("txn-1003", "user-42", 800.0).with_recipient_country("RU"),
    ];

    for tx in transfers {
        let assessment = engine.assess(tx, user.clone(), phone.clone()).await;
        println!("{}", serde_json::to_string_pretty(&assessment)?);
    }

    let tightened = engine
        .update_rules_json(&json!({ "maxSingleTransaction": 5000, "maxDevicesPerUser": 3 }))
        .await;
    println!("rules updated: {}", tightened);

    let history = engine
        .get_history(&HistoryQuery::for_user("user-42"))
        .await?;
    println!("{} assessments on file for user-42", history.len());

    if let Some(metrics) = engine.metrics() {
        for (name, value) in metrics.counter_values() {
            println!("{:<24} {}", name, value);
        }
    }

    Ok(())
}

fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "txguard_sdk=info,txguard_runtime=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    Ok(())
}
