use chrono::{Duration, Utc};

use crate::client::Drip;
use crate::models::EstimateItem;
use crate::types::{CheckContext, CheckResult};

pub async fn estimate_from_usage(client: &Drip, ctx: &mut CheckContext) -> CheckResult {
    let Some(customer_id) = ctx.customer_id() else {
        return CheckResult::fail("estimate_from_usage", "No customer ID available")
            .with_suggestion("Run customer_create check first or set TEST_CUSTOMER_ID");
    };

    let end = Utc::now();
    let start = end - Duration::days(30);
    let end_date = end.format("%Y-%m-%d").to_string();
    let start_date = start.format("%Y-%m-%d").to_string();

    match client
        .estimate_from_usage(customer_id, &start_date, &end_date)
        .await
    {
        Ok(estimate) => CheckResult::pass(
            "estimate_from_usage",
            format!("Estimated: {} {}", estimate.estimated_cost, estimate.currency),
        )
        .with_details(format!("Period: {start_date} to {end_date}")),
        Err(err) if err.is_unimplemented() => {
            CheckResult::pass("estimate_from_usage", "Skipped (endpoint not implemented)")
                .with_details(err.to_string())
        }
        Err(err) => CheckResult::fail(
            "estimate_from_usage",
            format!("Failed to estimate from usage: {err}"),
        ),
    }
}

pub async fn estimate_hypothetical(client: &Drip, _ctx: &mut CheckContext) -> CheckResult {
    let items = [
        EstimateItem {
            meter: "tokens".to_string(),
            quantity: 1000.0,
        },
        EstimateItem {
            meter: "api_calls".to_string(),
            quantity: 100.0,
        },
    ];

    match client.estimate_from_hypothetical(&items).await {
        Ok(estimate) => {
            let item_count = if estimate.breakdown.is_empty() {
                items.len()
            } else {
                estimate.breakdown.len()
            };
            CheckResult::pass(
                "estimate_hypothetical",
                format!("Estimated: {} {}", estimate.estimated_cost, estimate.currency),
            )
            .with_details(format!("Items: {item_count}"))
        }
        Err(err) if err.is_unimplemented() => {
            CheckResult::pass("estimate_hypothetical", "Skipped (endpoint not implemented)")
                .with_details(err.to_string())
        }
        Err(err) => CheckResult::fail(
            "estimate_hypothetical",
            format!("Failed to estimate hypothetical: {err}"),
        ),
    }
}
