use crate::client::Drip;
use crate::models::TrackUsageRequest;
use crate::types::{CheckContext, CheckResult};

pub async fn track_usage(client: &Drip, ctx: &mut CheckContext) -> CheckResult {
    let Some(customer_id) = ctx.customer_id() else {
        return CheckResult::fail("track_usage", "No customer ID available");
    };

    let request = TrackUsageRequest {
        customer_id: customer_id.to_string(),
        meter: "tokens".to_string(),
        quantity: 500.0,
        units: Some("tokens".to_string()),
        description: Some("Health check usage tracking".to_string()),
    };

    match client.track_usage(&request).await {
        Ok(_) => CheckResult::pass("track_usage", "Usage tracked successfully")
            .with_details("quantity: 500 tokens"),
        Err(err) if err.is_unimplemented() => {
            CheckResult::pass("track_usage", "Skipped (endpoint not implemented)")
                .with_details(err.to_string())
        }
        Err(err) => CheckResult::fail("track_usage", format!("Usage tracking failed: {err}")),
    }
}
