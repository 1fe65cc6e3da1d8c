//! End-to-end idempotency probe: the same key charged twice must replay.

use crate::client::Drip;
use crate::models::ChargeRequest;
use crate::types::{CheckContext, CheckResult};

pub async fn idempotency(client: &Drip, ctx: &mut CheckContext) -> CheckResult {
    let Some(customer_id) = ctx.customer_id() else {
        return CheckResult::fail("idempotency", "No customer ID available");
    };

    let request = ChargeRequest {
        customer_id: customer_id.to_string(),
        meter: "api_calls".to_string(),
        quantity: 1.0,
        idempotency_key: Some(super::fresh_idempotency_key(customer_id, "api_calls")),
        metadata: None,
    };

    let first = match client.charge(&request).await {
        Ok(r) => r,
        Err(err) => {
            return CheckResult::fail("idempotency", format!("Idempotency check failed: {err}"));
        }
    };
    let second = match client.charge(&request).await {
        Ok(r) => r,
        Err(err) => {
            return CheckResult::fail("idempotency", format!("Idempotency check failed: {err}"));
        }
    };

    let first_id = first.charge.map(|c| c.id);
    let second_id = second.charge.map(|c| c.id);
    let same_charge = first_id.is_some() && first_id == second_id;

    if second.is_replay || same_charge {
        CheckResult::pass("idempotency", "Idempotency working correctly").with_details(format!(
            "Replay detected, charge ID: {}",
            first_id.as_deref().unwrap_or("unknown")
        ))
    } else {
        CheckResult::fail("idempotency", "Idempotency not working")
            .with_suggestion("Second request should be marked as replay")
    }
}
