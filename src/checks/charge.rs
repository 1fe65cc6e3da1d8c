//! Charge lifecycle probes.

use serde_json::json;

use crate::client::Drip;
use crate::models::ChargeRequest;
use crate::types::{CheckContext, CheckResult};

pub async fn charge_create(client: &Drip, ctx: &mut CheckContext) -> CheckResult {
    let Some(customer_id) = ctx.customer_id() else {
        return CheckResult::fail("charge_create", "No customer ID available")
            .with_suggestion("Run customer_create check first");
    };

    let request = ChargeRequest {
        customer_id: customer_id.to_string(),
        meter: "api_calls".to_string(),
        quantity: 1.0,
        idempotency_key: Some(super::fresh_idempotency_key(customer_id, "api_calls")),
        metadata: Some(json!({"test": true})),
    };

    match client.charge(&request).await {
        Ok(result) => match result.charge {
            Some(charge) => {
                ctx.created_charge_id = Some(charge.id.clone());
                CheckResult::pass("charge_create", format!("Created charge {}", charge.id))
                    .with_details(format!(
                        "amount: {} USDC",
                        charge
                            .amount_usdc
                            .map(|a| a.to_string())
                            .unwrap_or_else(|| "N/A".to_string())
                    ))
            }
            None => CheckResult::fail("charge_create", "Charge response missing charge object")
                .with_suggestion("Check customer balance and meter configuration"),
        },
        Err(err) => CheckResult::fail("charge_create", format!("Failed to create charge: {err}"))
            .with_suggestion("Check customer balance and meter configuration"),
    }
}

pub async fn charge_status(client: &Drip, ctx: &mut CheckContext) -> CheckResult {
    let Some(charge_id) = ctx.created_charge_id.as_deref() else {
        return CheckResult::fail("charge_status", "No charge ID available")
            .with_suggestion("Run charge_create check first");
    };

    match client.get_charge_status(charge_id).await {
        Ok(status) => CheckResult::pass(
            "charge_status",
            format!("Charge status: {}", status.status.as_deref().unwrap_or("unknown")),
        )
        .with_details(format!(
            "settlement_tx: {}",
            status.settlement_tx.as_deref().unwrap_or("pending")
        )),
        Err(err) if err.is_unimplemented() => {
            CheckResult::pass("charge_status", "Skipped (endpoint not implemented)")
                .with_details(err.to_string())
        }
        Err(err) => {
            CheckResult::fail("charge_status", format!("Failed to get charge status: {err}"))
        }
    }
}

pub async fn get_charge(client: &Drip, ctx: &mut CheckContext) -> CheckResult {
    let Some(charge_id) = ctx.created_charge_id.as_deref() else {
        return CheckResult::fail("get_charge", "No charge ID available")
            .with_suggestion("Run charge_create check first");
    };

    match client.get_charge(charge_id).await {
        Ok(charge) => {
            CheckResult::pass("get_charge", format!("Retrieved charge {}", charge.id))
                .with_details(format!(
                    "status: {}",
                    charge.status.as_deref().unwrap_or("unknown")
                ))
        }
        Err(err) if err.is_unimplemented() => {
            CheckResult::pass("get_charge", "Skipped (endpoint not implemented)")
                .with_details(err.to_string())
        }
        Err(err) => CheckResult::fail("get_charge", format!("Failed to get charge: {err}")),
    }
}

pub async fn list_charges_filtered(client: &Drip, ctx: &mut CheckContext) -> CheckResult {
    let Some(customer_id) = ctx.customer_id() else {
        return CheckResult::fail("list_charges_filtered", "No customer ID available")
            .with_suggestion("Run customer_create check first");
    };

    match client.list_charges(Some(customer_id), Some(10)).await {
        Ok(list) => CheckResult::pass(
            "list_charges_filtered",
            format!("Found {} charge(s) for customer", list.data.len()),
        ),
        Err(err) if err.is_unimplemented() => {
            CheckResult::pass("list_charges_filtered", "Skipped (endpoint not implemented)")
                .with_details(err.to_string())
        }
        Err(err) => CheckResult::fail(
            "list_charges_filtered",
            format!("Failed to list charges: {err}"),
        ),
    }
}
