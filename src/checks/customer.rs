//! Customer lifecycle probes, including the final cleanup.

use serde_json::json;

use crate::client::Drip;
use crate::error::DripError;
use crate::models::CreateCustomer;
use crate::types::{CheckContext, CheckResult};

// A fixed, valid-looking address; the backend only validates the format.
const TEST_ONCHAIN_ADDRESS: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";

pub async fn customer_create(client: &Drip, ctx: &mut CheckContext) -> CheckResult {
    if let Some(seeded) = &ctx.test_customer_id {
        return CheckResult::pass("customer_create", format!("Using seeded customer {seeded}"))
            .with_details("Skipped creation (TEST_CUSTOMER_ID configured)");
    }

    let external_id = format!("health_check_{}", super::short_hex());
    let request = CreateCustomer {
        onchain_address: Some(TEST_ONCHAIN_ADDRESS.to_string()),
        external_customer_id: Some(external_id.clone()),
        metadata: Some(json!({"test": true, "source": "drip-doctor"})),
    };

    match client.create_customer(&request).await {
        Ok(customer) => {
            ctx.created_customer_id = Some(customer.id.clone());
            CheckResult::pass("customer_create", format!("Created customer {}", customer.id))
                .with_details(format!("external_id: {external_id}"))
        }
        Err(err) if is_duplicate(&err) => {
            CheckResult::pass("customer_create", "Customer already exists (using existing)")
                .with_details("Duplicate customer handled gracefully")
        }
        Err(err) => {
            CheckResult::fail("customer_create", format!("Failed to create customer: {err}"))
                .with_suggestion("Check API permissions and request format")
        }
    }
}

fn is_duplicate(err: &DripError) -> bool {
    if err.status() == Some(409) {
        return true;
    }
    let text = err.to_string().to_lowercase();
    text.contains("duplicate") || text.contains("already exists")
}

pub async fn customer_get(client: &Drip, ctx: &mut CheckContext) -> CheckResult {
    let Some(customer_id) = ctx.customer_id() else {
        return CheckResult::fail("customer_get", "No customer ID available")
            .with_suggestion("Run customer_create check first");
    };

    match client.get_customer(customer_id).await {
        Ok(customer) => {
            CheckResult::pass("customer_get", format!("Retrieved customer {}", customer.id))
                .with_details(format!(
                    "address: {}",
                    customer.onchain_address.as_deref().unwrap_or("N/A")
                ))
        }
        Err(err) => CheckResult::fail("customer_get", format!("Failed to get customer: {err}")),
    }
}

pub async fn customer_list(client: &Drip, _ctx: &mut CheckContext) -> CheckResult {
    match client.list_customers(Some(10)).await {
        Ok(list) => {
            CheckResult::pass("customer_list", format!("Listed {} customers", list.data.len()))
        }
        Err(err) => CheckResult::fail("customer_list", format!("Failed to list customers: {err}")),
    }
}

pub async fn customer_cleanup(client: &Drip, ctx: &mut CheckContext) -> CheckResult {
    if ctx.skip_cleanup {
        return CheckResult::pass("customer_cleanup", "Cleanup skipped (--no-cleanup flag)");
    }
    let Some(customer_id) = ctx.created_customer_id.clone() else {
        return CheckResult::pass("customer_cleanup", "No customer to clean up");
    };

    match client.delete_customer(&customer_id).await {
        Ok(()) => {
            ctx.created_customer_id = None;
            CheckResult::pass("customer_cleanup", format!("Deleted customer {customer_id}"))
        }
        Err(err) if err.is_unimplemented() => CheckResult::pass(
            "customer_cleanup",
            format!("Customer {customer_id} marked for cleanup"),
        )
        .with_details("Delete endpoint not implemented; manual cleanup may be required"),
        Err(err) => {
            CheckResult::fail("customer_cleanup", format!("Failed to cleanup customer: {err}"))
                .with_suggestion("Manual cleanup may be required")
        }
    }
}
