//! Connectivity and authentication probes.

use crate::client::Drip;
use crate::error::DripError;
use crate::types::{CheckContext, CheckResult};

pub async fn connectivity(client: &Drip, _ctx: &mut CheckContext) -> CheckResult {
    match client.ping().await {
        Ok(ping) => CheckResult::pass("connectivity", "API is reachable")
            .with_details(format!("ping ok: {}", ping.ok)),
        Err(err) => CheckResult::fail("connectivity", format!("Cannot reach API: {err}"))
            .with_suggestion("Check DRIP_API_URL and network connectivity"),
    }
}

pub async fn authentication(client: &Drip, _ctx: &mut CheckContext) -> CheckResult {
    match client.list_customers(Some(1)).await {
        Ok(_) => CheckResult::pass("authentication", "API key is valid"),
        Err(DripError::Auth(_)) => CheckResult::fail("authentication", "Invalid API key")
            .with_suggestion("Check DRIP_API_KEY environment variable"),
        Err(err) => {
            CheckResult::fail("authentication", format!("Authentication check failed: {err}"))
        }
    }
}
