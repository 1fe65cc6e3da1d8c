use crate::client::Drip;
use crate::types::{CheckContext, CheckResult};

pub async fn meters_list(client: &Drip, _ctx: &mut CheckContext) -> CheckResult {
    match client.list_meters().await {
        Ok(list) => {
            let names: Vec<&str> = list
                .data
                .iter()
                .take(3)
                .map(|m| m.name.as_str())
                .collect();
            let mut result =
                CheckResult::pass("meters_list", format!("Found {} meter(s)", list.data.len()));
            if !names.is_empty() {
                result = result.with_details(format!("Meters: {}", names.join(", ")));
            }
            result
        }
        Err(err) if err.is_unimplemented() => {
            CheckResult::pass("meters_list", "Skipped (endpoint not implemented)")
                .with_details(err.to_string())
        }
        Err(err) => CheckResult::fail("meters_list", format!("Failed to list meters: {err}")),
    }
}
