//! The health check battery.
//!
//! Checks run sequentially in registry order, sharing a `CheckContext` so the
//! customer created early on is reused by later checks and cleaned up by the
//! final check. Quick checks form the smoke-test subset.

use crate::types::Check;

mod balance;
mod charge;
mod checkout;
mod connectivity;
mod customer;
mod estimates;
mod idempotency;
mod meters;
mod resilience;
mod runs;
mod streaming;
mod usage;
mod utilities;
mod webhooks;
mod webhooks_crud;
mod workflows;
mod wrap_api_call;

macro_rules! check {
    ($name:literal, $desc:literal, $f:path) => {
        check!($name, $desc, $f, false)
    };
    ($name:literal, $desc:literal, $f:path, $quick:expr) => {{
        fn run<'a>(
            client: &'a crate::client::Drip,
            ctx: &'a mut crate::types::CheckContext,
        ) -> crate::types::CheckFuture<'a> {
            Box::pin($f(client, ctx))
        }
        Check {
            name: $name,
            description: $desc,
            quick: $quick,
            run,
        }
    }};
}

/// Every check, in execution order. Cleanup is always last.
pub fn all_checks() -> Vec<Check> {
    vec![
        // Connectivity & auth
        check!("connectivity", "Verify API connectivity", connectivity::connectivity, true),
        check!("authentication", "Verify API key authentication", connectivity::authentication, true),
        // Customer operations
        check!("customer_create", "Create a test customer", customer::customer_create),
        check!("customer_get", "Retrieve created customer", customer::customer_get),
        check!("customer_list", "List customers with pagination", customer::customer_list),
        // Charge operations
        check!("charge_create", "Create a usage charge", charge::charge_create),
        check!("charge_status", "Check charge settlement status", charge::charge_status),
        check!("get_charge", "Retrieve charge by ID", charge::get_charge),
        check!("list_charges_filtered", "List charges filtered by customer", charge::list_charges_filtered),
        // Usage tracking
        check!("track_usage", "Track usage without charging", usage::track_usage),
        check!("balance_get", "Get customer balance", balance::balance_get),
        // Streaming
        check!("stream_meter_add", "Test stream meter accumulation", streaming::stream_meter_add),
        check!("stream_meter_flush", "Test stream meter flush", streaming::stream_meter_flush),
        // Idempotency
        check!("idempotency", "Verify idempotent charge handling", idempotency::idempotency),
        // API wrapping
        check!("wrap_api_call_basic", "Test wrap_api_call basic usage", wrap_api_call::basic),
        check!("wrap_api_call_idempotency", "Test wrap_api_call idempotency", wrap_api_call::idempotency),
        check!("wrap_api_call_error", "Test wrap_api_call error handling", wrap_api_call::error_handling),
        // Checkout
        check!("checkout_create", "Create checkout session", checkout::checkout_create),
        // Webhook signatures
        check!("webhook_sign", "Create webhook and get secret", webhooks::webhook_sign, true),
        check!("webhook_verify", "Verify webhook signature", webhooks::webhook_verify, true),
        // Webhook CRUD
        check!("webhook_create", "Create webhook endpoint", webhooks_crud::webhook_create),
        check!("webhook_list", "List all webhooks", webhooks_crud::webhook_list),
        check!("webhook_get", "Get webhook by ID", webhooks_crud::webhook_get),
        check!("webhook_test", "Send test webhook event", webhooks_crud::webhook_test),
        check!("webhook_rotate_secret", "Rotate webhook signing secret", webhooks_crud::webhook_rotate_secret),
        check!("webhook_delete", "Delete webhook", webhooks_crud::webhook_delete),
        // Workflows
        check!("workflow_create", "Create workflow definition", workflows::workflow_create),
        check!("workflow_list", "List all workflows", workflows::workflow_list),
        // Runs
        check!("run_create", "Start a workflow run", runs::run_create),
        check!("run_timeline", "Get run timeline", runs::run_timeline),
        check!("run_end", "End an in-flight run", runs::run_end),
        check!("emit_event", "Emit a single run event", runs::emit_event),
        check!("emit_events_batch", "Emit run events in a batch", runs::emit_events_batch),
        check!("record_run", "Record a completed run in one call", runs::record_run),
        // Meters
        check!("meters_list", "List available meters", meters::meters_list),
        // Estimates
        check!("estimate_from_usage", "Estimate costs from historical usage", estimates::estimate_from_usage),
        check!("estimate_hypothetical", "Estimate hypothetical costs", estimates::estimate_hypothetical),
        // Resilience
        check!("sdk_metrics", "Get client request metrics", resilience::sdk_metrics),
        check!("resilience_health", "Get resilience health status", resilience::resilience_health),
        // Utilities
        check!("idempotency_key_gen", "Test idempotency key generation", utilities::idempotency_key_gen, true),
        check!("stream_meter_create", "Create stream meter instance", utilities::stream_meter_create),
        // Cleanup (always last)
        check!("customer_cleanup", "Clean up test resources", customer::customer_cleanup),
    ]
}

pub fn quick_checks() -> Vec<Check> {
    all_checks().into_iter().filter(|c| c.quick).collect()
}

/// Case-insensitive substring match against check names, preserving registry
/// order and deduplicating.
pub fn checks_by_name(names: &[String]) -> Vec<Check> {
    let mut selected: Vec<Check> = Vec::new();
    for name in names {
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            continue;
        }
        for check in all_checks() {
            if check.name.to_lowercase().contains(&needle)
                && !selected.iter().any(|c| c.name == check.name)
            {
                selected.push(check);
            }
        }
    }
    selected
}

/// Idempotency key unique to this process invocation, so health-check charges
/// never collide with keys from earlier invocations.
pub(crate) fn fresh_idempotency_key(customer_id: &str, meter: &str) -> String {
    crate::idempotency::generate_idempotency_key(
        customer_id,
        meter,
        0,
        Some(&uuid::Uuid::new_v4().to_string()),
    )
}

pub(crate) fn short_hex() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn battery_has_forty_two_checks() {
        assert_eq!(all_checks().len(), 42);
    }

    #[test]
    fn check_names_are_unique() {
        let checks = all_checks();
        let names: std::collections::HashSet<&str> = checks.iter().map(|c| c.name).collect();
        assert_eq!(names.len(), checks.len());
    }

    #[test]
    fn cleanup_runs_last() {
        assert_eq!(all_checks().last().unwrap().name, "customer_cleanup");
    }

    #[test]
    fn quick_subset() {
        let names: Vec<&str> = quick_checks().iter().map(|c| c.name).collect();
        assert_eq!(
            names,
            [
                "connectivity",
                "authentication",
                "webhook_sign",
                "webhook_verify",
                "idempotency_key_gen",
            ]
        );
    }

    #[test]
    fn name_filter_is_substring_and_case_insensitive() {
        let names: Vec<&str> = checks_by_name(&["CUSTOMER".to_string()])
            .iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(
            names,
            ["customer_create", "customer_get", "customer_list", "customer_cleanup"]
        );
    }

    #[test]
    fn name_filter_deduplicates() {
        let selected = checks_by_name(&["webhook".to_string(), "webhook_get".to_string()]);
        let count = selected.iter().filter(|c| c.name == "webhook_get").count();
        assert_eq!(count, 1);
    }

    #[test]
    fn name_filter_unknown_matches_nothing() {
        assert!(checks_by_name(&["zzz_not_a_check".to_string()]).is_empty());
    }

    #[test]
    fn fresh_keys_do_not_repeat() {
        let a = fresh_idempotency_key("cust_1", "tokens");
        let b = fresh_idempotency_key("cust_1", "tokens");
        assert_ne!(a, b);
        assert!(a.starts_with("idem_"));
    }
}
