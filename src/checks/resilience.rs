//! Client-side resilience introspection probes. These skip-pass when the
//! client was built without resilience.

use crate::client::Drip;
use crate::types::{CheckContext, CheckResult};

pub async fn sdk_metrics(client: &Drip, _ctx: &mut CheckContext) -> CheckResult {
    match client.metrics() {
        Some(metrics) => CheckResult::pass(
            "sdk_metrics",
            format!("Total requests: {}", metrics.total_requests),
        )
        .with_details(format!(
            "successful: {}, failed: {}, rate limited: {}",
            metrics.successful_requests, metrics.failed_requests, metrics.rate_limited_requests
        )),
        None => CheckResult::pass("sdk_metrics", "Skipped (resilience not enabled)")
            .with_details("Enable resilience to get metrics"),
    }
}

pub async fn resilience_health(client: &Drip, _ctx: &mut CheckContext) -> CheckResult {
    match client.health() {
        Some(health) => CheckResult::pass(
            "resilience_health",
            format!("Health status: {}", if health.healthy { "healthy" } else { "degraded" }),
        )
        .with_details(format!("circuit breaker: {}", health.circuit_state)),
        None => CheckResult::pass("resilience_health", "Skipped (resilience not enabled)")
            .with_details("Enable resilience to get health status"),
    }
}
