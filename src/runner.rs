//! Sequential check execution with per-check timeout.

use std::time::{Duration, Instant};

use crate::client::Drip;
use crate::reporter::Reporter;
use crate::types::{Check, CheckContext, CheckResult};

async fn run_with_timeout(
    check: &Check,
    client: &Drip,
    ctx: &mut CheckContext,
    timeout_ms: u64,
) -> CheckResult {
    match tokio::time::timeout(Duration::from_millis(timeout_ms), (check.run)(client, ctx)).await {
        Ok(result) => result,
        Err(_) => CheckResult::fail(check.name, format!("Check timed out after {timeout_ms}ms"))
            .with_suggestion("Increase timeout or check network connectivity")
            .timed(timeout_ms as f64),
    }
}

impl CheckResult {
    fn timed(mut self, duration_ms: f64) -> Self {
        self.duration_ms = duration_ms;
        self
    }
}

/// Run checks in order, threading the shared context through. Every check
/// produces a result; a failing check never aborts the battery.
pub async fn run_checks(
    checks: &[Check],
    client: &Drip,
    ctx: &mut CheckContext,
    timeout_ms: u64,
    reporter: &mut Reporter,
) -> Vec<CheckResult> {
    let mut results = Vec::with_capacity(checks.len());

    reporter.start();
    for check in checks {
        reporter.on_check_start(check);
        let started = Instant::now();
        let mut result = run_with_timeout(check, client, ctx, timeout_ms).await;
        if result.duration_ms == 0.0 {
            result.duration_ms = started.elapsed().as_secs_f64() * 1000.0;
        }
        reporter.on_check_complete(&result);
        results.push(result);
    }
    reporter.finish(&results);

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks;
    use httpmock::prelude::*;

    fn quiet_reporter() -> Reporter {
        Reporter::new(false, true)
    }

    #[tokio::test]
    async fn timeout_produces_failed_result() {
        // An unroutable address makes the connect hang long enough to trip
        // the 10ms timeout.
        let client = Drip::new("test_key", "http://10.255.255.1:9").unwrap();
        let battery = checks::checks_by_name(&["connectivity".to_string()]);
        let mut ctx = CheckContext::default();

        let results =
            run_checks(&battery, &client, &mut ctx, 10, &mut quiet_reporter()).await;
        assert_eq!(results.len(), 1);
        assert!(!results[0].success);
        assert!(results[0].duration_ms > 0.0);
    }

    #[tokio::test]
    async fn context_flows_between_checks() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/customers");
            then.status(200).json_body(serde_json::json!({"id": "cust_ctx"}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/v1/customers/cust_ctx");
            then.status(200).json_body(serde_json::json!({"id": "cust_ctx"}));
        });

        let client = Drip::new("test_key", &server.base_url()).unwrap();
        let battery = checks::checks_by_name(&[
            "customer_create".to_string(),
            "customer_get".to_string(),
        ]);
        let mut ctx = CheckContext::default();

        let results =
            run_checks(&battery, &client, &mut ctx, 5_000, &mut quiet_reporter()).await;
        assert!(results.iter().all(|r| r.success), "{results:?}");
        assert_eq!(ctx.created_customer_id.as_deref(), Some("cust_ctx"));
    }

    #[tokio::test]
    async fn failing_check_does_not_abort_battery() {
        let server = MockServer::start();
        // No mocks for customer endpoints: create fails, list also fails,
        // but both still produce results.
        server.mock(|when, then| {
            when.method(GET).path("/v1/ping");
            then.status(200).json_body(serde_json::json!({"ok": true}));
        });

        let client = Drip::new("test_key", &server.base_url()).unwrap();
        let battery = checks::checks_by_name(&[
            "customer_list".to_string(),
            "connectivity".to_string(),
        ]);
        let mut ctx = CheckContext::default();

        let results =
            run_checks(&battery, &client, &mut ctx, 5_000, &mut quiet_reporter()).await;
        assert_eq!(results.len(), 2);
        assert!(!results[0].success);
        assert!(results[1].success);
    }
}
