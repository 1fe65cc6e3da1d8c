use futures::future::BoxFuture;
use serde::Serialize;

use crate::client::Drip;
use crate::stream::StreamMeter;

pub type CheckFuture<'a> = BoxFuture<'a, CheckResult>;
pub type CheckFn = for<'a> fn(&'a Drip, &'a mut CheckContext) -> CheckFuture<'a>;

/// A single health check in the battery.
#[derive(Clone, Copy)]
pub struct Check {
    pub name: &'static str,
    pub description: &'static str,
    pub quick: bool,
    pub run: CheckFn,
}

#[derive(Debug, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub success: bool,
    #[serde(rename = "duration")]
    pub duration_ms: f64,
    pub message: String,
    pub details: Option<String>,
    pub suggestion: Option<String>,
}

impl CheckResult {
    pub fn pass(name: &str, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            success: true,
            duration_ms: 0.0,
            message: message.into(),
            details: None,
            suggestion: None,
        }
    }

    pub fn fail(name: &str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            ..Self::pass(name, message)
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Mutable state threaded through the battery. Earlier checks record the
/// resources they created so later checks can reuse and clean them up.
#[derive(Default)]
pub struct CheckContext {
    pub test_customer_id: Option<String>,
    pub created_customer_id: Option<String>,
    pub created_charge_id: Option<String>,
    pub webhook_id: Option<String>,
    pub webhook_secret: Option<String>,
    pub workflow_id: Option<String>,
    pub run_id: Option<String>,
    pub stream_meter: Option<StreamMeter>,
    pub skip_cleanup: bool,
}

impl CheckContext {
    /// The customer the battery operates on: the one it created, or the
    /// seeded TEST_CUSTOMER_ID.
    pub fn customer_id(&self) -> Option<&str> {
        self.created_customer_id
            .as_deref()
            .or(self.test_customer_id.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_builders() {
        let r = CheckResult::pass("connectivity", "ok")
            .with_details("detail")
            .with_suggestion("hint");
        assert!(r.success);
        assert_eq!(r.details.as_deref(), Some("detail"));
        assert_eq!(r.suggestion.as_deref(), Some("hint"));

        let r = CheckResult::fail("connectivity", "bad");
        assert!(!r.success);
        assert!(r.suggestion.is_none());
    }

    #[test]
    fn result_serializes_duration_field() {
        let r = CheckResult::pass("connectivity", "ok");
        let json = serde_json::to_value(&r).unwrap();
        assert!(json.get("duration").is_some());
        assert!(json.get("duration_ms").is_none());
    }

    #[test]
    fn context_prefers_created_customer() {
        let mut ctx = CheckContext {
            test_customer_id: Some("cust_seeded".into()),
            ..CheckContext::default()
        };
        assert_eq!(ctx.customer_id(), Some("cust_seeded"));
        ctx.created_customer_id = Some("cust_created".into());
        assert_eq!(ctx.customer_id(), Some("cust_created"));
    }
}
