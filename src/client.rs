//! Async client for the Drip billing API.
//!
//! All calls go through one request path that applies the client-side
//! resilience gates (rate limiter, circuit breaker) and retry backoff when a
//! `ResilienceConfig` is attached. Cloning the client is cheap and shares the
//! underlying connection pool and resilience state.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::error::{DripError, WrapCallError};
use crate::idempotency;
use crate::models::*;
use crate::resilience::{
    ResilienceConfig, ResilienceHealth, ResilienceManager, ResilienceMetrics, RetryPolicy,
};
use crate::signature;
use crate::stream::{StreamMeter, StreamMeterOptions};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

struct Inner {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    resilience: Option<ResilienceManager>,
    retry: RetryPolicy,
}

#[derive(Clone)]
pub struct Drip {
    inner: Arc<Inner>,
}

pub struct DripBuilder {
    api_key: String,
    base_url: String,
    resilience: Option<ResilienceConfig>,
    timeout: Duration,
}

impl DripBuilder {
    pub fn resilience(mut self, config: ResilienceConfig) -> Self {
        self.resilience = Some(config);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<Drip, DripError> {
        if self.api_key.is_empty() {
            return Err(DripError::Config("api key must not be empty".into()));
        }
        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()?;
        // Retries only apply when resilience is configured and enabled.
        let retry = match &self.resilience {
            Some(cfg) if cfg.enabled => cfg.retry.clone(),
            _ => RetryPolicy::none(),
        };
        Ok(Drip {
            inner: Arc::new(Inner {
                http,
                base_url: normalize_base_url(&self.base_url),
                api_key: self.api_key,
                resilience: self.resilience.map(ResilienceManager::new),
                retry,
            }),
        })
    }
}

/// Ensure the base URL ends in `/v1` exactly once, with no trailing slash.
pub fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    if trimmed.ends_with("/v1") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/v1")
    }
}

impl Drip {
    pub fn builder(api_key: impl Into<String>, base_url: impl Into<String>) -> DripBuilder {
        DripBuilder {
            api_key: api_key.into(),
            base_url: base_url.into(),
            resilience: None,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn new(api_key: &str, base_url: &str) -> Result<Self, DripError> {
        Self::builder(api_key, base_url).build()
    }

    // --- Static utilities ---

    /// Deterministic idempotency key from charge identity fields.
    pub fn generate_idempotency_key(
        customer_id: &str,
        meter: &str,
        sequence: u64,
        run_id: Option<&str>,
    ) -> String {
        idempotency::generate_idempotency_key(customer_id, meter, sequence, run_id)
    }

    /// Verify a `t=...,v1=...` webhook signature header.
    pub fn verify_webhook_signature(
        payload: &str,
        signature: &str,
        secret: &str,
        tolerance_seconds: u64,
    ) -> bool {
        signature::verify_webhook_signature(payload, signature, secret, tolerance_seconds)
    }

    // --- Resilience introspection ---

    /// Request metrics, or None when resilience is not enabled.
    pub fn metrics(&self) -> Option<ResilienceMetrics> {
        let mgr = self.inner.resilience.as_ref()?;
        mgr.is_enabled().then(|| mgr.metrics())
    }

    /// Health snapshot, or None when resilience is not enabled.
    pub fn health(&self) -> Option<ResilienceHealth> {
        let mgr = self.inner.resilience.as_ref()?;
        mgr.is_enabled().then(|| mgr.health())
    }

    // --- Connectivity ---

    pub async fn ping(&self) -> Result<Ping, DripError> {
        self.get("/ping").await
    }

    // --- Customers ---

    pub async fn create_customer(&self, params: &CreateCustomer) -> Result<Customer, DripError> {
        self.post("/customers", params).await
    }

    pub async fn get_customer(&self, customer_id: &str) -> Result<Customer, DripError> {
        self.get(&format!("/customers/{customer_id}")).await
    }

    pub async fn list_customers(
        &self,
        limit: Option<usize>,
    ) -> Result<ListResponse<Customer>, DripError> {
        match limit {
            Some(n) => self.get(&format!("/customers?limit={n}")).await,
            None => self.get("/customers").await,
        }
    }

    pub async fn delete_customer(&self, customer_id: &str) -> Result<(), DripError> {
        self.execute::<()>(Method::DELETE, &format!("/customers/{customer_id}"), None)
            .await
            .map(drop)
    }

    pub async fn get_balance(&self, customer_id: &str) -> Result<Balance, DripError> {
        self.get(&format!("/customers/{customer_id}/balance")).await
    }

    // --- Charges & usage ---

    pub async fn charge(&self, request: &ChargeRequest) -> Result<ChargeResult, DripError> {
        self.post("/charges", request).await
    }

    pub async fn get_charge(&self, charge_id: &str) -> Result<ChargeInfo, DripError> {
        self.get(&format!("/charges/{charge_id}")).await
    }

    pub async fn list_charges(
        &self,
        customer_id: Option<&str>,
        limit: Option<usize>,
    ) -> Result<ListResponse<ChargeInfo>, DripError> {
        let mut query = Vec::new();
        if let Some(id) = customer_id {
            query.push(format!("customerId={id}"));
        }
        if let Some(n) = limit {
            query.push(format!("limit={n}"));
        }
        let path = if query.is_empty() {
            "/charges".to_string()
        } else {
            format!("/charges?{}", query.join("&"))
        };
        self.get(&path).await
    }

    pub async fn get_charge_status(&self, charge_id: &str) -> Result<ChargeStatus, DripError> {
        self.get(&format!("/charges/{charge_id}/status")).await
    }

    pub async fn track_usage(&self, request: &TrackUsageRequest) -> Result<UsageRecord, DripError> {
        self.post("/usage", request).await
    }

    /// Run `call`, extract a usage quantity from its output, and record a
    /// charge for that quantity. A failing call propagates unchanged and
    /// records nothing.
    pub async fn wrap_api_call<T, E, F, Fut, U>(
        &self,
        customer_id: &str,
        meter: &str,
        call: F,
        extract_usage: U,
        idempotency_key: Option<&str>,
    ) -> Result<WrapApiCall<T>, WrapCallError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        U: FnOnce(&T) -> f64,
        E: std::error::Error,
    {
        let api_result = call().await.map_err(WrapCallError::Call)?;
        let quantity = extract_usage(&api_result);
        let charge = self
            .charge(&ChargeRequest {
                customer_id: customer_id.to_string(),
                meter: meter.to_string(),
                quantity,
                idempotency_key: idempotency_key.map(str::to_string),
                metadata: None,
            })
            .await
            .map_err(WrapCallError::Billing)?;
        Ok(WrapApiCall {
            api_result,
            charge: Some(charge),
        })
    }

    // --- Streaming ---

    pub fn create_stream_meter(&self, options: StreamMeterOptions) -> StreamMeter {
        StreamMeter::new(self.clone(), options)
    }

    // --- Webhooks ---

    pub async fn create_webhook(&self, request: &CreateWebhook) -> Result<Webhook, DripError> {
        self.post("/webhooks", request).await
    }

    pub async fn list_webhooks(&self) -> Result<ListResponse<Webhook>, DripError> {
        self.get("/webhooks").await
    }

    pub async fn get_webhook(&self, webhook_id: &str) -> Result<Webhook, DripError> {
        self.get(&format!("/webhooks/{webhook_id}")).await
    }

    pub async fn update_webhook(
        &self,
        webhook_id: &str,
        request: &UpdateWebhook,
    ) -> Result<Webhook, DripError> {
        self.request(Method::PATCH, &format!("/webhooks/{webhook_id}"), Some(request))
            .await
    }

    pub async fn delete_webhook(&self, webhook_id: &str) -> Result<(), DripError> {
        self.execute::<()>(Method::DELETE, &format!("/webhooks/{webhook_id}"), None)
            .await
            .map(drop)
    }

    pub async fn test_webhook(&self, webhook_id: &str) -> Result<WebhookTestResult, DripError> {
        self.post(&format!("/webhooks/{webhook_id}/test"), &json!({}))
            .await
    }

    pub async fn rotate_webhook_secret(
        &self,
        webhook_id: &str,
    ) -> Result<WebhookSecret, DripError> {
        self.post(&format!("/webhooks/{webhook_id}/rotate-secret"), &json!({}))
            .await
    }

    // --- Workflows & runs ---

    pub async fn create_workflow(&self, request: &CreateWorkflow) -> Result<Workflow, DripError> {
        self.post("/workflows", request).await
    }

    pub async fn list_workflows(&self) -> Result<ListResponse<Workflow>, DripError> {
        self.get("/workflows").await
    }

    pub async fn start_run(&self, request: &StartRun) -> Result<Run, DripError> {
        self.post("/runs", request).await
    }

    pub async fn emit_event(&self, run_id: &str, event: &RunEvent) -> Result<(), DripError> {
        self.execute(Method::POST, &format!("/runs/{run_id}/events"), Some(event))
            .await
            .map(drop)
    }

    pub async fn emit_events_batch(
        &self,
        run_id: &str,
        events: &[RunEvent],
    ) -> Result<(), DripError> {
        self.execute(
            Method::POST,
            &format!("/runs/{run_id}/events/batch"),
            Some(&json!({ "events": events })),
        )
        .await
        .map(drop)
    }

    pub async fn end_run(&self, run_id: &str, status: &str) -> Result<Run, DripError> {
        self.post(&format!("/runs/{run_id}/end"), &json!({ "status": status }))
            .await
    }

    pub async fn get_run_timeline(&self, run_id: &str) -> Result<RunTimeline, DripError> {
        self.get(&format!("/runs/{run_id}/timeline")).await
    }

    pub async fn record_run(&self, request: &RecordRun) -> Result<RecordRunResult, DripError> {
        self.post("/runs/record", request).await
    }

    // --- Billing utilities ---

    pub async fn list_meters(&self) -> Result<ListResponse<Meter>, DripError> {
        self.get("/meters").await
    }

    pub async fn checkout(
        &self,
        customer_id: &str,
        amount_cents: u64,
        return_url: &str,
    ) -> Result<CheckoutSession, DripError> {
        self.post(
            "/checkout",
            &json!({
                "customerId": customer_id,
                "amount": amount_cents,
                "returnUrl": return_url,
            }),
        )
        .await
    }

    pub async fn estimate_from_usage(
        &self,
        customer_id: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<Estimate, DripError> {
        self.post(
            "/estimates/usage",
            &json!({
                "customerId": customer_id,
                "startDate": start_date,
                "endDate": end_date,
            }),
        )
        .await
    }

    pub async fn estimate_from_hypothetical(
        &self,
        items: &[EstimateItem],
    ) -> Result<Estimate, DripError> {
        self.post("/estimates/hypothetical", &json!({ "items": items }))
            .await
    }

    pub async fn check_entitlement(
        &self,
        customer_id: &str,
        feature: &str,
    ) -> Result<Entitlement, DripError> {
        self.post(
            "/entitlements/check",
            &json!({ "customerId": customer_id, "feature": feature }),
        )
        .await
    }

    // --- Request plumbing ---

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, DripError> {
        self.request::<T, ()>(Method::GET, path, None).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, DripError> {
        self.request(Method::POST, path, Some(body)).await
    }

    async fn request<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, DripError> {
        let response = self.execute(method, path, body).await?;
        Ok(response.json().await?)
    }

    /// One request through the resilience gates, retried per policy on
    /// transport errors, 429s, and 5xx responses.
    async fn execute<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Response, DripError> {
        let mut attempt = 0u32;
        loop {
            if let Some(mgr) = &self.inner.resilience {
                mgr.before_request()?;
            }
            let result = self.send_once(method.clone(), path, body).await;
            if let Some(mgr) = &self.inner.resilience {
                mgr.after_request(result.is_ok());
            }
            match result {
                Ok(response) => return Ok(response),
                Err(err) if err.is_retryable() && attempt + 1 < self.inner.retry.max_attempts => {
                    tokio::time::sleep(self.inner.retry.delay_for(attempt)).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn send_once<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Response, DripError> {
        let url = format!("{}{}", self.inner.base_url, path);
        let mut request = self
            .inner
            .http
            .request(method, &url)
            .bearer_auth(&self.inner.api_key);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        Err(error_from_response(status, &text))
    }
}

fn error_from_response(status: StatusCode, body: &str) -> DripError {
    let (code, message) = parse_error_body(status, body);
    match status.as_u16() {
        401 | 403 => DripError::Auth(message),
        404 => DripError::NotFound(message),
        s => DripError::Api {
            status: s,
            code,
            message,
        },
    }
}

/// Pull `code`/`message` out of an error body, tolerating the shapes the
/// backend emits: `{"error":{"code","message"}}`, `{"error":"..."}`,
/// `{"message":"..."}`, or plain text.
fn parse_error_body(status: StatusCode, body: &str) -> (Option<String>, String) {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let code = value["error"]["code"]
            .as_str()
            .or_else(|| value["code"].as_str())
            .map(str::to_string);
        let message = value["error"]["message"]
            .as_str()
            .or_else(|| value["message"].as_str())
            .or_else(|| value["error"].as_str())
            .map(str::to_string);
        if let Some(message) = message {
            return (code, message);
        }
    }
    let fallback = if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.trim().to_string()
    };
    (None, fallback)
}
