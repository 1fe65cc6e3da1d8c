//! Client-side usage accumulation for high-frequency metering.
//!
//! A `StreamMeter` buffers quantities locally and flushes them as a single
//! aggregated charge. Each flush carries a deterministic idempotency key
//! derived from the meter's session and flush sequence, so a retried flush
//! replays instead of double-charging.

use serde_json::Value;

use crate::client::Drip;
use crate::error::DripError;
use crate::idempotency::generate_idempotency_key;
use crate::models::{ChargeRequest, ChargeResult};

pub struct StreamMeterOptions {
    pub customer_id: String,
    pub meter: String,
    /// When set, `add` triggers an automatic flush once the buffered total
    /// reaches this value.
    pub flush_threshold: Option<f64>,
    pub metadata: Option<Value>,
}

impl StreamMeterOptions {
    pub fn new(customer_id: impl Into<String>, meter: impl Into<String>) -> Self {
        Self {
            customer_id: customer_id.into(),
            meter: meter.into(),
            flush_threshold: None,
            metadata: None,
        }
    }

    pub fn flush_threshold(mut self, threshold: f64) -> Self {
        self.flush_threshold = Some(threshold);
        self
    }
}

pub struct StreamMeter {
    client: Drip,
    customer_id: String,
    meter: String,
    flush_threshold: Option<f64>,
    metadata: Option<Value>,
    /// Distinguishes this meter instance from other sessions with the same
    /// customer/meter pair in the idempotency key.
    session: String,
    total: f64,
    sequence: u64,
}

#[derive(Debug)]
pub struct FlushResult {
    pub charge: Option<ChargeResult>,
    pub total_flushed: f64,
}

impl StreamMeter {
    pub(crate) fn new(client: Drip, options: StreamMeterOptions) -> Self {
        Self {
            client,
            customer_id: options.customer_id,
            meter: options.meter,
            flush_threshold: options.flush_threshold,
            metadata: options.metadata,
            session: uuid::Uuid::new_v4().to_string(),
            total: 0.0,
            sequence: 0,
        }
    }

    /// Buffered quantity not yet flushed.
    pub fn total(&self) -> f64 {
        self.total
    }

    /// Accumulate without flushing. Returns the new buffered total.
    pub fn add(&mut self, quantity: f64) -> f64 {
        self.total += quantity;
        self.total
    }

    pub fn should_flush(&self) -> bool {
        matches!(self.flush_threshold, Some(t) if self.total >= t)
    }

    /// Accumulate and flush automatically when the threshold is crossed.
    pub async fn add_flushing(
        &mut self,
        quantity: f64,
    ) -> Result<Option<FlushResult>, DripError> {
        self.add(quantity);
        if self.should_flush() {
            return self.flush().await.map(Some);
        }
        Ok(None)
    }

    /// Charge the buffered total as one aggregated charge. A zero buffer is a
    /// no-op. The sequence only advances after a successful charge, so a
    /// retried flush reuses the same idempotency key.
    pub async fn flush(&mut self) -> Result<FlushResult, DripError> {
        if self.total == 0.0 {
            return Ok(FlushResult {
                charge: None,
                total_flushed: 0.0,
            });
        }
        let key = generate_idempotency_key(
            &self.customer_id,
            &self.meter,
            self.sequence,
            Some(&self.session),
        );
        let charge = self
            .client
            .charge(&ChargeRequest {
                customer_id: self.customer_id.clone(),
                meter: self.meter.clone(),
                quantity: self.total,
                idempotency_key: Some(key),
                metadata: self.metadata.clone(),
            })
            .await?;
        let total_flushed = self.total;
        self.total = 0.0;
        self.sequence += 1;
        Ok(FlushResult {
            charge: Some(charge),
            total_flushed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn meter_for(server: &MockServer, options: StreamMeterOptions) -> StreamMeter {
        Drip::new("test_key", &server.base_url())
            .unwrap()
            .create_stream_meter(options)
    }

    #[test]
    fn add_accumulates() {
        let server = MockServer::start();
        let mut meter = meter_for(&server, StreamMeterOptions::new("cust_1", "tokens"));
        assert_eq!(meter.add(10.0), 10.0);
        assert_eq!(meter.add(5.5), 15.5);
        assert_eq!(meter.total(), 15.5);
        assert!(!meter.should_flush());
    }

    #[tokio::test]
    async fn flush_charges_aggregated_total() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/charges")
                .json_body_partial(r#"{"customerId": "cust_1", "meter": "tokens", "quantity": 30.0}"#);
            then.status(200)
                .json_body(serde_json::json!({"charge": {"id": "ch_flush"}}));
        });

        let mut meter = meter_for(&server, StreamMeterOptions::new("cust_1", "tokens"));
        meter.add(10.0);
        meter.add(20.0);
        let result = meter.flush().await.unwrap();
        assert_eq!(result.total_flushed, 30.0);
        assert_eq!(result.charge.unwrap().charge.unwrap().id, "ch_flush");
        assert_eq!(meter.total(), 0.0);
        mock.assert();
    }

    #[tokio::test]
    async fn flush_of_empty_buffer_is_noop() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/v1/charges");
            then.status(200).json_body(serde_json::json!({}));
        });

        let mut meter = meter_for(&server, StreamMeterOptions::new("cust_1", "tokens"));
        let result = meter.flush().await.unwrap();
        assert!(result.charge.is_none());
        assert_eq!(result.total_flushed, 0.0);
        assert_eq!(mock.hits(), 0);
    }

    #[tokio::test]
    async fn threshold_triggers_automatic_flush() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/v1/charges");
            then.status(200)
                .json_body(serde_json::json!({"charge": {"id": "ch_auto"}}));
        });

        let mut meter = meter_for(
            &server,
            StreamMeterOptions::new("cust_1", "tokens").flush_threshold(100.0),
        );
        assert!(meter.add_flushing(40.0).await.unwrap().is_none());
        assert!(meter.add_flushing(40.0).await.unwrap().is_none());
        let flushed = meter
            .add_flushing(40.0)
            .await
            .unwrap()
            .expect("threshold crossed");
        assert_eq!(flushed.total_flushed, 120.0);
        assert_eq!(meter.total(), 0.0);
        assert_eq!(mock.hits(), 1);
    }

    #[tokio::test]
    async fn sequential_flushes_use_distinct_keys() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/v1/charges");
            then.status(200)
                .json_body(serde_json::json!({"charge": {"id": "ch_seq"}}));
        });

        let mut meter = meter_for(&server, StreamMeterOptions::new("cust_1", "tokens"));
        meter.add(1.0);
        meter.flush().await.unwrap();
        meter.add(2.0);
        meter.flush().await.unwrap();
        assert_eq!(mock.hits(), 2);

        // Same session + different sequence must give different keys.
        let a = generate_idempotency_key("cust_1", "tokens", 0, Some(&meter.session));
        let b = generate_idempotency_key("cust_1", "tokens", 1, Some(&meter.session));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn failed_flush_keeps_buffer_and_sequence() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/charges");
            then.status(500).body("boom");
        });

        let mut meter = meter_for(&server, StreamMeterOptions::new("cust_1", "tokens"));
        meter.add(7.0);
        assert!(meter.flush().await.is_err());
        assert_eq!(meter.total(), 7.0);
        assert_eq!(meter.sequence, 0);
    }
}
