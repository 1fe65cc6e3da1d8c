//! Local SDK utility probes that need no backend round-trip.

use crate::client::Drip;
use crate::idempotency::generate_idempotency_key;
use crate::stream::StreamMeterOptions;
use crate::types::{CheckContext, CheckResult};

pub async fn idempotency_key_gen(_client: &Drip, _ctx: &mut CheckContext) -> CheckResult {
    let key1 = generate_idempotency_key("cust_123", "tokens", 1, None);
    let key2 = generate_idempotency_key("cust_123", "tokens", 1, None);
    let key3 = generate_idempotency_key("cust_123", "tokens", 2, None);

    if key1 != key2 {
        return CheckResult::fail("idempotency_key_gen", "Keys not deterministic")
            .with_details("Same inputs should produce same key");
    }
    if key1 == key3 {
        return CheckResult::fail("idempotency_key_gen", "Keys not unique")
            .with_details("Different sequence should produce different key");
    }

    let preview: String = key1.chars().take(20).collect();
    CheckResult::pass("idempotency_key_gen", "Keys generated correctly")
        .with_details(format!("key: {preview}..."))
}

pub async fn stream_meter_create(client: &Drip, ctx: &mut CheckContext) -> CheckResult {
    let customer_id = ctx.customer_id().unwrap_or("test_customer").to_string();
    let meter = client.create_stream_meter(StreamMeterOptions::new(&customer_id, "tokens"));
    ctx.stream_meter = Some(meter);

    CheckResult::pass("stream_meter_create", "Stream meter instance created")
        .with_details(format!("Customer: {customer_id}"))
}
