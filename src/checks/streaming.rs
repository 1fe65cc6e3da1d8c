//! Stream meter accumulation and flush probes. The meter built here is
//! carried in the context so flush exercises the same instance.

use crate::client::Drip;
use crate::stream::StreamMeterOptions;
use crate::types::{CheckContext, CheckResult};

pub async fn stream_meter_add(client: &Drip, ctx: &mut CheckContext) -> CheckResult {
    let Some(customer_id) = ctx.customer_id() else {
        return CheckResult::fail("stream_meter_add", "No customer ID available");
    };

    let mut meter = client.create_stream_meter(
        StreamMeterOptions::new(customer_id, "tokens").flush_threshold(10_000.0),
    );
    meter.add(100.0);
    meter.add(200.0);
    meter.add(300.0);
    let total = meter.total();
    ctx.stream_meter = Some(meter);

    CheckResult::pass("stream_meter_add", format!("Accumulated {total} units"))
        .with_details("Ready for flush")
}

pub async fn stream_meter_flush(_client: &Drip, ctx: &mut CheckContext) -> CheckResult {
    let Some(meter) = ctx.stream_meter.as_mut() else {
        return CheckResult::pass("stream_meter_flush", "No stream meter available")
            .with_details("Stream meter add check may have been skipped");
    };

    match meter.flush().await {
        Ok(result) => {
            let charge_id = result
                .charge
                .and_then(|c| c.charge)
                .map(|c| c.id)
                .unwrap_or_else(|| "none".to_string());
            CheckResult::pass(
                "stream_meter_flush",
                format!("Flushed meter, charge: {charge_id}"),
            )
            .with_details(format!("total flushed: {}", result.total_flushed))
        }
        Err(err) => {
            CheckResult::fail("stream_meter_flush", format!("Stream meter flush failed: {err}"))
        }
    }
}
