use crate::client::Drip;
use crate::types::{CheckContext, CheckResult};

pub async fn checkout_create(client: &Drip, ctx: &mut CheckContext) -> CheckResult {
    let Some(customer_id) = ctx.customer_id() else {
        return CheckResult::fail("checkout_create", "No customer ID available")
            .with_suggestion("Run customer_create check first or set TEST_CUSTOMER_ID");
    };

    // $10.00 in cents
    match client
        .checkout(customer_id, 1000, "https://example.com/checkout/success")
        .await
    {
        Ok(session) => {
            let url = session.url.as_deref().unwrap_or("N/A");
            let url = if url.len() > 50 {
                format!("{}...", &url[..50])
            } else {
                url.to_string()
            };
            CheckResult::pass("checkout_create", format!("Session: {}", session.id))
                .with_details(format!("URL: {url}"))
        }
        Err(err) if err.is_unimplemented() => {
            CheckResult::pass("checkout_create", "Skipped (endpoint not implemented)")
                .with_details(err.to_string())
        }
        Err(err) => {
            CheckResult::fail("checkout_create", format!("Failed to create checkout: {err}"))
        }
    }
}
