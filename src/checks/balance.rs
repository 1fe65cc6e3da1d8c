use crate::client::Drip;
use crate::types::{CheckContext, CheckResult};

pub async fn balance_get(client: &Drip, ctx: &mut CheckContext) -> CheckResult {
    let Some(customer_id) = ctx.customer_id() else {
        return CheckResult::fail("balance_get", "No customer ID available")
            .with_suggestion("Run customer_create check first");
    };

    match client.get_balance(customer_id).await {
        Ok(balance) => CheckResult::pass(
            "balance_get",
            format!("Balance: {} USDC", balance.balance_usdc),
        )
        .with_details(format!(
            "available: {} USDC",
            balance.available_usdc.unwrap_or(balance.balance_usdc)
        )),
        Err(err) => CheckResult::fail("balance_get", format!("Failed to get balance: {err}")),
    }
}
