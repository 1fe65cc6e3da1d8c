//! Quick webhook signature probes: create a webhook to obtain a secret, then
//! verify a locally signed payload against it.

use crate::client::Drip;
use crate::models::CreateWebhook;
use crate::signature::{self, DEFAULT_TOLERANCE_SECONDS};
use crate::types::{CheckContext, CheckResult};

pub async fn webhook_sign(client: &Drip, ctx: &mut CheckContext) -> CheckResult {
    let request = CreateWebhook {
        url: format!("https://example.com/webhook/{}", super::short_hex()),
        events: vec![
            "charge.succeeded".to_string(),
            "customer.balance.low".to_string(),
        ],
        description: Some("Health check webhook".to_string()),
    };

    match client.create_webhook(&request).await {
        Ok(webhook) => {
            ctx.webhook_id = Some(webhook.id.clone());
            ctx.webhook_secret = webhook.secret;
            CheckResult::pass("webhook_sign", format!("Created webhook {}", webhook.id))
                .with_details("Secret obtained for verification")
        }
        Err(err) if err.is_unimplemented() => {
            CheckResult::pass("webhook_sign", "Skipped (endpoint not implemented)")
                .with_details(err.to_string())
        }
        Err(err) => CheckResult::fail("webhook_sign", format!("Failed to create webhook: {err}")),
    }
}

pub async fn webhook_verify(client: &Drip, ctx: &mut CheckContext) -> CheckResult {
    let Some(secret) = ctx.webhook_secret.clone() else {
        return CheckResult::pass("webhook_verify", "No webhook secret available")
            .with_details("Webhook sign check may have been skipped");
    };

    let payload = r#"{"event": "test", "data": {}}"#;
    let header = signature::sign_webhook_payload(payload, &secret, chrono::Utc::now().timestamp());
    let valid = Drip::verify_webhook_signature(payload, &header, &secret, DEFAULT_TOLERANCE_SECONDS);
    let tampered =
        Drip::verify_webhook_signature(payload, &header, "whsec_wrong", DEFAULT_TOLERANCE_SECONDS);

    // The webhook was only created to obtain a secret; remove it regardless
    // of the verification outcome.
    if let Some(webhook_id) = ctx.webhook_id.take() {
        let _ = client.delete_webhook(&webhook_id).await;
        ctx.webhook_secret = None;
    }

    if valid && !tampered {
        CheckResult::pass("webhook_verify", "Signature verification working")
    } else if !valid {
        CheckResult::fail("webhook_verify", "Signature verification failed unexpectedly")
    } else {
        CheckResult::fail("webhook_verify", "Verification accepted a wrong secret")
    }
}
