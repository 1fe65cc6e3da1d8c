//! Webhook CRUD probes. Each endpoint check skip-passes when the backend has
//! not implemented the endpoint or when the create step left no webhook ID.

use crate::client::Drip;
use crate::models::CreateWebhook;
use crate::types::{CheckContext, CheckResult};

fn no_webhook(name: &str) -> CheckResult {
    CheckResult::pass(name, "Skipped (no webhook ID)").with_details("Run webhook_create check first")
}

pub async fn webhook_create(client: &Drip, ctx: &mut CheckContext) -> CheckResult {
    let url = format!("https://webhook.site/health-check-{}", super::short_hex());
    let request = CreateWebhook {
        url: url.clone(),
        events: vec!["charge.created".to_string(), "charge.settled".to_string()],
        description: None,
    };

    match client.create_webhook(&request).await {
        Ok(webhook) => {
            ctx.webhook_id = Some(webhook.id.clone());
            if webhook.secret.is_some() {
                ctx.webhook_secret = webhook.secret;
            }
            CheckResult::pass("webhook_create", format!("Created webhook {}", webhook.id))
                .with_details(format!("URL: {url}"))
        }
        Err(err) if err.is_unimplemented() => {
            CheckResult::pass("webhook_create", "Skipped (endpoint not implemented)")
                .with_details(err.to_string())
        }
        Err(err) => CheckResult::fail("webhook_create", format!("Failed to create webhook: {err}")),
    }
}

pub async fn webhook_list(client: &Drip, _ctx: &mut CheckContext) -> CheckResult {
    match client.list_webhooks().await {
        Ok(list) => {
            CheckResult::pass("webhook_list", format!("Found {} webhook(s)", list.data.len()))
        }
        Err(err) if err.is_unimplemented() => {
            CheckResult::pass("webhook_list", "Skipped (endpoint not implemented)")
                .with_details(err.to_string())
        }
        Err(err) => CheckResult::fail("webhook_list", format!("Failed to list webhooks: {err}")),
    }
}

pub async fn webhook_get(client: &Drip, ctx: &mut CheckContext) -> CheckResult {
    let Some(webhook_id) = ctx.webhook_id.as_deref() else {
        return no_webhook("webhook_get");
    };

    match client.get_webhook(webhook_id).await {
        Ok(webhook) => {
            CheckResult::pass("webhook_get", format!("Retrieved webhook {webhook_id}"))
                .with_details(format!("URL: {}", webhook.url))
        }
        Err(err) if err.is_unimplemented() => {
            CheckResult::pass("webhook_get", "Skipped (endpoint not implemented)")
                .with_details(err.to_string())
        }
        Err(err) => CheckResult::fail("webhook_get", format!("Failed to get webhook: {err}")),
    }
}

pub async fn webhook_test(client: &Drip, ctx: &mut CheckContext) -> CheckResult {
    let Some(webhook_id) = ctx.webhook_id.as_deref() else {
        return no_webhook("webhook_test");
    };

    match client.test_webhook(webhook_id).await {
        Ok(result) => {
            CheckResult::pass("webhook_test", format!("Test event sent: {}", result.sent))
        }
        Err(err) if err.is_unimplemented() => {
            CheckResult::pass("webhook_test", "Skipped (endpoint not implemented)")
                .with_details(err.to_string())
        }
        Err(err) => CheckResult::fail("webhook_test", format!("Failed to test webhook: {err}")),
    }
}

pub async fn webhook_rotate_secret(client: &Drip, ctx: &mut CheckContext) -> CheckResult {
    let Some(webhook_id) = ctx.webhook_id.as_deref() else {
        return no_webhook("webhook_rotate_secret");
    };

    match client.rotate_webhook_secret(webhook_id).await {
        Ok(rotated) => {
            let preview: String = rotated.secret.chars().take(10).collect();
            ctx.webhook_secret = Some(rotated.secret.clone());
            CheckResult::pass("webhook_rotate_secret", "Secret rotated successfully")
                .with_details(format!("New secret: {preview}..."))
        }
        Err(err) if err.is_unimplemented() => {
            CheckResult::pass("webhook_rotate_secret", "Skipped (endpoint not implemented)")
                .with_details(err.to_string())
        }
        Err(err) => {
            CheckResult::fail("webhook_rotate_secret", format!("Failed to rotate secret: {err}"))
        }
    }
}

pub async fn webhook_delete(client: &Drip, ctx: &mut CheckContext) -> CheckResult {
    let Some(webhook_id) = ctx.webhook_id.clone() else {
        return no_webhook("webhook_delete");
    };

    match client.delete_webhook(&webhook_id).await {
        Ok(()) => {
            ctx.webhook_id = None;
            ctx.webhook_secret = None;
            CheckResult::pass("webhook_delete", format!("Deleted webhook {webhook_id}"))
        }
        Err(err) if err.is_unimplemented() => {
            CheckResult::pass("webhook_delete", "Skipped (endpoint not implemented)")
                .with_details(err.to_string())
        }
        Err(err) => CheckResult::fail("webhook_delete", format!("Failed to delete webhook: {err}")),
    }
}
