use crate::client::Drip;
use crate::models::CreateWorkflow;
use crate::types::{CheckContext, CheckResult};

pub async fn workflow_create(client: &Drip, ctx: &mut CheckContext) -> CheckResult {
    let slug = format!("health-check-{}", super::short_hex());
    let request = CreateWorkflow {
        name: format!("Health Check Workflow {slug}"),
        slug: slug.clone(),
        description: Some("Test workflow created by health check".to_string()),
    };

    match client.create_workflow(&request).await {
        Ok(workflow) => {
            ctx.workflow_id = Some(workflow.id.clone());
            CheckResult::pass("workflow_create", format!("Created workflow {}", workflow.id))
                .with_details(format!("Slug: {slug}"))
        }
        Err(err) if err.is_unimplemented() => {
            CheckResult::pass("workflow_create", "Skipped (endpoint not implemented)")
                .with_details(err.to_string())
        }
        Err(err) => {
            CheckResult::fail("workflow_create", format!("Failed to create workflow: {err}"))
        }
    }
}

pub async fn workflow_list(client: &Drip, ctx: &mut CheckContext) -> CheckResult {
    match client.list_workflows().await {
        Ok(list) => {
            if ctx.workflow_id.is_none() {
                ctx.workflow_id = list.data.first().map(|w| w.id.clone());
            }
            CheckResult::pass("workflow_list", format!("Found {} workflow(s)", list.data.len()))
        }
        Err(err) if err.is_unimplemented() => {
            CheckResult::pass("workflow_list", "Skipped (endpoint not implemented)")
                .with_details(err.to_string())
        }
        Err(err) => CheckResult::fail("workflow_list", format!("Failed to list workflows: {err}")),
    }
}
