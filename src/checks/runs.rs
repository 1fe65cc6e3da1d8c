//! Workflow run probes.
//!
//! `run_create` starts a run and leaves it open for the timeline and end
//! checks. The event checks start their own short-lived runs so they work
//! even when the shared run has already been ended.

use crate::client::Drip;
use crate::error::DripError;
use crate::models::{CreateWorkflow, RecordRun, Run, RunEvent, StartRun};
use crate::types::{CheckContext, CheckResult};

fn test_event(description: &str) -> RunEvent {
    RunEvent {
        event_type: "test.event".to_string(),
        quantity: 100.0,
        units: Some("tokens".to_string()),
        description: Some(description.to_string()),
    }
}

/// Create a workflow to run against if the context does not carry one yet.
async fn ensure_workflow(client: &Drip, ctx: &mut CheckContext) -> Result<String, DripError> {
    if let Some(id) = &ctx.workflow_id {
        return Ok(id.clone());
    }
    let slug = format!("health-check-{}", super::short_hex());
    let workflow = client
        .create_workflow(&CreateWorkflow {
            name: format!("Health Check Workflow {slug}"),
            slug,
            description: None,
        })
        .await?;
    ctx.workflow_id = Some(workflow.id.clone());
    Ok(workflow.id)
}

async fn start_scratch_run(
    client: &Drip,
    ctx: &mut CheckContext,
    customer_id: &str,
) -> Result<Run, DripError> {
    let workflow_id = ensure_workflow(client, ctx).await?;
    client
        .start_run(&StartRun {
            customer_id: customer_id.to_string(),
            workflow_id,
            correlation_id: Some(format!("health_{}", super::short_hex())),
        })
        .await
}

pub async fn run_create(client: &Drip, ctx: &mut CheckContext) -> CheckResult {
    let Some(customer_id) = ctx.customer_id().map(str::to_string) else {
        return CheckResult::fail("run_create", "No customer ID available");
    };

    match start_scratch_run(client, ctx, &customer_id).await {
        Ok(run) => {
            ctx.run_id = Some(run.id.clone());
            CheckResult::pass("run_create", format!("Started run {}", run.id)).with_details(
                format!("workflow: {}", ctx.workflow_id.as_deref().unwrap_or("unknown")),
            )
        }
        Err(err) if err.is_unimplemented() => {
            CheckResult::pass("run_create", "Skipped (endpoint not implemented)")
                .with_details(err.to_string())
        }
        Err(err) => CheckResult::fail("run_create", format!("Run creation failed: {err}")),
    }
}

pub async fn run_timeline(client: &Drip, ctx: &mut CheckContext) -> CheckResult {
    let Some(run_id) = ctx.run_id.as_deref() else {
        return CheckResult::pass("run_timeline", "No run ID available")
            .with_details("Run create check may have been skipped");
    };

    match client.get_run_timeline(run_id).await {
        Ok(timeline) => CheckResult::pass(
            "run_timeline",
            format!("Retrieved timeline with {} events", timeline.events.len()),
        ),
        Err(err) if err.is_unimplemented() => {
            CheckResult::pass("run_timeline", "Skipped (endpoint not implemented)")
                .with_details(err.to_string())
        }
        Err(err) => CheckResult::fail("run_timeline", format!("Failed to get timeline: {err}")),
    }
}

pub async fn run_end(client: &Drip, ctx: &mut CheckContext) -> CheckResult {
    let Some(run_id) = ctx.run_id.clone() else {
        return CheckResult::pass("run_end", "No run ID available")
            .with_details("Run create check may have been skipped");
    };

    match client.end_run(&run_id, "COMPLETED").await {
        Ok(run) => CheckResult::pass("run_end", format!("Ended run {}", run.id))
            .with_details(format!("status: {}", run.status.as_deref().unwrap_or("COMPLETED"))),
        Err(err) if err.is_unimplemented() => {
            CheckResult::pass("run_end", "Skipped (endpoint not implemented)")
                .with_details(err.to_string())
        }
        Err(err) => CheckResult::fail("run_end", format!("Failed to end run: {err}")),
    }
}

pub async fn emit_event(client: &Drip, ctx: &mut CheckContext) -> CheckResult {
    let Some(customer_id) = ctx.customer_id().map(str::to_string) else {
        return CheckResult::fail("emit_event", "No customer ID available");
    };

    let run = match start_scratch_run(client, ctx, &customer_id).await {
        Ok(run) => run,
        Err(err) if err.is_unimplemented() => {
            return CheckResult::pass("emit_event", "Skipped (endpoint not implemented)")
                .with_details(err.to_string());
        }
        Err(err) => {
            return CheckResult::fail("emit_event", format!("Failed to start run: {err}"));
        }
    };

    let outcome = client
        .emit_event(&run.id, &test_event("Health check single event"))
        .await;
    let _ = client.end_run(&run.id, "COMPLETED").await;

    match outcome {
        Ok(()) => CheckResult::pass("emit_event", format!("Emitted event on run {}", run.id)),
        Err(err) if err.is_unimplemented() => {
            CheckResult::pass("emit_event", "Skipped (endpoint not implemented)")
                .with_details(err.to_string())
        }
        Err(err) => CheckResult::fail("emit_event", format!("Failed to emit event: {err}")),
    }
}

pub async fn emit_events_batch(client: &Drip, ctx: &mut CheckContext) -> CheckResult {
    let Some(customer_id) = ctx.customer_id().map(str::to_string) else {
        return CheckResult::fail("emit_events_batch", "No customer ID available");
    };

    let run = match start_scratch_run(client, ctx, &customer_id).await {
        Ok(run) => run,
        Err(err) if err.is_unimplemented() => {
            return CheckResult::pass("emit_events_batch", "Skipped (endpoint not implemented)")
                .with_details(err.to_string());
        }
        Err(err) => {
            return CheckResult::fail("emit_events_batch", format!("Failed to start run: {err}"));
        }
    };

    let events = [
        test_event("Health check batch event 1"),
        test_event("Health check batch event 2"),
    ];
    let outcome = client.emit_events_batch(&run.id, &events).await;
    let _ = client.end_run(&run.id, "COMPLETED").await;

    match outcome {
        Ok(()) => CheckResult::pass(
            "emit_events_batch",
            format!("Emitted {} events on run {}", events.len(), run.id),
        ),
        Err(err) if err.is_unimplemented() => {
            CheckResult::pass("emit_events_batch", "Skipped (endpoint not implemented)")
                .with_details(err.to_string())
        }
        Err(err) => {
            CheckResult::fail("emit_events_batch", format!("Failed to emit batch: {err}"))
        }
    }
}

pub async fn record_run(client: &Drip, ctx: &mut CheckContext) -> CheckResult {
    let Some(customer_id) = ctx.customer_id() else {
        return CheckResult::fail("record_run", "No customer ID available");
    };

    // The backend auto-creates the workflow from the slug.
    let slug = format!("health-check-{}", super::short_hex());
    let request = RecordRun {
        customer_id: customer_id.to_string(),
        workflow: slug.clone(),
        status: "COMPLETED".to_string(),
        events: vec![test_event("Health check recorded event")],
    };

    match client.record_run(&request).await {
        Ok(result) => {
            CheckResult::pass("record_run", format!("Recorded run {}", result.run.id))
                .with_details(format!("workflow: {slug}"))
        }
        Err(err) if err.is_unimplemented() => {
            CheckResult::pass("record_run", "Skipped (endpoint not implemented)")
                .with_details(err.to_string())
        }
        Err(err) => CheckResult::fail("record_run", format!("Failed to record run: {err}")),
    }
}
