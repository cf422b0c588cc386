//! Tracing bootstrap and run summaries.

use anyhow::{anyhow, Result};
use branchflow_context::{RunContext, StageStatus};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber filtered by `RUST_LOG`.
///
/// Panics if a global subscriber is already set; see [`try_init_tracing`].
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
}

pub fn try_init_tracing() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))
}

/// Log the outcome of every stage recorded in `context`
pub fn log_run_summary(context: &RunContext) {
    info!(
        trace_id = %context.trace_id,
        total_stages = context.stage_logs.len(),
        success = context.count_with_status(StageStatus::Success),
        failed = context.count_with_status(StageStatus::Failed),
        errors = context.errors.len(),
        "Run summary"
    );

    for log in &context.stage_logs {
        let duration_ms = log.duration().unwrap_or_default().as_millis();

        match log.status {
            StageStatus::Success => {
                info!(
                    trace_id = %log.trace_id,
                    flow = %log.flow_name,
                    stage = %log.stage_name,
                    index = log.index,
                    duration_ms,
                    "Stage completed"
                );
            }
            StageStatus::Failed => {
                error!(
                    trace_id = %log.trace_id,
                    flow = %log.flow_name,
                    stage = %log.stage_name,
                    index = log.index,
                    duration_ms,
                    error = %log.error_message.as_deref().unwrap_or("Unknown error"),
                    "Stage failed"
                );
            }
            // A sibling item-branch group can still be running when its
            // stage has already failed.
            StageStatus::Running => {
                warn!(
                    trace_id = %log.trace_id,
                    flow = %log.flow_name,
                    stage = %log.stage_name,
                    index = log.index,
                    "Stage still running"
                );
            }
        }
    }
}
