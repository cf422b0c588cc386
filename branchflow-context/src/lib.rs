//! # BranchFlow Context
//!
//! Per-execution state shared by every stage of one `execute` call,
//! including the stages of branched sub-flows and item-branch groups.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct RunContext {
    pub trace_id: String,
    pub errors: Vec<String>,
    pub stage_logs: Vec<StageLog>,
    pub variables: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct StageLog {
    pub flow_name: String,
    pub stage_name: String,
    pub index: usize,
    pub start_time: Instant,
    pub end_time: Option<Instant>,
    pub status: StageStatus,
    pub error_message: Option<String>,
    pub trace_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    Running,
    Success,
    Failed,
}

/// Handle returned by [`RunContext::start_stage`], used to close the log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageLogId(usize);

impl StageLog {
    pub fn duration(&self) -> Option<Duration> {
        self.end_time
            .map(|end| end.duration_since(self.start_time))
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new_with_trace_id(Uuid::new_v4().to_string())
    }
}

impl RunContext {
    pub fn new_with_trace_id(trace_id: String) -> Self {
        Self {
            trace_id,
            errors: Vec::new(),
            stage_logs: Vec::new(),
            variables: HashMap::new(),
        }
    }

    pub fn into_shared(self) -> SharedContext {
        Arc::new(Mutex::new(self))
    }

    /// Whether no stage has failed so far in this execution.
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }

    // Overlapping runs of the same flow can share one context, so entries
    // are addressed by position rather than looked up by name.
    pub fn start_stage(
        &mut self,
        flow_name: &str,
        index: usize,
        stage_name: &str,
    ) -> StageLogId {
        self.stage_logs.push(StageLog {
            flow_name: flow_name.to_string(),
            stage_name: stage_name.to_string(),
            index,
            start_time: Instant::now(),
            end_time: None,
            status: StageStatus::Running,
            error_message: None,
            trace_id: self.trace_id.clone(),
        });

        tracing::debug!(
            trace_id = %self.trace_id,
            flow = %flow_name,
            stage = %stage_name,
            index,
            "stage starting"
        );

        StageLogId(self.stage_logs.len() - 1)
    }

    pub fn end_stage_success(&mut self, id: StageLogId) {
        if let Some(log) = self.stage_logs.get_mut(id.0) {
            let end = Instant::now();
            log.end_time = Some(end);
            log.status = StageStatus::Success;

            tracing::debug!(
                trace_id = %self.trace_id,
                flow = %log.flow_name,
                stage = %log.stage_name,
                index = log.index,
                duration_ms = ?end.duration_since(log.start_time),
                "stage success"
            );
        }
    }

    pub fn end_stage_failed(&mut self, id: StageLogId, error: &str) {
        let Some(log) = self.stage_logs.get_mut(id.0) else {
            return;
        };
        let end = Instant::now();
        log.end_time = Some(end);
        log.status = StageStatus::Failed;
        log.error_message = Some(error.to_string());

        tracing::warn!(
            trace_id = %self.trace_id,
            flow = %log.flow_name,
            stage = %log.stage_name,
            index = log.index,
            duration_ms = ?end.duration_since(log.start_time),
            error = %error,
            "stage failed"
        );

        let entry = format!(
            "[{}] {}#{} {}: {}",
            self.trace_id, log.flow_name, log.index, log.stage_name, error
        );
        self.errors.push(entry);
    }

    /// Stage logs recorded for one flow, in start order.
    pub fn logs_for<'a>(
        &'a self,
        flow_name: &'a str,
    ) -> impl Iterator<Item = &'a StageLog> + 'a {
        self.stage_logs
            .iter()
            .filter(move |log| log.flow_name == flow_name)
    }

    pub fn count_with_status(&self, status: StageStatus) -> usize {
        self.stage_logs
            .iter()
            .filter(|log| log.status == status)
            .count()
    }

    pub fn set_variable(&mut self, key: String, value: String) {
        tracing::debug!(trace_id = %self.trace_id, key = %key, value = %value, "set variable");

        self.variables.insert(key, value);
    }

    pub fn get_variable(&self, key: &str) -> Option<&String> {
        self.variables.get(key)
    }

    pub fn print_summary(&self) {
        tracing::info!(
            trace_id = %self.trace_id,
            total_stages = self.stage_logs.len(),
            success = self.count_with_status(StageStatus::Success),
            failed = self.count_with_status(StageStatus::Failed),
            running = self.count_with_status(StageStatus::Running),
            "run summary"
        );

        for error in &self.errors {
            tracing::info!(error = %error);
        }

        for (key, value) in &self.variables {
            tracing::debug!(key = %key, value = %value);
        }
    }
}

pub type SharedContext = Arc<Mutex<RunContext>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_log_lifecycle() {
        let mut ctx = RunContext::new_with_trace_id("t-1".to_string());

        let first = ctx.start_stage("main", 0, "load");
        let second = ctx.start_stage("main", 1, "check");
        ctx.end_stage_success(first);
        ctx.end_stage_failed(second, "bad input");

        assert_eq!(ctx.stage_logs.len(), 2);
        assert_eq!(ctx.stage_logs[0].status, StageStatus::Success);
        assert!(ctx.stage_logs[0].duration().is_some());
        assert_eq!(ctx.stage_logs[1].status, StageStatus::Failed);
        assert_eq!(
            ctx.stage_logs[1].error_message.as_deref(),
            Some("bad input")
        );
        assert!(!ctx.ok());
        assert_eq!(ctx.errors, vec!["[t-1] main#1 check: bad input"]);
    }

    #[test]
    fn test_same_stage_name_tracked_independently() {
        let mut ctx = RunContext::default();

        let a = ctx.start_stage("sub", 0, "map");
        let b = ctx.start_stage("sub", 0, "map");
        ctx.end_stage_success(b);

        assert_eq!(ctx.stage_logs[0].status, StageStatus::Running);
        assert_eq!(ctx.stage_logs[1].status, StageStatus::Success);

        ctx.end_stage_success(a);
        assert_eq!(ctx.count_with_status(StageStatus::Success), 2);
        assert_eq!(ctx.logs_for("sub").count(), 2);
        assert_eq!(ctx.logs_for("other").count(), 0);
    }

    #[tokio::test]
    async fn test_shared_context_variables() {
        let shared = RunContext::default().into_shared();
        shared
            .lock()
            .await
            .set_variable("mode".to_string(), "fast".to_string());

        let guard = shared.lock().await;
        assert_eq!(guard.get_variable("mode"), Some(&"fast".to_string()));
        assert!(guard.ok());
    }
}
