use crate::error::FlowResult;
use crate::stage::Stage;
use branchflow_context::SharedContext;
use std::sync::Arc;

/// Executes flow stages
#[derive(Debug, Clone, Copy)]
pub struct FlowExecutor {
    record_stage_logs: bool,
}

impl FlowExecutor {
    pub fn new() -> Self {
        Self {
            record_stage_logs: true,
        }
    }

    pub fn record_stage_logs(mut self, enabled: bool) -> Self {
        self.record_stage_logs = enabled;
        self
    }

    /// Run `stages` strictly in order, each receiving the previous output.
    ///
    /// The first failure stops the sequence; the error carries the input of
    /// the failed stage unless the stage already supplied a partial value.
    pub async fn execute_stages<T>(
        &self,
        flow_name: Arc<str>,
        stages: Arc<Vec<Stage<T>>>,
        value: T,
        context: SharedContext,
    ) -> FlowResult<T>
    where
        T: Clone + Send + 'static,
    {
        let trace_id = context.lock().await.trace_id.clone();
        tracing::debug!(
            trace_id = %trace_id,
            flow = %flow_name,
            stages = stages.len(),
            "flow starting"
        );

        let mut current = value;
        for (index, stage) in stages.iter().enumerate() {
            let log_id = if self.record_stage_logs {
                Some(context.lock().await.start_stage(
                    &flow_name,
                    index,
                    stage.name(),
                ))
            } else {
                None
            };

            let input = current.clone();
            match stage.invoke(current, context.clone()).await {
                Ok(output) => {
                    if let Some(id) = log_id {
                        context.lock().await.end_stage_success(id);
                    }
                    current = output;
                }
                Err(err) => {
                    if let Some(id) = log_id {
                        context
                            .lock()
                            .await
                            .end_stage_failed(id, &err.to_string());
                    }
                    tracing::info!(
                        trace_id = %trace_id,
                        flow = %flow_name,
                        stage = %stage.name(),
                        index,
                        error = %err,
                        "flow aborted"
                    );
                    return Err(err.or_partial(input));
                }
            }
        }

        tracing::debug!(trace_id = %trace_id, flow = %flow_name, "flow finished");
        Ok(current)
    }
}

impl Default for FlowExecutor {
    fn default() -> Self {
        Self::new()
    }
}
