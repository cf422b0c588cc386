use crate::branch::branch_stage;
use crate::config::FlowConfig;
use crate::error::FlowResult;
use crate::executor::FlowExecutor;
use crate::item_branch::item_branch_stage;
use crate::map::map_stage;
use crate::sequence::Sequence;
use crate::stage::{FlowHandle, FlowRunner, Stage, StageFuture};
use branchflow_context::{RunContext, SharedContext};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// A named, ordered sequence of stages.
///
/// The stage list is shared copy-on-write: cloning a flow or starting an
/// execution is O(1), and appending to a flow whose list is shared copies it
/// first, so executions already in flight keep the list they started with.
pub struct Flow<T> {
    name: Arc<str>,
    stages: Arc<Vec<Stage<T>>>,
    config: FlowConfig,
}

impl<T> Clone for Flow<T> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            stages: Arc::clone(&self.stages),
            config: self.config.clone(),
        }
    }
}

impl<T> fmt::Debug for Flow<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flow")
            .field("name", &self.name)
            .field("stages", &self.stages)
            .field("config", &self.config)
            .finish()
    }
}

impl<T> Flow<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    pub fn stages(&self) -> &[Stage<T>] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Append an already-built stage
    pub fn push(mut self, stage: Stage<T>) -> Self {
        Arc::make_mut(&mut self.stages).push(stage);
        self
    }
}

impl<T> Flow<T>
where
    T: Clone + Send + 'static,
{
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, FlowConfig::default())
    }

    /// Map and item-branch stages pick up the concurrency limit when they
    /// are appended.
    pub fn with_config(name: impl Into<String>, config: FlowConfig) -> Self {
        Self {
            name: Arc::from(name.into()),
            stages: Arc::new(Vec::new()),
            config,
        }
    }

    /// Adds a stage transforming the current value
    pub fn add_stage<F, Fut>(self, f: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        self.push(Stage::new(f))
    }

    /// Adds a stage whose name shows up in stage logs
    pub fn add_named_stage<F, Fut>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        self.push(Stage::new(f).named(name))
    }

    /// Adds a stage that also receives the execution's shared context
    pub fn add_context_stage<F, Fut>(self, f: F) -> Self
    where
        F: Fn(T, SharedContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        self.push(Stage::with_context(f))
    }

    /// Adds a stage that runs the flow chosen by `selector` on the whole value
    pub fn add_branch<F, Fut>(self, selector: F) -> Self
    where
        F: Fn(&T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<FlowHandle<T>>> + Send + 'static,
    {
        self.push(branch_stage(selector))
    }

    /// Handle usable as a selector result
    pub fn handle(&self) -> FlowHandle<T> {
        Arc::new(self.clone())
    }

    /// Execute the flow with a fresh context
    pub async fn execute(&self, value: T) -> FlowResult<T> {
        self.execute_with_context(value, RunContext::default().into_shared())
            .await
    }

    /// Execute the flow, recording into a caller-provided context
    pub async fn execute_with_context(
        &self,
        value: T,
        context: SharedContext,
    ) -> FlowResult<T> {
        FlowExecutor::new()
            .record_stage_logs(self.config.record_stage_logs)
            .execute_stages(
                Arc::clone(&self.name),
                Arc::clone(&self.stages),
                value,
                context,
            )
            .await
    }
}

impl<T> Flow<T>
where
    T: Sequence + Clone + Send + 'static,
    T::Item: Send + 'static,
{
    /// Adds a stage applying `transform` to every item concurrently
    pub fn add_map<F, Fut>(self, transform: F) -> Self
    where
        F: Fn(T::Item) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T::Item>> + Send + 'static,
    {
        let parallel = self.config.parallel();
        self.push(map_stage(transform, parallel))
    }

    /// Adds a stage routing each item to the flow chosen by `selector`
    pub fn add_item_branch<F, Fut>(self, selector: F) -> Self
    where
        F: Fn(&T::Item) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<FlowHandle<T>>> + Send + 'static,
    {
        let parallel = self.config.parallel();
        self.push(item_branch_stage(selector, parallel))
    }
}

impl<T> FlowRunner<T> for Flow<T>
where
    T: Clone + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, value: T, context: SharedContext) -> StageFuture<T> {
        let flow = self.clone();
        Box::pin(async move { flow.execute_with_context(value, context).await })
    }
}
