use crate::error::{FlowError, FlowResult};
use branchflow_context::SharedContext;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Type alias for stage futures
pub type StageFuture<T> = Pin<Box<dyn Future<Output = FlowResult<T>> + Send>>;
pub type StageFn<T> =
    Arc<dyn Fn(T, SharedContext) -> StageFuture<T> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Custom,
    Map,
    Branch,
    ItemBranch,
}

impl StageKind {
    pub fn label(self) -> &'static str {
        match self {
            StageKind::Custom => "stage",
            StageKind::Map => "map",
            StageKind::Branch => "branch",
            StageKind::ItemBranch => "item_branch",
        }
    }
}

/// One asynchronous step of a flow.
///
/// A stage may be invoked any number of times, including concurrently by
/// overlapping executions of the same flow. Anything it captures must be
/// immutable or safe for shared reentrant use; per-execution state belongs in
/// the [`SharedContext`].
pub struct Stage<T> {
    name: Arc<str>,
    kind: StageKind,
    func: StageFn<T>,
}

impl<T> Clone for Stage<T> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            kind: self.kind,
            func: Arc::clone(&self.func),
        }
    }
}

impl<T> fmt::Debug for Stage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

impl<T: Send + 'static> Stage<T> {
    /// Wrap an async function of the current value.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        Self::from_fn(
            StageKind::Custom,
            Arc::new(move |value, _ctx| {
                let fut = f(value);
                Box::pin(async move { fut.await.map_err(FlowError::new) })
            }),
        )
    }

    /// Wrap an async function that also receives the execution's context.
    pub fn with_context<F, Fut>(f: F) -> Self
    where
        F: Fn(T, SharedContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        Self::from_fn(
            StageKind::Custom,
            Arc::new(move |value, ctx| {
                let fut = f(value, ctx);
                Box::pin(async move { fut.await.map_err(FlowError::new) })
            }),
        )
    }

    pub(crate) fn from_fn(kind: StageKind, func: StageFn<T>) -> Self {
        Self {
            name: Arc::from(kind.label()),
            kind,
            func,
        }
    }
}

impl<T> Stage<T> {
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Arc::from(name.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> StageKind {
        self.kind
    }

    pub fn invoke(&self, value: T, context: SharedContext) -> StageFuture<T> {
        (self.func)(value, context)
    }
}

/// Anything that can run a whole stage sequence against a value.
///
/// Branch and item-branch selectors hand back a [`FlowHandle`]; grouping in
/// item-branch stages is keyed by [`FlowRunner::name`].
pub trait FlowRunner<T>: Send + Sync {
    fn name(&self) -> &str;

    fn run(&self, value: T, context: SharedContext) -> StageFuture<T>;
}

pub type FlowHandle<T> = Arc<dyn FlowRunner<T>>;
