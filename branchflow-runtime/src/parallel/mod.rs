use anyhow::{anyhow, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::Semaphore;


/// A unit of concurrent work whose output is collected by [`ParallelExecutor`].
pub type TaskFuture<O> = Pin<Box<dyn Future<Output = Result<O>> + Send>>;

/// Configuration for parallel execution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParallelConfig {
    /// Maximum number of tasks running at once (None for unlimited)
    pub max_concurrency: Option<usize>,
}

impl ParallelConfig {
    /// Create a config with maximum concurrency limit
    pub fn with_max_concurrency(concurrency: usize) -> Self {
        Self {
            max_concurrency: Some(concurrency),
        }
    }

    /// Set maximum concurrency
    pub fn max_concurrency(mut self, concurrency: usize) -> Self {
        self.max_concurrency = Some(concurrency);
        self
    }

    /// Remove any concurrency limit
    pub fn unbounded(mut self) -> Self {
        self.max_concurrency = None;
        self
    }
}

/// Runs independent tasks concurrently and gathers their outputs by position.
///
/// Every task is spawned onto the ambient tokio runtime. The first failure,
/// in completion order, is returned immediately. Tasks still in flight at
/// that point are detached rather than aborted: they run to completion and
/// their outputs are dropped.
#[derive(Debug, Clone, Default)]
pub struct ParallelExecutor {
    config: ParallelConfig,
}

impl ParallelExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create executor with custom configuration
    pub fn with_config(config: ParallelConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParallelConfig {
        &self.config
    }

    /// Apply `f` to every item concurrently. The output has the same length
    /// and order as `items`, whatever order the calls complete in.
    pub async fn map_ordered<I, O, F, Fut>(
        &self,
        items: Vec<I>,
        f: F,
    ) -> Result<Vec<O>>
    where
        F: Fn(I) -> Fut,
        Fut: Future<Output = Result<O>> + Send + 'static,
        O: Send + 'static,
    {
        let tasks = items
            .into_iter()
            .map(|item| Box::pin(f(item)) as TaskFuture<O>)
            .collect();

        self.run_all(tasks).await
    }

    /// Run all tasks concurrently; outputs are returned in task order.
    pub async fn run_all<O>(&self, tasks: Vec<TaskFuture<O>>) -> Result<Vec<O>>
    where
        O: Send + 'static,
    {
        let total = tasks.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        let semaphore = self
            .config
            .max_concurrency
            .map(|limit| Arc::new(Semaphore::new(limit.max(1))));

        let mut pending = FuturesUnordered::new();
        for (index, task) in tasks.into_iter().enumerate() {
            let sem = semaphore.clone();
            let handle = tokio::spawn(async move {
                let _permit = match sem {
                    Some(sem) => Some(sem.acquire_owned().await.map_err(|e| {
                        anyhow!("Failed to acquire semaphore permit: {}", e)
                    })?),
                    None => None,
                };
                task.await
            });
            pending.push(async move { (index, handle.await) });
        }

        let mut slots: Vec<Option<O>> = (0..total).map(|_| None).collect();

        while let Some((index, joined)) = pending.next().await {
            match joined {
                Ok(Ok(output)) => slots[index] = Some(output),
                Ok(Err(e)) => {
                    tracing::debug!(
                        task = index,
                        remaining = pending.len(),
                        "parallel task failed, detaching the rest"
                    );
                    return Err(e);
                }
                Err(join_error) => {
                    return Err(anyhow!("task {} panicked: {}", index, join_error));
                }
            }
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.ok_or_else(|| anyhow!("task {} produced no output", index))
            })
            .collect()
    }
}
