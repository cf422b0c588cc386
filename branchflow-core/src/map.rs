use crate::error::FlowError;
use crate::sequence::Sequence;
use crate::stage::{Stage, StageKind};
use branchflow_runtime::{ParallelConfig, ParallelExecutor};
use std::future::Future;
use std::sync::Arc;

/// Build a stage applying `transform` to every item concurrently.
///
/// Output order follows input order. The first failing transform fails the
/// stage without a partial sequence; the remaining transforms still run to
/// completion and are discarded.
pub(crate) fn map_stage<T, F, Fut>(transform: F, parallel: ParallelConfig) -> Stage<T>
where
    T: Sequence + Send + 'static,
    T::Item: Send + 'static,
    F: Fn(T::Item) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<T::Item>> + Send + 'static,
{
    let transform = Arc::new(transform);
    let executor = ParallelExecutor::with_config(parallel);

    Stage::from_fn(
        StageKind::Map,
        Arc::new(move |value: T, _ctx| {
            let transform = Arc::clone(&transform);
            let executor = executor.clone();
            Box::pin(async move {
                let items = value.into_items().map_err(FlowError::new)?;
                let mapped = executor
                    .map_ordered(items, |item| transform(item))
                    .await
                    .map_err(FlowError::new)?;
                Ok(T::from_items(mapped))
            })
        }),
    )
}
