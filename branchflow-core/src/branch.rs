use crate::error::FlowError;
use crate::stage::{FlowHandle, Stage, StageKind};
use std::future::Future;
use std::sync::Arc;

/// Build a stage that hands the whole value to the flow picked by `selector`.
///
/// A failure inside the selected flow propagates unchanged, so its partial
/// value is the last one that flow produced. There is no cycle detection: a
/// selector that keeps choosing its own flow recurses until it stops.
pub(crate) fn branch_stage<T, F, Fut>(selector: F) -> Stage<T>
where
    T: Send + 'static,
    F: Fn(&T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<FlowHandle<T>>> + Send + 'static,
{
    Stage::from_fn(
        StageKind::Branch,
        Arc::new(move |value: T, ctx| {
            let selection = selector(&value);
            Box::pin(async move {
                let target = selection.await.map_err(FlowError::new)?;
                tracing::debug!(target = %target.name(), "branch selected");
                target.run(value, ctx).await
            })
        }),
    )
}
