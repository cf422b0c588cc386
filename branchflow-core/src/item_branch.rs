use crate::error::FlowError;
use crate::sequence::Sequence;
use crate::stage::{FlowHandle, Stage, StageKind};
use branchflow_runtime::{ParallelConfig, ParallelExecutor, TaskFuture};
use indexmap::map::Entry;
use indexmap::IndexMap;
use std::future::Future;
use std::sync::Arc;

/// Items routed to one flow, in the order they appeared in the input.
pub(crate) struct Group<T: Sequence> {
    pub(crate) target: FlowHandle<T>,
    pub(crate) items: Vec<T::Item>,
}

/// Group items by the name of their selected flow.
///
/// Groups are ordered by the first appearance of each name. When distinct
/// flows share a name, the one selected for the latest item wins.
pub(crate) fn partition<T: Sequence>(
    items: Vec<T::Item>,
    targets: Vec<FlowHandle<T>>,
) -> IndexMap<String, Group<T>> {
    let mut groups: IndexMap<String, Group<T>> = IndexMap::new();

    for (item, target) in items.into_iter().zip(targets) {
        match groups.entry(target.name().to_string()) {
            Entry::Occupied(mut entry) => {
                let group = entry.get_mut();
                group.target = target;
                group.items.push(item);
            }
            Entry::Vacant(entry) => {
                entry.insert(Group {
                    target,
                    items: vec![item],
                });
            }
        }
    }

    groups
}

/// Build a stage routing each item to the flow chosen by `selector`.
///
/// Each group runs its flow once over its own sub-sequence, concurrently with
/// the other groups. Outputs are concatenated group by group, so items of
/// interleaved groups come back as contiguous blocks. A failing group fails
/// the stage without a partial sequence; sibling groups are not cancelled.
pub(crate) fn item_branch_stage<T, F, Fut>(
    selector: F,
    parallel: ParallelConfig,
) -> Stage<T>
where
    T: Sequence + Send + 'static,
    T::Item: Send + 'static,
    F: Fn(&T::Item) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<FlowHandle<T>>> + Send + 'static,
{
    let selector = Arc::new(selector);
    let executor = ParallelExecutor::with_config(parallel);

    Stage::from_fn(
        StageKind::ItemBranch,
        Arc::new(move |value: T, ctx| {
            let selector = Arc::clone(&selector);
            let executor = executor.clone();
            Box::pin(async move {
                let items = value.into_items().map_err(FlowError::new)?;

                let selections: Vec<TaskFuture<FlowHandle<T>>> = items
                    .iter()
                    .map(|item| Box::pin(selector(item)) as TaskFuture<FlowHandle<T>>)
                    .collect();
                let targets = executor
                    .run_all(selections)
                    .await
                    .map_err(FlowError::new)?;

                let groups = partition::<T>(items, targets);
                tracing::debug!(groups = groups.len(), "item branch partitioned");

                let runs: Vec<TaskFuture<Vec<T::Item>>> = groups
                    .into_values()
                    .map(|group| {
                        let ctx = ctx.clone();
                        Box::pin(async move {
                            let output = group
                                .target
                                .run(T::from_items(group.items), ctx)
                                .await
                                .map_err(FlowError::into_error)?;
                            output.into_items()
                        }) as TaskFuture<Vec<T::Item>>
                    })
                    .collect();

                let outputs = executor.run_all(runs).await.map_err(FlowError::new)?;
                Ok(T::from_items(outputs.into_iter().flatten().collect()))
            })
        }),
    )
}
