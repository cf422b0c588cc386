use crate::flow::Flow;
use crate::stage::FlowHandle;
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Name-indexed set of flows, owned and passed around by the caller.
///
/// Registering under an existing name replaces the earlier flow. Entries are
/// never removed, so the registry only grows for as long as it is kept alive.
pub struct FlowRegistry<T> {
    flows: RwLock<HashMap<String, Flow<T>>>,
}

impl<T> Default for FlowRegistry<T> {
    fn default() -> Self {
        Self {
            flows: RwLock::new(HashMap::new()),
        }
    }
}

impl<T> FlowRegistry<T>
where
    T: Clone + Send + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a flow under its own name, returning the flow it replaced
    pub async fn register(&self, flow: Flow<T>) -> Option<Flow<T>> {
        let name = flow.name().to_string();
        let previous = self.flows.write().await.insert(name.clone(), flow);
        if previous.is_some() {
            tracing::debug!(flow = %name, "replaced registered flow");
        }
        previous
    }

    pub async fn get(&self, name: &str) -> Option<Flow<T>> {
        self.flows.read().await.get(name).cloned()
    }

    /// Look up a flow for use as a selector result
    pub async fn resolve(&self, name: &str) -> Result<FlowHandle<T>> {
        self.get(name)
            .await
            .map(|flow| flow.handle())
            .ok_or_else(|| anyhow!("Flow not found: {}", name))
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.flows.read().await.contains_key(name)
    }

    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> =
            self.flows.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn len(&self) -> usize {
        self.flows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.flows.read().await.is_empty()
    }
}
