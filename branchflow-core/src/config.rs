use anyhow::{bail, Context, Result};
use branchflow_runtime::ParallelConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Per-flow execution settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Upper bound on concurrent item transforms, selector calls and group
    /// runs inside map and item-branch stages. `None` is unbounded.
    pub max_concurrency: Option<usize>,
    /// Record a [`StageLog`](branchflow_context::StageLog) per executed stage.
    pub record_stage_logs: bool,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            max_concurrency: None,
            record_stage_logs: true,
        }
    }
}

impl FlowConfig {
    pub fn with_max_concurrency(concurrency: usize) -> Self {
        Self {
            max_concurrency: Some(concurrency),
            ..Default::default()
        }
    }

    pub fn max_concurrency(mut self, concurrency: usize) -> Self {
        self.max_concurrency = Some(concurrency);
        self
    }

    pub fn without_stage_logs(mut self) -> Self {
        self.record_stage_logs = false;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_concurrency == Some(0) {
            bail!("max_concurrency must be at least 1");
        }
        Ok(())
    }

    /// 从 YAML 字符串加载配置
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)
            .with_context(|| "Failed to parse YAML flow config")?;
        config.validate()?;
        Ok(config)
    }

    /// 从 JSON 字符串加载配置
    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)
            .with_context(|| "Failed to parse JSON flow config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).with_context(|| {
            format!("Failed to read YAML file: {:?}", path.as_ref())
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).with_context(|| {
            format!("Failed to read JSON file: {:?}", path.as_ref())
        })?;
        Self::from_json_str(&content)
    }

    pub(crate) fn parallel(&self) -> ParallelConfig {
        ParallelConfig {
            max_concurrency: self.max_concurrency,
        }
    }
}
