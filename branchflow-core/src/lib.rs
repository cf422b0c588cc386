//! # BranchFlow Core
//!
//! Flows of asynchronous stages with whole-value branching and per-item
//! branching, plus the sequential executor that drives them.

#![cfg_attr(docsrs, feature(doc_cfg))]

mod branch;
mod config;
mod error;
mod executor;
mod flow;
mod item_branch;
mod map;
mod registry;
mod sequence;
mod stage;


pub use config::FlowConfig;
pub use error::{FlowError, FlowResult};
pub use executor::FlowExecutor;
pub use flow::Flow;
pub use registry::FlowRegistry;
pub use sequence::Sequence;
pub use stage::{FlowHandle, FlowRunner, Stage, StageFn, StageFuture, StageKind};

/// Prelude module for core functionality
pub mod prelude {
    pub use crate::{
        Flow, FlowConfig, FlowError, FlowHandle, FlowRegistry, FlowResult,
        FlowRunner, Sequence, Stage, StageKind,
    };
    pub use branchflow_context::{RunContext, SharedContext, StageStatus};
}
