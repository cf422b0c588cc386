//! # BranchFlow - Async Pipeline Flows with Branching
//!
//! A flow is a named sequence of asynchronous stages applied to a value.
//! Besides plain stages, a flow can branch the whole value into another
//! flow, map every item of a sequence concurrently, or route each item to
//! its own flow and merge the groups back together.
//!
//! ## Quick Start
//!
//! ```rust
//! use branchflow::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let short = Flow::<Vec<String>>::new("short").add_map(|word: String| async move {
//!         anyhow::Ok(format!("{word}:short"))
//!     });
//!     let long = Flow::<Vec<String>>::new("long").add_map(|word: String| async move {
//!         anyhow::Ok(format!("{word}:long"))
//!     });
//!     let (short, long) = (short.handle(), long.handle());
//!
//!     let flow = Flow::<Vec<String>>::new("words").add_item_branch(move |word: &String| {
//!         let target = if word.len() > 6 { long.clone() } else { short.clone() };
//!         async move { anyhow::Ok(target) }
//!     });
//!
//!     let words = vec!["pippo".to_string(), "paperino".to_string()];
//!     let tagged = flow.execute(words).await?;
//!     assert_eq!(tagged, vec!["pippo:short", "paperino:long"]);
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

pub use branchflow_context as context;
pub use branchflow_core::*;
pub use branchflow_runtime as runtime;

pub mod logger;

/// Prelude module for easy imports
pub mod prelude {
    pub use branchflow_core::prelude::*;
    pub use branchflow_runtime::{ParallelConfig, ParallelExecutor};
}
