//! # BranchFlow Runtime
//!
//! Concurrency primitives used by the map and item-branch stages:
//! an order-preserving concurrent map and a fail-fast fan-out/fan-in.

mod parallel;

pub use parallel::{ParallelConfig, ParallelExecutor, TaskFuture};
