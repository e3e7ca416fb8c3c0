// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

//! jobpool: a bounded worker pool.
//!
//! A fixed number of threads run submitted jobs from a bounded queue. Producers
//! are throttled when the queue is full, and [`WorkerPool::stop_and_wait`]
//! drains every accepted job before it returns.

pub mod config;
pub mod error;
pub mod partition;
pub mod pool;
pub mod workload;

pub use config::{PoolConfig, SubmitPolicy};
pub use error::{PoolError, PoolResult};
pub use partition::{Partition, PartitionPool};
pub use pool::{ClosureJob, Job, PoolState, PoolStats, WorkerPool};
