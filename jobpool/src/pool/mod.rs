// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>
//! # Design: Bounded Worker Pool (std threads)
//!
//! ## Overview
//! A fixed set of worker threads pulling jobs from one bounded queue.
//!
//! - The queue holds at most `capacity` jobs; a full queue blocks submitters (backpressure).
//! - Workers are started up front and idle on the queue until work arrives.
//! - Shutdown closes the queue for insertion. Queued jobs are still delivered.
//! - Each worker exits once the queue is closed *and* drained, then gets joined.
//! - The close sequence runs exactly once, no matter how many callers race on it.
//!
//! ## Lifecycle
//!
//! ```text
//! Running --(first stop_and_wait)--> Closing --(all workers joined)--> Closed
//! ```
//!
//! ## Data flow
//!
//! ```text
//!         +-------------+  +-------------+  +-------------+
//!         | producer A  |  | producer B  |  | producer C  |
//!         +------+------+  +------+------+  +------+------+
//!                |                |                |
//!                v                v                v
//!         +------+----------------+----------------+------+
//!         |     bounded MPMC queue (capacity slots)       |
//!         +------+----------------+----------------+------+
//!                |                |                |
//!         +------v----+    +------v----+    +------v----+
//!         | worker 0  |    | worker 1  |    | worker N  |
//!         | loop()    |    | loop()    |    | loop()    |
//!         +-----------+    +-----------+    +-----------+
//! ```

pub mod job;
pub mod stats;
pub mod worker;
pub mod worker_pool;

pub use job::{ClosureJob, Job};
pub use stats::PoolStats;
pub use worker_pool::{PoolState, WorkerPool};
