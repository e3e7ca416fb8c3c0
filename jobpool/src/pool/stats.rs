// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

/// Counters shared between the pool handle and its workers.
#[derive(Debug, Default)]
pub(crate) struct PoolCounters {
    pub active_workers: AtomicUsize,
    pub submitted: AtomicU64,
    pub rejected: AtomicU64,
    pub completed: AtomicU64,
    pub panicked: AtomicU64,
}

impl PoolCounters {
    pub fn snapshot(&self) -> PoolStats {
        PoolStats {
            active_workers: self.active_workers.load(Ordering::SeqCst),
            submitted: self.submitted.load(Ordering::SeqCst),
            rejected: self.rejected.load(Ordering::SeqCst),
            completed: self.completed.load(Ordering::SeqCst),
            panicked: self.panicked.load(Ordering::SeqCst),
        }
    }
}

/// Point-in-time view of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PoolStats {
    /// Worker threads started and not yet exited.
    pub active_workers: usize,
    /// Jobs accepted by `submit` (empty jobs excluded).
    pub submitted: u64,
    /// Submissions refused with `PoolError::Closed`.
    pub rejected: u64,
    /// Jobs that returned normally.
    pub completed: u64,
    /// Jobs that panicked. The worker survived and kept serving the queue.
    pub panicked: u64,
}

impl PoolStats {
    /// Jobs that ran, whether they returned or panicked.
    pub fn executed(&self) -> u64 {
        self.completed + self.panicked
    }

    /// Accepted jobs that have not finished yet.
    pub fn outstanding(&self) -> u64 {
        self.submitted.saturating_sub(self.executed())
    }
}
