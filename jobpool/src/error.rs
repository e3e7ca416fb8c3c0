// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use thiserror::Error;

/// Errors surfaced to callers of [`crate::pool::WorkerPool`].
///
/// The pool never retries on its own. What to do with a rejected job (drop it,
/// log it, route it elsewhere) is up to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PoolError {
    /// Shutdown has begun or completed; the job was not accepted.
    #[error("worker pool closed")]
    Closed,
}

pub type PoolResult<T> = Result<T, PoolError>;
