// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

use jobpool::ClosureJob;

#[derive(Clone, Debug, Copy, PartialOrd, PartialEq)]
pub enum State {
    Initialized,
    Started,
    Released,
    Finished,
}

/// A job that parks on a condition variable until the test releases it.
///
/// States only move forward, so releasing a gate before its job started lets
/// the job run straight through.
#[derive(Clone, Debug)]
pub struct Gate {
    sync_state: Arc<(Mutex<State>, Condvar)>,
}

impl Gate {
    pub fn new() -> Self {
        Self {
            sync_state: Arc::new((Mutex::new(State::Initialized), Condvar::new())),
        }
    }

    fn advance(&self, new_state: State) {
        let (lock, cvar) = &*self.sync_state;
        let mut current_state = lock.lock().unwrap_or_else(PoisonError::into_inner);
        if *current_state < new_state {
            *current_state = new_state;
        }
        cvar.notify_all();
    }

    pub fn state(&self) -> State {
        let (lock, _) = &*self.sync_state;
        *lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Blocks until the gate reached at least `state`. Returns false on timeout.
    pub fn wait_for(&self, state: State, timeout: Duration) -> bool {
        let (lock, cvar) = &*self.sync_state;
        let guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = cvar
            .wait_timeout_while(guard, timeout, |current| *current < state)
            .unwrap_or_else(PoisonError::into_inner);
        *guard >= state
    }

    pub fn release(&self) {
        self.advance(State::Released);
    }

    /// The job guarded by this gate.
    pub fn job(&self, desc: impl Into<String>) -> ClosureJob {
        let gate = self.clone();
        ClosureJob::new(desc, move || {
            gate.advance(State::Started);
            let (lock, cvar) = &*gate.sync_state;
            let guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            let guard = cvar
                .wait_while(guard, |current| *current < State::Released)
                .unwrap_or_else(PoisonError::into_inner);
            drop(guard);
            gate.advance(State::Finished);
        })
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}
