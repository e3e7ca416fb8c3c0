// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, Once, PoisonError};
use std::thread::{self, JoinHandle, ThreadId};

use async_channel::{SendError, Sender};
use log::{debug, error, warn};

use crate::config::{PoolConfig, SubmitPolicy};
use crate::error::{PoolError, PoolResult};
use crate::pool::job::{ClosureJob, Job};
use crate::pool::stats::{PoolCounters, PoolStats};
use crate::pool::worker::spawn_worker;

/// Lifecycle of a [`WorkerPool`]. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum PoolState {
    /// Accepting jobs.
    Running = 0,
    /// Shutdown started: no new jobs, queued and running jobs still finish.
    Closing = 1,
    /// Every worker has exited. Terminal.
    Closed = 2,
}

impl PoolState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => PoolState::Running,
            1 => PoolState::Closing,
            _ => PoolState::Closed,
        }
    }
}

/// Fixed number of worker threads fed by a bounded FIFO queue.
///
/// The queue has as many slots as there are workers. Once it is full,
/// `submit` blocks the caller until a worker takes the next job.
///
/// All methods take `&self`; wrap the pool in an [`Arc`] to submit from
/// several threads. Dropping the pool runs [`WorkerPool::stop_and_wait`].
pub struct WorkerPool {
    capacity: usize,
    policy: SubmitPolicy,
    tx: Sender<Box<dyn Job>>,
    state: AtomicU8,
    shutdown: Once,
    handles: Mutex<Vec<JoinHandle<()>>>,
    worker_threads: Vec<ThreadId>,
    counters: Arc<PoolCounters>,
}

impl WorkerPool {
    /// Starts `capacity` workers (at least one) using the default submission
    /// policy, [`SubmitPolicy::RejectAfterClose`].
    pub fn new(capacity: usize) -> Self {
        Self::with_config(PoolConfig::with_capacity(capacity))
    }

    /// Starts a pool from an explicit configuration.
    ///
    /// # Panics
    ///
    /// Panics if the operating system refuses to spawn a worker thread.
    pub fn with_config(config: PoolConfig) -> Self {
        let capacity = config.effective_capacity();
        let (tx, rx) = async_channel::bounded::<Box<dyn Job>>(capacity);
        let counters = Arc::new(PoolCounters::default());

        let handles: Vec<JoinHandle<()>> = (0..capacity)
            .map(|worker_id| {
                spawn_worker(worker_id, &config.thread_name, rx.clone(), counters.clone())
                    .expect("failed to spawn worker thread")
            })
            .collect();
        let worker_threads = handles.iter().map(|h| h.thread().id()).collect();

        debug!(
            "Started worker pool with {capacity} workers ({:?})",
            config.policy
        );

        Self {
            capacity,
            policy: config.policy,
            tx,
            state: AtomicU8::new(PoolState::Running as u8),
            shutdown: Once::new(),
            handles: Mutex::new(handles),
            worker_threads,
            counters,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> SubmitPolicy {
        self.policy
    }

    pub fn state(&self) -> PoolState {
        PoolState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Worker threads that have been started and not yet exited.
    pub fn active_workers(&self) -> usize {
        self.counters.active_workers.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot()
    }

    /// Submits a closure. See [`WorkerPool::submit_job`].
    pub fn submit<F>(&self, f: F) -> PoolResult<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit_job(Box::new(ClosureJob::new("closure", f)))
    }

    /// Enqueues `job`, blocking while the queue is full.
    ///
    /// An empty job is accepted as a no-op and never takes a queue slot.
    ///
    /// # Errors
    ///
    /// With [`SubmitPolicy::RejectAfterClose`], returns [`PoolError::Closed`] once
    /// shutdown has begun, including for callers that were blocked on a full
    /// queue when it began.
    ///
    /// # Panics
    ///
    /// With [`SubmitPolicy::BlockAlways`], submitting to a pool whose queue is
    /// already closed is a contract violation and panics.
    pub fn submit_job(&self, job: Box<dyn Job>) -> PoolResult<()> {
        if job.is_empty() {
            return Ok(());
        }
        self.admit(job.desc())?;
        let sent = self.tx.send_blocking(job);
        self.settle(sent)
    }

    /// Async flavour of [`WorkerPool::submit_job`] with the same contract.
    /// The returned future stays pending while the queue is full.
    pub async fn submit_async(&self, job: Box<dyn Job>) -> PoolResult<()> {
        if job.is_empty() {
            return Ok(());
        }
        self.admit(job.desc())?;
        let sent = self.tx.send(job).await;
        self.settle(sent)
    }

    /// Stops accepting jobs, lets queued and running jobs finish, then joins
    /// every worker.
    ///
    /// Safe to call any number of times from any number of threads. Only the
    /// first call performs the shutdown; concurrent callers block until it is
    /// complete and later callers return immediately.
    ///
    /// Called from inside one of this pool's own jobs, it closes the queue but
    /// does not wait, since the calling worker cannot join itself.
    pub fn stop_and_wait(&self) {
        if self.is_worker_thread() {
            warn!("stop_and_wait called from a worker of the same pool; closing without waiting");
            self.begin_close();
            return;
        }

        self.shutdown.call_once(|| {
            self.begin_close();

            let handles = std::mem::take(
                &mut *self
                    .handles
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner),
            );
            debug!("Waiting for {} workers to drain the queue", handles.len());
            for handle in handles {
                let name = handle.thread().name().unwrap_or("unnamed").to_owned();
                if handle.join().is_err() {
                    error!("Worker thread {name} terminated abnormally");
                }
            }

            self.state.store(PoolState::Closed as u8, Ordering::SeqCst);
            debug!("Worker pool closed");
        });
    }

    fn begin_close(&self) {
        if self
            .state
            .compare_exchange(
                PoolState::Running as u8,
                PoolState::Closing as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
        {
            debug!("Refusing new jobs");
        }
        // closing twice is a no-op; queued jobs stay receivable
        self.tx.close();
    }

    fn is_worker_thread(&self) -> bool {
        let current = thread::current().id();
        self.worker_threads.contains(&current)
    }

    fn admit(&self, desc: &str) -> PoolResult<()> {
        match self.policy {
            SubmitPolicy::RejectAfterClose if self.state() != PoolState::Running => {
                Err(self.reject(desc))
            }
            _ => Ok(()),
        }
    }

    fn settle(&self, sent: Result<(), SendError<Box<dyn Job>>>) -> PoolResult<()> {
        match sent {
            Ok(()) => {
                self.counters.submitted.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            Err(SendError(job)) => match self.policy {
                SubmitPolicy::RejectAfterClose => Err(self.reject(job.desc())),
                SubmitPolicy::BlockAlways => panic!(
                    "job '{}' submitted to a closed worker pool; block-always callers must not submit concurrently with shutdown",
                    job.desc()
                ),
            },
        }
    }

    fn reject(&self, desc: &str) -> PoolError {
        self.counters.rejected.fetch_add(1, Ordering::SeqCst);
        warn!("Rejected job '{desc}': worker pool closed");
        PoolError::Closed
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("capacity", &self.capacity)
            .field("policy", &self.policy)
            .field("state", &self.state())
            .field("stats", &self.stats())
            .finish()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.stop_and_wait();
    }
}
