// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use async_channel::Receiver;
use log::{debug, error, trace};

use crate::pool::job::Job;
use crate::pool::stats::PoolCounters;

/// Marks a worker as active for as long as its thread runs.
///
/// The count goes up before the thread is spawned and down when the loop
/// exits, so `active_workers` never under-reports a worker that is about to
/// pick up work.
struct ActiveWorker {
    counters: Arc<PoolCounters>,
}

impl ActiveWorker {
    fn enter(counters: Arc<PoolCounters>) -> Self {
        counters.active_workers.fetch_add(1, Ordering::SeqCst);
        Self { counters }
    }
}

impl Drop for ActiveWorker {
    fn drop(&mut self) {
        self.counters.active_workers.fetch_sub(1, Ordering::SeqCst);
    }
}

pub(crate) fn spawn_worker(
    worker_id: usize,
    thread_name: &str,
    rx: Receiver<Box<dyn Job>>,
    counters: Arc<PoolCounters>,
) -> io::Result<JoinHandle<()>> {
    let active = ActiveWorker::enter(counters.clone());
    thread::Builder::new()
        .name(format!("{thread_name}-{worker_id}"))
        .spawn(move || {
            let _active = active;
            worker_loop(worker_id, rx, &counters);
        })
}

/// Pulls jobs until the queue is closed and empty.
///
/// A panicking job is caught, logged and counted. The worker keeps serving the
/// queue, so the pool never loses capacity to a misbehaving job.
fn worker_loop(worker_id: usize, rx: Receiver<Box<dyn Job>>, counters: &PoolCounters) {
    debug!("Worker {worker_id} started");

    while let Ok(job) = rx.recv_blocking() {
        if job.is_empty() {
            trace!("Worker {worker_id} skipped empty job: {}", job.desc());
            continue;
        }

        let desc = job.desc().to_owned();
        trace!("Worker {worker_id} executing job: {desc}");
        match panic::catch_unwind(AssertUnwindSafe(move || job.run())) {
            Ok(()) => {
                counters.completed.fetch_add(1, Ordering::SeqCst);
            }
            Err(payload) => {
                counters.panicked.fetch_add(1, Ordering::SeqCst);
                error!(
                    "Worker {worker_id}: job '{desc}' panicked: {}",
                    panic_message(payload.as_ref())
                );
            }
        }
    }

    debug!("Worker {worker_id} stopped, queue closed and drained");
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "non-string panic payload"
    }
}
