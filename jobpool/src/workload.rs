// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

//! Synthetic workload driven through a [`WorkerPool`] by several producer
//! threads. Backs the `jobpool` binary and the end-to-end scenarios.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, ensure};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::PoolConfig;
use crate::pool::{ClosureJob, PoolStats, WorkerPool};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadConfig {
    pub pool: PoolConfig,
    /// Total number of jobs, split evenly across producers.
    pub jobs: usize,
    /// How long each job sleeps.
    pub job_millis: u64,
    pub producers: usize,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            pool: PoolConfig::default(),
            jobs: 100,
            job_millis: 1,
            producers: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub config: WorkloadConfig,
    pub accepted: u64,
    pub rejected: u64,
    /// Jobs whose bodies actually ran, counted by the jobs themselves.
    pub executed: usize,
    pub stats: PoolStats,
    pub elapsed_ms: u128,
}

/// Jobs assigned to `producer` when `jobs` are spread over `producers`.
fn share(jobs: usize, producers: usize, producer: usize) -> usize {
    jobs / producers + usize::from(producer < jobs % producers)
}

pub fn run_workload(config: &WorkloadConfig) -> anyhow::Result<RunReport> {
    ensure!(config.producers > 0, "at least one producer is required");

    let started = Instant::now();
    let pool = WorkerPool::with_config(config.pool.clone());
    let executed = Arc::new(AtomicUsize::new(0));
    let accepted = AtomicU64::new(0);
    let rejected = AtomicU64::new(0);
    let job_time = Duration::from_millis(config.job_millis);

    info!(
        "Running {} jobs on {} workers from {} producers",
        config.jobs,
        pool.capacity(),
        config.producers
    );

    thread::scope(|scope| {
        for producer in 0..config.producers {
            let count = share(config.jobs, config.producers, producer);
            let (pool, executed, accepted, rejected) = (&pool, &executed, &accepted, &rejected);
            scope.spawn(move || {
                for i in 0..count {
                    let executed = executed.clone();
                    let job = ClosureJob::new(format!("synthetic-{producer}-{i}"), move || {
                        if !job_time.is_zero() {
                            thread::sleep(job_time);
                        }
                        executed.fetch_add(1, Ordering::SeqCst);
                    });
                    match pool.submit_job(Box::new(job)) {
                        Ok(()) => {
                            accepted.fetch_add(1, Ordering::SeqCst);
                        }
                        Err(e) => {
                            rejected.fetch_add(1, Ordering::SeqCst);
                            warn!("Producer {producer} lost job {i}: {e}");
                        }
                    }
                }
                debug!("Producer {producer} submitted {count} jobs");
            });
        }
    });

    pool.stop_and_wait();

    let report = RunReport {
        config: config.clone(),
        accepted: accepted.load(Ordering::SeqCst),
        rejected: rejected.load(Ordering::SeqCst),
        executed: executed.load(Ordering::SeqCst),
        stats: pool.stats(),
        elapsed_ms: started.elapsed().as_millis(),
    };

    if report.executed as u64 != report.accepted {
        bail!(
            "{} jobs accepted but {} executed",
            report.accepted,
            report.executed
        );
    }
    if report.stats.active_workers != 0 {
        bail!(
            "{} workers still active after shutdown",
            report.stats.active_workers
        );
    }

    info!(
        "Finished {} jobs in {} ms",
        report.executed, report.elapsed_ms
    );
    Ok(report)
}
