// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

//! Named end-to-end scenarios. Each one drives a fresh pool and records what
//! it observed in a [`ScenarioLog`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use clap::ValueEnum;
use jobpool::{ClosureJob, PoolError, WorkerPool};
use log::{debug, info};

use crate::gate::{Gate, State};
use crate::test_log::{LoggedEvent, ScenarioLog};

/// How long a blocked `stop_and_wait` must stay blocked.
pub const STILL_BLOCKED: Duration = Duration::from_millis(100);
/// Upper bound for anything that is expected to happen promptly.
pub const PROMPTLY: Duration = Duration::from_secs(2);

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
#[clap(rename_all = "kebab-case")]
pub enum Scenario {
    /// Submit counting jobs, then drain
    Drain,
    /// Shut down while the only worker is blocked in a job
    StopWhileBlocked,
    /// One job panics, the rest must still run
    PanicSurvival,
    /// Producers keep submitting while shutdown races them
    RacingShutdown,
}

struct Recorder {
    started: Instant,
    log: ScenarioLog,
}

impl Recorder {
    fn new(scenario: Scenario, capacity: usize) -> Self {
        let name = scenario
            .to_possible_value()
            .map(|v| v.get_name().to_string())
            .unwrap_or_default();
        Self {
            started: Instant::now(),
            log: ScenarioLog {
                scenario: name,
                capacity,
                ..ScenarioLog::default()
            },
        }
    }

    fn event(&mut self, event: &str) {
        debug!("{event}");
        self.log.events.push(LoggedEvent {
            at_ms: self.started.elapsed().as_millis(),
            event: event.to_string(),
        });
    }

    fn finish(mut self, pool: &WorkerPool, executed: &AtomicU64) -> ScenarioLog {
        self.log.stats = pool.stats();
        self.log.accepted = self.log.stats.submitted;
        self.log.rejected = self.log.stats.rejected;
        self.log.executed = executed.load(Ordering::SeqCst);
        self.log
    }
}

fn counting_job(desc: String, executed: &Arc<AtomicU64>) -> Box<ClosureJob> {
    let executed = executed.clone();
    Box::new(ClosureJob::new(desc, move || {
        executed.fetch_add(1, Ordering::SeqCst);
    }))
}

pub fn run_scenario(scenario: Scenario, capacity: usize, jobs: usize) -> anyhow::Result<ScenarioLog> {
    info!("Running scenario {scenario:?} with capacity {capacity} and {jobs} jobs");
    match scenario {
        Scenario::Drain => drain(capacity, jobs),
        Scenario::StopWhileBlocked => stop_while_blocked(),
        Scenario::PanicSurvival => panic_survival(capacity, jobs),
        Scenario::RacingShutdown => racing_shutdown(capacity),
    }
}

fn drain(capacity: usize, jobs: usize) -> anyhow::Result<ScenarioLog> {
    let mut rec = Recorder::new(Scenario::Drain, capacity);
    let pool = WorkerPool::new(capacity);
    let executed = Arc::new(AtomicU64::new(0));

    for i in 0..jobs {
        pool.submit_job(counting_job(format!("count-{i}"), &executed))?;
    }
    rec.event("submitted");
    pool.stop_and_wait();
    rec.event("stopped");

    Ok(rec.finish(&pool, &executed))
}

fn stop_while_blocked() -> anyhow::Result<ScenarioLog> {
    let mut rec = Recorder::new(Scenario::StopWhileBlocked, 1);
    let pool = Arc::new(WorkerPool::new(1));
    let executed = Arc::new(AtomicU64::new(0));
    let gate = Gate::new();

    pool.submit_job(Box::new(gate.job("blocked")))?;
    if !gate.wait_for(State::Started, PROMPTLY) {
        bail!("worker did not start the gated job");
    }
    rec.event("job-started");

    let (done_tx, done_rx) = mpsc::channel();
    let stopper = {
        let pool = pool.clone();
        thread::spawn(move || {
            pool.stop_and_wait();
            let _ = done_tx.send(());
        })
    };

    match done_rx.recv_timeout(STILL_BLOCKED) {
        Ok(()) => rec.event("stop-returned-early"),
        Err(_) => rec.event("stop-still-waiting"),
    }

    gate.release();
    rec.event("released");

    done_rx
        .recv_timeout(PROMPTLY)
        .context("stop_and_wait did not return after the job was released")?;
    rec.event("stop-returned");
    stopper
        .join()
        .map_err(|_| anyhow::anyhow!("stopper thread panicked"))?;
    if gate.state() == State::Finished {
        executed.fetch_add(1, Ordering::SeqCst);
    }

    match pool.submit(|| {}) {
        Err(PoolError::Closed) => rec.event("late-submit-rejected"),
        Ok(()) => rec.event("late-submit-accepted"),
    }

    Ok(rec.finish(&pool, &executed))
}

fn panic_survival(capacity: usize, jobs: usize) -> anyhow::Result<ScenarioLog> {
    let mut rec = Recorder::new(Scenario::PanicSurvival, capacity);
    let pool = WorkerPool::new(capacity);
    let executed = Arc::new(AtomicU64::new(0));

    pool.submit_job(Box::new(ClosureJob::new("explodes", || {
        panic!("scenario panic");
    })))?;
    for i in 0..jobs {
        pool.submit_job(counting_job(format!("count-{i}"), &executed))?;
    }
    rec.event("submitted");
    pool.stop_and_wait();
    rec.event("stopped");

    Ok(rec.finish(&pool, &executed))
}

fn racing_shutdown(capacity: usize) -> anyhow::Result<ScenarioLog> {
    let mut rec = Recorder::new(Scenario::RacingShutdown, capacity);
    let pool = Arc::new(WorkerPool::new(capacity));
    let executed = Arc::new(AtomicU64::new(0));

    let producers: Vec<_> = (0..4)
        .map(|producer| {
            let pool = pool.clone();
            let executed = executed.clone();
            thread::spawn(move || {
                let mut i = 0u64;
                // submit until the pool refuses
                while pool
                    .submit_job(counting_job(format!("race-{producer}-{i}"), &executed))
                    .is_ok()
                {
                    i += 1;
                }
                i
            })
        })
        .collect();

    thread::sleep(Duration::from_millis(20));
    rec.event("stop-requested");
    pool.stop_and_wait();
    rec.event("stopped");

    let mut accepted_by_producers = 0;
    for producer in producers {
        accepted_by_producers += producer
            .join()
            .map_err(|_| anyhow::anyhow!("producer thread panicked"))?;
    }

    let log = rec.finish(&pool, &executed);
    if log.accepted != accepted_by_producers {
        bail!(
            "pool counted {} accepted jobs, producers counted {}",
            log.accepted,
            accepted_by_producers
        );
    }
    Ok(log)
}
