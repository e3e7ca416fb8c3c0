// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use jobpool::{ClosureJob, PoolError, PoolState, WorkerPool};
use jobpool_tests::gate::{Gate, State};
use jobpool_tests::scenarios::{PROMPTLY, STILL_BLOCKED};

fn init_log() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_every_accepted_job_runs_under_racing_shutdown() {
    init_log();
    for capacity in [1, 2, 8] {
        let pool = Arc::new(WorkerPool::new(capacity));
        let executed = Arc::new(AtomicU64::new(0));

        let producers: Vec<_> = (0..6)
            .map(|_| {
                let pool = pool.clone();
                let executed = executed.clone();
                thread::spawn(move || {
                    let mut accepted = 0u64;
                    loop {
                        let e = executed.clone();
                        match pool.submit(move || {
                            e.fetch_add(1, Ordering::SeqCst);
                        }) {
                            Ok(()) => accepted += 1,
                            Err(PoolError::Closed) => return accepted,
                        }
                    }
                })
            })
            .collect();

        thread::sleep(Duration::from_millis(10));
        pool.stop_and_wait();

        let accepted: u64 = producers.into_iter().map(|p| p.join().unwrap()).sum();
        assert_eq!(executed.load(Ordering::SeqCst), accepted);
        assert_eq!(pool.active_workers(), 0);
    }
}

#[test]
fn test_gated_jobs_hold_every_stop_caller() {
    init_log();
    let pool = Arc::new(WorkerPool::new(3));
    let gates: Vec<Gate> = (0..3).map(|_| Gate::new()).collect();
    for (i, gate) in gates.iter().enumerate() {
        pool.submit_job(Box::new(gate.job(format!("gated-{i}")))).unwrap();
    }
    for gate in &gates {
        assert!(gate.wait_for(State::Started, PROMPTLY));
    }

    let (done_tx, done_rx) = mpsc::channel();
    let stoppers: Vec<_> = (0..2)
        .map(|_| {
            let pool = pool.clone();
            let done_tx = done_tx.clone();
            thread::spawn(move || {
                pool.stop_and_wait();
                done_tx.send(()).unwrap();
            })
        })
        .collect();

    // releasing all but one gate is not enough
    for gate in &gates[..2] {
        gate.release();
        assert!(gate.wait_for(State::Finished, PROMPTLY));
    }
    assert!(done_rx.recv_timeout(STILL_BLOCKED).is_err());
    assert_eq!(pool.state(), PoolState::Closing);

    gates[2].release();
    for stopper in stoppers {
        stopper.join().unwrap();
    }
    assert_eq!(done_rx.try_iter().count(), 2);
    assert_eq!(pool.state(), PoolState::Closed);
}

#[test]
fn test_released_gate_runs_straight_through() {
    init_log();
    let pool = WorkerPool::new(1);
    let gate = Gate::new();
    gate.release();
    pool.submit_job(Box::new(gate.job("pre-released"))).unwrap();
    pool.stop_and_wait();
    assert_eq!(gate.state(), State::Finished);
}

#[test]
fn test_no_workers_survive_many_pools() {
    init_log();
    for capacity in 0..6 {
        let pool = WorkerPool::new(capacity);
        assert_eq!(pool.active_workers(), capacity.max(1));
        for i in 0..capacity * 3 {
            pool.submit_job(Box::new(ClosureJob::new(format!("noop-{i}"), || {})))
                .unwrap();
        }
        pool.stop_and_wait();
        assert_eq!(pool.active_workers(), 0);
    }
}
