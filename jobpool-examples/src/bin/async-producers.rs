// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

// Several async producers share one pool. They run on a single-threaded local
// executor; a producer that hits a full queue yields instead of blocking the
// executor thread.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::executor::LocalPool;
use futures::task::LocalSpawnExt;
use jobpool::{ClosureJob, WorkerPool};
use log::{info, warn};

const PRODUCERS: usize = 4;
const JOBS_PER_PRODUCER: usize = 25;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let pool = Arc::new(WorkerPool::new(3));
    let done = Arc::new(AtomicUsize::new(0));

    let mut executor = LocalPool::new();
    let spawner = executor.spawner();

    for producer in 0..PRODUCERS {
        let pool = pool.clone();
        let done = done.clone();
        spawner.spawn_local(async move {
            for i in 0..JOBS_PER_PRODUCER {
                let done = done.clone();
                let job = ClosureJob::new(format!("producer-{producer}-{i}"), move || {
                    std::thread::sleep(Duration::from_millis(2));
                    done.fetch_add(1, Ordering::SeqCst);
                });
                if let Err(e) = pool.submit_async(Box::new(job)).await {
                    warn!("producer {producer} stopped early: {e}");
                    return;
                }
            }
            info!("producer {producer} finished");
        })?;
    }

    executor.run();
    pool.stop_and_wait();

    info!(
        "{} of {} jobs executed",
        done.load(Ordering::SeqCst),
        PRODUCERS * JOBS_PER_PRODUCER
    );
    Ok(())
}
