// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

// Each job gets its payload in a pooled partition. The job checksums the bytes
// and releases the partition, so after the first round no new buffers are
// allocated.

use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use jobpool::{ClosureJob, PartitionPool, WorkerPool};
use log::info;

const ROUNDS: usize = 5;
const JOBS_PER_ROUND: usize = 16;
const PAYLOAD: usize = 4096;

/// Payload byte for the `n`th job; wraps every 256 jobs.
fn fill_byte(n: usize) -> u8 {
    (n % 256) as u8
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let buffers = PartitionPool::new(PAYLOAD);
    let checksum = Arc::new(AtomicU64::new(0));

    for round in 0..ROUNDS {
        let workers = WorkerPool::new(4);
        for i in 0..JOBS_PER_ROUND {
            let mut part = buffers.acquire();
            let fill = fill_byte(round * JOBS_PER_ROUND + i);
            part.write_all(&[fill; PAYLOAD])?;

            let checksum = checksum.clone();
            workers.submit_job(Box::new(ClosureJob::new(
                format!("checksum-{round}-{i}"),
                move || {
                    let sum: u64 = part.unread().iter().map(|b| u64::from(*b)).sum();
                    checksum.fetch_add(sum, Ordering::Relaxed);
                    part.reset();
                },
            )))?;
        }
        workers.stop_and_wait();
        info!(
            "round {round}: {} partitions idle, checksum {}",
            buffers.idle(),
            checksum.load(Ordering::Relaxed)
        );
    }

    Ok(())
}
