// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

// Work is staged in a deque first. Urgent items go to the front, the rest to
// the back, then everything is drained into the pool in deque order.

use std::sync::{Arc, Mutex};

use jobpool::WorkerPool;
use jobpool_deque::Deque;
use log::info;

#[derive(Debug)]
struct Task {
    name: String,
    urgent: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut staged: Deque<Task> = Deque::new();
    for i in 0..10 {
        let task = Task {
            name: format!("task-{i}"),
            urgent: i % 4 == 0,
        };
        if task.urgent {
            staged.push_front(task);
        } else {
            staged.push_back(task);
        }
    }
    info!("staged {} tasks, first is {}", staged.len(), staged.front().name);

    // a single worker keeps start order equal to deque order
    let pool = WorkerPool::new(1);
    let order = Arc::new(Mutex::new(Vec::new()));
    while let Some(task) = staged.try_pop_front() {
        let order = order.clone();
        pool.submit(move || {
            if let Ok(mut order) = order.lock() {
                order.push(format!("{}{}", task.name, if task.urgent { "!" } else { "" }));
            }
        })?;
    }
    pool.stop_and_wait();

    let order = order.lock().map_err(|e| anyhow::anyhow!("{e}"))?;
    info!("executed: {}", order.join(", "));
    Ok(())
}
