// SPDX-License-Identifier: MIT
// jobpool: run a synthetic workload through a bounded worker pool
//
// - Starts a pool with the requested capacity and submission policy.
// - Feeds it from one or more producer threads, then drains it.
// - Prints a run report (human readable or JSON).
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use clap::Parser;
use log::info;

use jobpool::workload::{run_workload, WorkloadConfig};
use jobpool::{PoolConfig, SubmitPolicy};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Number of worker threads and queue slots (0 is treated as 1)
    #[arg(long, env = "JOBPOOL_CAPACITY")]
    capacity: Option<usize>,

    /// Behaviour of submissions once shutdown has started
    #[arg(long, value_enum, env = "JOBPOOL_SUBMIT_POLICY")]
    policy: Option<SubmitPolicy>,

    /// Pool configuration (JSON encoded). Note that this excludes --capacity and --policy.
    #[arg(long, value_name = "JSON")]
    config: Option<String>,

    /// Total number of synthetic jobs
    #[arg(long, default_value_t = 100)]
    jobs: usize,

    /// Milliseconds each job sleeps
    #[arg(long = "job-millis", default_value_t = 1)]
    job_millis: u64,

    /// Number of producer threads submitting concurrently
    #[arg(long, default_value_t = 1)]
    producers: usize,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    json: bool,
}

fn validate_args(args: &Args) -> Result<(), String> {
    match (&args.config, &args.capacity, &args.policy) {
        (Some(_), None, None) | (None, _, _) => {}
        _ => {
            return Err("--config must not be used in combination with --capacity or --policy".into());
        }
    }

    if args.producers == 0 {
        return Err("--producers must be at least 1".into());
    }

    Ok(())
}

fn pool_config(args: &Args) -> anyhow::Result<PoolConfig> {
    if let Some(json) = &args.config {
        return Ok(PoolConfig::from_json(json)?);
    }
    let mut config = PoolConfig::default();
    if let Some(capacity) = args.capacity {
        config.capacity = capacity;
    }
    if let Some(policy) = args.policy {
        config.policy = policy;
    }
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {e}");
        std::process::exit(2);
    }

    let workload = WorkloadConfig {
        pool: pool_config(&args)?,
        jobs: args.jobs,
        job_millis: args.job_millis,
        producers: args.producers,
    };

    let report = run_workload(&workload)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        info!(
            "accepted={} rejected={} executed={} panicked={} elapsed={}ms",
            report.accepted,
            report.rejected,
            report.executed,
            report.stats.panicked,
            report.elapsed_ms
        );
    }

    Ok(())
}
