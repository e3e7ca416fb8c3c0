// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use clap::Parser;
use jobpool_tests::scenarios::{run_scenario, Scenario};

#[derive(Debug, Parser)]
#[command(about = "Runs a jobpool scenario and prints its log as JSON")]
struct Args {
    #[arg(long, value_enum)]
    scenario: Scenario,

    #[arg(long, default_value_t = 2)]
    capacity: usize,

    #[arg(long, default_value_t = 10)]
    jobs: usize,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let log = run_scenario(args.scenario, args.capacity, args.jobs)?;
    println!("{}", serde_json::to_string(&log)?);
    Ok(())
}
