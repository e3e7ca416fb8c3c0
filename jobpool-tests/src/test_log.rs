// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use serde::{Deserialize, Serialize};

use jobpool::PoolStats;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LoggedEvent {
    /// Milliseconds since the scenario started.
    pub at_ms: u128,

    pub event: String,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct ScenarioLog {
    pub scenario: String,

    pub capacity: usize,

    pub accepted: u64,

    pub rejected: u64,

    /// Job bodies that ran to completion, as counted by the jobs.
    pub executed: u64,

    pub stats: PoolStats,

    pub events: Vec<LoggedEvent>,
}

impl ScenarioLog {
    pub fn event_names(&self) -> Vec<&str> {
        self.events.iter().map(|e| e.event.as_str()).collect()
    }

    pub fn at(&self, event: &str) -> Option<u128> {
        self.events.iter().find(|e| e.event == event).map(|e| e.at_ms)
    }
}
