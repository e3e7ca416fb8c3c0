// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CAPACITY: usize = 4;
pub const DEFAULT_THREAD_NAME: &str = "jobpool-worker";

/// What `submit` does once shutdown has started.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, Default, Serialize, Deserialize)]
#[clap(rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum SubmitPolicy {
    #[default]
    /// Default: fail fast with `PoolError::Closed`, also waking submitters blocked on a full queue
    RejectAfterClose,
    /// Always block for a free slot. Callers must not submit concurrently with shutdown
    BlockAlways,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of worker threads and queue slots. Zero is clamped to one.
    pub capacity: usize,
    pub policy: SubmitPolicy,
    /// Prefix for worker thread names, suffixed with the worker index.
    pub thread_name: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            policy: SubmitPolicy::default(),
            thread_name: DEFAULT_THREAD_NAME.to_string(),
        }
    }
}

impl PoolConfig {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    pub fn policy(mut self, policy: SubmitPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Parses a JSON encoded configuration. Missing keys fall back to the defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Capacity after clamping, i.e. the number of workers actually started.
    pub fn effective_capacity(&self) -> usize {
        self.capacity.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_uses_kebab_case_and_defaults() {
        let cfg = PoolConfig::from_json(r#"{"capacity": 8, "policy": "block-always"}"#).unwrap();
        assert_eq!(cfg.capacity, 8);
        assert_eq!(cfg.policy, SubmitPolicy::BlockAlways);
        assert_eq!(cfg.thread_name, DEFAULT_THREAD_NAME);

        let cfg = PoolConfig::from_json("{}").unwrap();
        assert_eq!(cfg, PoolConfig::default());
    }

    #[test]
    fn unknown_policy_is_rejected() {
        assert!(PoolConfig::from_json(r#"{"policy": "drop-newest"}"#).is_err());
    }

    #[test]
    fn zero_capacity_is_clamped() {
        assert_eq!(PoolConfig::with_capacity(0).effective_capacity(), 1);
        assert_eq!(PoolConfig::with_capacity(3).effective_capacity(), 3);
    }

    #[test]
    fn policy_value_names() {
        let names: Vec<String> = SubmitPolicy::value_variants()
            .iter()
            .filter_map(|p| p.to_possible_value())
            .map(|v| v.get_name().to_string())
            .collect();
        assert_eq!(names, vec!["reject-after-close", "block-always"]);
    }
}
