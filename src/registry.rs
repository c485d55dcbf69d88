//! Per-key call statistics and iteration policies
//!
//! The registry is the only shared mutable state in the crate. Every
//! operation takes the same lock, so a `reset_all` is applied to all keys at
//! once relative to concurrent `record` calls, and `snapshot` never observes a
//! half-updated entry.

use crate::error::{Result, TimerError};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, trace};

/// Accumulated statistics for a single timing key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsEntry {
    /// Number of successfully completed timed invocations
    pub calls: u64,
    /// Wall-clock time summed over those invocations
    pub total_time: Duration,
}

impl StatsEntry {
    /// Calls per second of accumulated time (0 when no time was recorded)
    pub fn calls_per_second(&self) -> f64 {
        let secs = self.total_time.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.calls as f64 / secs
        }
    }

    /// Average seconds per call (0 when there were no calls)
    pub fn seconds_per_call(&self) -> f64 {
        if self.calls == 0 {
            0.0
        } else {
            self.total_time.as_secs_f64() / self.calls as f64
        }
    }
}

/// Report cadence and reset behaviour configured for a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterationPolicy {
    /// A trigger fires whenever `calls % threshold == 0`
    pub threshold: u64,
    /// Clear the whole registry after this key triggers a report
    pub reset_on_trigger: bool,
    /// Whether completed calls of this key are checked at all
    pub trigger_enabled: bool,
}

impl Default for IterationPolicy {
    fn default() -> Self {
        Self {
            threshold: 1,
            reset_on_trigger: false,
            trigger_enabled: false,
        }
    }
}

/// One row of a registry snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct StatsRow {
    pub key: String,
    pub stats: StatsEntry,
}

#[derive(Debug)]
struct RegistryState {
    stats: HashMap<String, StatsEntry>,
    policies: HashMap<String, IterationPolicy>,
    default_threshold: u64,
    reset_all_keys: bool,
}

impl Default for RegistryState {
    fn default() -> Self {
        Self {
            stats: HashMap::new(),
            policies: HashMap::new(),
            default_threshold: 1,
            reset_all_keys: false,
        }
    }
}

impl RegistryState {
    fn policy_mut(&mut self, key: &str) -> &mut IterationPolicy {
        let threshold = self.default_threshold;
        self.policies
            .entry(key.to_string())
            .or_insert_with(|| IterationPolicy {
                threshold,
                ..IterationPolicy::default()
            })
    }
}

/// Thread-safe map from timing key to statistics and policy
#[derive(Debug, Default)]
pub struct Registry {
    inner: Mutex<RegistryState>,
}

impl Registry {
    /// Create an empty registry with a default threshold of 1
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry whose keys start with `threshold` unless overridden
    ///
    /// Thresholds below 1 are raised to 1.
    pub fn with_default_iterations(threshold: u64) -> Self {
        let state = RegistryState {
            default_threshold: threshold.max(1),
            ..RegistryState::default()
        };
        Self {
            inner: Mutex::new(state),
        }
    }

    // Counters stay consistent even if a holder panicked, so poisoning is ignored.
    fn state(&self) -> MutexGuard<'_, RegistryState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record one completed invocation and return the key's new call count
    pub fn record(&self, key: &str, elapsed: Duration) -> u64 {
        let mut state = self.state();
        let entry = state.stats.entry(key.to_string()).or_default();
        entry.calls += 1;
        entry.total_time += elapsed;
        trace!(key, calls = entry.calls, elapsed_us = elapsed.as_micros() as u64, "recorded call");
        entry.calls
    }

    /// Zero the statistics of every known key, keeping keys and policies
    pub fn reset_all(&self) {
        let mut state = self.state();
        for entry in state.stats.values_mut() {
            *entry = StatsEntry::default();
        }
        debug!(keys = state.stats.len(), "reset all timing statistics");
    }

    /// Consistent copy of all statistics, ordered by key
    pub fn snapshot(&self) -> Vec<StatsRow> {
        let state = self.state();
        let mut rows: Vec<StatsRow> = state
            .stats
            .iter()
            .map(|(key, stats)| StatsRow {
                key: key.clone(),
                stats: *stats,
            })
            .collect();
        drop(state);
        rows.sort_by(|a, b| a.key.cmp(&b.key));
        rows
    }

    /// Statistics for a single key, if it has ever been recorded
    pub fn get(&self, key: &str) -> Option<StatsEntry> {
        self.state().stats.get(key).copied()
    }

    /// Number of keys with statistics
    pub fn len(&self) -> usize {
        self.state().stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Set the iteration threshold for `key`
    ///
    /// Values below 1 are rejected and leave the current threshold untouched.
    pub fn set_iterations(&self, key: &str, n: i64) -> Result<()> {
        if n < 1 {
            return Err(TimerError::InvalidIterations {
                key: key.to_string(),
                value: n,
            });
        }
        self.state().policy_mut(key).threshold = n as u64;
        debug!(key, threshold = n, "iteration threshold set");
        Ok(())
    }

    /// Effective threshold for `key`
    pub fn iterations(&self, key: &str) -> u64 {
        self.policy(key).threshold
    }

    /// Mark `key` so that its completed calls are checked by the trigger policy
    pub fn enable_trigger(&self, key: &str) {
        self.state().policy_mut(key).trigger_enabled = true;
    }

    /// Opt `key` into clearing the registry after each triggered report
    pub fn set_reset_on_trigger(&self, key: &str) {
        self.state().policy_mut(key).reset_on_trigger = true;
    }

    /// Opt every key, including ones not yet seen, into reset-after-trigger
    pub fn set_reset_all_keys(&self) {
        self.state().reset_all_keys = true;
    }

    /// Effective policy for `key`, with the registry-wide reset flag folded in
    pub fn policy(&self, key: &str) -> IterationPolicy {
        let state = self.state();
        let mut policy = state.policies.get(key).copied().unwrap_or(IterationPolicy {
            threshold: state.default_threshold,
            ..IterationPolicy::default()
        });
        policy.reset_on_trigger |= state.reset_all_keys;
        policy
    }
}
