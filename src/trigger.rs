//! Threshold-gated reporting after completed calls
//!
//! A trigger fires for a key when its call count is a multiple of the key's
//! iteration threshold. Firing writes a report of the whole registry, then,
//! if the key opted into it, clears every key's statistics.

use crate::error::Result;
use crate::registry::{IterationPolicy, Registry};
use crate::report::Reporter;
use std::sync::Arc;
use tracing::{debug, warn};

/// Which keys clear the registry after a triggered report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetScope {
    /// Only triggers of this key reset
    Key(String),
    /// Triggers of any key reset, including keys first used later
    All,
}

/// Whether `calls` satisfies the policy's threshold
pub fn should_fire(policy: &IterationPolicy, calls: u64) -> bool {
    policy.threshold > 0 && calls % policy.threshold == 0
}

/// Evaluates iteration thresholds and drives reports and resets
#[derive(Debug, Clone)]
pub struct TriggerPolicy {
    registry: Arc<Registry>,
    reporter: Arc<Reporter>,
}

impl TriggerPolicy {
    pub fn new(registry: Arc<Registry>, reporter: Arc<Reporter>) -> Self {
        Self { registry, reporter }
    }

    /// Check `key` after a call that brought it to `calls` completions
    ///
    /// Returns whether the trigger fired. Keys without `enable_trigger` never
    /// fire. The reset runs even when writing the report failed; the write
    /// error is returned afterwards.
    pub fn on_completed(&self, key: &str, calls: u64) -> Result<bool> {
        let policy = self.registry.policy(key);
        if !policy.trigger_enabled || !should_fire(&policy, calls) {
            return Ok(false);
        }

        debug!(key, calls, threshold = policy.threshold, "trigger fired");
        let shown = self.reporter.show(&self.registry.snapshot());
        if policy.reset_on_trigger {
            self.registry.reset_all();
        }
        shown?;
        Ok(true)
    }

    /// Hook form of [`on_completed`](Self::on_completed) for wrapped callables
    ///
    /// A wrapped callable's return type cannot carry a report failure, so it
    /// is logged instead.
    pub fn after_call(&self, key: &str, calls: u64) {
        if let Err(e) = self.on_completed(key, calls) {
            warn!("Failed to write triggered report for {}: {}", key, e);
        }
    }

    /// Apply a reset-after-trigger scope to the registry
    pub fn enable_reset(&self, scope: ResetScope) {
        match scope {
            ResetScope::Key(key) => self.registry.set_reset_on_trigger(&key),
            ResetScope::All => self.registry.set_reset_all_keys(),
        }
    }
}
