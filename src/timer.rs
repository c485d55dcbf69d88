//! The `Timer` facade tying registry, trigger policy and reporter together
//!
//! A `Timer` is cheap to clone; clones share one registry and one reporter.
//! Hosts that want isolated statistics build their own instance, and
//! [`global`](crate::global) provides a shared default writing to stdout.

use crate::block;
use crate::config::TimerConfig;
use crate::error::Result;
use crate::interceptor;
use crate::registry::Registry;
use crate::report::{ReportConfig, Reporter};
use crate::trigger::{ResetScope, TriggerPolicy};
use std::io::Write;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Timer {
    registry: Arc<Registry>,
    reporter: Arc<Reporter>,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Timer with default settings, reporting to stdout
    pub fn new() -> Self {
        Self::from_parts(Arc::new(Registry::new()), Reporter::stdout())
    }

    /// Build a timer from an existing registry and reporter
    pub fn from_parts(registry: Arc<Registry>, reporter: Reporter) -> Self {
        Self {
            registry,
            reporter: Arc::new(reporter),
        }
    }

    /// Timer with the given report settings writing to `sink`
    pub fn with_sink<W: Write + Send + 'static>(report: ReportConfig, sink: W) -> Result<Self> {
        Ok(Self::from_parts(
            Arc::new(Registry::new()),
            Reporter::with_sink(report, sink)?,
        ))
    }

    /// Timer configured from `config`, reporting to stdout
    pub fn from_config(config: &TimerConfig) -> Result<Self> {
        Self::from_config_with_sink(config, std::io::stdout())
    }

    /// Timer configured from `config`, reporting to `sink`
    pub fn from_config_with_sink<W: Write + Send + 'static>(
        config: &TimerConfig,
        sink: W,
    ) -> Result<Self> {
        config.validate()?;
        let registry = Registry::with_default_iterations(config.default_iterations);
        if config.reset_after_trigger {
            registry.set_reset_all_keys();
        }
        let reporter = Reporter::with_sink(config.report.clone(), sink)?;
        Ok(Self::from_parts(Arc::new(registry), reporter))
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    fn trigger(&self) -> TriggerPolicy {
        TriggerPolicy::new(Arc::clone(&self.registry), Arc::clone(&self.reporter))
    }

    /// Wrap `f` so its completed calls are timed under `key`
    ///
    /// If `key` has a trigger enabled, each completed call is checked against
    /// the key's iteration threshold. The check reads the policy at call time,
    /// so `enable_trigger` may come before or after wrapping.
    ///
    /// # Example
    /// ```
    /// use calltimer::{MemorySink, ReportConfig, Timer};
    ///
    /// let timer = Timer::with_sink(ReportConfig::default(), MemorySink::new()).unwrap();
    /// let square = timer.wrap("square", |x: u64| x * x);
    /// assert_eq!(square(7), 49);
    /// assert_eq!(timer.registry().get("square").unwrap().calls, 1);
    /// ```
    pub fn wrap<A, R, F>(&self, key: impl Into<String>, f: F) -> impl Fn(A) -> R
    where
        F: Fn(A) -> R,
    {
        let trigger = self.trigger();
        interceptor::wrap_with(Arc::clone(&self.registry), key, f, move |key, calls| {
            trigger.after_call(key, calls)
        })
    }

    /// Wrap a fallible `f`; `Err` results are returned unrecorded
    pub fn wrap_fallible<A, T, E, F>(
        &self,
        key: impl Into<String>,
        f: F,
    ) -> impl Fn(A) -> std::result::Result<T, E>
    where
        F: Fn(A) -> std::result::Result<T, E>,
    {
        let trigger = self.trigger();
        interceptor::wrap_fallible_with(Arc::clone(&self.registry), key, f, move |key, calls| {
            trigger.after_call(key, calls)
        })
    }

    /// Report after every `n` completed calls of `key`; `n < 1` is rejected
    pub fn set_iterations(&self, key: &str, n: i64) -> Result<()> {
        self.registry.set_iterations(key, n)
    }

    /// Check completed calls of `key` against its iteration threshold
    pub fn enable_trigger(&self, key: &str) {
        self.registry.enable_trigger(key);
    }

    /// Clear all statistics after reports triggered within `scope`
    ///
    /// Also governs resets after [`time_block`](Self::time_block) reports.
    pub fn enable_reset_after_trigger(&self, scope: ResetScope) {
        self.trigger().enable_reset(scope);
    }

    /// Time `body` under `label`, then report unconditionally
    pub fn time_block<R, F>(&self, label: &str, body: F) -> Result<R>
    where
        F: FnOnce() -> R,
    {
        block::time_block(&self.registry, &self.reporter, label, body)
    }

    /// Zero all statistics, keeping keys and policies
    pub fn reset_times(&self) {
        self.registry.reset_all();
    }

    /// Report the whole registry now
    pub fn show_times(&self) -> Result<()> {
        self.reporter.show(&self.registry.snapshot())
    }

    /// Report only the named keys
    pub fn show_keys(&self, keys: &[&str]) -> Result<()> {
        let rows: Vec<_> = self
            .registry
            .snapshot()
            .into_iter()
            .filter(|row| keys.contains(&row.key.as_str()))
            .collect();
        self.reporter.show(&rows)
    }
}
