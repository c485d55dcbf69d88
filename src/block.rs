//! Label-keyed timing of ad-hoc code regions
//!
//! Unlike wrapped callables, a timed block reports after every run,
//! regardless of any iteration threshold configured for its label.

use crate::error::Result;
use crate::interceptor::measure;
use crate::registry::Registry;
use crate::report::Reporter;
use tracing::debug;

/// Time a block of code and report afterwards
///
/// Expands to [`Timer::time_block`](crate::Timer::time_block), so it evaluates
/// to `Result<T>` holding the block's value.
///
/// # Usage
///
/// ```
/// use calltimer::{time_block, MemorySink, ReportConfig, Timer};
///
/// # fn main() -> calltimer::Result<()> {
/// let timer = Timer::with_sink(ReportConfig::default(), MemorySink::new())?;
/// let sum = time_block!(timer, "sum", {
///     (1..=10).sum::<u32>()
/// })?;
/// assert_eq!(sum, 55);
/// # Ok(())
/// # }
/// ```
#[macro_export]
macro_rules! time_block {
    ($timer:expr, $label:expr, $block:block) => {
        $timer.time_block($label, || $block)
    };
}

/// Run `body` once, record it under `label`, report, then reset if configured
///
/// A panicking body unwinds before anything is recorded or reported.
pub fn time_block<R, F>(registry: &Registry, reporter: &Reporter, label: &str, body: F) -> Result<R>
where
    F: FnOnce() -> R,
{
    let (value, elapsed) = measure(body);
    let calls = registry.record(label, elapsed);
    debug!(label, calls, elapsed_us = elapsed.as_micros() as u64, "block timed");

    let shown = reporter.show(&registry.snapshot());
    if registry.policy(label).reset_on_trigger {
        registry.reset_all();
    }
    shown?;
    Ok(value)
}
