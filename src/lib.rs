//! Calltimer - in-process call instrumentation
//!
//! This library wraps callables and code blocks to measure wall-clock time,
//! accumulates per-key call counts and totals, and writes aligned reports
//! either on demand or every N completed calls.
//!
//! ```
//! use calltimer::{MemorySink, ReportConfig, Timer};
//!
//! # fn main() -> calltimer::Result<()> {
//! let sink = MemorySink::new();
//! let timer = Timer::with_sink(ReportConfig::default(), sink.clone())?;
//!
//! timer.set_iterations("run", 2)?;
//! timer.enable_trigger("run");
//! let run = timer.wrap("run", |n: u64| (0..n).sum::<u64>());
//!
//! for _ in 0..4 {
//!     run(1_000);
//! }
//! assert_eq!(sink.contents().matches("Method").count(), 2);
//! # Ok(())
//! # }
//! ```

use std::sync::OnceLock;

pub mod block;
pub mod cli;
pub mod config;
pub mod error;
pub mod interceptor;
pub mod registry;
pub mod report;
pub mod timer;
pub mod trigger;
pub mod workload;

pub use config::TimerConfig;
pub use error::{Result, TimerError};
pub use registry::{IterationPolicy, Registry, StatsEntry, StatsRow};
pub use report::{MemorySink, OutputFormat, ReportConfig, Reporter, SortOrder};
pub use timer::Timer;
pub use trigger::{ResetScope, TriggerPolicy};

/// Process-wide default timer writing reports to stdout
pub fn global() -> &'static Timer {
    static GLOBAL: OnceLock<Timer> = OnceLock::new();
    GLOBAL.get_or_init(Timer::new)
}
