//! Timer configuration loaded from TOML
//!
//! # Example calltimer.toml
//!
//! ```toml
//! default_iterations = 5
//! reset_after_trigger = true
//!
//! [report]
//! format = "text"
//! sort = "total_time_desc"
//! include_idle = false
//! seconds_per_call = true
//! key_pattern = "^db_"
//! ```

use crate::error::{Result, TimerError};
use crate::report::ReportConfig;
use anyhow::Context;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Settings applied when building a [`Timer`](crate::Timer)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// Threshold for keys without an explicit `set_iterations`
    pub default_iterations: u64,
    /// Clear statistics after every triggered report, whichever key fired
    pub reset_after_trigger: bool,
    /// Report selection, order and format
    pub report: ReportConfig,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            default_iterations: 1,
            reset_after_trigger: false,
            report: ReportConfig::default(),
        }
    }
}

impl TimerConfig {
    /// Load configuration from a TOML file
    ///
    /// ```no_run
    /// use calltimer::config::TimerConfig;
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let config = TimerConfig::from_file("calltimer.toml")?;
    /// println!("default threshold: {}", config.default_iterations);
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid timer configuration in {}", path.display()))
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.default_iterations < 1 {
            return Err(TimerError::InvalidConfig(format!(
                "default_iterations must be >= 1, got {}",
                self.default_iterations
            )));
        }

        if let Some(pattern) = &self.report.key_pattern {
            Regex::new(pattern)?;
        }

        Ok(())
    }
}
