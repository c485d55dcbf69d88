//! Report rendering for accumulated timing statistics
//!
//! Two formats are supported: an aligned text table and a JSON array. Both
//! apply the same row selection (idle rows, key pattern) and ordering.

use crate::error::Result;
use crate::registry::StatsRow;
use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

const COL_NAME: &str = "Method";
const COL_CALLS: &str = "Calls";
const COL_TIME: &str = "Total Time";
const COL_CPS: &str = "Calls/Sec";
const COL_SPC: &str = "Seconds/Call";

/// Output format for reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Human-readable aligned table (default)
    #[default]
    Text,
    /// JSON array for machine parsing
    Json,
}

/// Row ordering for reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Ascending by key name (default, deterministic)
    #[default]
    Name,
    /// Descending by total time, hottest first; ties by name
    TotalTimeDesc,
    /// Ascending by seconds per call; ties by name
    SecondsPerCallAsc,
}

/// Which rows a report shows, in what order and format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub format: OutputFormat,
    pub sort: SortOrder,
    /// Include keys whose call count is zero (e.g. after a reset)
    pub include_idle: bool,
    /// Show the Seconds/Call column
    pub seconds_per_call: bool,
    /// Only report keys matching this regular expression
    pub key_pattern: Option<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            sort: SortOrder::Name,
            include_idle: false,
            seconds_per_call: true,
            key_pattern: None,
        }
    }
}

/// A single report row in JSON form
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonReportRow {
    pub key: String,
    pub calls: u64,
    pub total_time_secs: f64,
    pub calls_per_second: f64,
    pub seconds_per_call: f64,
}

impl From<&StatsRow> for JsonReportRow {
    fn from(row: &StatsRow) -> Self {
        Self {
            key: row.key.clone(),
            calls: row.stats.calls,
            total_time_secs: row.stats.total_time.as_secs_f64(),
            calls_per_second: row.stats.calls_per_second(),
            seconds_per_call: row.stats.seconds_per_call(),
        }
    }
}

/// In-memory report sink that can be cloned and inspected
///
/// All clones share one buffer, so a clone handed to a [`Reporter`] can be
/// read back through the original.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded as UTF-8
    pub fn contents(&self) -> String {
        let buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Renders snapshots and writes them to an output sink
pub struct Reporter {
    config: ReportConfig,
    pattern: Option<Regex>,
    sink: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Reporter {
    /// Reporter with default settings writing to standard output
    pub fn stdout() -> Self {
        Self {
            config: ReportConfig::default(),
            pattern: None,
            sink: Mutex::new(Box::new(io::stdout())),
        }
    }

    /// Create a reporter writing to an arbitrary sink
    pub fn with_sink<W: Write + Send + 'static>(config: ReportConfig, sink: W) -> Result<Self> {
        let pattern = config.key_pattern.as_deref().map(Regex::new).transpose()?;
        Ok(Self {
            config,
            pattern,
            sink: Mutex::new(Box::new(sink)),
        })
    }

    /// Apply idle filtering, key pattern and sort order
    pub fn select<'a>(&self, entries: &'a [StatsRow]) -> Vec<&'a StatsRow> {
        let mut rows: Vec<&StatsRow> = entries
            .iter()
            .filter(|row| self.config.include_idle || row.stats.calls > 0)
            .filter(|row| {
                self.pattern
                    .as_ref()
                    .map_or(true, |pattern| pattern.is_match(&row.key))
            })
            .collect();

        match self.config.sort {
            SortOrder::Name => rows.sort_by(|a, b| a.key.cmp(&b.key)),
            SortOrder::TotalTimeDesc => rows.sort_by(|a, b| {
                b.stats
                    .total_time
                    .cmp(&a.stats.total_time)
                    .then_with(|| a.key.cmp(&b.key))
            }),
            SortOrder::SecondsPerCallAsc => rows.sort_by(|a, b| {
                a.stats
                    .seconds_per_call()
                    .partial_cmp(&b.stats.seconds_per_call())
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| a.key.cmp(&b.key))
            }),
        }
        rows
    }

    /// Render `entries` in the configured format
    pub fn render(&self, entries: &[StatsRow]) -> Result<String> {
        self.render_rows(&self.select(entries))
    }

    fn render_rows(&self, rows: &[&StatsRow]) -> Result<String> {
        match self.config.format {
            OutputFormat::Text => Ok(render_table(rows, self.config.seconds_per_call)),
            OutputFormat::Json => {
                let json: Vec<JsonReportRow> = rows.iter().copied().map(JsonReportRow::from).collect();
                let mut out = serde_json::to_string(&json)?;
                out.push('\n');
                Ok(out)
            }
        }
    }

    /// Render `entries` and write them to the sink
    pub fn show(&self, entries: &[StatsRow]) -> Result<()> {
        let rows = self.select(entries);
        let rendered = self.render_rows(&rows)?;
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        sink.write_all(rendered.as_bytes())?;
        sink.flush()?;
        debug!(rows = rows.len(), "report written");
        Ok(())
    }
}

/// Render rows as an aligned table
///
/// Every column is as wide as its header or its widest cell, whichever is
/// larger. The name column is left-aligned, numbers are right-aligned.
pub fn render_table(rows: &[&StatsRow], seconds_per_call: bool) -> String {
    let mut headers = vec![COL_NAME, COL_CALLS, COL_TIME, COL_CPS];
    if seconds_per_call {
        headers.push(COL_SPC);
    }

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            let mut line = vec![
                row.key.clone(),
                row.stats.calls.to_string(),
                format!("{:.3}", row.stats.total_time.as_secs_f64()),
                format!("{:.3}", row.stats.calls_per_second()),
            ];
            if seconds_per_call {
                line.push(format!("{:.3}", row.stats.seconds_per_call()));
            }
            line
        })
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(col, header)| {
            cells
                .iter()
                .map(|line| line[col].chars().count())
                .fold(header.chars().count(), usize::max)
        })
        .collect();
    let total_width = widths.iter().sum::<usize>() + widths.len() - 1;
    let rule = "-".repeat(total_width);

    let mut out = String::new();
    out.push('\n');
    out.push_str(&format_line(&headers, &widths));
    out.push_str(&rule);
    out.push('\n');
    for line in &cells {
        out.push_str(&format_line(line, &widths));
    }
    out.push_str(&rule);
    out.push('\n');
    out.push('\n');
    out
}

fn format_line<S: AsRef<str>>(cells: &[S], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(col, (cell, &width))| {
            if col == 0 {
                format!("{:<width$}", cell.as_ref())
            } else {
                format!("{:>width$}", cell.as_ref())
            }
        })
        .collect();
    let mut line = padded.join(" ");
    line.push('\n');
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::StatsEntry;
    use std::time::Duration;

    fn row(key: &str, calls: u64, millis: u64) -> StatsRow {
        StatsRow {
            key: key.to_string(),
            stats: StatsEntry {
                calls,
                total_time: Duration::from_millis(millis),
            },
        }
    }

    fn reporter(config: ReportConfig) -> (Reporter, MemorySink) {
        let sink = MemorySink::new();
        let reporter = Reporter::with_sink(config, sink.clone()).unwrap();
        (reporter, sink)
    }

    #[test]
    fn test_table_layout() {
        let rows = vec![row("a", 5, 2000)];
        let refs: Vec<&StatsRow> = rows.iter().collect();
        let table = render_table(&refs, true);
        let lines: Vec<&str> = table.split('\n').collect();

        assert_eq!(lines[0], "");
        assert_eq!(lines[1], "Method Calls Total Time Calls/Sec Seconds/Call");
        assert_eq!(lines[2], "-".repeat(lines[1].len()));
        assert_eq!(lines[3], "a          5      2.000     2.500        0.400");
        assert_eq!(lines[4], lines[2]);
        assert_eq!(lines[5], "");
        assert_eq!(lines[6], "");
        assert_eq!(lines.len(), 7);
    }

    #[test]
    fn test_table_widths_grow_with_content() {
        let rows = vec![row("a_really_long_method_name", 1_234_567, 12_345_678)];
        let refs: Vec<&StatsRow> = rows.iter().collect();
        let table = render_table(&refs, false);
        let lines: Vec<&str> = table.lines().collect();

        assert!(lines[1].starts_with("Method                    "));
        assert!(!lines[1].contains(COL_SPC));
        assert_eq!(lines[1].len(), lines[3].len());
        assert_eq!(lines[2].len(), lines[3].len());
        assert!(lines[3].contains("1234567"));
        assert!(lines[3].contains("12345.678"));
    }

    #[test]
    fn test_empty_table_has_header_and_rules() {
        let table = render_table(&[], true);
        let lines: Vec<&str> = table.lines().collect();
        // blank, header, rule, rule, blank
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[2], lines[3]);
        assert_eq!(lines[4], "");
    }

    #[test]
    fn test_idle_rows_excluded_by_default() {
        let rows = vec![row("a", 5, 2000), row("b", 0, 0)];
        let (reporter, _) = reporter(ReportConfig::default());
        let selected = reporter.select(&rows);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].key, "a");
    }

    #[test]
    fn test_idle_rows_included_when_configured() {
        let rows = vec![row("a", 5, 2000), row("b", 0, 0)];
        let (reporter, _) = reporter(ReportConfig {
            include_idle: true,
            ..ReportConfig::default()
        });
        let table = reporter.render(&rows).unwrap();
        assert!(table.lines().any(|l| l.starts_with("b ") && l.ends_with("0.000     0.000        0.000")));
    }

    #[test]
    fn test_sort_orders() {
        let rows = vec![row("c", 1, 300), row("a", 3, 600), row("b", 2, 100)];
        let keys = |sort| {
            let (reporter, _) = reporter(ReportConfig {
                sort,
                ..ReportConfig::default()
            });
            reporter
                .select(&rows)
                .iter()
                .map(|r| r.key.clone())
                .collect::<Vec<_>>()
        };

        assert_eq!(keys(SortOrder::Name), vec!["a", "b", "c"]);
        assert_eq!(keys(SortOrder::TotalTimeDesc), vec!["a", "c", "b"]);
        // b: 0.05 s/call, a: 0.2 s/call, c: 0.3 s/call
        assert_eq!(keys(SortOrder::SecondsPerCallAsc), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_key_pattern_filters_rows() {
        let rows = vec![row("db_query", 1, 10), row("db_write", 1, 10), row("render", 1, 10)];
        let (reporter, _) = reporter(ReportConfig {
            key_pattern: Some("^db_".to_string()),
            ..ReportConfig::default()
        });
        let selected = reporter.select(&rows);
        assert_eq!(selected.len(), 2);
        assert!(selected.iter().all(|r| r.key.starts_with("db_")));
    }

    #[test]
    fn test_invalid_key_pattern_rejected() {
        let result = Reporter::with_sink(
            ReportConfig {
                key_pattern: Some("(".to_string()),
                ..ReportConfig::default()
            },
            MemorySink::new(),
        );
        assert!(matches!(result, Err(crate::TimerError::Pattern(_))));
    }

    #[test]
    fn test_json_format() {
        let rows = vec![row("a", 5, 2000)];
        let (reporter, sink) = reporter(ReportConfig {
            format: OutputFormat::Json,
            ..ReportConfig::default()
        });
        reporter.show(&rows).unwrap();

        let parsed: Vec<JsonReportRow> = serde_json::from_str(sink.contents().trim()).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].key, "a");
        assert_eq!(parsed[0].calls, 5);
        assert!((parsed[0].calls_per_second - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_show_propagates_write_errors() {
        struct BrokenPipe;
        impl Write for BrokenPipe {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let reporter = Reporter::with_sink(ReportConfig::default(), BrokenPipe).unwrap();
        let result = reporter.show(&[row("a", 1, 1)]);
        assert!(matches!(result, Err(crate::TimerError::Io(_))));
    }

    #[test]
    fn test_show_writes_only_selected_rows() {
        let rows = vec![row("db_query", 2, 10), row("db_idle", 0, 0), row("render", 1, 10)];
        let (reporter, sink) = reporter(ReportConfig {
            key_pattern: Some("^db_".to_string()),
            ..ReportConfig::default()
        });
        reporter.show(&rows).unwrap();

        let out = sink.contents();
        // blank, header, rule, one row, rule, blank
        assert_eq!(out.lines().count(), 6, "{}", out);
        assert!(out.lines().any(|l| l.starts_with("db_query ")));
        assert!(!out.contains("db_idle"));
        assert!(!out.contains("render"));
    }

    #[test]
    fn test_json_empty_selection() {
        let (reporter, sink) = reporter(ReportConfig {
            format: OutputFormat::Json,
            ..ReportConfig::default()
        });
        assert_eq!(reporter.render(&[]).unwrap(), "[]\n");

        // Only idle rows, all filtered out
        reporter.show(&[row("a", 0, 0), row("b", 0, 0)]).unwrap();
        assert_eq!(sink.contents(), "[]\n");
    }
}
