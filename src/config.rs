//! Run-time options controlling the end-of-run summary.
//!
//! Options are defined by the [`SummaryConfiguration`] structure, parsed from command line
//! flags with [`gumdrop`](https://docs.rs/gumdrop/), then validated into the
//! [`SummaryOptions`] used when rendering.

use gumdrop::Options;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::metrics::TimeUnit;
use crate::trend::{verify_trend_stat, TrendColumns};
use crate::SummaryError;

/// Indent written in front of every summary line.
pub const DEFAULT_INDENT: &str = " ";

/// Runtime options available when printing a summary.
///
/// # Example
/// ```rust
/// use gumdrop::Options;
/// use trend_summary::config::SummaryConfiguration;
///
/// let configuration = SummaryConfiguration::parse_args_default(&[
///     "--summary-trend-stats",
///     "avg,med,p(99)",
///     "--no-color",
/// ])
/// .unwrap();
/// let options = configuration.validate().unwrap();
///
/// assert_eq!(options.trend_columns.len(), 3);
/// assert!(!options.colors);
/// ```
#[derive(Options, Debug, Clone, Default, Serialize, Deserialize)]
#[options(help = r#"Prints a summary of the metrics collected during a load test.

The following runtime options are available:"#)]
pub struct SummaryConfiguration {
    /// Displays this help
    #[options(short = "h")]
    pub help: bool,

    /// Sets trend stats to show (ie avg,min,med,max,p(90),p(95))
    #[options(no_short, meta = "STATS")]
    pub summary_trend_stats: String,
    /// Shows time values in a fixed unit (s, ms, us)
    #[options(no_short, meta = "UNIT")]
    pub summary_time_unit: Option<TimeUnit>,
    /// Disables colored output
    #[options(no_short)]
    pub no_color: bool,
    /// Exports the summary as JSON to this file
    // Add a blank line and then a 'Logging:' header after this option
    #[options(
        no_short,
        meta = "FILE",
        help = "Exports the summary as JSON to this file\n\nLogging:"
    )]
    pub summary_export: String,

    /// Enables log file and sets name
    #[options(short = "G", meta = "NAME")]
    pub log_file: String,
    /// Increases log file level (-g, -gg, etc)
    #[options(short = "g", count)]
    pub log_level: u8,
    /// Decreases verbosity (-q, -qq, etc)
    #[options(count, short = "q")]
    pub quiet: u8,
    /// Increases verbosity (-v, -vv, etc)
    #[options(count, short = "v")]
    pub verbose: u8,
}

/// Validated options, ready to render a summary.
#[derive(Clone, Debug)]
pub struct SummaryOptions {
    /// Statistics shown for every trend.
    pub trend_columns: TrendColumns,
    /// Fixed unit for time values, if any.
    pub time_unit: Option<TimeUnit>,
    /// Whether to color the output.
    pub colors: bool,
    /// Written in front of every line.
    pub indent: String,
    /// Where to write the JSON export, if anywhere.
    pub export_path: Option<PathBuf>,
}

impl SummaryConfiguration {
    /// Trend statistic specifiers, in the order they were given.
    pub fn trend_stats(&self) -> Vec<&str> {
        if self.summary_trend_stats.is_empty() {
            Vec::new()
        } else {
            self.summary_trend_stats.split(',').collect()
        }
    }

    /// Validate configured [`SummaryConfiguration`] values.
    ///
    /// Unlike [`TrendColumns::update`], which skips invalid specifiers, an invalid
    /// `--summary-trend-stats` entry is an error here so typos are reported.
    pub fn validate(&self) -> Result<SummaryOptions, SummaryError> {
        // Can't set both --verbose and --quiet.
        if self.verbose > 0 && self.quiet > 0 {
            return Err(SummaryError::InvalidOption {
                option: "--verbose".to_string(),
                value: self.verbose.to_string(),
                detail: "--verbose can not be set with --quiet.".to_string(),
            });
        }

        let stats = self.trend_stats();
        for stat in &stats {
            verify_trend_stat(stat).map_err(|source| SummaryError::InvalidTrendStat {
                stat: stat.to_string(),
                source,
            })?;
        }
        let mut trend_columns = TrendColumns::default();
        trend_columns.update(&stats);

        let export_path = if self.summary_export.is_empty() {
            None
        } else {
            Some(PathBuf::from(&self.summary_export))
        };

        Ok(SummaryOptions {
            trend_columns,
            time_unit: self.summary_time_unit,
            colors: !self.no_color && console::colors_enabled(),
            indent: DEFAULT_INDENT.to_string(),
            export_path,
        })
    }
}
