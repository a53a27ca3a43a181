//! Configurable statistics displayed for trend metrics.
//!
//! Each trend metric in the summary is rendered as a list of `label=value` pairs, one
//! per [`TrendColumn`]. Columns are built from specifier strings:
//!  - `avg`, `min`, `med`, `max`: the matching statistic of the trend.
//!  - `count`: the number of samples.
//!  - `p(N)`: the N-th percentile, where N is a number between 0 and 100, for example
//!    `p(95)` or `p(99.99)`.
//!
//! By default the summary shows `avg`, `min`, `med`, `max`, `p(90)` and `p(95)`.
//!
//! # Example
//! ```rust
//! use trend_summary::metrics::TrendSink;
//! use trend_summary::trend::TrendColumns;
//!
//! let mut sink = TrendSink::default();
//! for value in &[10.0, 15.0, 20.0] {
//!     sink.add(*value);
//! }
//!
//! let mut columns = TrendColumns::default();
//! columns.update(&["med", "p(95)", "not-a-stat"]);
//!
//! let values: Vec<(&str, f64)> = columns
//!     .iter()
//!     .map(|column| (column.label(), column.value(&sink)))
//!     .collect();
//! assert_eq!(values, vec![("med", 15.0), ("p(95)", 19.5)]);
//! ```

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use crate::metrics::TrendStats;
use crate::util;

lazy_static! {
    static ref PERCENTILE: Regex =
        Regex::new(r"(?s)^p\((?P<value>.*)\)$").expect("failed to compile percentile regex");
}

/// Specifiers of the columns shown when none are configured.
pub const DEFAULT_TREND_STATS: [&str; 6] = ["avg", "min", "med", "max", "p(90)", "p(95)"];

/// Reasons a trend statistic specifier is rejected.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TrendStatError {
    /// The specifier is an empty string.
    EmptyString,
    /// The specifier is neither a known statistic nor of the form `p(N)`.
    UnknownFormat,
    /// The specifier is of the form `p(N)`, but N is not a number between 0 and 100.
    PercentileInvalidValue,
}
impl TrendStatError {
    fn describe(&self) -> &str {
        match *self {
            TrendStatError::EmptyString => "trend stat is an empty string",
            TrendStatError::UnknownFormat => {
                "invalid trend stat format, expected avg, min, med, max, count or p(N)"
            }
            TrendStatError::PercentileInvalidValue => {
                "invalid percentile value, expected a number between 0 and 100"
            }
        }
    }
}
impl fmt::Display for TrendStatError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.describe())
    }
}
impl std::error::Error for TrendStatError {}

/// Statistics selected by name.
#[derive(Clone, Copy, Debug, EnumIter, Eq, PartialEq)]
pub enum FixedStat {
    Avg,
    Min,
    Med,
    Max,
    Count,
}
impl FixedStat {
    pub fn as_str(&self) -> &'static str {
        match self {
            FixedStat::Avg => "avg",
            FixedStat::Min => "min",
            FixedStat::Med => "med",
            FixedStat::Max => "max",
            FixedStat::Count => "count",
        }
    }
}

/// A statistic to extract from a trend.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TrendStat {
    Fixed(FixedStat),
    /// A percentile, stored as a fraction between 0 and 1.
    Percentile(f64),
}
impl TrendStat {
    /// Extract this statistic from a trend.
    pub fn value<S: TrendStats + ?Sized>(&self, stats: &S) -> f64 {
        match *self {
            TrendStat::Fixed(FixedStat::Avg) => stats.avg(),
            TrendStat::Fixed(FixedStat::Min) => stats.min(),
            TrendStat::Fixed(FixedStat::Med) => stats.med(),
            TrendStat::Fixed(FixedStat::Max) => stats.max(),
            TrendStat::Fixed(FixedStat::Count) => stats.count() as f64,
            TrendStat::Percentile(fraction) => stats.p(fraction),
        }
    }
}
/// Parse a specifier such as `avg` or `p(99.9)`. The whole string must match, no
/// whitespace is trimmed.
impl FromStr for TrendStat {
    type Err = TrendStatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(TrendStatError::EmptyString);
        }
        if let Some(stat) = FixedStat::iter().find(|stat| stat.as_str() == s) {
            return Ok(TrendStat::Fixed(stat));
        }
        let captures = PERCENTILE
            .captures(s)
            .ok_or(TrendStatError::UnknownFormat)?;
        let percent = captures
            .name("value")
            .and_then(|value| value.as_str().parse::<f64>().ok())
            .ok_or(TrendStatError::PercentileInvalidValue)?;
        // Also rejects NaN.
        if !(0.0..=100.0).contains(&percent) {
            return Err(TrendStatError::PercentileInvalidValue);
        }
        Ok(TrendStat::Percentile(percent / 100.0))
    }
}
impl fmt::Display for TrendStat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TrendStat::Fixed(stat) => f.write_str(stat.as_str()),
            TrendStat::Percentile(fraction) => {
                write!(f, "p({})", util::format_number(fraction * 100.0))
            }
        }
    }
}

/// Check that a specifier is valid, without building a column.
///
/// # Example
/// ```rust
/// use trend_summary::trend::{verify_trend_stat, TrendStatError};
///
/// assert!(verify_trend_stat("p(99.9)").is_ok());
/// assert_eq!(verify_trend_stat(" avg"), Err(TrendStatError::UnknownFormat));
/// ```
pub fn verify_trend_stat(stat: &str) -> Result<(), TrendStatError> {
    TrendStat::from_str(stat).map(|_| ())
}

/// One statistic shown for every trend metric: a label and the statistic it extracts.
#[derive(Clone, Debug, PartialEq)]
pub struct TrendColumn {
    label: String,
    stat: TrendStat,
}
impl TrendColumn {
    /// Build a column from a specifier, labelled with the specifier itself.
    pub fn parse(spec: &str) -> Result<Self, TrendStatError> {
        Ok(TrendColumn {
            label: spec.to_string(),
            stat: TrendStat::from_str(spec)?,
        })
    }

    pub fn new(label: &str, stat: TrendStat) -> Self {
        TrendColumn {
            label: label.to_string(),
            stat,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn stat(&self) -> TrendStat {
        self.stat
    }

    pub fn value<S: TrendStats + ?Sized>(&self, stats: &S) -> f64 {
        self.stat.value(stats)
    }
}

/// A specifier rejected by [`TrendColumns::update`], and why.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SkippedTrendStat {
    pub spec: String,
    pub error: TrendStatError,
}

/// The ordered columns displayed for every trend metric of a summary.
///
/// Configured once, typically from the `--summary-trend-stats` run-time option, then
/// shared by every render.
#[derive(Clone, Debug, PartialEq)]
pub struct TrendColumns {
    columns: Vec<TrendColumn>,
}
impl Default for TrendColumns {
    fn default() -> Self {
        TrendColumns {
            columns: DEFAULT_TREND_STATS
                .iter()
                .filter_map(|spec| TrendColumn::parse(spec).ok())
                .collect(),
        }
    }
}
impl TrendColumns {
    /// Columns built from specifiers, falling back to the defaults if none are valid.
    pub fn from_specs<S: AsRef<str>>(specs: &[S]) -> Self {
        let mut columns = TrendColumns::default();
        columns.update(specs);
        columns
    }

    /// Columns used exactly as given, including an empty list.
    pub fn from_columns(columns: Vec<TrendColumn>) -> Self {
        TrendColumns { columns }
    }

    /// Replace the columns with those parsed from `specs`.
    ///
    /// Invalid specifiers are skipped, while the order and any duplicates of valid
    /// ones are preserved. If no specifier is valid the columns are left unchanged.
    /// Skipped specifiers are returned for callers that want to report them.
    pub fn update<S: AsRef<str>>(&mut self, specs: &[S]) -> Vec<SkippedTrendStat> {
        let mut columns = Vec::with_capacity(specs.len());
        let mut skipped = Vec::new();
        for spec in specs {
            let spec = spec.as_ref();
            match TrendColumn::parse(spec) {
                Ok(column) => columns.push(column),
                Err(error) => {
                    debug!("skipping trend stat {:?}: {}", spec, error);
                    skipped.push(SkippedTrendStat {
                        spec: spec.to_string(),
                        error,
                    });
                }
            }
        }

        if columns.is_empty() {
            debug!("no valid trend stats, keeping {} columns", self.columns.len());
        } else {
            self.columns = columns;
        }
        skipped
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrendColumn> {
        self.columns.iter()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TrendColumn> {
        self.columns.get(index)
    }
}
impl<'a> IntoIterator for &'a TrendColumns {
    type Item = &'a TrendColumn;
    type IntoIter = std::slice::Iter<'a, TrendColumn>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::metrics::TrendSink;

    fn trend_sink(count: usize) -> TrendSink {
        let mut sink = TrendSink::default();
        for i in 0..count {
            sink.add(i as f64);
        }
        sink
    }

    #[test]
    fn verify() {
        let cases = vec![
            ("avg", Ok(())),
            ("min", Ok(())),
            ("med", Ok(())),
            ("max", Ok(())),
            ("p(0)", Ok(())),
            ("p(90)", Ok(())),
            ("p(95)", Ok(())),
            ("p(99)", Ok(())),
            ("p(99.9)", Ok(())),
            ("p(99.9999)", Ok(())),
            ("p(100)", Ok(())),
            ("count", Ok(())),
            ("nil", Err(TrendStatError::UnknownFormat)),
            (" avg", Err(TrendStatError::UnknownFormat)),
            ("avg ", Err(TrendStatError::UnknownFormat)),
            ("AVG", Err(TrendStatError::UnknownFormat)),
            ("p90", Err(TrendStatError::UnknownFormat)),
            ("p(90", Err(TrendStatError::UnknownFormat)),
            (" p(90)", Err(TrendStatError::UnknownFormat)),
            ("p(a)", Err(TrendStatError::PercentileInvalidValue)),
            ("p()", Err(TrendStatError::PercentileInvalidValue)),
            ("p( 90)", Err(TrendStatError::PercentileInvalidValue)),
            ("p(100.1)", Err(TrendStatError::PercentileInvalidValue)),
            ("p(-1)", Err(TrendStatError::PercentileInvalidValue)),
            ("p(NaN)", Err(TrendStatError::PercentileInvalidValue)),
            ("", Err(TrendStatError::EmptyString)),
        ];
        for (stat, expected) in cases {
            assert_eq!(verify_trend_stat(stat), expected, "stat: {:?}", stat);
        }
    }

    #[test]
    fn parse() {
        assert_eq!(
            TrendStat::from_str("med"),
            Ok(TrendStat::Fixed(FixedStat::Med))
        );
        assert_eq!(TrendStat::from_str("p(90)"), Ok(TrendStat::Percentile(0.9)));
        assert_eq!(TrendStat::from_str("p(0)"), Ok(TrendStat::Percentile(0.0)));
        assert_eq!(
            TrendStat::from_str("p(99.9999)"),
            Ok(TrendStat::Percentile(99.9999 / 100.0))
        );
        assert_eq!(TrendStat::Fixed(FixedStat::Count).to_string(), "count");
        assert_eq!(TrendStat::Percentile(0.95).to_string(), "p(95)");
    }

    #[test]
    fn percentile_with_newline() {
        assert_eq!(
            TrendStat::from_str("p(1\n)"),
            Err(TrendStatError::PercentileInvalidValue)
        );
        assert_eq!(
            TrendStat::from_str("p(\n)"),
            Err(TrendStatError::PercentileInvalidValue)
        );
        assert_eq!(
            TrendStat::from_str("p(1)\n"),
            Err(TrendStatError::UnknownFormat)
        );
    }

    #[test]
    fn default_columns() {
        let columns = TrendColumns::default();
        let labels: Vec<&str> = columns.iter().map(|column| column.label()).collect();
        assert_eq!(labels, DEFAULT_TREND_STATS.to_vec());
    }

    #[test]
    fn update_without_stats() {
        let mut columns = TrendColumns::default();
        let skipped = columns.update::<&str>(&[]);
        assert!(skipped.is_empty());
        assert_eq!(columns, TrendColumns::default());
    }

    #[test]
    fn update_one_stat() {
        let sink = trend_sink(100);
        let mut columns = TrendColumns::default();
        columns.update(&["avg"]);
        assert_eq!(columns.len(), 1);
        assert_eq!(columns.get(0).unwrap().value(&sink), sink.avg());
    }

    #[test]
    fn update_multiple_stats() {
        let sink = trend_sink(100);
        let mut columns = TrendColumns::default();
        columns.update(&["med", "max", "count"]);
        assert_eq!(columns.len(), 3);
        assert_eq!(columns.get(0).unwrap().value(&sink), sink.med());
        assert_eq!(columns.get(1).unwrap().value(&sink), sink.max());
        assert_eq!(columns.get(2).unwrap().value(&sink), 100.0);
    }

    #[test]
    fn update_ignores_invalid_stats() {
        let sink = trend_sink(100);
        let mut columns = TrendColumns::default();
        let skipped = columns.update(&["med", "max", "invalid"]);
        assert_eq!(columns.len(), 2);
        assert_eq!(columns.get(0).unwrap().value(&sink), sink.med());
        assert_eq!(columns.get(1).unwrap().value(&sink), sink.max());
        assert_eq!(
            skipped,
            vec![SkippedTrendStat {
                spec: "invalid".to_string(),
                error: TrendStatError::UnknownFormat,
            }]
        );
    }

    #[test]
    fn update_only_invalid_stats() {
        let mut columns = TrendColumns::default();
        columns.update(&["med"]);
        let skipped = columns.update(&["", "p(x)", "mean"]);
        assert_eq!(skipped.len(), 3);
        assert_eq!(columns.len(), 1);
        assert_eq!(columns.get(0).unwrap().label(), "med");
    }

    #[test]
    fn update_keeps_duplicates_and_order() {
        let mut columns = TrendColumns::default();
        columns.update(&["p(99)", "avg", "p(99)"]);
        let labels: Vec<&str> = columns.iter().map(|column| column.label()).collect();
        assert_eq!(labels, vec!["p(99)", "avg", "p(99)"]);
    }

    #[test]
    fn update_percentile_stat() {
        let sink = trend_sink(100);
        let mut columns = TrendColumns::default();
        columns.update(&["p(99.9999)"]);
        assert_eq!(columns.len(), 1);
        assert_eq!(
            columns.get(0).unwrap().value(&sink),
            sink.p(99.9999 / 100.0)
        );
    }

    #[test]
    fn percentile_column() {
        let sink = trend_sink(100);
        let column = TrendColumn::parse("p(99)").unwrap();
        assert_eq!(column.value(&sink), sink.p(0.99));
        assert_ne!(column.value(&sink), sink.p(0.98));

        assert_eq!(TrendColumn::parse(""), Err(TrendStatError::EmptyString));
        assert_eq!(TrendColumn::parse("p90"), Err(TrendStatError::UnknownFormat));
        assert_eq!(TrendColumn::parse("p(90"), Err(TrendStatError::UnknownFormat));
        assert_eq!(
            TrendColumn::parse("p(a)"),
            Err(TrendStatError::PercentileInvalidValue)
        );
    }

    #[test]
    fn from_specs() {
        let columns = TrendColumns::from_specs(&["count".to_string()]);
        assert_eq!(columns.len(), 1);
        let fallback = TrendColumns::from_specs(&["bogus"]);
        assert_eq!(fallback, TrendColumns::default());
    }
}
