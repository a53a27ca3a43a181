//! Metrics collected during a load test, and the sinks that aggregate their samples.
//!
//! Every [`Metric`] has a [`MetricType`] which determines the [`Sink`] its samples are
//! added to:
//!  - [`CounterSink`]: a cumulative sum, for example the number of requests made.
//!  - [`GaugeSink`]: the most recent value, plus the smallest and largest ever seen.
//!  - [`RateSink`]: the share of samples that were non-zero, for example passed checks.
//!  - [`TrendSink`]: every sample, so averages and percentiles can be calculated.
//!
//! A metric's [`ValueType`] describes what the samples measure, and is used when
//! humanizing values for display.

use lazy_static::lazy_static;
use regex::{Regex, RegexSet};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::util;
use crate::SummaryError;

lazy_static! {
    static ref SUBMETRIC: Regex =
        Regex::new(r"^(?P<parent>[^{]+)\{(?P<suffix>.+)\}$").expect("failed to compile regex");
}

/// All metrics of a load test, keyed by metric name.
pub type Metrics = HashMap<String, Metric>;

/// The kind of a metric, selecting how its samples are aggregated.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    /// Samples are summed.
    Counter,
    /// Only the latest sample matters, along with the min and max seen.
    Gauge,
    /// Tracks the percentage of non-zero samples.
    Rate,
    /// Samples form a distribution, summarized with statistics.
    Trend,
}
impl MetricType {
    /// Lowercase name of the metric type.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Counter => "counter",
            MetricType::Gauge => "gauge",
            MetricType::Rate => "rate",
            MetricType::Trend => "trend",
        }
    }
}
impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the values of a metric measure.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// Plain numbers.
    Default,
    /// Durations in milliseconds.
    Time,
    /// Amounts of data in bytes.
    Data,
}
impl Default for ValueType {
    fn default() -> Self {
        ValueType::Default
    }
}
impl ValueType {
    /// Lowercase name of the value type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Default => "default",
            ValueType::Time => "time",
            ValueType::Data => "data",
        }
    }
}

/// A fixed unit for displaying time values, instead of automatic scaling.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum TimeUnit {
    Seconds,
    Milliseconds,
    Microseconds,
}
/// Allow `--summary-time-unit` from the command line using text variations on supported
/// `TimeUnit`s by implementing [`FromStr`].
impl FromStr for TimeUnit {
    type Err = SummaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let time_unit = RegexSet::new([
            r"(?i)^(s|sec|secs|second|seconds)$",
            r"(?i)^(ms|msec|millis|millisecond|milliseconds)$",
            r"(?i)^(us|µs|usec|micros|microsecond|microseconds)$",
        ])
        .expect("failed to compile time_unit RegexSet");
        let matches = time_unit.matches(s);
        if matches.matched(0) {
            Ok(TimeUnit::Seconds)
        } else if matches.matched(1) {
            Ok(TimeUnit::Milliseconds)
        } else if matches.matched(2) {
            Ok(TimeUnit::Microseconds)
        } else {
            Err(SummaryError::InvalidOption {
                option: "--summary-time-unit".to_string(),
                value: s.to_string(),
                detail: "Invalid time unit, expected: s, ms, or us".to_string(),
            })
        }
    }
}

/// The statistics a trend exposes to the summary.
///
/// Implemented by [`TrendSink`], and by any external statistics engine whose
/// results should be rendered.
pub trait TrendStats {
    /// Number of samples.
    fn count(&self) -> u64;
    /// Smallest sample, 0 if there are none.
    fn min(&self) -> f64;
    /// Largest sample, 0 if there are none.
    fn max(&self) -> f64;
    /// Arithmetic mean of all samples, 0 if there are none.
    fn avg(&self) -> f64;
    /// Median of all samples, 0 if there are none.
    fn med(&self) -> f64;
    /// Value at the given percentile, expressed as a fraction between 0 and 1.
    fn p(&self, fraction: f64) -> f64;
}

/// Sums all samples.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CounterSink {
    pub value: f64,
}
impl CounterSink {
    pub fn add(&mut self, value: f64) {
        self.value += value;
    }
}

/// Tracks the latest sample as well as the smallest and largest seen.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GaugeSink {
    pub value: f64,
    pub min: f64,
    pub max: f64,
    seen: bool,
}
impl GaugeSink {
    pub fn add(&mut self, value: f64) {
        if !self.seen || value < self.min {
            self.min = value;
        }
        if !self.seen || value > self.max {
            self.max = value;
        }
        self.value = value;
        self.seen = true;
    }
}

/// Counts how many samples were non-zero ("true").
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RateSink {
    pub trues: u64,
    pub total: u64,
}
impl RateSink {
    pub fn add(&mut self, value: f64) {
        self.total += 1;
        if value != 0.0 {
            self.trues += 1;
        }
    }

    /// Share of true samples between 0 and 1, or 0 if there are no samples.
    pub fn rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.trues as f64 / self.total as f64
        }
    }

    /// Number of samples that were zero ("false").
    pub fn falses(&self) -> u64 {
        self.total.saturating_sub(self.trues)
    }
}

/// Keeps every sample to answer statistical queries.
///
/// Samples are appended as they arrive and sorted once, by the first query after
/// the last [`add`](#method.add).
#[derive(Clone, Debug, Default)]
pub struct TrendSink {
    values: Vec<f64>,
    sum: f64,
    // Sorted copy of `values`, cleared by every add.
    sorted: OnceLock<Vec<f64>>,
}
impl TrendSink {
    pub fn add(&mut self, value: f64) {
        self.values.push(value);
        self.sum += value;
        self.sorted = OnceLock::new();
    }

    /// All samples, smallest first.
    pub fn values(&self) -> &[f64] {
        self.sorted.get_or_init(|| {
            let mut sorted = self.values.clone();
            sorted.sort_unstable_by(|a, b| a.total_cmp(b));
            sorted
        })
    }
}

/// Sinks are equal if they hold the same samples in the same order.
impl PartialEq for TrendSink {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl TrendStats for TrendSink {
    fn count(&self) -> u64 {
        self.values.len() as u64
    }

    fn min(&self) -> f64 {
        self.values().first().copied().unwrap_or(0.0)
    }

    fn max(&self) -> f64 {
        self.values().last().copied().unwrap_or(0.0)
    }

    fn avg(&self) -> f64 {
        if self.values.is_empty() {
            0.0
        } else {
            self.sum / self.values.len() as f64
        }
    }

    fn med(&self) -> f64 {
        let values = self.values();
        let count = values.len();
        match count {
            0 => 0.0,
            _ if count % 2 == 0 => (values[count / 2 - 1] + values[count / 2]) / 2.0,
            _ => values[count / 2],
        }
    }

    /// Interpolates linearly between the two closest ranks.
    fn p(&self, fraction: f64) -> f64 {
        let values = self.values();
        match values.len() {
            0 => 0.0,
            1 => values[0],
            count => {
                let rank = fraction.max(0.0).min(1.0) * (count as f64 - 1.0);
                let lower = values[rank.floor() as usize];
                let upper = values[rank.ceil() as usize];
                lower + (upper - lower) * (rank - rank.floor())
            }
        }
    }
}

/// The aggregator of a metric, matching its [`MetricType`].
#[derive(Clone, Debug, PartialEq)]
pub enum Sink {
    Counter(CounterSink),
    Gauge(GaugeSink),
    Rate(RateSink),
    Trend(TrendSink),
}
impl Sink {
    fn for_type(metric_type: MetricType) -> Self {
        match metric_type {
            MetricType::Counter => Sink::Counter(CounterSink::default()),
            MetricType::Gauge => Sink::Gauge(GaugeSink::default()),
            MetricType::Rate => Sink::Rate(RateSink::default()),
            MetricType::Trend => Sink::Trend(TrendSink::default()),
        }
    }

    pub fn add(&mut self, value: f64) {
        match self {
            Sink::Counter(sink) => sink.add(value),
            Sink::Gauge(sink) => sink.add(value),
            Sink::Rate(sink) => sink.add(value),
            Sink::Trend(sink) => sink.add(value),
        }
    }
}

/// A named metric and its aggregated samples.
#[derive(Clone, Debug, PartialEq)]
pub struct Metric {
    /// Unique name, for example `http_req_duration`, or `parent{tag:value}` for a
    /// sub-metric.
    pub name: String,
    pub metric_type: MetricType,
    /// What the values measure, used when humanizing them.
    pub contains: ValueType,
    pub sink: Sink,
    /// Threshold result: `None` if no threshold was evaluated, `Some(true)` if a
    /// threshold was crossed, `Some(false)` if all thresholds passed.
    pub tainted: Option<bool>,
}
impl Metric {
    /// Create a metric with an empty sink of the matching type.
    pub fn new(name: &str, metric_type: MetricType) -> Self {
        Metric {
            name: name.to_string(),
            metric_type,
            contains: ValueType::Default,
            sink: Sink::for_type(metric_type),
            tainted: None,
        }
    }

    pub fn with_contains(mut self, contains: ValueType) -> Self {
        self.contains = contains;
        self
    }

    pub fn with_tainted(mut self, tainted: bool) -> Self {
        self.tainted = Some(tainted);
        self
    }

    /// Add a sample to the metric's sink.
    pub fn add(&mut self, value: f64) {
        self.sink.add(value);
    }

    /// Splits a sub-metric name such as `http_req_duration{status:200}` into its parent
    /// name and its suffix. Returns `None` for top-level metrics.
    pub fn submetric(&self) -> Option<(&str, &str)> {
        SUBMETRIC.captures(&self.name).and_then(|captures| {
            match (captures.name("parent"), captures.name("suffix")) {
                (Some(parent), Some(suffix)) => Some((parent.as_str(), suffix.as_str())),
                _ => None,
            }
        })
    }

    /// Format a value of this metric for display.
    ///
    /// Rates are shown as percentages. Otherwise time values are shown as durations
    /// (in the configured unit, if any), data values in bytes, and anything else as
    /// a plain number.
    pub fn humanize_value(&self, value: f64, time_unit: Option<TimeUnit>) -> String {
        if self.metric_type == MetricType::Rate {
            return util::format_percent(value);
        }
        match self.contains {
            ValueType::Time => {
                let nanos = util::millis_to_nanos(value);
                match time_unit {
                    Some(TimeUnit::Seconds) => format!("{:.2}s", nanos as f64 / 1e9),
                    Some(TimeUnit::Milliseconds) => format!("{:.2}ms", nanos as f64 / 1e6),
                    Some(TimeUnit::Microseconds) => format!("{:.2}µs", nanos as f64 / 1e3),
                    None => util::format_duration(nanos),
                }
            }
            ValueType::Data => util::format_bytes(value),
            ValueType::Default => util::format_number(value),
        }
    }
}
