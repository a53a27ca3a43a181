//! Writes the human-readable summary of all metrics at the end of a load test.
//!
//! Each metric is written on its own line, sorted by name:
//!
//! ```text
//!  ✓ checks.........: 100.00% ✓ 3     ✗ 0
//!    data_received..: 1.2 kB  1.2 kB/s
//!  ✗ http_reqs......: 3       3/s
//!    my_trend.......: avg=15ms min=10ms med=15ms max=20ms p(90)=19ms p(95)=19.5ms
//!    vus............: 1       min=1   max=1
//! ```
//!
//! A line starts with the configured indent and a glyph showing the threshold result
//! of the metric (`✓` passed, `✗` failed, blank if no threshold was evaluated). Names
//! are padded with dots to line up, followed by a body that depends on the metric type:
//!  - counters: the total and the total per second of test duration.
//!  - gauges: the latest value, and the smallest and largest values seen.
//!  - rates: the percentage of true samples, and the number of true and false samples.
//!  - trends: one `label=value` pair per configured [`TrendColumn`](../trend/struct.TrendColumn.html).

use console::{Color, Style};
use itertools::Itertools;
use std::collections::HashMap;
use std::io::Write;
use std::time;

use crate::metrics::{Metric, Metrics, Sink, TimeUnit};
use crate::trend::{FixedStat, TrendColumns, TrendStat};
use crate::util;
use crate::SummaryError;

/// Glyph for passed thresholds and true rate samples.
pub const SUCCESS_MARK: &str = "✓";
/// Glyph for failed thresholds and false rate samples.
pub const FAIL_MARK: &str = "✗";

/// Threshold status shown in front of a metric.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Mark {
    /// No threshold was evaluated.
    Blank,
    Success,
    Fail,
}
impl Mark {
    /// A tainted metric crossed one of its thresholds.
    pub fn for_tainted(tainted: Option<bool>) -> Self {
        match tainted {
            None => Mark::Blank,
            Some(true) => Mark::Fail,
            Some(false) => Mark::Success,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mark::Blank => " ",
            Mark::Success => SUCCESS_MARK,
            Mark::Fail => FAIL_MARK,
        }
    }
}

/// The humanized body of a metric line, before alignment.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MetricValue {
    /// One value per trend column, in column order.
    Trend(Vec<String>),
    /// A headline value followed by extra annotations.
    Scalar { value: String, extras: Vec<String> },
}

/// Humanize the values shown for a metric.
///
/// # Example
/// ```rust
/// use std::time::Duration;
///
/// use trend_summary::metrics::{Metric, MetricType};
/// use trend_summary::summary::{render_value, MetricValue};
/// use trend_summary::trend::TrendColumns;
///
/// let mut requests = Metric::new("http_reqs", MetricType::Counter);
/// requests.add(10.0);
///
/// assert_eq!(
///     render_value(&requests, Duration::from_secs(4), None, &TrendColumns::default()),
///     MetricValue::Scalar {
///         value: "10".to_string(),
///         extras: vec!["2.5/s".to_string()],
///     }
/// );
/// ```
pub fn render_value(
    metric: &Metric,
    duration: time::Duration,
    time_unit: Option<TimeUnit>,
    columns: &TrendColumns,
) -> MetricValue {
    let humanize = |value: f64| metric.humanize_value(value, time_unit);
    match &metric.sink {
        Sink::Trend(sink) => MetricValue::Trend(
            columns
                .iter()
                .map(|column| match column.stat() {
                    // Counts are plain numbers whatever the metric contains.
                    TrendStat::Fixed(FixedStat::Count) => util::format_number(column.value(sink)),
                    _ => humanize(column.value(sink)),
                })
                .collect(),
        ),
        Sink::Counter(sink) => {
            let seconds = duration.as_secs_f64();
            let rate = if seconds > 0.0 {
                sink.value / seconds
            } else {
                0.0
            };
            MetricValue::Scalar {
                value: humanize(sink.value),
                extras: vec![format!("{}/s", humanize(rate))],
            }
        }
        Sink::Gauge(sink) => MetricValue::Scalar {
            value: humanize(sink.value),
            extras: vec![
                format!("min={}", humanize(sink.min)),
                format!("max={}", humanize(sink.max)),
            ],
        },
        Sink::Rate(sink) => MetricValue::Scalar {
            value: humanize(sink.rate()),
            extras: vec![
                format!("{} {}", SUCCESS_MARK, sink.trues),
                format!("{} {}", FAIL_MARK, sink.falses()),
            ],
        },
    }
}

/// Name shown for a metric: sub-metrics only show their tag, as `{ tag:value }`.
pub fn display_name(metric: &Metric) -> String {
    match metric.submetric() {
        Some((_, suffix)) => format!("{{ {} }}", suffix),
        None => metric.name.clone(),
    }
}

/// Extra indentation of a metric: sub-metrics are nested below their parent.
pub fn indent_for(metric: &Metric) -> &'static str {
    if metric.submetric().is_some() {
        "  "
    } else {
        ""
    }
}

/// Applies terminal colors, or leaves text untouched when colors are disabled.
#[derive(Clone, Copy, Debug)]
struct Palette {
    enabled: bool,
}
impl Palette {
    fn paint(&self, text: &str, style: Style) -> String {
        if self.enabled {
            style.force_styling(true).apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn mark(&self, mark: Mark) -> String {
        match mark {
            Mark::Blank => mark.as_str().to_string(),
            Mark::Success => self.paint(mark.as_str(), Style::new().fg(Color::Green)),
            Mark::Fail => self.paint(mark.as_str(), Style::new().fg(Color::Red)),
        }
    }

    fn gray(&self, text: &str) -> String {
        self.paint(text, Style::new().fg(Color::Black).bright())
    }

    fn value(&self, text: &str) -> String {
        self.paint(text, Style::new().fg(Color::Cyan))
    }
}

/// Column widths shared by all lines of one summary.
#[derive(Debug, Default)]
struct Layout {
    name_width: usize,
    value_width: usize,
    extra_widths: Vec<usize>,
    column_widths: Vec<usize>,
}
impl Layout {
    fn widen(widths: &mut Vec<usize>, index: usize, text: &str) {
        if widths.len() <= index {
            widths.resize(index + 1, 0);
        }
        widths[index] = widths[index].max(util::display_width(text));
    }
}

/// Writes the end-of-run summary using a configured set of trend columns.
///
/// # Example
/// ```rust
/// use std::collections::HashMap;
/// use std::time::Duration;
///
/// use trend_summary::metrics::{Metric, MetricType, Metrics};
/// use trend_summary::summary::SummaryWriter;
/// use trend_summary::trend::TrendColumns;
///
/// let mut vus = Metric::new("vus", MetricType::Gauge);
/// vus.add(5.0);
/// vus.add(2.0);
/// let mut metrics: Metrics = HashMap::new();
/// metrics.insert(vus.name.clone(), vus);
///
/// let mut output = Vec::new();
/// SummaryWriter::new(TrendColumns::default())
///     .write(&mut output, "", Duration::from_secs(1), None, &metrics)
///     .unwrap();
/// assert_eq!(String::from_utf8(output).unwrap(), "  vus...: 2 min=2 max=5\n");
/// ```
#[derive(Clone, Debug)]
pub struct SummaryWriter {
    columns: TrendColumns,
    colors: bool,
}
impl SummaryWriter {
    /// A writer rendering trends with the given columns, without colors.
    pub fn new(columns: TrendColumns) -> Self {
        SummaryWriter {
            columns,
            colors: false,
        }
    }

    /// Enable or disable terminal colors.
    pub fn with_colors(mut self, colors: bool) -> Self {
        self.colors = colors;
        self
    }

    pub fn columns(&self) -> &TrendColumns {
        &self.columns
    }

    /// Write one line per metric, sorted by metric name.
    ///
    /// `duration` is how long the test ran, used for per-second rates. If `time_unit`
    /// is set, time values are displayed in that unit instead of being scaled
    /// automatically. Only errors writing to `w` are returned.
    pub fn write<W: Write>(
        &self,
        w: &mut W,
        indent: &str,
        duration: time::Duration,
        time_unit: Option<TimeUnit>,
        metrics: &Metrics,
    ) -> Result<(), SummaryError> {
        Summary {
            w,
            columns: &self.columns,
            palette: Palette {
                enabled: self.colors,
            },
            indent,
            duration,
            time_unit,
            metrics,
        }
        .write()
    }
}

struct Summary<'m, 'w, W: Write> {
    w: &'w mut W,
    columns: &'m TrendColumns,
    palette: Palette,
    indent: &'m str,
    duration: time::Duration,
    time_unit: Option<TimeUnit>,
    metrics: &'m Metrics,
}

impl<'m, W: Write> Summary<'m, '_, W> {
    fn write(mut self) -> Result<(), SummaryError> {
        debug!(
            "writing summary of {} metrics with {} trend columns",
            self.metrics.len(),
            self.columns.len()
        );
        let (values, layout) = self.prepare();

        let metrics = self.metrics;
        for name in metrics.keys().sorted() {
            let metric = &metrics[name];
            if let Some(value) = values.get(name.as_str()) {
                self.write_metric(metric, value, &layout)?;
            }
        }

        Ok(())
    }

    // Humanize every metric and measure the widest name, value, extra and column.
    fn prepare(&self) -> (HashMap<&'m str, MetricValue>, Layout) {
        let mut layout = Layout::default();
        let mut values = HashMap::with_capacity(self.metrics.len());

        for (name, metric) in self.metrics {
            let name_width = util::display_width(&display_name(metric))
                + util::display_width(indent_for(metric));
            layout.name_width = layout.name_width.max(name_width);

            let value = render_value(metric, self.duration, self.time_unit, self.columns);
            match &value {
                MetricValue::Trend(cols) => {
                    for (index, col) in cols.iter().enumerate() {
                        Layout::widen(&mut layout.column_widths, index, col);
                    }
                }
                MetricValue::Scalar { value, extras } => {
                    layout.value_width = layout.value_width.max(util::display_width(value));
                    // A single extra is never aligned.
                    if extras.len() > 1 {
                        for (index, extra) in extras.iter().enumerate() {
                            Layout::widen(&mut layout.extra_widths, index, extra);
                        }
                    }
                }
            }
            values.insert(name.as_str(), value);
        }

        (values, layout)
    }

    fn write_metric(
        &mut self,
        metric: &Metric,
        value: &MetricValue,
        layout: &Layout,
    ) -> Result<(), SummaryError> {
        let name = display_name(metric);
        let nested = indent_for(metric);
        let dots = layout.name_width + 3
            - util::display_width(&name)
            - util::display_width(nested);

        let body = match value {
            MetricValue::Trend(cols) => self
                .columns
                .iter()
                .zip(cols)
                .enumerate()
                .map(|(index, (column, col))| {
                    format!(
                        "{}={}{}",
                        column.label(),
                        self.palette.value(col),
                        padding(layout.column_widths.get(index), col)
                    )
                })
                .join(" "),
            MetricValue::Scalar { value, extras } => {
                let mut body = format!(
                    "{}{}",
                    self.palette.value(value),
                    padding(Some(&layout.value_width), value)
                );
                match extras.len() {
                    0 => (),
                    1 => {
                        body.push(' ');
                        body.push_str(&self.palette.gray(&extras[0]));
                    }
                    _ => {
                        let aligned = extras
                            .iter()
                            .enumerate()
                            .map(|(index, extra)| {
                                format!(
                                    "{}{}",
                                    self.palette.gray(extra),
                                    padding(layout.extra_widths.get(index), extra)
                                )
                            })
                            .join(" ");
                        body.push(' ');
                        body.push_str(&aligned);
                    }
                }
                body
            }
        };

        write!(
            self.w,
            "{}{}{} {}{}",
            self.indent,
            nested,
            self.palette.mark(Mark::for_tainted(metric.tainted)),
            name,
            self.palette.gray(&format!("{}:", ".".repeat(dots))),
        )?;
        // No trailing space after the colon when there is nothing to show.
        if body.is_empty() {
            writeln!(self.w)?;
        } else {
            writeln!(self.w, " {}", body)?;
        }

        Ok(())
    }
}

// Spaces needed to widen `text` to `width`.
fn padding(width: Option<&usize>, text: &str) -> String {
    let width = width.copied().unwrap_or(0);
    " ".repeat(width.saturating_sub(util::display_width(text)))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::metrics::{MetricType, ValueType};

    fn write(metrics: &Metrics, columns: TrendColumns) -> String {
        let mut output = Vec::new();
        SummaryWriter::new(columns)
            .write(&mut output, " ", time::Duration::from_secs(1), None, metrics)
            .unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn marks() {
        assert_eq!(Mark::for_tainted(None), Mark::Blank);
        assert_eq!(Mark::for_tainted(Some(true)), Mark::Fail);
        assert_eq!(Mark::for_tainted(Some(false)), Mark::Success);
        assert_eq!(Mark::Blank.as_str(), " ");
        assert_eq!(Mark::Success.as_str(), "✓");
        assert_eq!(Mark::Fail.as_str(), "✗");
    }

    #[test]
    fn counter_rate_without_duration() {
        let mut metric = Metric::new("iterations", MetricType::Counter);
        metric.add(7.0);
        assert_eq!(
            render_value(
                &metric,
                time::Duration::from_secs(0),
                None,
                &TrendColumns::default()
            ),
            MetricValue::Scalar {
                value: "7".to_string(),
                extras: vec!["0/s".to_string()],
            }
        );
    }

    #[test]
    fn empty_rate() {
        let metric = Metric::new("checks", MetricType::Rate);
        assert_eq!(
            render_value(
                &metric,
                time::Duration::from_secs(1),
                None,
                &TrendColumns::default()
            ),
            MetricValue::Scalar {
                value: "0.00%".to_string(),
                extras: vec!["✓ 0".to_string(), "✗ 0".to_string()],
            }
        );
    }

    #[test]
    fn empty_trend() {
        let metric = Metric::new("t", MetricType::Trend).with_contains(ValueType::Time);
        let mut columns = TrendColumns::default();
        columns.update(&["avg", "count", "p(99)"]);
        assert_eq!(
            render_value(&metric, time::Duration::from_secs(1), None, &columns),
            MetricValue::Trend(vec!["0s".to_string(), "0".to_string(), "0s".to_string()])
        );
    }

    #[test]
    fn data_counter() {
        let mut metric =
            Metric::new("data_received", MetricType::Counter).with_contains(ValueType::Data);
        metric.add(4_000.0);
        assert_eq!(
            render_value(
                &metric,
                time::Duration::from_secs(2),
                None,
                &TrendColumns::default()
            ),
            MetricValue::Scalar {
                value: "4.0 kB".to_string(),
                extras: vec!["2.0 kB/s".to_string()],
            }
        );
    }

    #[test]
    fn empty_summary() {
        assert_eq!(write(&HashMap::new(), TrendColumns::default()), "");
    }

    #[test]
    fn submetrics() {
        let mut metrics: Metrics = HashMap::new();
        for name in &["http_req_duration", "http_req_duration{status:200}"] {
            let mut metric = Metric::new(name, MetricType::Trend).with_contains(ValueType::Time);
            metric.add(100.0);
            metrics.insert(metric.name.clone(), metric);
        }
        let mut columns = TrendColumns::default();
        columns.update(&["max"]);

        assert_eq!(display_name(&metrics["http_req_duration{status:200}"]), "{ status:200 }");
        assert_eq!(
            write(&metrics, columns),
            concat!(
                "   http_req_duration...: max=100ms\n",
                "     { status:200 }....: max=100ms\n",
            )
        );
    }

    #[test]
    fn trend_columns_align() {
        let mut metrics: Metrics = HashMap::new();
        let mut fast = Metric::new("fast", MetricType::Trend).with_contains(ValueType::Time);
        fast.add(5.0);
        let mut slow = Metric::new("slow", MetricType::Trend).with_contains(ValueType::Time);
        slow.add(1_250.0);
        metrics.insert(fast.name.clone(), fast);
        metrics.insert(slow.name.clone(), slow);

        let mut columns = TrendColumns::default();
        columns.update(&["avg", "count"]);

        assert_eq!(
            write(&metrics, columns),
            concat!(
                "   fast...: avg=5ms   count=1\n",
                "   slow...: avg=1.25s count=1\n",
            )
        );
    }

    #[test]
    fn no_trend_columns() {
        let mut metrics: Metrics = HashMap::new();
        let mut trend = Metric::new("my_trend", MetricType::Trend).with_contains(ValueType::Time);
        trend.add(10.0);
        metrics.insert(trend.name.clone(), trend);
        let mut vus = Metric::new("vus", MetricType::Gauge);
        vus.add(1.0);
        metrics.insert(vus.name.clone(), vus);

        assert_eq!(
            write(&metrics, TrendColumns::from_columns(vec![])),
            concat!("   my_trend...:\n", "   vus........: 1 min=1 max=1\n")
        );
    }

    #[test]
    fn colors() {
        let mut metrics: Metrics = HashMap::new();
        let mut vus = Metric::new("vus", MetricType::Gauge).with_tainted(false);
        vus.add(1.0);
        metrics.insert(vus.name.clone(), vus);

        let mut output = Vec::new();
        SummaryWriter::new(TrendColumns::default())
            .with_colors(true)
            .write(&mut output, "", time::Duration::from_secs(1), None, &metrics)
            .unwrap();
        let output = String::from_utf8(output).unwrap();

        assert!(output.contains('\u{1b}'));
        assert_eq!(
            console::strip_ansi_codes(&output),
            "✓ vus...: 1 min=1 max=1\n"
        );
    }
}
