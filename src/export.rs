//! Machine-readable export of the end-of-run summary.
//!
//! The export holds the same values as the text summary, unformatted, as a JSON
//! document:
//!
//! ```json
//! {
//!   "duration_secs": 1.0,
//!   "generated_at": "2021-05-12T10:15:00.000000000+00:00",
//!   "metrics": {
//!     "http_reqs": {
//!       "contains": "default",
//!       "count": 3.0,
//!       "rate": 3.0,
//!       "thresholds_failed": true,
//!       "type": "counter"
//!     }
//!   }
//! }
//! ```
//!
//! Trend metrics have one entry per configured trend column, keyed by its label.

use chrono::prelude::*;
use serde_json::{json, Map, Value};
use std::io::Write;
use std::time;

use crate::metrics::{Metric, Metrics, Sink};
use crate::trend::TrendColumns;
use crate::SummaryError;

/// The values of one metric, keyed by statistic.
pub fn metric_values(metric: &Metric, duration: time::Duration, columns: &TrendColumns) -> Value {
    let mut values = Map::new();
    values.insert("type".to_string(), json!(metric.metric_type));
    values.insert("contains".to_string(), json!(metric.contains));
    values.insert("thresholds_failed".to_string(), json!(metric.tainted));

    match &metric.sink {
        Sink::Counter(sink) => {
            let seconds = duration.as_secs_f64();
            let rate = if seconds > 0.0 {
                sink.value / seconds
            } else {
                0.0
            };
            values.insert("count".to_string(), json!(sink.value));
            values.insert("rate".to_string(), json!(rate));
        }
        Sink::Gauge(sink) => {
            values.insert("value".to_string(), json!(sink.value));
            values.insert("min".to_string(), json!(sink.min));
            values.insert("max".to_string(), json!(sink.max));
        }
        Sink::Rate(sink) => {
            values.insert("rate".to_string(), json!(sink.rate()));
            values.insert("passes".to_string(), json!(sink.trues));
            values.insert("fails".to_string(), json!(sink.falses()));
        }
        Sink::Trend(sink) => {
            for column in columns {
                values.insert(column.label().to_string(), json!(column.value(sink)));
            }
        }
    }

    Value::Object(values)
}

/// Build the complete export document.
pub fn summary_json(duration: time::Duration, columns: &TrendColumns, metrics: &Metrics) -> Value {
    let metrics: Map<String, Value> = metrics
        .iter()
        .map(|(name, metric)| (name.clone(), metric_values(metric, duration, columns)))
        .collect();

    json!({
        "generated_at": Utc::now().to_rfc3339(),
        "duration_secs": duration.as_secs_f64(),
        "metrics": metrics,
    })
}

/// Write the export document as pretty-printed JSON.
pub fn write_json<W: Write>(
    w: &mut W,
    duration: time::Duration,
    columns: &TrendColumns,
    metrics: &Metrics,
) -> Result<(), SummaryError> {
    serde_json::to_writer_pretty(&mut *w, &summary_json(duration, columns, metrics))?;
    writeln!(w)?;
    debug!("exported {} metrics", metrics.len());

    Ok(())
}
