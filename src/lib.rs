//! # Trend Summary
//!
//! Renders the human-readable summary printed at the end of a load test.
//!
//! A load test collects named [`Metric`](./metrics/struct.Metric.html)s of four kinds:
//! counters, gauges, rates and trends. When the test completes, the
//! [`SummaryWriter`](./summary/struct.SummaryWriter.html) turns them into an aligned,
//! unit-annotated text report, one line per metric:
//!
//! ```text
//!  ✓ checks......: 100.00% ✓ 3   ✗ 0
//!  ✗ http_reqs...: 3       3/s
//!    my_trend....: avg=15ms min=10ms med=15ms max=20ms p(90)=19ms p(95)=19.5ms
//!    vus.........: 1       min=1 max=1
//! ```
//!
//! Which statistics are shown for trend metrics is configurable through
//! [`TrendColumns`](./trend/struct.TrendColumns.html), built from specifier strings such
//! as `avg`, `med`, `count` or `p(99.9)`.
//!
//! ## Rendering a summary
//!
//! ```rust
//! use std::collections::HashMap;
//! use std::time::Duration;
//!
//! use trend_summary::prelude::*;
//!
//! fn main() -> Result<(), SummaryError> {
//!     let mut metrics: Metrics = HashMap::new();
//!
//!     let mut duration = Metric::new("req_duration", MetricType::Trend).with_contains(ValueType::Time);
//!     for value in &[10.0, 15.0, 20.0] {
//!         duration.add(*value);
//!     }
//!     metrics.insert(duration.name.clone(), duration);
//!
//!     let mut columns = TrendColumns::default();
//!     columns.update(&["avg", "p(90)"]);
//!
//!     let mut output = Vec::new();
//!     SummaryWriter::new(columns).write(&mut output, " ", Duration::from_secs(1), None, &metrics)?;
//!
//!     assert_eq!(
//!         String::from_utf8(output).unwrap(),
//!         "   req_duration...: avg=15ms p(90)=19ms\n"
//!     );
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Run-time options
//!
//! A [`SummaryConfiguration`](./config/struct.SummaryConfiguration.html) can be parsed
//! from command line flags (`--summary-trend-stats`, `--summary-time-unit`, `--no-color`,
//! `--summary-export`) and validated into the options used by [`summarize`].
//!
//! ## License
//!
//! Copyright 2020-21 Jeremy Andrews
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! you may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//! <http://www.apache.org/licenses/LICENSE-2.0>
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

#[macro_use]
extern crate log;

pub mod config;
pub mod export;
pub mod logger;
pub mod metrics;
pub mod prelude;
pub mod summary;
pub mod trend;
pub mod util;

use num_format::{Locale, ToFormattedString};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::{fmt, time};

use crate::config::SummaryConfiguration;
use crate::metrics::Metrics;
use crate::summary::SummaryWriter;
use crate::trend::TrendStatError;

/// An enumeration of all errors the summary renderer can return.
#[derive(Debug)]
pub enum SummaryError {
    /// Wraps a [`std::io::Error`](https://doc.rust-lang.org/std/io/struct.Error.html).
    Io(io::Error),
    /// Wraps a [`serde_json::Error`](https://docs.rs/serde_json/*/serde_json/struct.Error.html).
    Json(serde_json::Error),
    /// Invalid option or value specified, may only be invalid in context.
    InvalidOption {
        /// The invalid option that caused this error, may be only invalid in context.
        option: String,
        /// The invalid value that caused this error, may be only invalid in context.
        value: String,
        /// An optional explanation of the error.
        detail: String,
    },
    /// A trend statistic specifier could not be parsed.
    InvalidTrendStat {
        /// The specifier that failed to parse.
        stat: String,
        /// Why the specifier was rejected.
        source: TrendStatError,
    },
}
/// Implement a helper to provide a text description of all possible types of errors.
impl SummaryError {
    fn describe(&self) -> &str {
        match *self {
            SummaryError::Io(_) => "io::Error",
            SummaryError::Json(_) => "serde_json::Error",
            SummaryError::InvalidOption { .. } => "invalid option or value specified",
            SummaryError::InvalidTrendStat { .. } => "invalid trend statistic specified",
        }
    }
}

/// Implement format trait to allow displaying errors.
impl fmt::Display for SummaryError {
    // Implement display of error with `{}` marker.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            SummaryError::Io(ref source) => {
                write!(f, "SummaryError: {} ({})", self.describe(), source)
            }
            SummaryError::Json(ref source) => {
                write!(f, "SummaryError: {} ({})", self.describe(), source)
            }
            SummaryError::InvalidOption {
                ref option,
                ref value,
                ref detail,
            } => write!(
                f,
                "SummaryError: {} ({} = {:?}: {})",
                self.describe(),
                option,
                value,
                detail
            ),
            SummaryError::InvalidTrendStat {
                ref stat,
                ref source,
            } => write!(
                f,
                "SummaryError: {} ({:?}: {})",
                self.describe(),
                stat,
                source
            ),
        }
    }
}

// Define the lower level source of this error, if any.
impl std::error::Error for SummaryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            SummaryError::Io(ref source) => Some(source),
            SummaryError::Json(ref source) => Some(source),
            SummaryError::InvalidTrendStat { ref source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Auto-convert IO errors.
impl From<io::Error> for SummaryError {
    fn from(err: io::Error) -> SummaryError {
        SummaryError::Io(err)
    }
}

/// Auto-convert serde_json errors.
impl From<serde_json::Error> for SummaryError {
    fn from(err: serde_json::Error) -> SummaryError {
        SummaryError::Json(err)
    }
}

/// Validates the configuration, prints the end-of-run summary to stdout and, if
/// `--summary-export` was set, writes the JSON export.
///
/// # Example
/// ```rust
/// use gumdrop::Options;
/// use std::collections::HashMap;
/// use std::time::Duration;
///
/// use trend_summary::prelude::*;
///
/// fn main() -> Result<(), SummaryError> {
///     let configuration =
///         SummaryConfiguration::parse_args_default(&["--summary-trend-stats", "avg,p(95)"])
///             .expect("failed to parse options");
///
///     let mut vus = Metric::new("vus", MetricType::Gauge);
///     vus.add(1.0);
///     let mut metrics: Metrics = HashMap::new();
///     metrics.insert(vus.name.clone(), vus);
///
///     trend_summary::summarize(&configuration, Duration::from_secs(10), &metrics)
/// }
/// ```
pub fn summarize(
    configuration: &SummaryConfiguration,
    duration: time::Duration,
    metrics: &Metrics,
) -> Result<(), SummaryError> {
    let options = configuration.validate()?;

    info!(
        "printing summary of {} metrics after {} seconds...",
        metrics.len().to_formatted_string(&Locale::en),
        duration.as_secs().to_formatted_string(&Locale::en)
    );

    let writer = SummaryWriter::new(options.trend_columns.clone()).with_colors(options.colors);
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writer.write(
        &mut handle,
        &options.indent,
        duration,
        options.time_unit,
        metrics,
    )?;
    handle.flush()?;

    if let Some(path) = options.export_path.as_ref() {
        let mut file = BufWriter::new(File::create(path)?);
        export::write_json(&mut file, duration, &options.trend_columns, metrics)?;
        file.flush()?;
        info!("wrote summary export to {}", path.display());
    }

    Ok(())
}
