//! Re-exports the types needed to build metrics and render their summary.
//!
//! ```rust
//! use trend_summary::prelude::*;
//! ```

pub use crate::config::{SummaryConfiguration, SummaryOptions};
pub use crate::metrics::{Metric, MetricType, Metrics, TimeUnit, TrendStats, ValueType};
pub use crate::summary::SummaryWriter;
pub use crate::trend::{TrendColumn, TrendColumns, TrendStat, TrendStatError};
pub use crate::SummaryError;
