use gumdrop::Options;
use std::collections::HashMap;
use std::time::Duration;

use trend_summary::config::{SummaryConfiguration, SummaryOptions};
use trend_summary::metrics::{Metric, MetricType, Metrics, ValueType};
use trend_summary::summary::SummaryWriter;

/// Not all functions are used by all tests, so we enable allow(dead_code) to avoid
/// compiler warnings during testing.

/// The following options are configured by default, if not set to a custom value:
///  --no-color
pub fn build_configuration(custom: Vec<&str>) -> SummaryConfiguration {
    // Start with an empty configuration.
    let mut configuration: Vec<&str> = vec![];

    // Merge in all custom options first.
    configuration.extend_from_slice(&custom);

    // Tests compare plain text.
    if !configuration.contains(&"--no-color") {
        configuration.push("--no-color");
    }

    // Parse these options to generate a SummaryConfiguration.
    SummaryConfiguration::parse_args_default(&configuration)
        .expect("failed to parse options and generate a configuration")
}

/// Validate a configuration built from the given options.
#[allow(dead_code)]
pub fn build_options(custom: Vec<&str>) -> SummaryOptions {
    build_configuration(custom)
        .validate()
        .expect("failed to validate configuration")
}

/// Metrics of a short load test:
///  - `checks`: a rate with 3 passing samples, thresholds passed.
///  - `http_reqs`: a counter of 3 requests, thresholds failed.
///  - `my_trend`: a time trend of 10ms, 15ms and 20ms.
///  - `vus`: a gauge set to 1.
#[allow(dead_code)]
pub fn create_test_metrics() -> Metrics {
    let mut checks = Metric::new("checks", MetricType::Rate).with_tainted(false);
    let mut http_reqs = Metric::new("http_reqs", MetricType::Counter).with_tainted(true);
    for _ in 0..3 {
        checks.add(1.0);
        http_reqs.add(1.0);
    }

    let mut my_trend = Metric::new("my_trend", MetricType::Trend).with_contains(ValueType::Time);
    for value in &[10.0, 15.0, 20.0] {
        my_trend.add(*value);
    }

    let mut vus = Metric::new("vus", MetricType::Gauge);
    vus.add(1.0);

    let mut metrics: Metrics = HashMap::new();
    for metric in vec![checks, http_reqs, my_trend, vus] {
        metrics.insert(metric.name.clone(), metric);
    }
    metrics
}

/// Render metrics to a string as a one second test would, with a single space indent.
#[allow(dead_code)]
pub fn render(options: &SummaryOptions, metrics: &Metrics) -> String {
    let mut output = Vec::new();
    SummaryWriter::new(options.trend_columns.clone())
        .with_colors(options.colors)
        .write(
            &mut output,
            &options.indent,
            Duration::from_secs(1),
            options.time_unit,
            metrics,
        )
        .expect("failed to write summary");
    String::from_utf8(output).expect("summary is not valid UTF-8")
}
