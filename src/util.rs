//! Utility functions used to humanize values in the summary, and available to callers
//! building their own reports.

/// Units used when scaling byte counts, in steps of 1000.
const BYTE_SIZES: [&str; 7] = ["B", "kB", "MB", "GB", "TB", "PB", "EB"];

const NANOS_PER_MICRO: u64 = 1_000;
const NANOS_PER_MILLI: u64 = 1_000_000;
const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Convert a number of milliseconds into whole nanoseconds, truncating toward zero.
///
/// Values outside the range of an `i64` saturate.
///
/// # Example
/// ```rust
/// use trend_summary::util;
///
/// assert_eq!(util::millis_to_nanos(19.5), 19_500_000);
/// assert_eq!(util::millis_to_nanos(-1.0), -1_000_000);
/// ```
pub fn millis_to_nanos(millis: f64) -> i64 {
    (millis * NANOS_PER_MILLI as f64) as i64
}

/// Format a duration given in nanoseconds, picking the largest sensible unit.
///
/// Durations under a second are displayed in `ns`, `µs` or `ms`. Longer durations
/// are split into hours, minutes and seconds. Fractions are printed without
/// trailing zeros.
///
/// # Example
/// ```rust
/// use trend_summary::util;
///
/// assert_eq!(util::format_duration(0), "0s");
/// assert_eq!(util::format_duration(15_000_000), "15ms");
/// assert_eq!(util::format_duration(19_500_000), "19.5ms");
/// assert_eq!(util::format_duration(1_500), "1.5µs");
/// assert_eq!(util::format_duration(90_500_000_000), "1m30.5s");
/// assert_eq!(util::format_duration(3_600_000_000_000), "1h0m0s");
/// ```
pub fn format_duration(nanos: i64) -> String {
    if nanos == 0 {
        return "0s".to_string();
    }
    let sign = if nanos < 0 { "-" } else { "" };
    let nanos = nanos.unsigned_abs();

    if nanos < NANOS_PER_SECOND {
        let (divisor, precision, unit) = if nanos < NANOS_PER_MICRO {
            (1, 0, "ns")
        } else if nanos < NANOS_PER_MILLI {
            (NANOS_PER_MICRO, 3, "µs")
        } else {
            (NANOS_PER_MILLI, 6, "ms")
        };
        return format!(
            "{}{}{}{}",
            sign,
            nanos / divisor,
            fraction(nanos % divisor, precision),
            unit
        );
    }

    let total_seconds = nanos / NANOS_PER_SECOND;
    let seconds = format!(
        "{}{}s",
        total_seconds % 60,
        fraction(nanos % NANOS_PER_SECOND, 9)
    );
    let minutes = total_seconds / 60 % 60;
    let hours = total_seconds / 3600;
    if hours > 0 {
        format!("{}{}h{}m{}", sign, hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}{}m{}", sign, minutes, seconds)
    } else {
        format!("{}{}", sign, seconds)
    }
}

// Fractional part of a value as ".ddd", without trailing zeros. Empty if zero.
fn fraction(remainder: u64, precision: usize) -> String {
    if remainder == 0 || precision == 0 {
        return String::new();
    }
    let digits = format!("{:0width$}", remainder, width = precision);
    format!(".{}", digits.trim_end_matches('0'))
}

/// Format a number of bytes in SI units (powers of 1000).
///
/// Values below 10 bytes are shown as is, larger values are rounded to one
/// decimal while below 10 of the chosen unit, and to a whole number above.
///
/// # Example
/// ```rust
/// use trend_summary::util;
///
/// assert_eq!(util::format_bytes(0.0), "0 B");
/// assert_eq!(util::format_bytes(999.0), "999 B");
/// assert_eq!(util::format_bytes(1_234.0), "1.2 kB");
/// assert_eq!(util::format_bytes(12_345_678.0), "12 MB");
/// ```
pub fn format_bytes(bytes: f64) -> String {
    // Negative and NaN values saturate to zero.
    let bytes = bytes as u64;
    if bytes < 10 {
        return format!("{} B", bytes);
    }
    let exponent = ((bytes as f64).ln() / 1000_f64.ln()).floor() as usize;
    let exponent = exponent.min(BYTE_SIZES.len() - 1);
    let value = (bytes as f64 / 1000_f64.powi(exponent as i32) * 10.0 + 0.5).floor() / 10.0;
    if value < 10.0 {
        format!("{:.1} {}", value, BYTE_SIZES[exponent])
    } else {
        format!("{:.0} {}", value, BYTE_SIZES[exponent])
    }
}

/// Format a plain number with up to six decimals, stripping trailing zeros.
///
/// # Example
/// ```rust
/// use trend_summary::util;
///
/// assert_eq!(util::format_number(3.0), "3");
/// assert_eq!(util::format_number(2.5), "2.5");
/// assert_eq!(util::format_number(1.0 / 3.0), "0.333333");
/// ```
pub fn format_number(value: f64) -> String {
    let formatted = format!("{:.6}", value);
    if formatted.contains('.') {
        formatted
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    } else {
        formatted
    }
}

/// Format a fraction as a percentage with two decimals.
///
/// # Example
/// ```rust
/// use trend_summary::util;
///
/// assert_eq!(util::format_percent(1.0), "100.00%");
/// assert_eq!(util::format_percent(0.1234), "12.34%");
/// ```
pub fn format_percent(fraction: f64) -> String {
    format!("{:.2}%", 100.0 * fraction)
}

/// Number of terminal columns a string occupies, ignoring ANSI escape sequences.
///
/// # Example
/// ```rust
/// use trend_summary::util;
///
/// assert_eq!(util::display_width("✓ 3"), 3);
/// assert_eq!(util::display_width("\u{1b}[36m15ms\u{1b}[0m"), 4);
/// ```
pub fn display_width(text: &str) -> usize {
    console::measure_text_width(text)
}
