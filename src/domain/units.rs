// Axis tick and tracking label formatting
use chrono::{DateTime, Utc};

const KIB: f64 = 1024.0;
const BINARY_PREFIXES: [(&str, i32); 5] = [("Pi", 5), ("Ti", 4), ("Gi", 3), ("Mi", 2), ("ki", 1)];

const MINUTE: f64 = 60.0;
const HOUR: f64 = 60.0 * MINUTE;
const DAY: f64 = 24.0 * HOUR;
const YEAR: f64 = 365.0 * DAY;

/// Format a y-axis tick for the given unit.
/// - `B`: binary prefixes once the value exceeds 1 ki
/// - `s`: `1y 2d 3h 4m 5s` decomposition
/// - anything else: value followed by the unit
pub fn format_tick(value: f64, unit: Option<&str>) -> String {
    let unit = unit.unwrap_or("");
    match unit {
        "B" => format_bytes(value),
        "s" => format_duration(value),
        _ => format!("{} {}", value, unit),
    }
}

fn format_bytes(value: f64) -> String {
    for (prefix, power) in BINARY_PREFIXES {
        let scale = KIB.powi(power);
        if value > scale {
            return format!("{:.2} {}B", value / scale, prefix);
        }
    }
    format!("{} B", value)
}

fn format_duration(seconds: f64) -> String {
    let mut parts = Vec::new();
    let mut rest = seconds;
    for (size, suffix) in [(YEAR, "y"), (DAY, "d"), (HOUR, "h")] {
        if rest >= size {
            parts.push(format!("{}{}", (rest / size).floor(), suffix));
            rest %= size;
        }
    }
    if rest >= MINUTE {
        parts.push(format!("{}m", (rest / MINUTE).floor()));
        rest %= MINUTE;
    }
    parts.push(format!("{}s", rest));
    parts.join(" ")
}

/// Text shown when hovering a point: UTC date, then `label = value`.
pub fn track_label(label: &str, time_ms: i64, value: f64) -> String {
    let date = DateTime::<Utc>::from_timestamp_millis(time_ms)
        .map(|d| d.to_rfc2822())
        .unwrap_or_else(|| time_ms.to_string());
    format!("{}\n{} = {}", date, label, value)
}
