//! Human-readable distances and durations for popups and logs.

pub fn format_distance(meters: f64) -> String {
    if meters >= 1000.0 {
        format!("{:.2} km", meters / 1000.0)
    } else {
        format!("{} m", meters.round() as i64)
    }
}

pub fn format_duration(millis: u64) -> String {
    let total_minutes = millis / 60_000;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    if hours > 0 {
        format!("{hours}h {minutes}min")
    } else {
        format!("{minutes}min")
    }
}

/// Kilometres with one decimal, as shown in the route summary.
pub fn kilometres(meters: f64) -> String {
    format!("{:.1}", meters / 1000.0)
}

/// Whole minutes, rounded.
pub fn minutes(millis: u64) -> u64 {
    (millis as f64 / 60_000.0).round() as u64
}
