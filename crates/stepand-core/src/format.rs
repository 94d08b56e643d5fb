//! Human-readable labels for distances and durations

use std::time::Duration;

/// `"85m"` below one kilometre, `"1.2km"` above
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{}m", meters.round() as i64)
    } else {
        format!("{:.1}km", meters / 1000.0)
    }
}

/// Elapsed walk time as zero-padded `mm:ss`
pub fn format_clock(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Planned walk length: `"45min"`, `"1h"`, `"1h 30min"`
pub fn format_planned_duration(planned: Duration) -> String {
    let minutes = planned.as_secs() / 60;
    if minutes < 60 {
        return format!("{minutes}min");
    }
    let (hours, mins) = (minutes / 60, minutes % 60);
    if mins > 0 {
        format!("{hours}h {mins}min")
    } else {
        format!("{hours}h")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_distance() {
        assert_eq!(format_distance(0.0), "0m");
        assert_eq!(format_distance(84.6), "85m");
        assert_eq!(format_distance(999.4), "999m");
        assert_eq!(format_distance(1000.0), "1.0km");
        assert_eq!(format_distance(1249.0), "1.2km");
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(Duration::from_secs(0)), "00:00");
        assert_eq!(format_clock(Duration::from_secs(75)), "01:15");
        assert_eq!(format_clock(Duration::from_millis(3_599_900)), "59:59");
        assert_eq!(format_clock(Duration::from_secs(6000)), "100:00");
    }

    #[test]
    fn test_format_planned_duration() {
        assert_eq!(format_planned_duration(Duration::from_secs(20 * 60)), "20min");
        assert_eq!(format_planned_duration(Duration::from_secs(60 * 60)), "1h");
        assert_eq!(format_planned_duration(Duration::from_secs(90 * 60)), "1h 30min");
    }
}
