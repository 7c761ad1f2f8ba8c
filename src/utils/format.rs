// src/utils/format.rs

use crate::config::TIME_WARNING_MILLIS;

/// Formats a countdown as `m:ss`. Partial seconds are dropped.
pub fn format_time(millis: u64) -> String {
    let total_seconds = millis / 1000;
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Share of the quiz reached when showing question `index` (0-based), in percent.
pub fn progress_percent(index: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (index + 1) as f64 / total as f64 * 100.0
}

/// True while time is running out but not yet exhausted.
pub fn is_time_warning(remaining_millis: u64) -> bool {
    remaining_millis > 0 && remaining_millis <= TIME_WARNING_MILLIS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "0:00");
        assert_eq!(format_time(999), "0:00");
        assert_eq!(format_time(61_000), "1:01");
        assert_eq!(format_time(300_000), "5:00");
        assert_eq!(format_time(3_599_999), "59:59");
        assert_eq!(format_time(7_200_000), "120:00");
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(0, 4), 25.0);
        assert_eq!(progress_percent(3, 4), 100.0);
        assert_eq!(progress_percent(0, 0), 0.0);
    }

    #[test]
    fn test_time_warning_window() {
        assert!(!is_time_warning(0));
        assert!(is_time_warning(1_000));
        assert!(is_time_warning(300_000));
        assert!(!is_time_warning(300_001));
    }
}
