//! Utility functions
//!
//! Formatting helpers for the run summary.

use std::time::Duration;

/// Format a duration into (minutes, seconds) tuple
#[inline]
pub fn format_duration(dur: Duration) -> (u64, u64) {
    let secs = dur.as_secs();
    (secs / 60, secs % 60)
}

/// Format duration as a human-readable string
pub fn format_duration_verbose(dur: Duration) -> String {
    let (mins, secs) = format_duration(dur);
    if mins > 0 {
        format!("{mins} min {secs} sec")
    } else {
        format!("{:.1} sec", dur.as_secs_f64())
    }
}

/// Records per second, or 0 for an instantaneous run.
pub fn throughput(records: u64, dur: Duration) -> u64 {
    let secs = dur.as_secs_f64();
    if secs > 0.0 { (records as f64 / secs) as u64 } else { 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration_minutes() {
        let dur = Duration::from_secs(125); // 2 min 5 sec
        assert_eq!(format_duration(dur), (2, 5));
    }

    #[test]
    fn test_format_duration_verbose() {
        assert_eq!(format_duration_verbose(Duration::from_secs(125)), "2 min 5 sec");
        assert_eq!(format_duration_verbose(Duration::from_millis(500)), "0.5 sec");
    }

    #[test]
    fn test_throughput() {
        assert_eq!(throughput(1000, Duration::from_secs(2)), 500);
        assert_eq!(throughput(1000, Duration::ZERO), 0);
    }
}
