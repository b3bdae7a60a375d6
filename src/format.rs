//! Display helpers for durations and progress

use crate::state::Timer;

/// `M:SS`, e.g. `2:05`
pub fn format_time(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// `Nm Ns`, e.g. `2m 5s`
pub fn format_duration(seconds: u64) -> String {
    format!("{}m {}s", seconds / 60, seconds % 60)
}

/// Elapsed fraction of the current run in `0.0..=1.0`
pub fn progress_fraction(timer: &Timer) -> f64 {
    if timer.original_duration == 0 {
        return 0.0;
    }
    let elapsed = timer.original_duration.saturating_sub(timer.remaining_time);
    elapsed as f64 / timer.original_duration as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats() {
        assert_eq!(format_time(0), "0:00");
        assert_eq!(format_time(125), "2:05");
        assert_eq!(format_time(3600), "60:00");
        assert_eq!(format_duration(125), "2m 5s");
        assert_eq!(format_duration(59), "0m 59s");
    }

    #[test]
    fn progress_tracks_elapsed_time() {
        let mut timer = Timer::new("Focus".into(), "Study".into(), 120, false);
        assert_eq!(progress_fraction(&timer), 0.0);
        timer.remaining_time = 30;
        assert_eq!(progress_fraction(&timer), 0.75);
        timer.remaining_time = 0;
        assert_eq!(progress_fraction(&timer), 1.0);
    }
}
