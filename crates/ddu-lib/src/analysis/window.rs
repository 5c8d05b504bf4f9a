//! Query windows for one analysis pass

use crate::models::TimeWindow;
use chrono::{DateTime, Duration, Utc};

/// Width of the compared periods
pub const PERIOD_MINUTES: i64 = 5;

/// Offset of the comparison period
pub const COMPARISON_OFFSET_HOURS: i64 = 1;

/// How far back open problems are looked up
pub const PROBLEM_LOOKBACK_MINUTES: i64 = 1;

/// All windows derived from one reference instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisWindows {
    /// The last five minutes
    pub current: TimeWindow,
    /// The same five minutes one hour earlier
    pub previous: TimeWindow,
    /// Range used to find open problems
    pub problems: TimeWindow,
    /// Range used to resolve scope membership
    pub entities: TimeWindow,
}

impl AnalysisWindows {
    pub fn ending_at(now: DateTime<Utc>) -> Self {
        let current = TimeWindow::new(now - Duration::minutes(PERIOD_MINUTES), now);
        let previous = current.shifted_back(Duration::hours(COMPARISON_OFFSET_HOURS));

        Self {
            current,
            previous,
            problems: TimeWindow::new(now - Duration::minutes(PROBLEM_LOOKBACK_MINUTES), now),
            entities: TimeWindow::new(previous.from, current.to),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_windows_from_reference_instant() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let windows = AnalysisWindows::ending_at(now);

        assert_eq!(windows.current.to, now);
        assert_eq!(windows.current.to - windows.current.from, Duration::minutes(5));
        assert_eq!(windows.previous.from, windows.current.from - Duration::hours(1));
        assert_eq!(windows.previous.to, windows.current.to - Duration::hours(1));
        assert_eq!(windows.problems.from, now - Duration::minutes(1));
        assert_eq!(windows.entities.from, windows.previous.from);
        assert_eq!(windows.entities.to, now);
    }
}
