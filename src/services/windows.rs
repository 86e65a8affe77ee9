// src/services/windows.rs
use chrono::NaiveDate;
use log::debug;
use serde::Serialize;

use crate::error::{DashboardError, Result};
use crate::models::ListingRecord;

/// Fixed reference period the dashboard compares against. It matches the
/// dataset snapshot (January 2020) rather than following the data.
pub const PREVIOUS_WINDOW_START: (i32, u32, u32) = (2020, 1, 1);
pub const PREVIOUS_WINDOW_END: (i32, u32, u32) = (2020, 2, 5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowLabel {
    Current,
    Previous,
}

/// Half-open date interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeriodWindow {
    pub label: WindowLabel,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PeriodWindow {
    pub fn new(label: WindowLabel, start: NaiveDate, end: NaiveDate) -> Self {
        PeriodWindow { label, start, end }
    }

    pub fn previous_reference() -> Self {
        let (sy, sm, sd) = PREVIOUS_WINDOW_START;
        let (ey, em, ed) = PREVIOUS_WINDOW_END;
        PeriodWindow::new(
            WindowLabel::Previous,
            NaiveDate::from_ymd_opt(sy, sm, sd).unwrap(),
            NaiveDate::from_ymd_opt(ey, em, ed).unwrap(),
        )
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    /// Last day inside the window.
    pub fn last_day(&self) -> NaiveDate {
        self.end.pred_opt().unwrap_or(self.start)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeriodWindows {
    pub current: PeriodWindow,
    pub previous: PeriodWindow,
}

/// Current window spans every observed review date; previous is the fixed
/// reference period.
pub fn compute_windows(records: &[ListingRecord]) -> Result<PeriodWindows> {
    compute_windows_with_reference(records, PeriodWindow::previous_reference())
}

pub fn compute_windows_with_reference(
    records: &[ListingRecord],
    previous: PeriodWindow,
) -> Result<PeriodWindows> {
    let mut dates = records.iter().filter_map(|r| r.review_date);
    let first = dates.next().ok_or(DashboardError::EmptyDataset)?;
    let (earliest, latest) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));

    let current = PeriodWindow::new(
        WindowLabel::Current,
        earliest,
        latest.succ_opt().unwrap_or(NaiveDate::MAX),
    );
    debug!(
        "Computed windows: current [{}, {}), previous [{}, {})",
        current.start, current.end, previous.start, previous.end
    );

    Ok(PeriodWindows {
        current,
        previous: PeriodWindow {
            label: WindowLabel::Previous,
            ..previous
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dated(date: Option<&str>) -> ListingRecord {
        ListingRecord {
            listing_id: "1".into(),
            review_date: date.map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap()),
            ..Default::default()
        }
    }

    #[test]
    fn test_current_window_spans_min_to_max() {
        let records = vec![
            dated(Some("2021-01-05")),
            dated(None),
            dated(Some("2020-01-10")),
        ];
        let windows = compute_windows(&records).unwrap();

        assert_eq!(windows.current.start, NaiveDate::from_ymd_opt(2020, 1, 10).unwrap());
        assert_eq!(windows.current.last_day(), NaiveDate::from_ymd_opt(2021, 1, 5).unwrap());
        assert!(windows.current.contains(NaiveDate::from_ymd_opt(2021, 1, 5).unwrap()));
        assert_eq!(windows.current.label, WindowLabel::Current);
    }

    #[test]
    fn test_previous_window_is_fixed_and_half_open() {
        let windows = compute_windows(&[dated(Some("2023-06-01"))]).unwrap();
        let previous = windows.previous;

        assert_eq!(previous.start, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert!(previous.contains(NaiveDate::from_ymd_opt(2020, 2, 4).unwrap()));
        assert!(!previous.contains(NaiveDate::from_ymd_opt(2020, 2, 5).unwrap()));
    }

    #[test]
    fn test_all_null_dates_is_empty_dataset() {
        let result = compute_windows(&[dated(None), dated(None)]);
        assert!(matches!(result, Err(DashboardError::EmptyDataset)));

        assert!(matches!(compute_windows(&[]), Err(DashboardError::EmptyDataset)));
    }
}
