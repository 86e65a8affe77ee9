// src/services/metrics.rs
//! Period-comparison metrics: one snapshot of aggregate statistics per
//! window, and the rounded current-minus-previous delta between two
//! snapshots.

use log::debug;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use crate::models::{columns, ListingFilter, ListingRecord, RecordSet, ReviewCategory};
use crate::services::calculations::{
    calculate_average, calculate_median, calculate_quantile, distinct_count, round_to,
};
use crate::services::windows::{PeriodWindow, WindowLabel};

/// Decimal places kept in deltas.
pub const DELTA_DECIMALS: i32 = 2;

/// A statistic that is either computed or explicitly unavailable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    Value(f64),
    NotAvailable,
}

impl Metric {
    pub fn value(self) -> Option<f64> {
        match self {
            Metric::Value(v) => Some(v),
            Metric::NotAvailable => None,
        }
    }

    pub fn is_available(self) -> bool {
        matches!(self, Metric::Value(_))
    }

    fn count(n: usize) -> Self {
        Metric::Value(n as f64)
    }
}

impl From<Option<f64>> for Metric {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_finite() => Metric::Value(v),
            _ => Metric::NotAvailable,
        }
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value().serialize(serializer)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Metric::Value(v) => write!(f, "{}", v),
            Metric::NotAvailable => write!(f, "N/A"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricName {
    TotalListings,
    TotalHosts,
    MedianReviewScore,
    MedianPrice,
    MeanPrice,
    P90Price,
    MedianSuperhostPrice,
    ReviewCount,
    MeanReviewScore,
    MeanSuperhostReviewScore,
    MeanAccuracy,
    MeanCleanliness,
    MeanCheckin,
    MeanCommunication,
    MeanLocation,
    MeanValue,
}

impl MetricName {
    pub const ALL: [MetricName; 16] = [
        MetricName::TotalListings,
        MetricName::TotalHosts,
        MetricName::MedianReviewScore,
        MetricName::MedianPrice,
        MetricName::MeanPrice,
        MetricName::P90Price,
        MetricName::MedianSuperhostPrice,
        MetricName::ReviewCount,
        MetricName::MeanReviewScore,
        MetricName::MeanSuperhostReviewScore,
        MetricName::MeanAccuracy,
        MetricName::MeanCleanliness,
        MetricName::MeanCheckin,
        MetricName::MeanCommunication,
        MetricName::MeanLocation,
        MetricName::MeanValue,
    ];

    pub fn category_mean(category: ReviewCategory) -> Self {
        match category {
            ReviewCategory::Accuracy => MetricName::MeanAccuracy,
            ReviewCategory::Cleanliness => MetricName::MeanCleanliness,
            ReviewCategory::Checkin => MetricName::MeanCheckin,
            ReviewCategory::Communication => MetricName::MeanCommunication,
            ReviewCategory::Location => MetricName::MeanLocation,
            ReviewCategory::Value => MetricName::MeanValue,
        }
    }

    /// Counts stay numeric (zero) on an empty selection.
    pub fn is_count(self) -> bool {
        matches!(
            self,
            MetricName::TotalListings | MetricName::TotalHosts | MetricName::ReviewCount
        )
    }
}

/// Statistics computed over one window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSnapshot {
    pub window: WindowLabel,
    pub matching_rows: usize,
    pub metrics: BTreeMap<MetricName, Metric>,
}

impl MetricSnapshot {
    pub fn get(&self, name: MetricName) -> Metric {
        self.metrics.get(&name).copied().unwrap_or(Metric::NotAvailable)
    }
}

/// Current minus previous, per metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricDelta {
    pub metrics: BTreeMap<MetricName, Metric>,
}

impl MetricDelta {
    pub fn get(&self, name: MetricName) -> Metric {
        self.metrics.get(&name).copied().unwrap_or(Metric::NotAvailable)
    }
}

/// Values of one numeric column over `rows`; `None` when the column was
/// not loaded at all.
fn column_values<'a, F>(
    set: &RecordSet,
    column: &str,
    rows: impl Iterator<Item = &'a ListingRecord>,
    extract: F,
) -> Option<Vec<f64>>
where
    F: Fn(&ListingRecord) -> Option<f64>,
{
    if let Err(e) = set.require(column) {
        debug!("{}; dependent metric is not available", e);
        return None;
    }
    Some(rows.filter_map(|r| extract(r)).collect())
}

fn is_superhost(record: &ListingRecord) -> bool {
    record.is_superhost == Some(true)
}

/// Applies `filter`, keeps rows whose review date falls inside `window`,
/// and computes every `MetricName` over them.
pub fn snapshot(set: &RecordSet, window: &PeriodWindow, filter: &ListingFilter) -> MetricSnapshot {
    let rows: Vec<&ListingRecord> = set
        .filtered(filter)
        .filter(|r| r.review_date.map_or(false, |d| window.contains(d)))
        .collect();

    debug!(
        "Snapshot for {:?} window with filter [{}]: {} rows",
        window.label,
        filter,
        rows.len()
    );

    let mut metrics = BTreeMap::new();
    let all = || rows.iter().copied();
    let superhosts = || rows.iter().copied().filter(|r| is_superhost(r));

    metrics.insert(
        MetricName::TotalListings,
        Metric::count(distinct_count(all().map(|r| r.listing_id.as_str()))),
    );

    let total_hosts = if set.has(columns::HOST_ID) {
        Metric::count(distinct_count(all().filter_map(|r| r.host_id.as_deref())))
    } else {
        Metric::NotAvailable
    };
    metrics.insert(MetricName::TotalHosts, total_hosts);

    let review_count = if set.has(columns::REVIEW_ID) {
        Metric::count(all().filter(|r| r.review_id.is_some()).count())
    } else {
        Metric::NotAvailable
    };
    metrics.insert(MetricName::ReviewCount, review_count);

    let prices = column_values(set, columns::PRICE, all(), |r| r.price);
    metrics.insert(
        MetricName::MedianPrice,
        prices.as_deref().and_then(calculate_median).into(),
    );
    metrics.insert(
        MetricName::MeanPrice,
        prices.as_deref().and_then(calculate_average).into(),
    );
    metrics.insert(
        MetricName::P90Price,
        prices.as_deref().and_then(|p| calculate_quantile(p, 0.9)).into(),
    );

    let superhost_prices = if set.has(columns::HOST_IS_SUPERHOST) {
        column_values(set, columns::PRICE, superhosts(), |r| r.price)
    } else {
        None
    };
    metrics.insert(
        MetricName::MedianSuperhostPrice,
        superhost_prices.as_deref().and_then(calculate_median).into(),
    );

    let ratings = column_values(set, columns::REVIEW_SCORES_RATING, all(), |r| r.scores.rating);
    metrics.insert(
        MetricName::MedianReviewScore,
        ratings.as_deref().and_then(calculate_median).into(),
    );
    metrics.insert(
        MetricName::MeanReviewScore,
        ratings.as_deref().and_then(calculate_average).into(),
    );

    let superhost_ratings = if set.has(columns::HOST_IS_SUPERHOST) {
        column_values(set, columns::REVIEW_SCORES_RATING, superhosts(), |r| {
            r.scores.rating
        })
    } else {
        None
    };
    metrics.insert(
        MetricName::MeanSuperhostReviewScore,
        superhost_ratings.as_deref().and_then(calculate_average).into(),
    );

    for category in ReviewCategory::ALL {
        let values = column_values(set, category.column(), all(), |r| r.scores.category(category));
        metrics.insert(
            MetricName::category_mean(category),
            values.as_deref().and_then(calculate_average).into(),
        );
    }

    MetricSnapshot {
        window: window.label,
        matching_rows: rows.len(),
        metrics,
    }
}

/// Elementwise `current - previous`, rounded for display. A metric missing
/// from either side is not available.
pub fn delta(current: &MetricSnapshot, previous: &MetricSnapshot) -> MetricDelta {
    let metrics = current
        .metrics
        .iter()
        .map(|(name, value)| {
            let d = match (value, previous.get(*name)) {
                (Metric::Value(c), Metric::Value(p)) => {
                    Metric::Value(round_to(c - p, DELTA_DECIMALS))
                }
                _ => Metric::NotAvailable,
            };
            (*name, d)
        })
        .collect();

    MetricDelta { metrics }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ColumnSet, ReviewScores};
    use crate::services::windows::{compute_windows, WindowLabel};
    use chrono::NaiveDate;

    fn all_columns() -> ColumnSet {
        let mut cols: ColumnSet = [
            columns::LISTING_ID,
            columns::HOST_ID,
            columns::REVIEW_ID,
            columns::REVIEW_DATE,
            columns::PRICE,
            columns::DISTRICT,
            columns::NEIGHBOURHOOD,
            columns::REVIEW_SCORES_RATING,
            columns::HOST_IS_SUPERHOST,
        ]
        .into_iter()
        .collect();
        cols.extend(ReviewCategory::ALL.iter().map(|c| c.column()));
        cols
    }

    fn record(id: &str, district: &str, price: f64, date: &str, superhost: bool) -> ListingRecord {
        ListingRecord {
            listing_id: id.into(),
            host_id: Some(format!("h{}", id)),
            review_id: Some(format!("r{}", id)),
            review_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").ok(),
            price: Some(price),
            district: Some(district.into()),
            is_superhost: Some(superhost),
            scores: ReviewScores {
                rating: Some(90.0),
                accuracy: Some(9.0),
                cleanliness: Some(8.0),
                checkin: Some(10.0),
                communication: Some(10.0),
                location: Some(9.0),
                value: Some(9.0),
            },
            ..Default::default()
        }
    }

    fn manhattan() -> RecordSet {
        RecordSet::new(
            vec![
                record("1", "Manhattan", 100.0, "2021-01-05", true),
                record("2", "Manhattan", 200.0, "2020-01-10", false),
            ],
            all_columns(),
        )
    }

    #[test]
    fn test_period_comparison_scenario() {
        let set = manhattan();
        let windows = compute_windows(&set.records).unwrap();
        let filter = ListingFilter::district("Manhattan");

        let current = snapshot(&set, &windows.current, &filter);
        let previous = snapshot(&set, &windows.previous, &filter);
        let d = delta(&current, &previous);

        assert_eq!(current.get(MetricName::MedianPrice), Metric::Value(150.0));
        assert_eq!(previous.get(MetricName::MedianPrice), Metric::Value(200.0));
        assert_eq!(d.get(MetricName::MedianPrice), Metric::Value(-50.0));
        assert_eq!(current.get(MetricName::TotalListings), Metric::Value(2.0));
        assert_eq!(previous.get(MetricName::TotalListings), Metric::Value(1.0));
        assert_eq!(current.window, WindowLabel::Current);
    }

    #[test]
    fn test_superhost_metrics_use_flag() {
        let set = manhattan();
        let windows = compute_windows(&set.records).unwrap();
        let current = snapshot(&set, &windows.current, &ListingFilter::all());
        let previous = snapshot(&set, &windows.previous, &ListingFilter::all());

        assert_eq!(current.get(MetricName::MedianSuperhostPrice), Metric::Value(100.0));
        // the only previous-window row is not a superhost
        assert_eq!(previous.get(MetricName::MedianSuperhostPrice), Metric::NotAvailable);
        assert_eq!(
            delta(&current, &previous).get(MetricName::MedianSuperhostPrice),
            Metric::NotAvailable
        );
    }

    #[test]
    fn test_empty_selection_yields_not_available() {
        let set = manhattan();
        let windows = compute_windows(&set.records).unwrap();
        let snap = snapshot(&set, &windows.current, &ListingFilter::district("Brooklyn"));

        assert_eq!(snap.matching_rows, 0);
        assert_eq!(snap.get(MetricName::TotalListings), Metric::Value(0.0));
        for name in MetricName::ALL {
            if !name.is_count() {
                assert_eq!(snap.get(name), Metric::NotAvailable, "{:?}", name);
            }
        }
    }

    /// Current-window snapshot of `manhattan()` with `column` not loaded.
    fn snapshot_without(column: &str) -> MetricSnapshot {
        let mut set = manhattan();
        set.columns = all_columns().iter().filter(|c| *c != column).collect();
        let windows = compute_windows(&set.records).unwrap();
        snapshot(&set, &windows.current, &ListingFilter::all())
    }

    #[test]
    fn test_missing_rating_column_only_affects_score_metrics() {
        let snap = snapshot_without(columns::REVIEW_SCORES_RATING);

        assert_eq!(snap.get(MetricName::MedianReviewScore), Metric::NotAvailable);
        assert_eq!(snap.get(MetricName::MeanReviewScore), Metric::NotAvailable);
        assert_eq!(snap.get(MetricName::MeanSuperhostReviewScore), Metric::NotAvailable);
        assert_eq!(snap.get(MetricName::MedianPrice), Metric::Value(150.0));
        assert_eq!(snap.get(MetricName::MeanAccuracy), Metric::Value(9.0));
    }

    #[test]
    fn test_missing_host_id_column_only_affects_host_count() {
        let snap = snapshot_without(columns::HOST_ID);

        assert_eq!(snap.get(MetricName::TotalHosts), Metric::NotAvailable);
        assert_eq!(snap.get(MetricName::TotalListings), Metric::Value(2.0));
        assert_eq!(snap.get(MetricName::ReviewCount), Metric::Value(2.0));
        assert_eq!(snap.get(MetricName::MedianPrice), Metric::Value(150.0));
    }

    #[test]
    fn test_missing_superhost_column_only_affects_superhost_metrics() {
        let snap = snapshot_without(columns::HOST_IS_SUPERHOST);

        assert_eq!(snap.get(MetricName::MedianSuperhostPrice), Metric::NotAvailable);
        assert_eq!(snap.get(MetricName::MeanSuperhostReviewScore), Metric::NotAvailable);
        assert_eq!(snap.get(MetricName::MedianPrice), Metric::Value(150.0));
        assert_eq!(snap.get(MetricName::MeanReviewScore), Metric::Value(90.0));
        assert_eq!(snap.get(MetricName::TotalHosts), Metric::Value(2.0));
    }

    #[test]
    fn test_missing_price_column_only_affects_price_metrics() {
        let snap = snapshot_without(columns::PRICE);

        for name in [
            MetricName::MedianPrice,
            MetricName::MeanPrice,
            MetricName::P90Price,
            MetricName::MedianSuperhostPrice,
        ] {
            assert_eq!(snap.get(name), Metric::NotAvailable, "{:?}", name);
        }
        assert_eq!(snap.get(MetricName::TotalListings), Metric::Value(2.0));
        assert_eq!(snap.get(MetricName::TotalHosts), Metric::Value(2.0));
        assert_eq!(snap.get(MetricName::ReviewCount), Metric::Value(2.0));
        assert_eq!(snap.get(MetricName::MedianReviewScore), Metric::Value(90.0));
        assert_eq!(snap.get(MetricName::MeanSuperhostReviewScore), Metric::Value(90.0));
        assert_eq!(snap.get(MetricName::MeanCleanliness), Metric::Value(8.0));
    }

    #[test]
    fn test_missing_review_id_column_only_affects_review_count() {
        let snap = snapshot_without(columns::REVIEW_ID);

        assert_eq!(snap.get(MetricName::ReviewCount), Metric::NotAvailable);
        assert_eq!(snap.get(MetricName::TotalListings), Metric::Value(2.0));
        assert_eq!(snap.get(MetricName::TotalHosts), Metric::Value(2.0));
        assert_eq!(snap.get(MetricName::MedianPrice), Metric::Value(150.0));
    }

    #[test]
    fn test_self_delta_is_zero() {
        let set = manhattan();
        let windows = compute_windows(&set.records).unwrap();
        let snap = snapshot(&set, &windows.current, &ListingFilter::all());
        let d = delta(&snap, &snap);

        for name in MetricName::ALL {
            assert_eq!(d.get(name), Metric::Value(0.0), "{:?}", name);
        }
    }

    #[test]
    fn test_delta_is_antisymmetric() {
        let set = RecordSet::new(
            vec![
                record("1", "Queens", 87.5, "2021-03-01", true),
                record("2", "Queens", 123.25, "2020-01-15", true),
                record("3", "Queens", 64.99, "2020-01-20", false),
                record("4", "Queens", 310.0, "2020-06-20", false),
            ],
            all_columns(),
        );
        let windows = compute_windows(&set.records).unwrap();
        let a = snapshot(&set, &windows.current, &ListingFilter::all());
        let b = snapshot(&set, &windows.previous, &ListingFilter::all());
        let ab = delta(&a, &b);
        let ba = delta(&b, &a);

        for name in MetricName::ALL {
            match (ab.get(name), ba.get(name)) {
                (Metric::Value(x), Metric::Value(y)) => assert_eq!(x, -y, "{:?}", name),
                (x, y) => assert_eq!(x, y, "{:?}", name),
            }
        }
    }

    #[test]
    fn test_snapshot_is_idempotent() {
        let set = manhattan();
        let windows = compute_windows(&set.records).unwrap();
        let first = snapshot(&set, &windows.current, &ListingFilter::all());
        let second = snapshot(&set, &windows.current, &ListingFilter::all());
        assert_eq!(first, second);
    }

    #[test]
    fn test_metric_serializes_as_number_or_null() {
        assert_eq!(serde_json::to_string(&Metric::Value(1.5)).unwrap(), "1.5");
        assert_eq!(serde_json::to_string(&Metric::NotAvailable).unwrap(), "null");
        assert_eq!(Metric::from(Some(f64::NAN)), Metric::NotAvailable);
        assert_eq!(Metric::NotAvailable.to_string(), "N/A");
    }
}
