// src/services/display.rs
use serde::Serialize;

use crate::services::metrics::{Metric, MetricDelta, MetricName, MetricSnapshot};

/// How a metric card renders its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricFormat {
    Count,
    Price,
    Score,
}

/// One dashboard metric tile: label, formatted value and delta.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricCard {
    pub metric: MetricName,
    pub label: &'static str,
    pub value: String,
    pub delta: String,
}

pub const OVERVIEW_CARDS: &[(MetricName, &str, MetricFormat)] = &[
    (MetricName::TotalListings, "Active Listings", MetricFormat::Count),
    (MetricName::TotalHosts, "Active Hosts", MetricFormat::Count),
    (MetricName::MedianReviewScore, "Median Review Score", MetricFormat::Score),
    (MetricName::MedianPrice, "Median Nightly Price", MetricFormat::Price),
];

pub const PRICING_CARDS: &[(MetricName, &str, MetricFormat)] = &[
    (MetricName::MeanPrice, "Mean Price", MetricFormat::Price),
    (MetricName::P90Price, "Ninetieth Percentile Price", MetricFormat::Price),
    (MetricName::MedianSuperhostPrice, "Median Superhost Price", MetricFormat::Price),
];

pub const REVIEW_CARDS: &[(MetricName, &str, MetricFormat)] = &[
    (MetricName::ReviewCount, "Review Count", MetricFormat::Count),
    (MetricName::MeanReviewScore, "Mean Reviews Score", MetricFormat::Score),
    (
        MetricName::MeanSuperhostReviewScore,
        "Mean Superhost Reviews Score",
        MetricFormat::Score,
    ),
];

const NOT_AVAILABLE: &str = "N/A";

/// Groups the integer part in thousands: `1234567.8` -> `1,234,568`.
pub fn format_thousands(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{}", rounded.abs() as u64);
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if rounded < 0.0 {
        out.insert(0, '-');
    }
    out
}

/// `$1,234.50` style, with the sign ahead of the currency symbol.
pub fn format_price(value: f64) -> String {
    let cents = (value.abs() * 100.0).round();
    let whole = format_thousands((cents / 100.0).trunc());
    let frac = (cents % 100.0) as u64;
    let sign = if value < 0.0 && cents > 0.0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, whole, frac)
}

pub fn format_value(metric: Metric, format: MetricFormat) -> String {
    match metric {
        Metric::NotAvailable => NOT_AVAILABLE.to_string(),
        Metric::Value(v) => match format {
            MetricFormat::Count => format_thousands(v),
            MetricFormat::Price => format_price(v),
            MetricFormat::Score => format!("{:.2}/100", v),
        },
    }
}

pub fn format_delta(metric: Metric, format: MetricFormat) -> String {
    match metric {
        Metric::NotAvailable => NOT_AVAILABLE.to_string(),
        Metric::Value(v) => {
            let sign = if v > 0.0 { "+" } else { "" };
            match format {
                MetricFormat::Count => format!("{}{}", sign, format_thousands(v)),
                MetricFormat::Price => format!("{}{}", sign, format_price(v)),
                MetricFormat::Score => format!("{}{:.2}", sign, v),
            }
        }
    }
}

pub fn cards(
    layout: &[(MetricName, &'static str, MetricFormat)],
    current: &MetricSnapshot,
    delta: &MetricDelta,
) -> Vec<MetricCard> {
    layout
        .iter()
        .map(|&(metric, label, format)| MetricCard {
            metric,
            label,
            value: format_value(current.get(metric), format),
            delta: format_delta(delta.get(metric), format),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0.0), "0");
        assert_eq!(format_thousands(999.0), "999");
        assert_eq!(format_thousands(1234.0), "1,234");
        assert_eq!(format_thousands(-1234567.0), "-1,234,567");
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(150.0), "$150.00");
        assert_eq!(format_price(1234.5), "$1,234.50");
        assert_eq!(format_price(-50.0), "-$50.00");
        assert_eq!(format_price(0.004), "$0.00");
    }

    #[test]
    fn test_format_delta() {
        assert_eq!(format_delta(Metric::Value(-50.0), MetricFormat::Price), "-$50.00");
        assert_eq!(format_delta(Metric::Value(12.0), MetricFormat::Count), "+12");
        assert_eq!(format_delta(Metric::Value(0.0), MetricFormat::Score), "0.00");
        assert_eq!(format_delta(Metric::NotAvailable, MetricFormat::Score), "N/A");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(Metric::Value(92.5), MetricFormat::Score), "92.50/100");
        assert_eq!(format_value(Metric::NotAvailable, MetricFormat::Price), "N/A");
    }
}
