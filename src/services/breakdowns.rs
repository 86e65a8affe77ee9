// src/services/breakdowns.rs
use log::warn;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::models::{ListingFilter, ListingRecord, RecordSet, ReviewCategory};
use crate::services::calculations::{calculate_average, calculate_median, sorted_quantile};
use crate::services::metrics::Metric;
use crate::services::windows::PeriodWindow;

/// Monthly series stop at the dataset snapshot month.
pub const TIMELINE_LAST_MONTH: &str = "2021-01";

pub const PRICE_GROUP_COUNT: usize = 5;
const PRICE_GROUP_LABELS: [&str; PRICE_GROUP_COUNT] = [
    "Lowest Price",
    "Low Price",
    "Middle Price",
    "High Price",
    "Highest Price",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyActivity {
    pub month: String,
    pub listings: usize,
    pub hosts: usize,
    pub reviews: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryValue {
    pub name: String,
    pub value: Metric,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryMean {
    pub category: ReviewCategory,
    pub label: &'static str,
    pub score: Metric,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuperhostComparison {
    pub category: ReviewCategory,
    pub label: &'static str,
    pub superhost: Metric,
    pub non_superhost: Metric,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceGroupScores {
    pub group: String,
    pub label: &'static str,
    pub min_price: f64,
    pub max_price: f64,
    pub listings: usize,
    pub scores: BTreeMap<ReviewCategory, Metric>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostScore {
    pub host_id: String,
    pub response_rate: Metric,
    pub acceptance_rate: Metric,
    pub rating: Metric,
    pub is_superhost: Option<bool>,
    pub total_listings: Option<u32>,
}

fn month_of(record: &ListingRecord) -> Option<String> {
    record
        .review_date
        .map(|d| d.format("%Y-%m").to_string())
        .filter(|m| m.as_str() <= TIMELINE_LAST_MONTH)
}

fn mean_of<'a>(
    rows: impl Iterator<Item = &'a ListingRecord>,
    extract: impl Fn(&ListingRecord) -> Option<f64>,
) -> Metric {
    let values: Vec<f64> = rows.filter_map(|r| extract(r)).collect();
    calculate_average(&values).into()
}

/// Distinct listings, distinct hosts and review count per month.
pub fn monthly_activity(set: &RecordSet, filter: &ListingFilter) -> Vec<MonthlyActivity> {
    #[derive(Default)]
    struct Acc<'a> {
        listings: HashSet<&'a str>,
        hosts: HashSet<&'a str>,
        reviews: usize,
    }

    let mut months: BTreeMap<String, Acc> = BTreeMap::new();
    for record in set.filtered(filter) {
        let Some(month) = month_of(record) else {
            continue;
        };
        let acc = months.entry(month).or_default();
        acc.listings.insert(record.listing_id.as_str());
        if let Some(host) = record.host_id.as_deref() {
            acc.hosts.insert(host);
        }
        if record.review_id.is_some() {
            acc.reviews += 1;
        }
    }

    months
        .into_iter()
        .map(|(month, acc)| MonthlyActivity {
            month,
            listings: acc.listings.len(),
            hosts: acc.hosts.len(),
            reviews: acc.reviews,
        })
        .collect()
}

pub fn monthly_mean_price(set: &RecordSet, filter: &ListingFilter) -> Vec<CategoryValue> {
    let mut months: BTreeMap<String, Vec<&ListingRecord>> = BTreeMap::new();
    for record in set.filtered(filter) {
        if let Some(month) = month_of(record) {
            months.entry(month).or_default().push(record);
        }
    }
    months
        .into_iter()
        .map(|(name, rows)| CategoryValue {
            name,
            value: mean_of(rows.into_iter(), |r| r.price),
        })
        .collect()
}

fn distinct_listings_by<F>(set: &RecordSet, filter: &ListingFilter, key: F) -> Vec<CategoryCount>
where
    F: Fn(&ListingRecord) -> Option<&str>,
{
    let mut groups: BTreeMap<&str, HashSet<&str>> = BTreeMap::new();
    for record in set.filtered(filter) {
        if let Some(k) = key(record) {
            groups.entry(k).or_default().insert(record.listing_id.as_str());
        }
    }
    groups
        .into_iter()
        .map(|(name, ids)| CategoryCount {
            name: name.to_string(),
            count: ids.len(),
        })
        .collect()
}

pub fn listings_by_room_type(set: &RecordSet, filter: &ListingFilter) -> Vec<CategoryCount> {
    distinct_listings_by(set, filter, |r| r.room_type.as_deref())
}

/// Sorted by listing count, largest first.
pub fn listings_by_neighbourhood(set: &RecordSet, filter: &ListingFilter) -> Vec<CategoryCount> {
    let mut counts = distinct_listings_by(set, filter, |r| r.neighbourhood.as_deref());
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

fn prices_in_window<'a, F>(
    set: &'a RecordSet,
    filter: &'a ListingFilter,
    window: &'a PeriodWindow,
    key: F,
) -> BTreeMap<&'a str, Vec<f64>>
where
    F: Fn(&'a ListingRecord) -> Option<&'a str>,
{
    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for record in set.filtered(filter) {
        if !record.review_date.map_or(false, |d| window.contains(d)) {
            continue;
        }
        if let Some(k) = key(record) {
            let prices = groups.entry(k).or_default();
            if let Some(p) = record.price {
                prices.push(p);
            }
        }
    }
    groups
}

pub fn room_type_mean_price(
    set: &RecordSet,
    filter: &ListingFilter,
    window: &PeriodWindow,
) -> Vec<CategoryValue> {
    prices_in_window(set, filter, window, |r| r.room_type.as_deref())
        .into_iter()
        .map(|(name, prices)| CategoryValue {
            name: name.to_string(),
            value: calculate_average(&prices).into(),
        })
        .collect()
}

/// Sorted by median price, highest first; groups without prices last.
pub fn neighbourhood_median_price(
    set: &RecordSet,
    filter: &ListingFilter,
    window: &PeriodWindow,
) -> Vec<CategoryValue> {
    let mut values: Vec<CategoryValue> =
        prices_in_window(set, filter, window, |r| r.neighbourhood.as_deref())
            .into_iter()
            .map(|(name, prices)| CategoryValue {
                name: name.to_string(),
                value: calculate_median(&prices).into(),
            })
            .collect();
    values.sort_by(|a, b| {
        let a = a.value.value().unwrap_or(f64::NEG_INFINITY);
        let b = b.value.value().unwrap_or(f64::NEG_INFINITY);
        b.total_cmp(&a)
    });
    values
}

pub fn category_means(set: &RecordSet, filter: &ListingFilter) -> Vec<CategoryMean> {
    ReviewCategory::ALL
        .iter()
        .map(|&category| CategoryMean {
            category,
            label: category.label(),
            score: if set.has(category.column()) {
                mean_of(set.filtered(filter), |r| r.scores.category(category))
            } else {
                Metric::NotAvailable
            },
        })
        .collect()
}

pub fn superhost_comparison(set: &RecordSet, filter: &ListingFilter) -> Vec<SuperhostComparison> {
    let mean_for = |category: ReviewCategory, flag: bool| {
        if !set.has(category.column()) {
            return Metric::NotAvailable;
        }
        mean_of(
            set.filtered(filter).filter(|r| r.is_superhost == Some(flag)),
            |r| r.scores.category(category),
        )
    };

    ReviewCategory::ALL
        .iter()
        .map(|&category| SuperhostComparison {
            category,
            label: category.label(),
            superhost: mean_for(category, true),
            non_superhost: mean_for(category, false),
        })
        .collect()
}

/// Splits priced rows into five equal-frequency groups and averages each
/// review sub-score per group. Returns nothing when the quintile edges are
/// not strictly increasing.
pub fn price_group_scores(set: &RecordSet, filter: &ListingFilter) -> Vec<PriceGroupScores> {
    let rows: Vec<(&ListingRecord, f64)> = set
        .filtered(filter)
        .filter_map(|r| r.price.map(|p| (r, p)))
        .collect();
    if rows.is_empty() {
        return Vec::new();
    }

    let mut sorted: Vec<f64> = rows.iter().map(|(_, p)| *p).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let edges: Vec<f64> = (0..=PRICE_GROUP_COUNT)
        .map(|i| sorted_quantile(&sorted, i as f64 / PRICE_GROUP_COUNT as f64))
        .collect();
    if edges.windows(2).any(|w| w[0] >= w[1]) {
        warn!("Price group edges are not unique ({:?}); skipping price groups", edges);
        return Vec::new();
    }

    let mut groups: Vec<Vec<&ListingRecord>> = vec![Vec::new(); PRICE_GROUP_COUNT];
    for &(record, price) in &rows {
        let group = (0..PRICE_GROUP_COUNT)
            .find(|&i| price <= edges[i + 1])
            .unwrap_or(PRICE_GROUP_COUNT - 1);
        groups[group].push(record);
    }

    groups
        .into_iter()
        .enumerate()
        .map(|(i, members)| {
            let scores = ReviewCategory::ALL
                .iter()
                .map(|&category| {
                    let score = if set.has(category.column()) {
                        mean_of(members.iter().copied(), |r| r.scores.category(category))
                    } else {
                        Metric::NotAvailable
                    };
                    (category, score)
                })
                .collect();
            PriceGroupScores {
                group: format!("Group {}", i + 1),
                label: PRICE_GROUP_LABELS[i],
                min_price: edges[i],
                max_price: edges[i + 1],
                listings: members.len(),
                scores,
            }
        })
        .collect()
}

/// Per-host response, acceptance and rating averages, for the host/score
/// scatter plot.
pub fn host_correlation(set: &RecordSet, filter: &ListingFilter) -> Vec<HostScore> {
    let mut hosts: BTreeMap<&str, Vec<&ListingRecord>> = BTreeMap::new();
    for record in set.filtered(filter) {
        if let Some(host) = record.host_id.as_deref() {
            hosts.entry(host).or_default().push(record);
        }
    }

    hosts
        .into_iter()
        .map(|(host_id, rows)| HostScore {
            host_id: host_id.to_string(),
            response_rate: mean_of(rows.iter().copied(), |r| r.response_rate),
            acceptance_rate: mean_of(rows.iter().copied(), |r| r.acceptance_rate),
            rating: mean_of(rows.iter().copied(), |r| r.scores.rating),
            is_superhost: rows.iter().find_map(|r| r.is_superhost),
            total_listings: rows.iter().find_map(|r| r.host_total_listings),
        })
        .collect()
}

/// Distinct values of `key` in first-seen order.
pub fn unique_in_order<'a, T: 'a>(
    items: impl IntoIterator<Item = &'a T>,
    key: impl Fn(&'a T) -> Option<&'a str>,
) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for item in items {
        if let Some(k) = key(item) {
            if seen.insert(k) {
                out.push(k.to_string());
            }
        }
    }
    out
}

/// Count per key, largest first, ties broken by name.
pub fn count_by<'a, T: 'a>(
    items: impl IntoIterator<Item = &'a T>,
    key: impl Fn(&'a T) -> Option<&'a str>,
) -> Vec<CategoryCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for item in items {
        if let Some(k) = key(item) {
            *counts.entry(k).or_default() += 1;
        }
    }
    let mut out: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(name, count)| CategoryCount {
            name: name.to_string(),
            count,
        })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    out
}
