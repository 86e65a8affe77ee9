// src/services/exploration.rs
use log::{info, warn};
use serde::Serialize;

use crate::error::DashboardError;
use crate::models::ListingFilter;
use crate::services::breakdowns::{
    self, CategoryCount, CategoryMean, CategoryValue, HostScore, MonthlyActivity,
    PriceGroupScores, SuperhostComparison,
};
use crate::services::calculations::distinct_count;
use crate::services::display::{self, MetricCard};
use crate::services::loader::Dataset;
use crate::services::metrics::{self, MetricDelta, MetricSnapshot};
use crate::services::windows::PeriodWindows;

#[derive(Debug, Clone, Serialize)]
pub struct PeriodComparison {
    pub windows: PeriodWindows,
    pub note: String,
    pub current: MetricSnapshot,
    pub previous: MetricSnapshot,
    pub delta: MetricDelta,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverviewTab {
    pub cards: Vec<MetricCard>,
    pub monthly_activity: Vec<MonthlyActivity>,
    pub listings_by_room_type: Vec<CategoryCount>,
    pub listings_by_neighbourhood: Vec<CategoryCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PricingTab {
    pub cards: Vec<MetricCard>,
    pub monthly_mean_price: Vec<CategoryValue>,
    pub room_type_mean_price: Vec<CategoryValue>,
    pub neighbourhood_median_price: Vec<CategoryValue>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewsTab {
    pub cards: Vec<MetricCard>,
    pub category_means: Vec<CategoryMean>,
    pub superhost_comparison: Vec<SuperhostComparison>,
    pub price_groups: Vec<PriceGroupScores>,
    pub host_correlation: Vec<HostScore>,
}

/// Everything the Exploration page shows for one filter selection.
#[derive(Debug, Clone, Serialize)]
pub struct Exploration {
    pub filter: ListingFilter,
    pub matching_listings: usize,
    /// Set when the period comparison could not be computed.
    pub comparison_message: Option<String>,
    pub comparison: Option<PeriodComparison>,
    pub overview: OverviewTab,
    pub pricing: PricingTab,
    pub reviews: ReviewsTab,
}

fn comparison_note(windows: &PeriodWindows) -> String {
    format!(
        "Metrics cover {} to {} and are compared to {} to {}.",
        windows.current.start,
        windows.current.last_day(),
        windows.previous.start,
        windows.previous.last_day()
    )
}

pub fn compare_periods(dataset: &Dataset, filter: &ListingFilter) -> Result<PeriodComparison, DashboardError> {
    let windows = *dataset.windows().ok_or(DashboardError::EmptyDataset)?;
    let current = metrics::snapshot(&dataset.records, &windows.current, filter);
    let previous = metrics::snapshot(&dataset.records, &windows.previous, filter);
    let delta = metrics::delta(&current, &previous);

    Ok(PeriodComparison {
        note: comparison_note(&windows),
        windows,
        current,
        previous,
        delta,
    })
}

pub fn explore(dataset: &Dataset, filter: &ListingFilter) -> Exploration {
    let set = &dataset.records;
    let matching_listings = distinct_count(set.filtered(filter).map(|r| r.listing_id.as_str()));
    if matching_listings == 0 {
        warn!("{}", DashboardError::InvalidFilterSelection(filter.to_string()));
    }
    info!("Exploring [{}]: {} matching listings", filter, matching_listings);

    let (comparison, comparison_message) = match compare_periods(dataset, filter) {
        Ok(c) => (Some(c), None),
        Err(e) => {
            warn!("Period comparison not available: {}", e);
            (None, Some(format!("Not available: {}", e)))
        }
    };

    let tab_cards = |layout| match &comparison {
        Some(c) => display::cards(layout, &c.current, &c.delta),
        None => Vec::new(),
    };

    let (room_type_mean_price, neighbourhood_median_price) = match &comparison {
        Some(c) => (
            breakdowns::room_type_mean_price(set, filter, &c.windows.current),
            breakdowns::neighbourhood_median_price(set, filter, &c.windows.current),
        ),
        None => (Vec::new(), Vec::new()),
    };

    Exploration {
        filter: filter.clone(),
        matching_listings,
        overview: OverviewTab {
            cards: tab_cards(display::OVERVIEW_CARDS),
            monthly_activity: breakdowns::monthly_activity(set, filter),
            listings_by_room_type: breakdowns::listings_by_room_type(set, filter),
            listings_by_neighbourhood: breakdowns::listings_by_neighbourhood(set, filter),
        },
        pricing: PricingTab {
            cards: tab_cards(display::PRICING_CARDS),
            monthly_mean_price: breakdowns::monthly_mean_price(set, filter),
            room_type_mean_price,
            neighbourhood_median_price,
        },
        reviews: ReviewsTab {
            cards: tab_cards(display::REVIEW_CARDS),
            category_means: breakdowns::category_means(set, filter),
            superhost_comparison: breakdowns::superhost_comparison(set, filter),
            price_groups: breakdowns::price_group_scores(set, filter),
            host_correlation: breakdowns::host_correlation(set, filter),
        },
        comparison,
        comparison_message,
    }
}
