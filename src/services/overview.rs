// src/services/overview.rs
use serde::Serialize;

use crate::models::ALL_DISTRICTS;
use crate::services::breakdowns::{count_by, unique_in_order, CategoryCount};
use crate::services::calculations::distinct_count;
use crate::services::loader::Dataset;

/// Number of districts shown in the home page bar chart.
pub const TOP_DISTRICTS: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct DatasetOverview {
    pub total_districts: usize,
    pub total_neighbourhoods: usize,
    pub total_listings: usize,
    pub total_reviews: usize,
    pub listings_by_district: Vec<CategoryCount>,
}

pub fn dataset_overview(dataset: &Dataset) -> DatasetOverview {
    let listings = &dataset.listings;
    let mut by_district = count_by(listings, |l| l.district.as_deref());
    by_district.truncate(TOP_DISTRICTS);

    DatasetOverview {
        total_districts: distinct_count(listings.iter().filter_map(|l| l.district.as_deref())),
        total_neighbourhoods: distinct_count(
            listings.iter().filter_map(|l| l.neighbourhood.as_deref()),
        ),
        total_listings: distinct_count(listings.iter().map(|l| l.listing_id.as_str())),
        total_reviews: distinct_count(
            dataset.reviews.iter().filter_map(|r| r.review_id.as_deref()),
        ),
        listings_by_district: by_district,
    }
}

/// District selector options: the "all" entry, then districts in the order
/// they first appear.
pub fn district_options(dataset: &Dataset) -> Vec<String> {
    let mut options = vec![ALL_DISTRICTS.to_string()];
    options.extend(unique_in_order(&dataset.listings, |l| {
        l.district.as_deref()
    }));
    options
}
