// src/models.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::DashboardError;

/// Column names as they appear in the source tables.
pub mod columns {
    pub const LISTING_ID: &str = "listing_id";
    pub const LISTING_NAME: &str = "listing_name";
    pub const HOST_ID: &str = "host_id";
    pub const REVIEW_ID: &str = "review_id";
    pub const REVIEW_DATE: &str = "review_date";
    pub const PRICE: &str = "price";
    pub const ROOM_TYPE: &str = "room_type";
    pub const PROPERTY_TYPE: &str = "property_type";
    pub const NEIGHBOURHOOD: &str = "neighbourhood";
    pub const DISTRICT: &str = "district";
    pub const CITY: &str = "city";
    pub const LATITUDE: &str = "latitude";
    pub const LONGITUDE: &str = "longitude";
    pub const ACCOMMODATES: &str = "accommodates";
    pub const BEDROOMS: &str = "bedrooms";
    pub const MINIMUM_NIGHTS: &str = "minimum_nights";
    pub const MAXIMUM_NIGHTS: &str = "maximum_nights";
    pub const INSTANT_BOOKABLE: &str = "instant_bookable";
    pub const REVIEW_SCORES_RATING: &str = "review_scores_rating";
    pub const HOST_IS_SUPERHOST: &str = "host_is_superhost";
    pub const HOST_RESPONSE_RATE: &str = "host_response_rate";
    pub const HOST_ACCEPTANCE_RATE: &str = "host_acceptance_rate";
    pub const HOST_TOTAL_LISTINGS_COUNT: &str = "host_total_listings_count";
}

/// Token table for the dataset's boolean encoding (`host_is_superhost`,
/// `instant_bookable`). Tokens outside the table load as unknown.
pub const FLAG_TOKENS: &[(&str, bool)] = &[
    ("t", true),
    ("true", true),
    ("1", true),
    ("f", false),
    ("false", false),
    ("0", false),
];

pub fn parse_flag(token: &str) -> Option<bool> {
    let token = token.trim();
    FLAG_TOKENS
        .iter()
        .find(|(t, _)| t.eq_ignore_ascii_case(token))
        .map(|(_, v)| *v)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewCategory {
    Accuracy,
    Cleanliness,
    Checkin,
    Communication,
    Location,
    Value,
}

impl ReviewCategory {
    pub const ALL: [ReviewCategory; 6] = [
        ReviewCategory::Accuracy,
        ReviewCategory::Cleanliness,
        ReviewCategory::Checkin,
        ReviewCategory::Communication,
        ReviewCategory::Location,
        ReviewCategory::Value,
    ];

    pub fn column(self) -> &'static str {
        match self {
            ReviewCategory::Accuracy => "review_scores_accuracy",
            ReviewCategory::Cleanliness => "review_scores_cleanliness",
            ReviewCategory::Checkin => "review_scores_checkin",
            ReviewCategory::Communication => "review_scores_communication",
            ReviewCategory::Location => "review_scores_location",
            ReviewCategory::Value => "review_scores_value",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReviewCategory::Accuracy => "Accuracy",
            ReviewCategory::Cleanliness => "Cleanliness",
            ReviewCategory::Checkin => "Checkin",
            ReviewCategory::Communication => "Communication",
            ReviewCategory::Location => "Location",
            ReviewCategory::Value => "Value",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReviewScores {
    pub rating: Option<f64>,
    pub accuracy: Option<f64>,
    pub cleanliness: Option<f64>,
    pub checkin: Option<f64>,
    pub communication: Option<f64>,
    pub location: Option<f64>,
    pub value: Option<f64>,
}

impl ReviewScores {
    pub fn category(&self, category: ReviewCategory) -> Option<f64> {
        match category {
            ReviewCategory::Accuracy => self.accuracy,
            ReviewCategory::Cleanliness => self.cleanliness,
            ReviewCategory::Checkin => self.checkin,
            ReviewCategory::Communication => self.communication,
            ReviewCategory::Location => self.location,
            ReviewCategory::Value => self.value,
        }
    }
}

/// Row of the listings table.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub listing_id: String,
    pub name: Option<String>,
    pub host_id: Option<String>,
    pub neighbourhood: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub property_type: Option<String>,
    pub room_type: Option<String>,
    pub accommodates: Option<u32>,
    pub bedrooms: Option<u32>,
    pub price: Option<f64>,
    pub minimum_nights: Option<u32>,
    pub maximum_nights: Option<u32>,
    pub instant_bookable: Option<bool>,
    pub scores: ReviewScores,
}

/// Row of the hosts table.
#[derive(Debug, Clone, Default)]
pub struct Host {
    pub host_id: String,
    pub is_superhost: Option<bool>,
    pub response_rate: Option<f64>,
    pub acceptance_rate: Option<f64>,
    pub total_listings_count: Option<u32>,
}

/// Row of the reviews table.
#[derive(Debug, Clone, Default)]
pub struct Review {
    pub review_id: Option<String>,
    pub listing_id: String,
    pub review_date: Option<NaiveDate>,
}

/// One row of the listing-review-host join.
#[derive(Debug, Clone, Default)]
pub struct ListingRecord {
    pub listing_id: String,
    pub host_id: Option<String>,
    pub review_id: Option<String>,
    pub review_date: Option<NaiveDate>,
    pub price: Option<f64>,
    pub room_type: Option<String>,
    pub neighbourhood: Option<String>,
    pub district: Option<String>,
    pub scores: ReviewScores,
    pub is_superhost: Option<bool>,
    pub response_rate: Option<f64>,
    pub acceptance_rate: Option<f64>,
    pub host_total_listings: Option<u32>,
}

impl ListingRecord {
    pub fn join(listing: &Listing, host: Option<&Host>, review: Option<&Review>) -> Self {
        ListingRecord {
            listing_id: listing.listing_id.clone(),
            host_id: listing.host_id.clone(),
            review_id: review.and_then(|r| r.review_id.clone()),
            review_date: review.and_then(|r| r.review_date),
            price: listing.price,
            room_type: listing.room_type.clone(),
            neighbourhood: listing.neighbourhood.clone(),
            district: listing.district.clone(),
            scores: listing.scores.clone(),
            is_superhost: host.and_then(|h| h.is_superhost),
            response_rate: host.and_then(|h| h.response_rate),
            acceptance_rate: host.and_then(|h| h.acceptance_rate),
            host_total_listings: host.and_then(|h| h.total_listings_count),
        }
    }
}

/// Names of the columns present in the loaded tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSet(BTreeSet<String>);

impl ColumnSet {
    pub fn has(&self, column: &str) -> bool {
        self.0.contains(column)
    }

    pub fn insert(&mut self, column: impl Into<String>) {
        self.0.insert(column.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ColumnSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        ColumnSet(iter.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>> Extend<S> for ColumnSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.0.extend(iter.into_iter().map(Into::into));
    }
}

/// Joined records together with the columns they were loaded from.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    pub records: Vec<ListingRecord>,
    pub columns: ColumnSet,
}

impl RecordSet {
    pub fn new(records: Vec<ListingRecord>, columns: ColumnSet) -> Self {
        RecordSet { records, columns }
    }

    pub fn has(&self, column: &str) -> bool {
        self.columns.has(column)
    }

    pub fn require(&self, column: &str) -> Result<(), DashboardError> {
        if self.has(column) {
            Ok(())
        } else {
            Err(DashboardError::MissingColumn(column.to_string()))
        }
    }

    pub fn filtered<'a>(
        &'a self,
        filter: &'a ListingFilter,
    ) -> impl Iterator<Item = &'a ListingRecord> + 'a {
        self.records.iter().filter(move |r| filter.matches(r))
    }
}

/// Label the district selector uses for "no district filter".
pub const ALL_DISTRICTS: &str = "All District";

/// District/neighbourhood equality filter. `None` matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingFilter {
    pub district: Option<String>,
    pub neighbourhood: Option<String>,
}

impl ListingFilter {
    pub fn all() -> Self {
        ListingFilter::default()
    }

    pub fn district(district: impl Into<String>) -> Self {
        ListingFilter {
            district: Some(district.into()),
            neighbourhood: None,
        }
    }

    /// Builds a filter from raw selector values; empty strings and
    /// `ALL_DISTRICTS` mean no restriction.
    pub fn from_selection(district: Option<&str>, neighbourhood: Option<&str>) -> Self {
        fn selected(value: Option<&str>) -> Option<String> {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty() && *v != ALL_DISTRICTS)
                .map(str::to_string)
        }
        ListingFilter {
            district: selected(district),
            neighbourhood: selected(neighbourhood),
        }
    }

    pub fn is_all(&self) -> bool {
        self.district.is_none() && self.neighbourhood.is_none()
    }

    pub fn matches(&self, record: &ListingRecord) -> bool {
        fn eq(want: &Option<String>, have: &Option<String>) -> bool {
            match want {
                Some(w) => have.as_deref() == Some(w.as_str()),
                None => true,
            }
        }
        eq(&self.district, &record.district) && eq(&self.neighbourhood, &record.neighbourhood)
    }
}

impl std::fmt::Display for ListingFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.district, &self.neighbourhood) {
            (None, None) => write!(f, "{}", ALL_DISTRICTS),
            (Some(d), None) => write!(f, "district={}", d),
            (None, Some(n)) => write!(f, "neighbourhood={}", n),
            (Some(d), Some(n)) => write!(f, "district={}, neighbourhood={}", d, n),
        }
    }
}
