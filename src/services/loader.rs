// src/services/loader.rs
//! CSV loading for the listings, hosts and reviews tables. Only delimited
//! text is read; columnar (parquet) exports are out of scope and must be
//! converted to CSV first.
use chrono::NaiveDate;
use csv::{ByteRecord, ReaderBuilder, Trim};
use log::{debug, info, warn};
use std::cell::Cell;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::Result;
use crate::models::{
    columns, parse_flag, ColumnSet, Host, Listing, ListingRecord, RecordSet, Review,
    ReviewCategory, ReviewScores,
};
use crate::services::windows::{compute_windows, PeriodWindows};

pub const LISTINGS_FILE: &str = "listings.csv";
pub const HOSTS_FILE: &str = "hosts.csv";
pub const REVIEWS_FILE: &str = "reviews.csv";

/// Alternative header spellings seen in exports of the dataset, mapped to
/// the canonical column name.
const HEADER_ALIASES: &[(&str, &str)] = &[
    ("listings_name", columns::LISTING_NAME),
    ("name", columns::LISTING_NAME),
    ("date", columns::REVIEW_DATE),
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];

/// Everything the dashboard reads, loaded once and never mutated.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub listings: Vec<Listing>,
    pub hosts: HashMap<String, Host>,
    pub reviews: Vec<Review>,
    pub records: RecordSet,
    windows: Option<PeriodWindows>,
}

impl Dataset {
    /// Reads the three tables from `dir` and joins them.
    pub fn load(dir: &Path, delimiter: u8) -> Result<Self> {
        info!("Loading dataset from {}", dir.display());

        let (listings, listing_cols) =
            read_listings(File::open(dir.join(LISTINGS_FILE))?, delimiter)?;
        let (hosts, host_cols) = read_hosts(File::open(dir.join(HOSTS_FILE))?, delimiter)?;
        let (reviews, review_cols) =
            read_reviews(File::open(dir.join(REVIEWS_FILE))?, delimiter)?;

        let mut columns = listing_cols;
        columns.extend(host_cols.iter());
        columns.extend(review_cols.iter());

        Ok(Dataset::from_tables(listings, hosts, reviews, columns))
    }

    pub fn from_tables(
        listings: Vec<Listing>,
        hosts: Vec<Host>,
        reviews: Vec<Review>,
        columns: ColumnSet,
    ) -> Self {
        let hosts: HashMap<String, Host> =
            hosts.into_iter().map(|h| (h.host_id.clone(), h)).collect();
        let records = join_tables(&listings, &hosts, &reviews);
        info!(
            "Loaded {} listings, {} hosts, {} reviews into {} joined records",
            listings.len(),
            hosts.len(),
            reviews.len(),
            records.len()
        );

        let windows = match compute_windows(&records) {
            Ok(w) => Some(w),
            Err(e) => {
                warn!("Period comparison unavailable: {}", e);
                None
            }
        };

        Dataset {
            listings,
            hosts,
            reviews,
            records: RecordSet::new(records, columns),
            windows,
        }
    }

    /// Windows computed at load time; `None` when no review date parsed.
    pub fn windows(&self) -> Option<&PeriodWindows> {
        self.windows.as_ref()
    }
}

/// Left join listings → reviews, then listings → hosts. A listing without
/// reviews contributes one record with empty review fields.
pub fn join_tables(
    listings: &[Listing],
    hosts: &HashMap<String, Host>,
    reviews: &[Review],
) -> Vec<ListingRecord> {
    let mut by_listing: HashMap<&str, Vec<&Review>> = HashMap::new();
    for review in reviews {
        by_listing
            .entry(review.listing_id.as_str())
            .or_default()
            .push(review);
    }

    let mut records = Vec::with_capacity(reviews.len().max(listings.len()));
    let mut matched_reviews = 0;
    for listing in listings {
        let host = listing.host_id.as_deref().and_then(|id| hosts.get(id));
        match by_listing.get(listing.listing_id.as_str()) {
            Some(list) => {
                matched_reviews += list.len();
                records.extend(
                    list.iter()
                        .map(|review| ListingRecord::join(listing, host, Some(*review))),
                );
            }
            None => records.push(ListingRecord::join(listing, host, None)),
        }
    }

    if matched_reviews < reviews.len() {
        debug!(
            "Dropped {} reviews referencing unknown listings",
            reviews.len() - matched_reviews
        );
    }
    records
}

/// Header positions keyed by canonical column name. Cells are decoded
/// lazily, so bad bytes in a column nobody reads never surface.
struct HeaderIndex {
    positions: HashMap<String, usize>,
    invalid_cells: Cell<usize>,
}

impl HeaderIndex {
    fn new(headers: &ByteRecord) -> Self {
        let mut positions: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (String::from_utf8_lossy(h).trim().to_lowercase(), i))
            .collect();

        for (alias, canonical) in HEADER_ALIASES {
            if positions.contains_key(*canonical) {
                continue;
            }
            if let Some(&i) = positions.get(*alias) {
                positions.insert(canonical.to_string(), i);
            }
        }
        HeaderIndex {
            positions,
            invalid_cells: Cell::new(0),
        }
    }

    fn columns(&self) -> ColumnSet {
        self.positions.keys().cloned().collect()
    }

    /// Trimmed, non-empty cell of `column`. A cell that is not valid UTF-8
    /// counts as missing.
    fn get<'r>(&self, row: &'r ByteRecord, column: &str) -> Option<&'r str> {
        let i = *self.positions.get(column)?;
        match std::str::from_utf8(row.get(i)?) {
            Ok(cell) => Some(cell.trim()).filter(|s| !s.is_empty()),
            Err(_) => {
                self.invalid_cells.set(self.invalid_cells.get() + 1);
                None
            }
        }
    }

    fn report_invalid(&self, table: &str) {
        let invalid = self.invalid_cells.get();
        if invalid > 0 {
            warn!(
                "{} {} cells were not valid UTF-8 and were left empty",
                invalid, table
            );
        }
    }

    fn string(&self, row: &ByteRecord, column: &str) -> Option<String> {
        self.get(row, column).map(str::to_string)
    }

    fn number(&self, row: &ByteRecord, column: &str) -> Option<f64> {
        self.get(row, column).and_then(parse_number)
    }

    fn whole(&self, row: &ByteRecord, column: &str) -> Option<u32> {
        self.number(row, column)
            .filter(|v| *v >= 0.0)
            .map(|v| v.round() as u32)
    }
}

fn reader<R: Read>(source: R, delimiter: u8) -> csv::Reader<R> {
    ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(source)
}

/// Parses plain numbers as well as `$1,234.00` style prices.
pub fn parse_number(cell: &str) -> Option<f64> {
    let cleaned: String = cell
        .trim()
        .chars()
        .filter(|c| *c != '$' && *c != ',')
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses `95%` as 0.95; plain numbers are taken as fractions already.
pub fn parse_rate(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    match cell.strip_suffix('%') {
        Some(pct) => parse_number(pct).map(|v| v / 100.0),
        None => parse_number(cell),
    }
}

/// Day-first or ISO date; anything unparseable is treated as missing.
pub fn parse_date(cell: &str) -> Option<NaiveDate> {
    let cell = cell.trim();
    let date_part = cell.split([' ', 'T']).next().unwrap_or(cell);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

fn review_scores(index: &HeaderIndex, row: &ByteRecord) -> ReviewScores {
    let category = |c: ReviewCategory| index.number(row, c.column());
    ReviewScores {
        rating: index.number(row, columns::REVIEW_SCORES_RATING),
        accuracy: category(ReviewCategory::Accuracy),
        cleanliness: category(ReviewCategory::Cleanliness),
        checkin: category(ReviewCategory::Checkin),
        communication: category(ReviewCategory::Communication),
        location: category(ReviewCategory::Location),
        value: category(ReviewCategory::Value),
    }
}

pub fn read_listings<R: Read>(source: R, delimiter: u8) -> Result<(Vec<Listing>, ColumnSet)> {
    let mut rdr = reader(source, delimiter);
    let index = HeaderIndex::new(rdr.byte_headers()?);

    let mut listings = Vec::new();
    let mut skipped = 0;
    for result in rdr.byte_records() {
        let row = result?;
        let Some(listing_id) = index.string(&row, columns::LISTING_ID) else {
            skipped += 1;
            continue;
        };
        listings.push(Listing {
            listing_id,
            name: index.string(&row, columns::LISTING_NAME),
            host_id: index.string(&row, columns::HOST_ID),
            neighbourhood: index.string(&row, columns::NEIGHBOURHOOD),
            district: index.string(&row, columns::DISTRICT),
            city: index.string(&row, columns::CITY),
            latitude: index.number(&row, columns::LATITUDE),
            longitude: index.number(&row, columns::LONGITUDE),
            property_type: index.string(&row, columns::PROPERTY_TYPE),
            room_type: index.string(&row, columns::ROOM_TYPE),
            accommodates: index.whole(&row, columns::ACCOMMODATES),
            bedrooms: index.whole(&row, columns::BEDROOMS),
            price: index.number(&row, columns::PRICE),
            minimum_nights: index.whole(&row, columns::MINIMUM_NIGHTS),
            maximum_nights: index.whole(&row, columns::MAXIMUM_NIGHTS),
            instant_bookable: index
                .get(&row, columns::INSTANT_BOOKABLE)
                .and_then(parse_flag),
            scores: review_scores(&index, &row),
        });
    }

    if skipped > 0 {
        warn!("Skipped {} listings without a listing_id", skipped);
    }
    index.report_invalid("listing");
    debug!("Read {} listings", listings.len());
    Ok((listings, index.columns()))
}

pub fn read_hosts<R: Read>(source: R, delimiter: u8) -> Result<(Vec<Host>, ColumnSet)> {
    let mut rdr = reader(source, delimiter);
    let index = HeaderIndex::new(rdr.byte_headers()?);

    let mut hosts = Vec::new();
    for result in rdr.byte_records() {
        let row = result?;
        let Some(host_id) = index.string(&row, columns::HOST_ID) else {
            continue;
        };
        hosts.push(Host {
            host_id,
            is_superhost: index
                .get(&row, columns::HOST_IS_SUPERHOST)
                .and_then(parse_flag),
            response_rate: index
                .get(&row, columns::HOST_RESPONSE_RATE)
                .and_then(parse_rate),
            acceptance_rate: index
                .get(&row, columns::HOST_ACCEPTANCE_RATE)
                .and_then(parse_rate),
            total_listings_count: index.whole(&row, columns::HOST_TOTAL_LISTINGS_COUNT),
        });
    }

    index.report_invalid("host");
    debug!("Read {} hosts", hosts.len());
    Ok((hosts, index.columns()))
}

pub fn read_reviews<R: Read>(source: R, delimiter: u8) -> Result<(Vec<Review>, ColumnSet)> {
    let mut rdr = reader(source, delimiter);
    let index = HeaderIndex::new(rdr.byte_headers()?);

    let mut reviews = Vec::new();
    let mut bad_dates = 0;
    for result in rdr.byte_records() {
        let row = result?;
        let Some(listing_id) = index.string(&row, columns::LISTING_ID) else {
            continue;
        };
        let raw_date = index.get(&row, columns::REVIEW_DATE);
        let review_date = raw_date.and_then(parse_date);
        if raw_date.is_some() && review_date.is_none() {
            bad_dates += 1;
        }
        reviews.push(Review {
            review_id: index.string(&row, columns::REVIEW_ID),
            listing_id,
            review_date,
        });
    }

    if bad_dates > 0 {
        warn!("{} review dates could not be parsed and were left empty", bad_dates);
    }
    index.report_invalid("review");
    debug!("Read {} reviews", reviews.len());
    Ok((reviews, index.columns()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number_and_rate() {
        assert_eq!(parse_number("$1,250.50"), Some(1250.5));
        assert_eq!(parse_number(" 42 "), Some(42.0));
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_rate("95%"), Some(0.95));
        assert_eq!(parse_rate("0.8"), Some(0.8));
        assert_eq!(parse_rate(""), None);
    }

    #[test]
    fn test_parse_date_day_first() {
        let expected = NaiveDate::from_ymd_opt(2021, 1, 5);
        assert_eq!(parse_date("05/01/2021"), expected);
        assert_eq!(parse_date("2021-01-05"), expected);
        assert_eq!(parse_date("2021-01-05 00:00:00"), expected);
        assert_eq!(parse_date("not a date"), None);
    }

    #[test]
    fn test_read_listings_with_aliases() {
        let data = "\
listing_id;listings_name;host_id;district;price;instant_bookable
1;Cozy loft;10;Manhattan;$150;t
;Orphan;11;Queens;80;f
2;;12;Brooklyn;;f
";
        let (listings, cols) = read_listings(data.as_bytes(), b';').unwrap();

        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].name.as_deref(), Some("Cozy loft"));
        assert_eq!(listings[0].price, Some(150.0));
        assert_eq!(listings[0].instant_bookable, Some(true));
        assert_eq!(listings[1].price, None);
        assert!(cols.has(columns::LISTING_NAME));
        assert!(!cols.has(columns::REVIEW_SCORES_RATING));
    }

    #[test]
    fn test_read_reviews_ignores_bad_bytes_in_unread_columns() {
        let mut data = b"review_id,listing_id,date,comments\nr1,1,10/01/2020,great stay\nr2,1,12/01/2020,"
            .to_vec();
        data.extend_from_slice(&[0xff, 0xfe]);
        data.extend_from_slice(b"\nr3,");
        data.extend_from_slice(&[0xc3, 0x28]);
        data.extend_from_slice(b",13/01/2020,ok\nr4,2,");
        data.extend_from_slice(&[0xff]);
        data.extend_from_slice(b",fine\n");

        let (reviews, cols) = read_reviews(data.as_slice(), b',').unwrap();

        // r3 has an undecodable listing_id and is dropped; r4 keeps its row
        assert_eq!(reviews.len(), 3);
        assert_eq!(reviews[1].review_id.as_deref(), Some("r2"));
        assert_eq!(reviews[1].review_date, NaiveDate::from_ymd_opt(2020, 1, 12));
        assert_eq!(reviews[2].listing_id, "2");
        assert_eq!(reviews[2].review_date, None);
        assert!(cols.has(columns::REVIEW_DATE));
    }

    #[test]
    fn test_join_keeps_listings_without_reviews() {
        let listings = vec![
            Listing {
                listing_id: "1".into(),
                host_id: Some("10".into()),
                ..Default::default()
            },
            Listing {
                listing_id: "2".into(),
                ..Default::default()
            },
        ];
        let hosts: HashMap<String, Host> = [(
            "10".to_string(),
            Host {
                host_id: "10".into(),
                is_superhost: Some(true),
                ..Default::default()
            },
        )]
        .into_iter()
        .collect();
        let reviews = vec![
            Review {
                review_id: Some("a".into()),
                listing_id: "1".into(),
                review_date: parse_date("2020-01-10"),
            },
            Review {
                review_id: Some("b".into()),
                listing_id: "1".into(),
                review_date: parse_date("2020-03-10"),
            },
            Review {
                review_id: Some("c".into()),
                listing_id: "99".into(),
                review_date: parse_date("2020-03-10"),
            },
        ];

        let records = join_tables(&listings, &hosts, &reviews);

        assert_eq!(records.len(), 3);
        assert!(records[..2].iter().all(|r| r.is_superhost == Some(true)));
        assert_eq!(records[2].listing_id, "2");
        assert_eq!(records[2].review_date, None);
    }
}
