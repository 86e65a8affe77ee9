// src/services/map.rs
use log::debug;
use serde::Serialize;

use crate::models::Listing;
use crate::services::breakdowns::unique_in_order;
use crate::services::calculations::{calculate_average, distinct_count};

pub const DEFAULT_ZOOM: u8 = 11;

/// District plus optional neighbourhood multi-selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapQuery {
    pub district: Option<String>,
    pub neighbourhoods: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapCenter {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub listing_id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub price: f64,
    pub neighbourhood: Option<String>,
    pub property_type: Option<String>,
    pub room_type: Option<String>,
    pub accommodates: Option<u32>,
    pub bedrooms: Option<u32>,
    pub minimum_nights: Option<u32>,
    pub maximum_nights: Option<u32>,
    pub instant_bookable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub city: String,
    pub district: Option<String>,
    pub listings_in_district: usize,
    pub neighbourhoods_in_district: usize,
    pub neighbourhood_options: Vec<String>,
    pub total_listings: usize,
    pub center: Option<MapCenter>,
    pub markers: Vec<MapMarker>,
}

/// Marker for a listing that has everything a map pin needs.
fn marker(listing: &Listing) -> Option<MapMarker> {
    Some(MapMarker {
        listing_id: listing.listing_id.clone(),
        name: listing.name.clone()?,
        latitude: listing.latitude?,
        longitude: listing.longitude?,
        price: listing.price?,
        neighbourhood: listing.neighbourhood.clone(),
        property_type: listing.property_type.clone(),
        room_type: listing.room_type.clone(),
        accommodates: listing.accommodates,
        bedrooms: listing.bedrooms,
        minimum_nights: listing.minimum_nights,
        maximum_nights: listing.maximum_nights,
        instant_bookable: listing.instant_bookable.unwrap_or(false),
    })
}

pub fn search(listings: &[Listing], city: &str, query: &MapQuery) -> MapView {
    let in_district: Vec<&Listing> = listings
        .iter()
        .filter(|l| l.city.as_deref() == Some(city))
        .filter(|l| match &query.district {
            Some(d) => l.district.as_deref() == Some(d.as_str()),
            None => true,
        })
        .collect();

    let neighbourhoods_in_district = distinct_count(
        in_district
            .iter()
            .filter_map(|l| l.neighbourhood.as_deref()),
    );

    let complete: Vec<MapMarker> = in_district.iter().filter_map(|l| marker(l)).collect();
    let neighbourhood_options = unique_in_order(&complete, |m| m.neighbourhood.as_deref());

    let markers: Vec<MapMarker> = if query.neighbourhoods.is_empty() {
        complete
    } else {
        complete
            .into_iter()
            .filter(|m| {
                m.neighbourhood
                    .as_ref()
                    .map_or(false, |n| query.neighbourhoods.contains(n))
            })
            .collect()
    };

    let lats: Vec<f64> = markers.iter().map(|m| m.latitude).collect();
    let lons: Vec<f64> = markers.iter().map(|m| m.longitude).collect();
    let center = calculate_average(&lats)
        .zip(calculate_average(&lons))
        .map(|(latitude, longitude)| MapCenter {
            latitude,
            longitude,
            zoom: DEFAULT_ZOOM,
        });

    debug!(
        "Map search in {} ({:?}): {} in district, {} markers",
        city,
        query.district,
        in_district.len(),
        markers.len()
    );

    MapView {
        city: city.to_string(),
        district: query.district.clone(),
        listings_in_district: in_district.len(),
        neighbourhoods_in_district,
        neighbourhood_options,
        total_listings: markers.len(),
        center,
        markers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(id: &str, district: &str, hood: &str, lat: Option<f64>) -> Listing {
        Listing {
            listing_id: id.into(),
            name: Some(format!("Listing {}", id)),
            city: Some("New York".into()),
            district: Some(district.into()),
            neighbourhood: Some(hood.into()),
            latitude: lat,
            longitude: Some(-73.9),
            price: Some(100.0),
            ..Default::default()
        }
    }

    fn sample() -> Vec<Listing> {
        let mut paris = listing("9", "Manhattan", "Harlem", Some(48.8));
        paris.city = Some("Paris".into());
        vec![
            listing("1", "Manhattan", "Harlem", Some(40.8)),
            listing("2", "Manhattan", "Chelsea", Some(40.7)),
            listing("3", "Manhattan", "Chelsea", None),
            listing("4", "Brooklyn", "Bushwick", Some(40.6)),
            paris,
        ]
    }

    #[test]
    fn test_search_drops_incomplete_rows() {
        let query = MapQuery {
            district: Some("Manhattan".into()),
            neighbourhoods: Vec::new(),
        };
        let view = search(&sample(), "New York", &query);

        assert_eq!(view.listings_in_district, 3);
        assert_eq!(view.neighbourhoods_in_district, 2);
        assert_eq!(view.total_listings, 2);
        assert_eq!(view.neighbourhood_options, vec!["Harlem", "Chelsea"]);
        let center = view.center.unwrap();
        assert!((center.latitude - 40.75).abs() < 1e-9);
    }

    #[test]
    fn test_search_by_neighbourhood() {
        let query = MapQuery {
            district: Some("Manhattan".into()),
            neighbourhoods: vec!["Chelsea".into()],
        };
        let view = search(&sample(), "New York", &query);
        assert_eq!(view.total_listings, 1);
        assert_eq!(view.markers[0].listing_id, "2");
    }

    #[test]
    fn test_search_without_matches_has_no_center() {
        let query = MapQuery {
            district: Some("Staten Island".into()),
            neighbourhoods: Vec::new(),
        };
        let view = search(&sample(), "New York", &query);
        assert_eq!(view.total_listings, 0);
        assert!(view.center.is_none());
    }

    #[test]
    fn test_search_whole_city() {
        let view = search(&sample(), "New York", &MapQuery::default());
        assert_eq!(view.listings_in_district, 4);
        assert_eq!(view.total_listings, 3);
    }
}
