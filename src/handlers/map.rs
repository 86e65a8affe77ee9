// src/handlers/map.rs
use serde::Deserialize;
use std::sync::Arc;
use warp::reply::Json;
use warp::Rejection;

use crate::models::ListingFilter;
use crate::services::map::{search, MapQuery};
use crate::state::AppState;
use log::info;

#[derive(Debug, Default, Deserialize)]
pub struct MapParams {
    pub district: Option<String>,
    /// Comma-separated neighbourhood selection.
    pub neighbourhoods: Option<String>,
}

impl MapParams {
    fn into_query(self) -> MapQuery {
        let district = ListingFilter::from_selection(self.district.as_deref(), None).district;
        let neighbourhoods = self
            .neighbourhoods
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .collect();
        MapQuery {
            district,
            neighbourhoods,
        }
    }
}

pub async fn get_map(params: MapParams, state: Arc<AppState>) -> Result<Json, Rejection> {
    let query = params.into_query();
    info!(
        "Handling map request for district {:?} with {} neighbourhoods",
        query.district,
        query.neighbourhoods.len()
    );
    let view = search(&state.dataset.listings, &state.config.map_city, &query);
    Ok(warp::reply::json(&view))
}
