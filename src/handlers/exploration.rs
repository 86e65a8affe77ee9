// src/handlers/exploration.rs
use serde::Deserialize;
use std::sync::Arc;
use warp::reply::Json;
use warp::Rejection;

use crate::models::ListingFilter;
use crate::services::exploration::explore;
use crate::state::AppState;
use log::info;

#[derive(Debug, Default, Deserialize)]
pub struct ExplorationQuery {
    pub district: Option<String>,
    pub neighbourhood: Option<String>,
}

pub async fn get_exploration(
    query: ExplorationQuery,
    state: Arc<AppState>,
) -> Result<Json, Rejection> {
    let filter =
        ListingFilter::from_selection(query.district.as_deref(), query.neighbourhood.as_deref());
    info!("Handling request for exploration data [{}]", filter);

    let exploration = explore(&state.dataset, &filter);
    Ok(warp::reply::json(&exploration))
}
