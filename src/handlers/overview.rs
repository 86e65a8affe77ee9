// src/handlers/overview.rs
use std::sync::Arc;
use warp::reply::Json;
use warp::Rejection;

use crate::services::overview::{dataset_overview, district_options};
use crate::state::AppState;
use log::{debug, info};

pub async fn get_overview(state: Arc<AppState>) -> Result<Json, Rejection> {
    info!("Handling request for dataset overview");
    let overview = dataset_overview(&state.dataset);
    debug!("Overview: {} listings, {} reviews", overview.total_listings, overview.total_reviews);
    Ok(warp::reply::json(&overview))
}

pub async fn get_districts(state: Arc<AppState>) -> Result<Json, Rejection> {
    Ok(warp::reply::json(&district_options(&state.dataset)))
}
