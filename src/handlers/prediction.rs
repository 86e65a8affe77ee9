// src/handlers/prediction.rs
use std::sync::Arc;
use warp::reply::Json;
use warp::Rejection;

use super::error::ApiError;
use crate::services::prediction::{predict_price, PredictionInput};
use crate::state::AppState;
use log::{error, info};

pub async fn post_predict(
    input: PredictionInput,
    state: Arc<AppState>,
) -> Result<Json, Rejection> {
    info!("Handling price prediction request");

    let model = state.model.as_ref().ok_or_else(|| {
        error!("Prediction requested but no price model is loaded");
        warp::reject::custom(ApiError::unavailable("Price model is not loaded"))
    })?;

    let prediction = predict_price(model.as_ref(), &input).map_err(|e| {
        error!("Prediction failed: {}", e);
        warp::reject::custom(ApiError::from(e))
    })?;

    Ok(warp::reply::json(&prediction))
}
