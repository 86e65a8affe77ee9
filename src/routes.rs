// src/routes.rs
use std::sync::Arc;
use warp::filters::body::BodyDeserializeError;
use warp::reject::{InvalidQuery, Rejection};
use crate::handlers::{exploration::get_exploration, map::get_map,
                     overview::{get_districts, get_overview}, prediction::post_predict};
use crate::state::AppState;
use log::info;

use std::convert::Infallible;
use warp::{Filter, Reply};
use crate::handlers::error::ApiError;

/// Maximum accepted prediction request body.
const MAX_BODY_BYTES: u64 = 16 * 1024;

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let code;
    let message;

    if err.is_not_found() {
        code = warp::http::StatusCode::NOT_FOUND;
        message = "Not Found".to_string();
    } else if let Some(api_error) = err.find::<ApiError>() {
        code = api_error.status;
        message = api_error.message.clone();
    } else if let Some(e) = err.find::<BodyDeserializeError>() {
        code = warp::http::StatusCode::BAD_REQUEST;
        message = e.to_string();
    } else if let Some(e) = err.find::<InvalidQuery>() {
        code = warp::http::StatusCode::BAD_REQUEST;
        message = e.to_string();
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        code = warp::http::StatusCode::METHOD_NOT_ALLOWED;
        message = "Method Not Allowed".to_string();
    } else {
        code = warp::http::StatusCode::INTERNAL_SERVER_ERROR;
        message = "Internal Server Error".to_string();
    }

    Ok(warp::reply::with_status(
        warp::reply::json(&serde_json::json!({
            "error": message,
        })),
        code,
    ))
}

pub fn routes(state: Arc<AppState>) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    info!("Configuring routes...");

    let state_filter = warp::any().map(move || state.clone());

    let overview_route = warp::path!("api" / "v1" / "overview")
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(get_overview);

    let districts_route = warp::path!("api" / "v1" / "districts")
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(get_districts);

    let exploration_route = warp::path!("api" / "v1" / "exploration")
        .and(warp::get())
        .and(warp::query())
        .and(state_filter.clone())
        .and_then(get_exploration);

    let map_route = warp::path!("api" / "v1" / "map")
        .and(warp::get())
        .and(warp::query())
        .and(state_filter.clone())
        .and_then(get_map);

    let predict_route = warp::path!("api" / "v1" / "predict")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(state_filter.clone())
        .and_then(post_predict);

    info!("All routes configured successfully.");

    overview_route
        .or(districts_route)
        .or(exploration_route)
        .or(map_route)
        .or(predict_route)
        .recover(handle_rejection)
}
