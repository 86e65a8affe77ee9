// src/state.rs
use std::sync::Arc;

use crate::config::Config;
use crate::services::loader::Dataset;
use crate::services::prediction::PriceModel;

/// Shared, read-only state handed to every request.
pub struct AppState {
    pub config: Config,
    pub dataset: Dataset,
    pub model: Option<Arc<dyn PriceModel>>,
}

impl AppState {
    pub fn new(config: Config, dataset: Dataset, model: Option<Arc<dyn PriceModel>>) -> Self {
        AppState {
            config,
            dataset,
            model,
        }
    }
}
