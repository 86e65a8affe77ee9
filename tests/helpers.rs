#![allow(dead_code)]

use airbnb_dashboard::services::loader::Dataset;
use airbnb_dashboard::services::prediction::{LinearPriceModel, PriceModel};
use std::path::PathBuf;
use std::sync::Arc;

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

/// The small Manhattan/Queens/Paris dataset under tests/fixtures.
pub fn fixture_dataset() -> Dataset {
    Dataset::load(&fixtures_dir(), b',').expect("fixture dataset should load")
}

pub fn fixture_model() -> Arc<dyn PriceModel> {
    let model = LinearPriceModel::load(&fixtures_dir().join("price_model.json"))
        .expect("fixture model should load");
    Arc::new(model)
}
