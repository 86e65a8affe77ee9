use airbnb_dashboard::config::Config;
use airbnb_dashboard::routes;
use airbnb_dashboard::services::loader::Dataset;
use airbnb_dashboard::services::prediction::{LinearPriceModel, PriceModel};
use airbnb_dashboard::state::AppState;
use anyhow::{anyhow, Context};
use dotenv::dotenv;
use log::{info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use warp::Filter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    // Initialize the logger
    env_logger::init();
    info!("Logger initialized. Starting the application...");

    let config = Config::from_env().map_err(|e| anyhow!(e))?;
    info!("Using PORT: {}", config.port);

    let dataset = Dataset::load(&config.data_dir, config.csv_delimiter)
        .with_context(|| format!("failed to load dataset from {}", config.data_dir.display()))?;

    let model: Option<Arc<dyn PriceModel>> = match LinearPriceModel::load(&config.model_path) {
        Ok(m) => Some(Arc::new(m)),
        Err(e) => {
            warn!("Price prediction disabled, could not load model: {}", e);
            None
        }
    };

    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    info!("Will bind to: {}", addr);

    // Set up CORS
    let cors = warp::cors()
        .allow_any_origin()
        .allow_header("content-type")
        .allow_methods(vec!["GET", "POST"]);

    let state = Arc::new(AppState::new(config, dataset, model));
    let api = routes::routes(state).with(cors);
    info!("Routes configured successfully with CORS.");

    info!("Starting server on {}", addr);
    warp::serve(api).run(addr).await;
    Ok(())
}
