// src/bin/metrics_report.rs
use airbnb_dashboard::config::Config;
use airbnb_dashboard::models::ListingFilter;
use airbnb_dashboard::services::exploration::explore;
use airbnb_dashboard::services::loader::Dataset;
use dotenv::dotenv;
use log::info;
use std::env;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env()?;
    let district = env::args().nth(1);
    let neighbourhood = env::args().nth(2);
    let filter = ListingFilter::from_selection(district.as_deref(), neighbourhood.as_deref());

    info!("Loading data from {}", config.data_dir.display());
    let dataset = Dataset::load(&config.data_dir, config.csv_delimiter)?;
    let exploration = explore(&dataset, &filter);

    println!("Exploration for {}", filter);
    println!("Matching listings: {}", exploration.matching_listings);

    if let Some(message) = &exploration.comparison_message {
        println!("{}", message);
        return Ok(());
    }
    if let Some(comparison) = &exploration.comparison {
        println!("{}", comparison.note);
    }

    let tabs = [
        ("Overview", &exploration.overview.cards),
        ("Pricing", &exploration.pricing.cards),
        ("Reviews", &exploration.reviews.cards),
    ];
    for (tab, cards) in tabs {
        println!("\n{}", tab);
        for card in cards {
            println!("  {:<30} {:>14} {:>12}", card.label, card.value, card.delta);
        }
    }

    Ok(())
}
