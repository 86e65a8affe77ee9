pub mod breakdowns;
pub mod calculations;
pub mod display;
pub mod exploration;
pub mod loader;
pub mod map;
pub mod metrics;
pub mod overview;
pub mod prediction;
pub mod windows;
