pub mod error;
pub mod exploration;
pub mod map;
pub mod overview;
pub mod prediction;
