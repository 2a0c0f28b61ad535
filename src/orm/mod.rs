pub mod photos;
pub mod reviews;
pub mod users;
pub mod water_sources;
