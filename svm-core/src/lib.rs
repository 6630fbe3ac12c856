pub mod error;
pub mod month_range;
pub mod observation;
pub mod reach;
pub mod reach_length;
pub mod reach_series;
pub mod reference;
pub mod scenario;
pub mod tables;
pub mod translation;
