pub mod api;
pub mod attendance;
pub mod error;
pub mod geo;
pub mod models;
pub mod schedule;
