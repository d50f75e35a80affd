pub mod client;
pub mod models;

pub use client::PolygonClient;
pub use models::{AggregateBar, PolygonError};
