//! Request pipeline stages, from credential check to PNG rendering

pub mod auth_service;
pub mod chart_service;
pub mod graph_service;
pub mod request_service;
pub mod series_service;
