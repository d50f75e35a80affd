//! Data models for the spark graph service
//!
//! Requests are validated into `GraphRequest`, provider bars become a `Series`,
//! and the renderer produces a `RenderedImage`. Nothing here outlives a request.

pub mod bar;
pub mod chart;
pub mod graph;

pub use bar::{Bar, Series};
pub use chart::RenderedImage;
pub use graph::{GraphDuration, GraphRequest, ImageSize, Timespan};
