use std::fs;
use std::path::Path;

use plotters::prelude::*;
use tracing::debug;
use uuid::Uuid;

use crate::models::{ImageSize, RenderedImage, Series};
use crate::utils::errors::ServiceError;

pub const LINE_COLOR: RGBColor = RGBColor(0x1f, 0x77, 0xb4);
const STROKE_WIDTH: u32 = 2;
const FILL_OPACITY: f64 = 0.3;
/// Inset so the stroke is not clipped at the canvas edge
const MARGIN: i32 = 4;
const DOT_RADIUS: i32 = 3;

/// Render a spark graph off the async executor
pub async fn render_spark_graph(
    series: Series,
    size: ImageSize,
) -> Result<RenderedImage, ServiceError> {
    tokio::task::spawn_blocking(move || draw_spark_graph(&series, size))
        .await
        .map_err(|e| ServiceError::InternalError(format!("Render task failed: {}", e)))?
}

/// Draw `series` as a spark graph of exactly `size` pixels and return PNG bytes.
///
/// No axes, grid or labels. An empty series gives a blank canvas and a single
/// bar gives one dot.
pub fn draw_spark_graph(series: &Series, size: ImageSize) -> Result<RenderedImage, ServiceError> {
    let temp_file = std::env::temp_dir().join(format!("spark_graph_{}.png", Uuid::new_v4()));

    let bytes = draw_to_file(series, size, &temp_file).and_then(|_| {
        fs::read(&temp_file).map_err(|e| format!("Failed to read chart file: {}", e))
    });
    let _ = fs::remove_file(&temp_file);
    let bytes = bytes.map_err(ServiceError::InternalError)?;

    debug!(
        "Rendered {} points at {}x{} ({} bytes)",
        series.len(),
        size.width,
        size.height,
        bytes.len()
    );

    Ok(RenderedImage {
        bytes,
        width: size.width,
        height: size.height,
    })
}

fn draw_to_file(series: &Series, size: ImageSize, path: &Path) -> Result<(), String> {
    let root = BitMapBackend::new(path, (size.width, size.height)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| format!("Failed to fill canvas: {}", e))?;

    let points = scale_points(series, size);
    match points.as_slice() {
        [] => {}
        [point] => {
            root.draw(&Circle::new(*point, DOT_RADIUS, LINE_COLOR.filled()))
                .map_err(|e| format!("Failed to draw point: {}", e))?;
        }
        [first, .., last] => {
            let baseline = size.height as i32 - 1 - MARGIN;
            let mut area = points.clone();
            area.push((last.0, baseline));
            area.push((first.0, baseline));

            root.draw(&Polygon::new(area, LINE_COLOR.mix(FILL_OPACITY).filled()))
                .map_err(|e| format!("Failed to fill area: {}", e))?;
            root.draw(&PathElement::new(
                points.clone(),
                LINE_COLOR.stroke_width(STROKE_WIDTH),
            ))
            .map_err(|e| format!("Failed to draw line: {}", e))?;
        }
    }

    root.present()
        .map_err(|e| format!("Failed to render chart: {}", e))?;

    Ok(())
}

/// Map each bar to canvas pixels.
///
/// x is spaced evenly by index across the plot width; y is scaled so the lowest
/// close sits on the bottom edge and the highest on the top edge. A flat series
/// (or a single bar) sits on the vertical middle.
pub fn scale_points(series: &Series, size: ImageSize) -> Vec<(i32, i32)> {
    let Some((min, max)) = series.price_range() else {
        return Vec::new();
    };

    let left = MARGIN;
    let right = size.width as i32 - 1 - MARGIN;
    let top = MARGIN;
    let bottom = size.height as i32 - 1 - MARGIN;
    let middle = (top + bottom) / 2;

    let n = series.len();
    if n == 1 {
        return vec![((left + right) / 2, middle)];
    }

    let x_step = f64::from(right - left) / (n - 1) as f64;
    let y_span = f64::from(bottom - top);

    series
        .bars()
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let x = left + (i as f64 * x_step).round() as i32;
            let y = if max > min {
                bottom - ((bar.close_price - min) / (max - min) * y_span).round() as i32
            } else {
                middle
            };
            (x, y)
        })
        .collect()
}
