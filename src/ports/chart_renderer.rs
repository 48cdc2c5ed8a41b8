//! Chart-rendering port definition.

use std::path::PathBuf;

/// Port for turning plotting code into an image file.
pub trait ChartRenderer {
    /// Path of the rendered image, or `None` when the code has no plotting
    /// call or rendering failed.
    fn render(&self, source: &str) -> Option<PathBuf>;
}

/// Renderer that never produces a chart.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledChartRenderer;

impl ChartRenderer for DisabledChartRenderer {
    fn render(&self, _source: &str) -> Option<PathBuf> {
        None
    }
}
