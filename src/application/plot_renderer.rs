// Plot renderer trait - External charting capability the grapher drives
use crate::domain::render_options::RenderOptions;
use crate::domain::series::Series;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

/// Axis extents resolved by the renderer; `None` when nothing visible was plotted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Axes {
    pub x: Option<AxisRange>,
    pub y: Option<AxisRange>,
}

/// Styling the renderer settled on for one input series, in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesStyle {
    pub label: String,
    pub color: String,
    pub hidden: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Svg,
    Png,
}

impl ImageFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            ImageFormat::Svg => "image/svg+xml",
            ImageFormat::Png => "image/png",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportedImage {
    pub format: ImageFormat,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("render failed: {0}")]
    Failed(String),
}

/// A drawn plot. Owned by the grapher until the next render replaces it.
pub trait RenderedPlot: Send + Sync {
    fn axes(&self) -> Axes;

    fn series_styles(&self) -> &[SeriesStyle];

    /// Serializable description of the plot for a browser front end.
    fn document(&self) -> serde_json::Value;

    fn export_image(&self, format: ImageFormat) -> Result<ExportedImage, RenderError>;
}

pub trait PlotRenderer: Send + Sync {
    /// Draw every series, hidden ones included and flagged, into `container`.
    fn render(
        &self,
        container: &str,
        series: &[Series],
        options: &RenderOptions,
    ) -> Result<Box<dyn RenderedPlot>, RenderError>;
}
