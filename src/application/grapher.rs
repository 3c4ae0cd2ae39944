// Time series grapher - Fetches one graph's data, tracks series visibility and zoom history
use crate::application::data_endpoint::{DataEndpoint, FetchError, FetchRequest};
use crate::application::plot_renderer::{
    Axes, ExportedImage, ImageFormat, PlotRenderer, RenderError, RenderedPlot,
};
use crate::domain::render_options::RenderOptions;
use crate::domain::series::{FetchedPayload, Series};
use crate::domain::time_range::{TimeRange, ZoomBoundsError, ZoomStack};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Binding of a widget to its data endpoint and display settings.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub endpoint_url: String,
    pub series_id: String,
    pub range: TimeRange,
    /// Overrides merged over the defaults and the server's properties.
    pub render_options: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("graph endpoint url must not be empty")]
    MissingEndpointUrl,
    #[error("graph id must not be empty")]
    MissingSeriesId,
}

#[derive(Debug, Error)]
pub enum GrapherError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    ZoomBounds(#[from] ZoomBoundsError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("graph is not configured")]
    NotConfigured,
    #[error("graph has no data loaded yet")]
    NotLoaded,
    #[error("no series labelled {0:?}")]
    UnknownSeries(String),
    #[error("no series at index {0}")]
    SeriesIndex(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The payload replaced the previous one and was drawn.
    Rendered,
    /// The server reported an error; the previous plot stays on screen.
    ServerError(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub index: usize,
    pub label: String,
    pub color: String,
    /// Hidden series keep their row but lose their color box.
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub columns: usize,
    pub entries: Vec<LegendEntry>,
}

impl Default for Legend {
    fn default() -> Self {
        Self {
            columns: 1,
            entries: Vec::new(),
        }
    }
}

/// Snapshot of a widget for the page front end.
#[derive(Debug, Clone, Serialize)]
pub struct GraphView {
    pub id: String,
    pub range: Option<TimeRange>,
    pub zoom_depth: usize,
    pub generation: u64,
    pub series_count: usize,
    pub legend_shown: bool,
    pub legend: Legend,
    pub axes: Axes,
    pub plot: Option<Value>,
    pub error: Option<String>,
}

pub type ZoomedCallback = Box<dyn Fn(TimeRange) + Send + Sync>;

pub struct TimeSeriesGrapher {
    endpoint: Arc<dyn DataEndpoint>,
    renderer: Arc<dyn PlotRenderer>,
    config: Option<GraphConfig>,
    payload: Option<FetchedPayload>,
    options: RenderOptions,
    plot: Option<Box<dyn RenderedPlot>>,
    legend: Legend,
    zooms: ZoomStack,
    error_notice: Option<String>,
    generation: u64,
    zoomed: Vec<ZoomedCallback>,
}

impl TimeSeriesGrapher {
    pub fn new(endpoint: Arc<dyn DataEndpoint>, renderer: Arc<dyn PlotRenderer>) -> Self {
        Self {
            endpoint,
            renderer,
            config: None,
            payload: None,
            options: RenderOptions::default(),
            plot: None,
            legend: Legend::default(),
            zooms: ZoomStack::default(),
            error_notice: None,
            generation: 0,
            zoomed: Vec::new(),
        }
    }

    pub fn configure(&mut self, config: GraphConfig) -> Result<(), ConfigError> {
        if config.endpoint_url.trim().is_empty() {
            return Err(ConfigError::MissingEndpointUrl);
        }
        if config.series_id.trim().is_empty() {
            return Err(ConfigError::MissingSeriesId);
        }

        let reconfigured = self.payload.as_ref().map(|p| merged_options(p, &config.render_options));
        self.config = Some(config);
        if let Some(options) = reconfigured {
            self.options = options;
            if let Err(e) = self.render() {
                tracing::warn!("Could not redraw graph after reconfiguration: {}", e);
            }
        }
        Ok(())
    }

    /// Subscribe to successful zooms, called once the new range is drawn.
    pub fn on_zoomed(&mut self, callback: impl Fn(TimeRange) + Send + Sync + 'static) {
        self.zoomed.push(Box::new(callback));
    }

    /// Fetch `range`, or the configured range, and draw it.
    /// Nothing changes until the response is in hand.
    pub async fn load(&mut self, range: Option<TimeRange>) -> Result<LoadOutcome, GrapherError> {
        let config = self.config.as_ref().ok_or(GrapherError::NotConfigured)?;
        let url = config.endpoint_url.clone();
        let overrides = config.render_options.clone();
        let request = FetchRequest::new(&config.series_id, range.unwrap_or(config.range));

        self.generation += 1;
        tracing::debug!(
            "Fetching graph {} from {} ({} -> {}), generation {}",
            request.id, url, request.from, request.to, self.generation
        );

        let mut payload = match self.endpoint.fetch(&url, &request).await {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!("Error fetching graph {}: {}", request.id, e);
                return Err(e.into());
            }
        };

        if let Some(message) = payload.error.take() {
            tracing::warn!("Data endpoint reported an error for graph {}: {}", request.id, message);
            self.error_notice = Some(message.clone());
            return Ok(LoadOutcome::ServerError(message));
        }

        let duplicates = payload.duplicate_labels();
        if !duplicates.is_empty() {
            tracing::warn!("Graph {} has duplicate series labels: {:?}", request.id, duplicates);
        }
        if let Some(previous) = &self.payload {
            payload.carry_hidden(&previous.hidden_labels());
        }
        let options = merged_options(&payload, &overrides);
        let plot = self.renderer.render(&request.id, &payload.series, &options)?;

        self.payload = Some(payload);
        self.options = options;
        self.install(plot);
        Ok(LoadOutcome::Rendered)
    }

    /// Redraw the current payload with the current visibility.
    pub fn render(&mut self) -> Result<(), GrapherError> {
        let config = self.config.as_ref().ok_or(GrapherError::NotConfigured)?;
        let payload = self.payload.as_ref().ok_or(GrapherError::NotLoaded)?;
        let plot = self
            .renderer
            .render(&config.series_id, &payload.series, &self.options)?;
        self.install(plot);
        Ok(())
    }

    pub async fn zoom(&mut self, from: i64, to: i64) -> Result<LoadOutcome, GrapherError> {
        let range = TimeRange::new(from, to).inspect_err(|e| {
            tracing::warn!("Rejected zoom: {}", e);
        })?;
        let current = self.range().ok_or(GrapherError::NotConfigured)?;

        let outcome = self.load(Some(range)).await?;
        self.zooms.push(current);
        self.commit_range(range, &outcome);
        Ok(outcome)
    }

    /// Jump to a new window without recording history, as the scale buttons do.
    pub async fn set_range(&mut self, range: TimeRange) -> Result<LoadOutcome, GrapherError> {
        let outcome = self.load(Some(range)).await?;
        if let Some(config) = self.config.as_mut() {
            config.range = range;
        }
        Ok(outcome)
    }

    /// Return to the range left by the last zoom. `None` when there is no history.
    pub async fn zoom_back(&mut self) -> Result<Option<LoadOutcome>, GrapherError> {
        let Some(range) = self.zooms.peek() else {
            return Ok(None);
        };

        let outcome = self.load(Some(range)).await?;
        self.zooms.pop();
        self.commit_range(range, &outcome);
        Ok(Some(outcome))
    }

    pub fn set_series_visible(&mut self, label: &str, visible: bool) -> Result<(), GrapherError> {
        let payload = self.payload.as_mut().ok_or(GrapherError::NotLoaded)?;
        let series = payload
            .find_mut(label)
            .ok_or_else(|| GrapherError::UnknownSeries(label.to_string()))?;
        series.hide = !visible;
        self.render()
    }

    /// Legend click: flip one series by position.
    pub fn toggle_series_at(&mut self, index: usize) -> Result<(), GrapherError> {
        let payload = self.payload.as_mut().ok_or(GrapherError::NotLoaded)?;
        let series = payload
            .series
            .get_mut(index)
            .ok_or(GrapherError::SeriesIndex(index))?;
        series.hide = !series.hide;
        self.render()
    }

    pub fn show_all(&mut self) -> Result<(), GrapherError> {
        self.payload_mut()?.set_all_hidden(false);
        self.render()
    }

    pub fn hide_all(&mut self) -> Result<(), GrapherError> {
        self.payload_mut()?.set_all_hidden(true);
        self.render()
    }

    pub fn invert_visibility(&mut self) -> Result<(), GrapherError> {
        self.payload_mut()?.invert_hidden();
        self.render()
    }

    /// Export the plot with its legend drawn, whatever the on-screen setting.
    /// The forced-legend plot is drawn off screen; the displayed plot is not touched.
    pub fn export_image(&self, format: ImageFormat) -> Result<ExportedImage, GrapherError> {
        if self.options.legend_shown() {
            return self.export_current(format);
        }

        let config = self.config.as_ref().ok_or(GrapherError::NotConfigured)?;
        let payload = self.payload.as_ref().ok_or(GrapherError::NotLoaded)?;
        let mut options = self.options.clone();
        options.set_legend_shown(true);
        let plot = self
            .renderer
            .render(&config.series_id, &payload.series, &options)?;
        Ok(plot.export_image(format)?)
    }

    pub fn dismiss_error(&mut self) {
        self.error_notice = None;
    }

    pub fn id(&self) -> Option<&str> {
        self.config.as_ref().map(|c| c.series_id.as_str())
    }

    pub fn range(&self) -> Option<TimeRange> {
        self.config.as_ref().map(|c| c.range)
    }

    pub fn series(&self) -> &[Series] {
        self.payload.as_ref().map(|p| p.series.as_slice()).unwrap_or_default()
    }

    pub fn legend(&self) -> &Legend {
        &self.legend
    }

    pub fn legend_shown(&self) -> bool {
        self.options.legend_shown()
    }

    pub fn error_notice(&self) -> Option<&str> {
        self.error_notice.as_deref()
    }

    pub fn zoom_depth(&self) -> usize {
        self.zooms.len()
    }

    pub fn view(&self) -> GraphView {
        GraphView {
            id: self.id().unwrap_or_default().to_string(),
            range: self.range(),
            zoom_depth: self.zoom_depth(),
            generation: self.generation,
            series_count: self.series().len(),
            legend_shown: self.legend_shown(),
            legend: self.legend().clone(),
            axes: self.plot.as_ref().map(|p| p.axes()).unwrap_or_default(),
            plot: self.plot.as_ref().map(|p| p.document()),
            error: self.error_notice().map(str::to_string),
        }
    }

    fn payload_mut(&mut self) -> Result<&mut FetchedPayload, GrapherError> {
        self.payload.as_mut().ok_or(GrapherError::NotLoaded)
    }

    fn export_current(&self, format: ImageFormat) -> Result<ExportedImage, GrapherError> {
        let plot = self.plot.as_ref().ok_or(GrapherError::NotLoaded)?;
        Ok(plot.export_image(format)?)
    }

    fn install(&mut self, plot: Box<dyn RenderedPlot>) {
        self.legend = Legend {
            columns: self.options.legend_columns(),
            entries: plot
                .series_styles()
                .iter()
                .enumerate()
                .filter(|(_, style)| !style.label.is_empty())
                .map(|(index, style)| LegendEntry {
                    index,
                    label: style.label.clone(),
                    color: style.color.clone(),
                    hidden: style.hidden,
                })
                .collect(),
        };
        self.plot = Some(plot);
        self.error_notice = None;
    }

    fn commit_range(&mut self, range: TimeRange, outcome: &LoadOutcome) {
        if let Some(config) = self.config.as_mut() {
            config.range = range;
        }
        if *outcome == LoadOutcome::Rendered {
            for callback in &self.zoomed {
                callback(range);
            }
        }
    }
}

fn merged_options(payload: &FetchedPayload, overrides: &Value) -> RenderOptions {
    RenderOptions::layered(payload.properties.iter().chain(std::iter::once(overrides)))
}
