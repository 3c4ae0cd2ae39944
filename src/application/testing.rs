// In-memory data endpoint and plot renderer for tests
use crate::application::data_endpoint::{DataEndpoint, FetchError, FetchRequest};
use crate::application::plot_renderer::{
    Axes, ExportedImage, ImageFormat, PlotRenderer, RenderError, RenderedPlot, SeriesStyle,
};
use crate::domain::render_options::RenderOptions;
use crate::domain::series::{FetchedPayload, Series};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::Notify;

/// Answers queued responses in order, then empty payloads.
#[derive(Default)]
pub struct FakeEndpoint {
    responses: Mutex<VecDeque<Result<FetchedPayload, FetchError>>>,
    requests: Mutex<Vec<FetchRequest>>,
}

impl FakeEndpoint {
    pub fn respond(&self, body: Value) {
        let payload = serde_json::from_value(body).unwrap();
        self.responses.lock().unwrap().push_back(Ok(payload));
    }

    pub fn fail(&self) {
        self.responses.lock().unwrap().push_back(Err(FetchError::Status {
            url: "http://grapher/data".to_string(),
            status: 503,
        }));
    }

    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl DataEndpoint for FakeEndpoint {
    async fn fetch(&self, _url: &str, request: &FetchRequest) -> Result<FetchedPayload, FetchError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(FetchedPayload::default()))
    }
}

/// Holds every fetch until `release` lets one through, then answers an empty payload.
#[derive(Default)]
pub struct GatedEndpoint {
    gate: Notify,
    requests: Mutex<Vec<FetchRequest>>,
}

impl GatedEndpoint {
    pub fn release(&self) {
        self.gate.notify_one();
    }

    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl DataEndpoint for GatedEndpoint {
    async fn fetch(&self, _url: &str, request: &FetchRequest) -> Result<FetchedPayload, FetchError> {
        self.requests.lock().unwrap().push(request.clone());
        self.gate.notified().await;
        Ok(FetchedPayload::default())
    }
}

#[derive(Debug, Clone)]
pub struct RenderCall {
    pub container: String,
    pub series: Vec<(String, bool)>,
    pub legend_shown: bool,
}

/// Records every render and hands back plots that export `legend=<shown>`.
#[derive(Default)]
pub struct FakeRenderer {
    calls: Mutex<Vec<RenderCall>>,
}

impl FakeRenderer {
    pub fn calls(&self) -> Vec<RenderCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last(&self) -> RenderCall {
        self.calls().last().cloned().unwrap()
    }
}

struct FakePlot {
    styles: Vec<SeriesStyle>,
    legend_shown: bool,
}

impl RenderedPlot for FakePlot {
    fn axes(&self) -> Axes {
        Axes::default()
    }

    fn series_styles(&self) -> &[SeriesStyle] {
        &self.styles
    }

    fn document(&self) -> Value {
        json!({"series": self.styles.len()})
    }

    fn export_image(&self, format: ImageFormat) -> Result<ExportedImage, RenderError> {
        Ok(ExportedImage {
            format,
            bytes: format!("legend={}", self.legend_shown).into_bytes(),
        })
    }
}

impl PlotRenderer for FakeRenderer {
    fn render(
        &self,
        container: &str,
        series: &[Series],
        options: &RenderOptions,
    ) -> Result<Box<dyn RenderedPlot>, RenderError> {
        self.calls.lock().unwrap().push(RenderCall {
            container: container.to_string(),
            series: series.iter().map(|s| (s.label.clone(), s.hide)).collect(),
            legend_shown: options.legend_shown(),
        });
        Ok(Box::new(FakePlot {
            styles: series
                .iter()
                .enumerate()
                .map(|(i, s)| SeriesStyle {
                    label: s.label.clone(),
                    color: format!("#00000{}", i),
                    hidden: s.hide,
                })
                .collect(),
            legend_shown: options.legend_shown(),
        }))
    }
}
