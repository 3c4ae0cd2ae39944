// Graph page - Directory of the page's graphs and toolbar dispatch
use crate::application::grapher::{GrapherError, GraphView, LoadOutcome, TimeSeriesGrapher};
use crate::application::plot_renderer::{ExportedImage, ImageFormat};
use crate::domain::time_range::TimeRange;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

/// One graph of the page with its toolbar state.
pub struct GraphSlot {
    pub grapher: TimeSeriesGrapher,
    /// State of the on/off series button; starts on.
    series_on: bool,
}

pub type SharedSlot = Arc<Mutex<GraphSlot>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolbarAction {
    Export,
    InvertSeries,
    OffonSeries,
}

#[derive(Debug)]
pub enum ToolbarOutcome {
    Exported(ExportedImage),
    Inverted,
    SeriesSwitched { on: bool },
}

#[derive(Debug, Error)]
pub enum PageError {
    #[error("no graph with id {0:?} on this page")]
    UnknownGraph(String),
    #[error("graph {0:?} is already on this page")]
    DuplicateGraph(String),
    #[error(transparent)]
    Grapher(#[from] GrapherError),
}

/// Maps graph id to widget. Operations on one widget are serialized by its lock.
#[derive(Default)]
pub struct GraphPage {
    graphs: BTreeMap<String, SharedSlot>,
}

impl GraphPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, grapher: TimeSeriesGrapher) -> Result<(), PageError> {
        let id = grapher
            .id()
            .ok_or(GrapherError::NotConfigured)?
            .to_string();
        if self.graphs.contains_key(&id) {
            return Err(PageError::DuplicateGraph(id));
        }
        let slot = GraphSlot {
            grapher,
            series_on: true,
        };
        self.graphs.insert(id, Arc::new(Mutex::new(slot)));
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<SharedSlot, PageError> {
        self.graphs
            .get(id)
            .cloned()
            .ok_or_else(|| PageError::UnknownGraph(id.to_string()))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.graphs.keys().map(String::as_str)
    }

    pub async fn views(&self) -> Vec<GraphView> {
        let mut views = Vec::with_capacity(self.graphs.len());
        for slot in self.graphs.values() {
            views.push(slot.lock().await.grapher.view());
        }
        views
    }

    /// Move every graph to `range`, as the scale buttons do. One failing graph
    /// does not stop the others.
    pub async fn apply_scale(
        &self,
        range: TimeRange,
    ) -> Vec<(String, Result<LoadOutcome, GrapherError>)> {
        let mut results = Vec::with_capacity(self.graphs.len());
        for (id, slot) in &self.graphs {
            let result = slot.lock().await.grapher.set_range(range).await;
            if let Err(e) = &result {
                tracing::warn!("Graph {} could not switch to {:?}: {}", id, range, e);
            }
            results.push((id.clone(), result));
        }
        results
    }

    pub async fn dispatch(&self, id: &str, action: ToolbarAction) -> Result<ToolbarOutcome, PageError> {
        let slot = self.get(id)?;
        let mut slot = slot.lock().await;
        tracing::debug!("Toolbar {:?} on graph {}", action, id);

        match action {
            ToolbarAction::Export => {
                let image = slot.grapher.export_image(ImageFormat::Png)?;
                Ok(ToolbarOutcome::Exported(image))
            }
            ToolbarAction::InvertSeries => {
                slot.grapher.invert_visibility()?;
                Ok(ToolbarOutcome::Inverted)
            }
            ToolbarAction::OffonSeries => {
                let on = !slot.series_on;
                if on {
                    slot.grapher.show_all()?;
                } else {
                    slot.grapher.hide_all()?;
                }
                slot.series_on = on;
                Ok(ToolbarOutcome::SeriesSwitched { on })
            }
        }
    }
}
