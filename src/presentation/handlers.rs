// HTTP request handlers
use crate::application::grapher::{GrapherError, GraphView, LoadOutcome};
use crate::application::plot_renderer::{ExportedImage, ImageFormat};
use crate::domain::time_range::{custom_range, RangePreset, TimeRange};
use crate::presentation::app_state::AppState;
use crate::presentation::page::{PageError, ToolbarAction, ToolbarOutcome};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct ZoomBody {
    pub from: Option<i64>,
    pub to: Option<i64>,
}

#[derive(Deserialize)]
pub struct SeriesBody {
    pub label: String,
    pub visible: bool,
}

#[derive(Deserialize)]
pub struct ExportQuery {
    pub format: Option<ImageFormat>,
}

/// Either a preset scale or a custom `from`/`to` window.
#[derive(Deserialize)]
pub struct ScaleBody {
    pub preset: Option<RangePreset>,
    pub from: Option<i64>,
    pub to: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ScaleResult {
    pub id: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            tracing::error!("Graph request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

fn status_for(error: &PageError) -> StatusCode {
    match error {
        PageError::UnknownGraph(_) => StatusCode::NOT_FOUND,
        PageError::DuplicateGraph(_) => StatusCode::CONFLICT,
        PageError::Grapher(e) => match e {
            GrapherError::Config(_)
            | GrapherError::ZoomBounds(_)
            | GrapherError::UnknownSeries(_)
            | GrapherError::SeriesIndex(_) => StatusCode::BAD_REQUEST,
            GrapherError::NotConfigured | GrapherError::NotLoaded => StatusCode::CONFLICT,
            GrapherError::Fetch(_) => StatusCode::BAD_GATEWAY,
            GrapherError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        },
    }
}

fn image_response(id: &str, image: ExportedImage) -> Response {
    let extension = match image.format {
        ImageFormat::Svg => "svg",
        ImageFormat::Png => "png",
    };
    (
        [
            (header::CONTENT_TYPE, image.format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"graph-{}.{}\"", id, extension),
            ),
        ],
        image.bytes,
    )
        .into_response()
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Views of every graph on the page
pub async fn list_graphs(State(state): State<Arc<AppState>>) -> Json<Vec<GraphView>> {
    Json(state.page.views().await)
}

pub async fn show_graph(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<GraphView>, PageError> {
    let slot = state.page.get(&id)?;
    let view = slot.lock().await.grapher.view();
    Ok(Json(view))
}

/// Plot selection: zoom into `from`..`to`
pub async fn zoom_graph(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<ZoomBody>,
) -> Result<Json<GraphView>, PageError> {
    let range = TimeRange::from_bounds(body.from, body.to).map_err(GrapherError::from)?;
    let slot = state.page.get(&id)?;
    let mut slot = slot.lock().await;
    slot.grapher.zoom(range.from(), range.to()).await?;
    Ok(Json(slot.grapher.view()))
}

/// Plot click: undo the last zoom
pub async fn zoom_back(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<GraphView>, PageError> {
    let slot = state.page.get(&id)?;
    let mut slot = slot.lock().await;
    slot.grapher.zoom_back().await?;
    Ok(Json(slot.grapher.view()))
}

pub async fn set_series(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<SeriesBody>,
) -> Result<Json<GraphView>, PageError> {
    let slot = state.page.get(&id)?;
    let mut slot = slot.lock().await;
    slot.grapher.set_series_visible(&body.label, body.visible)?;
    Ok(Json(slot.grapher.view()))
}

/// Legend click on the entry at `index`
pub async fn toggle_series(
    Path((id, index)): Path<(String, usize)>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<GraphView>, PageError> {
    let slot = state.page.get(&id)?;
    let mut slot = slot.lock().await;
    slot.grapher.toggle_series_at(index)?;
    Ok(Json(slot.grapher.view()))
}

pub async fn dismiss_error(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<GraphView>, PageError> {
    let slot = state.page.get(&id)?;
    let mut slot = slot.lock().await;
    slot.grapher.dismiss_error();
    Ok(Json(slot.grapher.view()))
}

/// Toolbar buttons addressed by graph id
pub async fn toolbar(
    Path((id, action)): Path<(String, ToolbarAction)>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, PageError> {
    match state.page.dispatch(&id, action).await? {
        ToolbarOutcome::Exported(image) => Ok(image_response(&id, image)),
        outcome => {
            if let ToolbarOutcome::SeriesSwitched { on } = outcome {
                tracing::debug!("Series of graph {} switched {}", id, if on { "on" } else { "off" });
            }
            let slot = state.page.get(&id)?;
            let view = slot.lock().await.grapher.view();
            Ok(Json(view).into_response())
        }
    }
}

pub async fn export_graph(
    Path(id): Path<String>,
    Query(query): Query<ExportQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, PageError> {
    let format = query.format.unwrap_or(ImageFormat::Png);
    let slot = state.page.get(&id)?;
    let image = slot.lock().await.grapher.export_image(format)?;
    Ok(image_response(&id, image))
}

/// Scale buttons: move every graph to a preset or custom window
pub async fn apply_scale(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ScaleBody>,
) -> Result<Json<Vec<ScaleResult>>, PageError> {
    let now = Utc::now();
    let range = match body.preset {
        Some(preset) => preset.range_ending_at(now),
        None => custom_range(body.from, body.to, now),
    }
    .map_err(GrapherError::from)?;

    let results = state
        .page
        .apply_scale(range)
        .await
        .into_iter()
        .map(|(id, result)| match result {
            Ok(LoadOutcome::Rendered) => ScaleResult {
                id,
                status: "rendered",
                message: None,
            },
            Ok(LoadOutcome::ServerError(message)) => ScaleResult {
                id,
                status: "server_error",
                message: Some(message),
            },
            Err(e) => ScaleResult {
                id,
                status: "failed",
                message: Some(e.to_string()),
            },
        })
        .collect();

    Ok(Json(results))
}
