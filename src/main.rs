// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use axum::{
    routing::{get, post},
    Router,
};
use chrono::Utc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::grapher::{GraphConfig, TimeSeriesGrapher};
use crate::infrastructure::config::load_grapher_config;
use crate::infrastructure::http_endpoint::HttpDataEndpoint;
use crate::infrastructure::chart_renderer::ChartRenderer;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    apply_scale, dismiss_error, export_graph, health_check, list_graphs, set_series, show_graph,
    toggle_series, toolbar, zoom_back, zoom_graph,
};
use crate::presentation::page::GraphPage;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let settings = load_grapher_config()?;

    // Collaborators (infrastructure layer)
    let endpoint = Arc::new(HttpDataEndpoint::new(&settings.endpoint)?);
    let renderer = Arc::new(ChartRenderer::default());

    // One grapher per configured graph (application layer)
    let initial_range = settings.default_preset.range_ending_at(Utc::now())?;
    let mut page = GraphPage::new();
    for entry in &settings.graphs {
        let mut grapher = TimeSeriesGrapher::new(endpoint.clone(), renderer.clone());
        grapher.configure(GraphConfig {
            endpoint_url: settings.endpoint.url.clone(),
            series_id: entry.id.clone(),
            range: initial_range,
            render_options: entry.render_options.clone(),
        })?;

        let id = entry.id.clone();
        grapher.on_zoomed(move |range| {
            tracing::info!("Graph {} zoomed to {} -> {}", id, range.from(), range.to());
        });
        page.register(grapher)?;
    }

    // First draw, like pressing the default scale button
    let drawn = page
        .apply_scale(initial_range)
        .await
        .into_iter()
        .filter(|(_, result)| result.is_ok())
        .count();
    tracing::info!("Drew {} of {} graphs", drawn, settings.graphs.len());

    let state = Arc::new(AppState { page });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/graphs", get(list_graphs))
        .route("/graphs/:id", get(show_graph))
        .route("/graphs/:id/zoom", post(zoom_graph))
        .route("/graphs/:id/zoom/back", post(zoom_back))
        .route("/graphs/:id/series", post(set_series))
        .route("/graphs/:id/series/:index/toggle", post(toggle_series))
        .route("/graphs/:id/toolbar/:action", post(toolbar))
        .route("/graphs/:id/export", get(export_graph))
        .route("/graphs/:id/error/dismiss", post(dismiss_error))
        .route("/scales", post(apply_scale))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = settings.listen.parse()?;
    tracing::info!("Starting opm-grapher on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
