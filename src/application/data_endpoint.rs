// Data endpoint trait - Remote source of a graph's time series
use crate::domain::series::FetchedPayload;
use crate::domain::time_range::TimeRange;
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Body posted to the data endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchRequest {
    pub id: String,
    pub from: i64,
    pub to: i64,
}

impl FetchRequest {
    pub fn new(id: &str, range: TimeRange) -> Self {
        Self {
            id: id.to_string(),
            from: range.from(),
            to: range.to(),
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("data endpoint {url} answered with status {status}")]
    Status { url: String, status: u16 },
    #[error("data endpoint returned an unreadable payload: {0}")]
    Decode(String),
}

#[async_trait]
pub trait DataEndpoint: Send + Sync {
    /// Fetch the series of one graph for the requested window.
    async fn fetch(&self, url: &str, request: &FetchRequest) -> Result<FetchedPayload, FetchError>;
}
