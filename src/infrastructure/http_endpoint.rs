// HTTP data endpoint - Posts graph requests to the grapher data URL
use crate::application::data_endpoint::{DataEndpoint, FetchError, FetchRequest};
use crate::domain::series::FetchedPayload;
use crate::infrastructure::config::{EndpointSettings, RequestEncoding};
use async_trait::async_trait;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpDataEndpoint {
    client: reqwest::Client,
    encoding: RequestEncoding,
}

impl HttpDataEndpoint {
    pub fn new(settings: &EndpointSettings) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            encoding: settings.encoding,
        })
    }
}

#[async_trait]
impl DataEndpoint for HttpDataEndpoint {
    async fn fetch(&self, url: &str, request: &FetchRequest) -> Result<FetchedPayload, FetchError> {
        let builder = self
            .client
            .post(url)
            .header("Accept", "application/json")
            .header("Cache-Control", "no-cache");
        let builder = match self.encoding {
            RequestEncoding::Form => builder.form(request),
            RequestEncoding::Json => builder.json(request),
        };

        let transport = |source: reqwest::Error| FetchError::Transport {
            url: url.to_string(),
            source,
        };
        let response = builder.send().await.map_err(transport)?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response.bytes().await.map_err(transport)?;
        serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::time_range::TimeRange;
    use axum::{routing::post, Form, Json, Router};
    use serde::Deserialize;
    use serde_json::{json, Value};

    #[derive(Deserialize)]
    struct Posted {
        id: String,
        from: i64,
        to: i64,
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/data", addr)
    }

    fn endpoint(encoding: RequestEncoding) -> HttpDataEndpoint {
        HttpDataEndpoint::new(&EndpointSettings {
            url: String::new(),
            encoding,
            timeout_secs: 5,
        })
        .unwrap()
    }

    fn echo(posted: Posted) -> Json<Value> {
        Json(json!({
            "series": [{"label": posted.id, "data": [[posted.from, 1], [posted.to, 2]]}],
            "properties": {"yaxis": {"unit": "s"}}
        }))
    }

    #[tokio::test]
    async fn test_posts_form_encoded_request() {
        let url = serve(Router::new().route(
            "/data",
            post(|Form(posted): Form<Posted>| async move { echo(posted) }),
        ))
        .await;

        let request = FetchRequest::new("7", TimeRange::new(100, 200).unwrap());
        let payload = endpoint(RequestEncoding::Form).fetch(&url, &request).await.unwrap();

        assert_eq!(payload.series[0].label, "7");
        assert_eq!(payload.series[0].points[1].time_ms, 200);
        assert!(payload.properties.is_some());
    }

    #[tokio::test]
    async fn test_posts_json_request() {
        let url = serve(Router::new().route(
            "/data",
            post(|Json(posted): Json<Posted>| async move { echo(posted) }),
        ))
        .await;

        let request = FetchRequest::new("8", TimeRange::new(1, 2).unwrap());
        let payload = endpoint(RequestEncoding::Json).fetch(&url, &request).await.unwrap();

        assert_eq!(payload.series[0].label, "8");
        assert_eq!(payload.series[0].points[0].time_ms, 1);
    }

    #[tokio::test]
    async fn test_reports_status_and_decode_errors() {
        let url = serve(
            Router::new()
                .route("/data", post(|| async { (axum::http::StatusCode::BAD_GATEWAY, "down") }))
                .route("/garbage", post(|| async { "not json" })),
        )
        .await;
        let request = FetchRequest::new("1", TimeRange::new(1, 2).unwrap());
        let endpoint = endpoint(RequestEncoding::Form);

        let err = endpoint.fetch(&url, &request).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 502, .. }));

        let garbage = url.replace("/data", "/garbage");
        let err = endpoint.fetch(&garbage, &request).await.unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }
}
