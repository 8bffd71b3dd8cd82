// Thin reqwest wrapper over the aggregator surface

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::types::{EventsResponse, PublishResponse, StatsResponse};

#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport failure (connection refused, timeout) or a body that does
    /// not decode into the documented shape.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The aggregator answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
}

/// Client for one aggregator instance.
#[derive(Debug, Clone)]
pub struct AggregatorClient {
    base_url: String,
    http: reqwest::Client,
}

impl AggregatorClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Publish one event or a batch; the aggregator accepts either an object
    /// or an array under the `events` key.
    pub async fn publish<E: Serialize>(&self, events: &E) -> Result<PublishResponse, ClientError> {
        #[derive(Serialize)]
        struct PublishBody<'a, E> {
            events: &'a E,
        }
        self.post("/publish", &PublishBody { events }).await
    }

    pub async fn stats(&self) -> Result<StatsResponse, ClientError> {
        self.get("/stats").await
    }

    pub async fn recent_events(&self, limit: usize) -> Result<EventsResponse, ClientError> {
        self.get(&format!("/events?limit={limit}")).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.http.get(&url).send().await?;
        Self::handle_response(response).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.http.post(&url).json(body).send().await?;
        Self::handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if status != StatusCode::OK {
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }
        let body = response.json().await?;
        Ok(body)
    }
}
