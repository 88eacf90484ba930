//! Thin HTTP client shared by the forge provider and the download executor.
//!
//! Requests are sent once: a failed round-trip is reported to the caller,
//! which decides what the failure means for its stage.

use anyhow::{Context, Result};
use log::debug;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;

use super::status::check_status;

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a new HTTP client wrapping the given reqwest Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Returns a reference to the underlying reqwest Client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Performs a GET request and deserializes the JSON response.
    #[tracing::instrument(skip(self))]
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.get_json_with_query(url, &[]).await
    }

    /// Performs a GET request with query parameters and deserializes the JSON response.
    #[tracing::instrument(skip(self, query))]
    pub async fn get_json_with_query<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        debug!("GET JSON from {} with query {:?}...", url, query);

        let response = self.send(url, query).await?;
        let response = response.error_for_status().map_err(check_status)?;

        response
            .json::<T>()
            .await
            .context("Failed to parse JSON response")
    }

    /// Like [`HttpClient::get_json`], but a 404 yields `Ok(None)`.
    #[tracing::instrument(skip(self))]
    pub async fn get_json_optional<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        debug!("GET optional JSON from {}...", url);

        let response = self.send(url, &[]).await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!("{} not found", url);
            return Ok(None);
        }
        let response = response.error_for_status().map_err(check_status)?;

        let result = response
            .json::<T>()
            .await
            .context("Failed to parse JSON response")?;
        Ok(Some(result))
    }

    /// Starts a streaming GET. The body is left unread so the caller can
    /// consume it chunk by chunk.
    #[tracing::instrument(skip(self))]
    pub async fn get_stream(&self, url: &str) -> Result<Response> {
        debug!("Starting download from {}...", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to start download request")?;

        response.error_for_status().map_err(check_status)
    }

    async fn send(&self, url: &str, query: &[(&str, &str)]) -> Result<Response> {
        let mut request = self.client.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }
        request.send().await.context("Failed to send request")
    }
}
