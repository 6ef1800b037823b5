//! HTTP client shared by every collector.

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

use super::FetchError;

pub const DEFAULT_USER_AGENT: &str = "ChartHarvest/0.3 (+https://github.com/chart-harvest)";

/// Thin wrapper around `reqwest::Client` carrying the user agent and the
/// per-request timeout every upstream call must respect.
#[derive(Clone)]
pub struct ChartHttpClient {
    client: reqwest::Client,
}

impl ChartHttpClient {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// GET `url` and return the body as text. Non-2xx statuses are errors.
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        Self::read_text(self.client.get(url)).await
    }

    /// GET `url` and decode the body as JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let body = self.get_text(url).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Like [`get_json`](Self::get_json), appending `query` to any query
    /// string `url` already carries.
    pub async fn get_json_with_query<T, Q>(&self, url: &str, query: &Q) -> Result<T, FetchError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let body = Self::read_text(self.client.get(url).query(query)).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn read_text(request: reqwest::RequestBuilder) -> Result<String, FetchError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(response.text().await?)
    }
}
