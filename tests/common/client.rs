//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with one method per API route. When routes change, update
//! only this file.

use super::constants::*;
use reqwest::Response;
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    async fn get(&self, path: &str) -> Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("GET request failed")
    }

    pub async fn home(&self) -> Response {
        self.get("/").await
    }

    pub async fn health(&self) -> Response {
        self.get("/health").await
    }

    pub async fn list_platforms(&self) -> Response {
        self.get("/api/v1/platforms").await
    }

    pub async fn all_platforms(&self, limit: Option<usize>) -> Response {
        match limit {
            Some(limit) => self.get(&format!("/api/v1/platforms/all?limit={}", limit)).await,
            None => self.get("/api/v1/platforms/all").await,
        }
    }

    pub async fn platform(&self, slug: &str) -> Response {
        self.get(&format!("/api/v1/platforms/{}", slug)).await
    }

    pub async fn run_harvest(&self, limit: usize) -> Response {
        self.client
            .post(format!("{}/api/v1/harvest/run?limit={}", self.base_url, limit))
            .send()
            .await
            .expect("POST request failed")
    }

    pub async fn recent(&self) -> Response {
        self.get("/api/v1/harvest/recent").await
    }

    pub async fn history(&self, slug: &str, limit: Option<usize>) -> Response {
        match limit {
            Some(limit) => {
                self.get(&format!("/api/v1/harvest/history/{}?limit={}", slug, limit))
                    .await
            }
            None => self.get(&format!("/api/v1/harvest/history/{}", slug)).await,
        }
    }

    pub async fn turntable_chart(&self) -> Response {
        self.get("/api/v1/charts/turntable").await
    }
}
