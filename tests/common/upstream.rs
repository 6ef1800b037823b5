//! Fake chart sites for end-to-end tests
//!
//! Serves one route per platform on a random local port. A healthy upstream
//! answers with the payloads from `constants`; a broken one answers every
//! request with a 503.

use super::constants::*;
use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use std::collections::HashMap;
use tokio::net::TcpListener;

pub struct FakeUpstream {
    pub base_url: String,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

fn json(body: &'static str) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/json")], body)
}

fn html(body: &'static str) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], body)
}

impl FakeUpstream {
    /// Upstream serving a valid payload on every platform route
    pub async fn healthy() -> Self {
        let app = Router::new()
            .route("/deezer", get(|| async { json(DEEZER_PAYLOAD) }))
            .route("/apple-music", get(|| async { json(APPLE_MUSIC_PAYLOAD) }))
            .route("/audiomack", get(|| async { html(AUDIOMACK_PAYLOAD) }))
            .route("/boomplay", get(|| async { html(BOOMPLAY_PAYLOAD) }))
            .route("/turntable", get(|| async { html(TURNTABLE_PAYLOAD) }));
        Self::serve(app).await
    }

    /// Upstream that fails every request
    pub async fn broken() -> Self {
        let app = Router::new()
            .fallback(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") });
        Self::serve(app).await
    }

    async fn serve(app: Router) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake upstream");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Fake upstream failed");
        });

        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            _shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Source URL overrides pointing every platform at this upstream
    pub fn sources(&self) -> HashMap<String, String> {
        PLATFORM_SLUGS
            .iter()
            .map(|slug| (slug.to_string(), format!("{}/{}", self.base_url, slug)))
            .collect()
    }
}

impl Drop for FakeUpstream {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
