use anyhow::{Context, Result};
use chrono::Utc;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{error, info};

use axum::{
    extract::{Path, Query, State},
    http::Uri,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::error::ApiError;
use super::metrics::{metrics_handler, record_snapshots_stored};
use super::{log_requests, rate_limit, state::*, ServerConfig};
use crate::harvest::{
    ChartReport, EconomicImpact, HarvestError, PlatformCollection, PlatformInfo, PlatformSnapshot,
};

#[derive(Serialize)]
struct ServerStats {
    pub service: &'static str,
    pub version: &'static str,
    pub uptime: String,
}

#[derive(Deserialize, Debug, Default)]
struct LimitQuery {
    pub limit: Option<usize>,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    Json(ServerStats {
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        uptime: format_uptime(state.start_time.elapsed()),
    })
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

async fn list_platforms(State(pipeline): State<GuardedPipeline>) -> Json<Vec<PlatformInfo>> {
    Json(pipeline.list_platforms().collect())
}

async fn get_all_platforms(
    State(pipeline): State<GuardedPipeline>,
    State(config): State<ServerConfig>,
    Query(query): Query<LimitQuery>,
) -> Json<PlatformCollection> {
    let limit = config.clamp_limit(query.limit, config.default_limit);
    Json(PlatformCollection {
        items: pipeline.collect_all(limit).await,
    })
}

async fn get_platform(
    State(pipeline): State<GuardedPipeline>,
    State(config): State<ServerConfig>,
    Path(slug): Path<String>,
    Query(query): Query<LimitQuery>,
    uri: Uri,
) -> Result<Response, ApiError> {
    let limit = config.clamp_limit(query.limit, config.default_limit);
    match pipeline.collect_one(&slug, limit).await {
        Ok(snapshot) => Ok(Json(snapshot).into_response()),
        Err(err @ HarvestError::UnknownPlatform(_)) => Err(ApiError::not_found(&uri, err.to_string())),
        Err(err) => Err(ApiError::internal(&uri, err.into())),
    }
}

async fn run_harvest(
    State(pipeline): State<GuardedPipeline>,
    State(store): State<GuardedSnapshotStore>,
    State(config): State<ServerConfig>,
    Query(query): Query<LimitQuery>,
    uri: Uri,
) -> Result<Response, ApiError> {
    let limit = config.clamp_limit(query.limit, config.default_limit);
    let snapshots = pipeline.collect_all(limit).await;
    let summary = store
        .save(&snapshots)
        .map_err(|err| ApiError::internal(&uri, err))?;
    record_snapshots_stored(summary.platforms);
    info!(
        "Stored harvest: {} platforms, {} tracks",
        summary.platforms, summary.tracks
    );
    Ok(Json(json!({
        "status": "stored",
        "platforms": summary.platforms,
        "tracks": summary.tracks,
    }))
    .into_response())
}

async fn get_recent(
    State(store): State<GuardedSnapshotStore>,
    uri: Uri,
) -> Result<Response, ApiError> {
    let items = store
        .latest_per_platform()
        .map_err(|err| ApiError::internal(&uri, err))?;
    Ok(Json(json!({ "items": items })).into_response())
}

/// Impact estimate over the latest stored snapshot of every platform.
async fn get_impact(
    State(store): State<GuardedSnapshotStore>,
    State(config): State<ServerConfig>,
    uri: Uri,
) -> Result<Json<EconomicImpact>, ApiError> {
    let snapshots: Vec<PlatformSnapshot> = store
        .latest_per_platform()
        .map_err(|err| ApiError::internal(&uri, err))?
        .into_iter()
        .map(|stored| stored.snapshot)
        .collect();
    Ok(Json(config.impact.estimate(&snapshots)))
}

async fn get_history(
    State(store): State<GuardedSnapshotStore>,
    State(config): State<ServerConfig>,
    Path(slug): Path<String>,
    Query(query): Query<LimitQuery>,
    uri: Uri,
) -> Result<Response, ApiError> {
    let limit = config.clamp_limit(query.limit, config.default_history_limit);
    let items = store
        .history(&slug, limit)
        .map_err(|err| ApiError::internal(&uri, err))?;
    if items.is_empty() {
        return Err(ApiError::not_found(
            &uri,
            format!("No snapshots stored for platform '{}'", slug),
        ));
    }
    Ok(Json(json!({ "items": items })).into_response())
}

async fn get_turntable_chart(State(chart_source): State<GuardedChartSource>) -> Json<ChartReport> {
    let entries = chart_source.fetch_chart().await;
    Json(ChartReport::from_entries(entries))
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(&uri, "Resource not found")
}

pub fn make_app(state: ServerState) -> Router {
    let platform_routes: Router = Router::new()
        .route("/", get(list_platforms))
        .route("/all", get(get_all_platforms))
        .route("/{slug}", get(get_platform))
        .with_state(state.clone());

    let harvest_routes: Router = Router::new()
        .route("/run", post(run_harvest))
        .route("/recent", get(get_recent))
        .route("/impact", get(get_impact))
        .route("/history/{slug}", get(get_history))
        .with_state(state.clone());

    let chart_routes: Router = Router::new()
        .route("/turntable", get(get_turntable_chart))
        .with_state(state.clone());

    let mut app: Router = Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .fallback(not_found)
        .with_state(state.clone())
        .nest("/api/v1/platforms", platform_routes)
        .nest("/api/v1/harvest", harvest_routes)
        .nest("/api/v1/charts", chart_routes);

    app = app.layer(middleware::from_fn_with_state(state.clone(), rate_limit));
    app = app.layer(middleware::from_fn_with_state(state, log_requests));

    app
}

pub fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

pub async fn run_server(state: ServerState) -> Result<()> {
    let port = state.config.port;
    let metrics_port = state.config.metrics_port;
    let app = make_app(state);

    let metrics_listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;
    tokio::spawn(async move {
        if let Err(err) = axum::serve(metrics_listener, make_metrics_app()).await {
            error!("Metrics server stopped: {}", err);
        }
    });

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;

    Ok(axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::test_support::{client, UNREACHABLE};
    use crate::collectors::{ChartCollector, FetchError, TurntableCollector};
    use crate::harvest::{
        CollectorDescriptor, CollectorRegistry, HarvestPipeline, PlatformSnapshot, RawTrack,
    };
    use crate::rate_limiter::TokenBucketLimiter;
    use crate::snapshot_store::{SaveSummary, SnapshotStore, SqliteSnapshotStore, StoredSnapshot};
    use async_trait::async_trait;
    use axum::{body::Body, http::Request, http::StatusCode};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt; // for `oneshot`

    struct StaticCollector;

    #[async_trait]
    impl ChartCollector for StaticCollector {
        fn slug(&self) -> &'static str {
            "static"
        }

        async fn try_fetch(&self, _limit: usize) -> Result<Vec<RawTrack>, FetchError> {
            Ok(vec![
                RawTrack::new("Calm Down", Some("Rema")).at(1),
                RawTrack::new("Rush", Some("Ayra Starr")).at(2),
                RawTrack::new("Soso", Some("Omah Lay")).at(3),
            ])
        }

        fn fallback(&self) -> Vec<RawTrack> {
            Vec::new()
        }
    }

    struct FailingStore;

    impl SnapshotStore for FailingStore {
        fn save(&self, _snapshots: &[PlatformSnapshot]) -> anyhow::Result<SaveSummary> {
            anyhow::bail!("database is locked")
        }

        fn latest_per_platform(&self) -> anyhow::Result<Vec<StoredSnapshot>> {
            anyhow::bail!("database is locked")
        }

        fn history(&self, _platform: &str, _limit: usize) -> anyhow::Result<Vec<StoredSnapshot>> {
            anyhow::bail!("database is locked")
        }

        fn delete_snapshot(&self, _id: i64) -> anyhow::Result<bool> {
            anyhow::bail!("database is locked")
        }
    }

    fn state_with_store(store: GuardedSnapshotStore, burst: u32) -> ServerState {
        let registry = CollectorRegistry::new(vec![CollectorDescriptor::new(
            "static",
            "Static Chart",
            "https://example.com",
            "A fixed chart",
            Arc::new(StaticCollector),
        )])
        .unwrap();
        ServerState::new(
            ServerConfig {
                requests_logging_level: crate::server::RequestsLoggingLevel::None,
                ..ServerConfig::default()
            },
            Arc::new(HarvestPipeline::new(
                Arc::new(registry),
                Duration::from_secs(5),
            )),
            store,
            Arc::new(TurntableCollector::new(client(), UNREACHABLE)),
            Arc::new(TokenBucketLimiter::new(60, burst)),
        )
    }

    fn test_state(burst: u32) -> (ServerState, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteSnapshotStore::new(temp_dir.path().join("harvest.db")).unwrap();
        (state_with_store(Arc::new(store), burst), temp_dir)
    }

    async fn send(app: &Router, method: &str, uri: &str) -> Response {
        app.clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(Duration::from_secs(0)), "0d 00:00:00");
        assert_eq!(format_uptime(Duration::from_secs(90_061)), "1d 01:01:01");
    }

    #[tokio::test]
    async fn test_home_and_health() {
        let (state, _dir) = test_state(10);
        let app = make_app(state);

        let home = body_json(send(&app, "GET", "/").await).await;
        assert_eq!(home["service"], "chart-harvest-server");
        assert!(home["uptime"].as_str().unwrap().starts_with("0d "));

        let health = body_json(send(&app, "GET", "/health").await).await;
        assert_eq!(health["status"], "healthy");
    }

    #[tokio::test]
    async fn test_list_platforms() {
        let (state, _dir) = test_state(10);
        let app = make_app(state);

        let response = send(&app, "GET", "/api/v1/platforms").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body[0]["platform"], "static");
        assert_eq!(body[0]["display_name"], "Static Chart");
    }

    #[tokio::test]
    async fn test_platform_limit_and_unknown_slug() {
        let (state, _dir) = test_state(10);
        let app = make_app(state);

        let body = body_json(send(&app, "GET", "/api/v1/platforms/static?limit=2").await).await;
        assert_eq!(body["tracks"].as_array().unwrap().len(), 2);

        let response = send(&app, "GET", "/api/v1/platforms/spotify").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "NOT_FOUND");
        assert_eq!(body["path"], "/api/v1/platforms/spotify");
    }

    #[tokio::test]
    async fn test_run_harvest_then_recent_and_history() {
        let (state, _dir) = test_state(10);
        let app = make_app(state);

        let response = send(&app, "GET", "/api/v1/harvest/history/static").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let run = body_json(send(&app, "POST", "/api/v1/harvest/run").await).await;
        assert_eq!(run["status"], "stored");
        assert_eq!(run["platforms"], 1);
        assert_eq!(run["tracks"], 3);

        let recent = body_json(send(&app, "GET", "/api/v1/harvest/recent").await).await;
        let items = recent["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["tracks"][0]["title"], "Calm Down");

        let history =
            body_json(send(&app, "GET", "/api/v1/harvest/history/static").await).await;
        assert_eq!(history["items"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_store_failures_surface_as_internal_errors() {
        let app = make_app(state_with_store(Arc::new(FailingStore), 10));

        let response = send(&app, "POST", "/api/v1/harvest/run").await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "INTERNAL_ERROR");
        assert_eq!(body["path"], "/api/v1/harvest/run");

        let recent = send(&app, "GET", "/api/v1/harvest/recent").await;
        assert_eq!(recent.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let impact = send(&app, "GET", "/api/v1/harvest/impact").await;
        assert_eq!(impact.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_impact_follows_stored_snapshots() {
        let (state, _dir) = test_state(10);
        let app = make_app(state);

        let before = body_json(send(&app, "GET", "/api/v1/harvest/impact").await).await;
        assert_eq!(before["charted_tracks"], 0);
        assert_eq!(before["direct_streaming_revenue_usd"], 0.0);

        send(&app, "POST", "/api/v1/harvest/run").await;

        let after = body_json(send(&app, "GET", "/api/v1/harvest/impact").await).await;
        assert_eq!(after["platforms"], 1);
        assert_eq!(after["charted_tracks"], 3);
        assert_eq!(after["estimated_streams"], 15_000_000);
        assert_eq!(after["parameters"]["economic_multiplier"], 1.75);
        assert!(
            after["gdp_contribution_usd"].as_f64().unwrap()
                > before["gdp_contribution_usd"].as_f64().unwrap()
        );
    }

    #[tokio::test]
    async fn test_turntable_chart_serves_demo_when_unreachable() {
        let (state, _dir) = test_state(10);
        let app = make_app(state);

        let body = body_json(send(&app, "GET", "/api/v1/charts/turntable").await).await;

        assert_eq!(body["total_tracks"], 100);
        assert!(!body["top_artists"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let (state, _dir) = test_state(10);
        let app = make_app(state);

        let response = send(&app, "GET", "/nope").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_rate_limit_applies_to_api_only() {
        let (state, _dir) = test_state(2);
        let app = make_app(state);

        let first = send(&app, "GET", "/api/v1/platforms").await;
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(first.headers()["x-ratelimit-limit"], "60");
        assert_eq!(first.headers()["x-ratelimit-remaining"], "1");
        assert_eq!(send(&app, "GET", "/api/v1/platforms").await.status(), StatusCode::OK);

        let denied = send(&app, "GET", "/api/v1/platforms").await;
        assert_eq!(denied.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(denied.headers().contains_key("retry-after"));

        assert_eq!(send(&app, "GET", "/health").await.status(), StatusCode::OK);
    }
}
