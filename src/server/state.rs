use axum::extract::FromRef;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;
use crate::collectors::TurntableCollector;
use crate::harvest::HarvestPipeline;
use crate::rate_limiter::TokenBucketLimiter;
use crate::snapshot_store::SnapshotStore;

pub type GuardedPipeline = Arc<HarvestPipeline>;
pub type GuardedSnapshotStore = Arc<dyn SnapshotStore>;
pub type GuardedChartSource = Arc<TurntableCollector>;
pub type GuardedRateLimiter = Arc<TokenBucketLimiter>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub pipeline: GuardedPipeline,
    pub snapshot_store: GuardedSnapshotStore,
    pub chart_source: GuardedChartSource,
    pub rate_limiter: GuardedRateLimiter,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        pipeline: GuardedPipeline,
        snapshot_store: GuardedSnapshotStore,
        chart_source: GuardedChartSource,
        rate_limiter: GuardedRateLimiter,
    ) -> Self {
        Self {
            config,
            start_time: Instant::now(),
            pipeline,
            snapshot_store,
            chart_source,
            rate_limiter,
        }
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for GuardedPipeline {
    fn from_ref(input: &ServerState) -> Self {
        input.pipeline.clone()
    }
}

impl FromRef<ServerState> for GuardedSnapshotStore {
    fn from_ref(input: &ServerState) -> Self {
        input.snapshot_store.clone()
    }
}

impl FromRef<ServerState> for GuardedChartSource {
    fn from_ref(input: &ServerState) -> Self {
        input.chart_source.clone()
    }
}

impl FromRef<ServerState> for GuardedRateLimiter {
    fn from_ref(input: &ServerState) -> Self {
        input.rate_limiter.clone()
    }
}
