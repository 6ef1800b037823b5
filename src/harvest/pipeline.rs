use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::{error, info};

use super::{
    normalize_tracks, CollectorDescriptor, CollectorRegistry, HarvestError, PlatformInfo,
    PlatformSnapshot, RawTrack,
};
use crate::server::metrics::record_harvested_tracks;

pub const DEFAULT_HARVEST_DEADLINE: Duration = Duration::from_secs(30);

/// Fans a harvest out over every registered collector.
///
/// Collectors run as independent tasks under one shared deadline. A collector
/// that panics or misses the deadline contributes an empty track list for its
/// own platform and nothing else is affected.
#[derive(Clone)]
pub struct HarvestPipeline {
    registry: Arc<CollectorRegistry>,
    deadline: Duration,
}

impl HarvestPipeline {
    pub fn new(registry: Arc<CollectorRegistry>, deadline: Duration) -> Self {
        Self { registry, deadline }
    }

    pub fn registry(&self) -> &CollectorRegistry {
        &self.registry
    }

    pub fn list_platforms(&self) -> impl Iterator<Item = PlatformInfo> + '_ {
        self.registry.list_platforms()
    }

    /// One snapshot per registered platform, in registration order, all
    /// sharing the same `retrieved_at`.
    pub async fn collect_all(&self, limit: usize) -> Vec<PlatformSnapshot> {
        let retrieved_at = Utc::now();
        let deadline = Instant::now() + self.deadline;

        let results = join_all(
            self.registry
                .iter()
                .map(|descriptor| run_collector(descriptor, limit, deadline)),
        )
        .await;

        let snapshots: Vec<PlatformSnapshot> = self
            .registry
            .iter()
            .zip(results)
            .map(|(descriptor, raw)| build_snapshot(descriptor, &raw, retrieved_at))
            .collect();

        info!(
            "Harvested {} platforms, {} tracks",
            snapshots.len(),
            snapshots.iter().map(|s| s.tracks.len()).sum::<usize>()
        );
        snapshots
    }

    pub async fn collect_one(
        &self,
        slug: &str,
        limit: usize,
    ) -> Result<PlatformSnapshot, HarvestError> {
        let descriptor = self
            .registry
            .get(slug)
            .ok_or_else(|| HarvestError::UnknownPlatform(slug.to_string()))?;
        let retrieved_at = Utc::now();
        let raw = run_collector(descriptor, limit, Instant::now() + self.deadline).await;
        Ok(build_snapshot(descriptor, &raw, retrieved_at))
    }
}

async fn run_collector(
    descriptor: &CollectorDescriptor,
    limit: usize,
    deadline: Instant,
) -> Vec<RawTrack> {
    let collector = Arc::clone(&descriptor.collector);
    let handle = tokio::spawn(async move { collector.fetch(limit).await });
    let abort = handle.abort_handle();

    match timeout_at(deadline, handle).await {
        Ok(Ok(mut tracks)) => {
            tracks.truncate(limit);
            tracks
        }
        Ok(Err(err)) => {
            error!("Collector {} failed: {}", descriptor.slug, err);
            Vec::new()
        }
        Err(_) => {
            abort.abort();
            error!("Collector {} missed the harvest deadline", descriptor.slug);
            Vec::new()
        }
    }
}

fn build_snapshot(
    descriptor: &CollectorDescriptor,
    raw: &[RawTrack],
    retrieved_at: chrono::DateTime<Utc>,
) -> PlatformSnapshot {
    let tracks = normalize_tracks(raw);
    record_harvested_tracks(&descriptor.slug, tracks.len());
    PlatformSnapshot::new(descriptor.info(), retrieved_at, tracks)
}
