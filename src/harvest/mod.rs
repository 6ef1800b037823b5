//! Collector registry, harvest pipeline and the canonical track model.

pub mod impact;
pub mod models;
pub mod normalize;
mod pipeline;
mod registry;
pub mod report;

pub use impact::{EconomicImpact, ImpactParameters};
pub use models::{PlatformCollection, PlatformInfo, PlatformSnapshot, RawTrack, TrackRecord};
pub use normalize::normalize_tracks;
pub use pipeline::{HarvestPipeline, DEFAULT_HARVEST_DEADLINE};
pub use registry::{source_url, CollectorDescriptor, CollectorRegistry};
pub use report::{ArtistStats, ArtistTrack, ChartReport};

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HarvestError {
    #[error("Unknown platform '{0}'")]
    UnknownPlatform(String),

    #[error("Platform '{0}' is registered more than once")]
    DuplicatePlatform(String),
}
