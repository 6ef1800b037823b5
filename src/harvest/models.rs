use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A chart entry as produced by a collector, before normalization.
///
/// Every field is optional: upstream sources routinely omit ranks, titles or
/// artists, and the normalizer decides what to put in their place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTrack {
    pub position: Option<i64>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub source_url: Option<String>,
}

impl RawTrack {
    pub fn new(title: impl Into<String>, artist: Option<&str>) -> Self {
        Self {
            position: None,
            title: Some(title.into()),
            artist: artist.map(str::to_string),
            source_url: None,
        }
    }

    pub fn at(mut self, position: i64) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_source_url(mut self, url: Option<String>) -> Self {
        self.source_url = url;
        self
    }
}

/// Canonical chart entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRecord {
    pub position: u32,
    pub title: String,
    pub artist: Option<String>,
    pub source_url: Option<String>,
}

/// Static, descriptive metadata of a registered platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformInfo {
    pub platform: String,
    pub display_name: String,
    pub homepage: String,
    pub description: String,
}

/// One harvest of one platform at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformSnapshot {
    pub platform: String,
    pub display_name: String,
    pub homepage: String,
    pub description: String,
    pub retrieved_at: DateTime<Utc>,
    pub tracks: Vec<TrackRecord>,
}

impl PlatformSnapshot {
    pub fn new(info: PlatformInfo, retrieved_at: DateTime<Utc>, tracks: Vec<TrackRecord>) -> Self {
        Self {
            platform: info.platform,
            display_name: info.display_name,
            homepage: info.homepage,
            description: info.description,
            retrieved_at,
            tracks,
        }
    }

    pub fn info(&self) -> PlatformInfo {
        PlatformInfo {
            platform: self.platform.clone(),
            display_name: self.display_name.clone(),
            homepage: self.homepage.clone(),
            description: self.description.clone(),
        }
    }
}

/// Wrapper used by the API for lists of snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformCollection {
    pub items: Vec<PlatformSnapshot>,
}
