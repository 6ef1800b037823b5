use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::{HarvestError, PlatformInfo};
use crate::collectors::{
    apple_music::APPLE_MUSIC_FEED_URL, audiomack::AUDIOMACK_TRENDING_URL,
    boomplay::BOOMPLAY_CHART_URL, deezer::DEEZER_CHART_URL, turntable::TURNTABLE_CHART_URL,
    AppleMusicCollector, AudiomackCollector, BoomplayCollector, ChartCollector, ChartHttpClient,
    DeezerCollector, TurntableCollector,
};

/// A registered platform: descriptive metadata plus the collector behind it.
#[derive(Clone)]
pub struct CollectorDescriptor {
    pub slug: String,
    pub name: String,
    pub homepage: String,
    pub description: String,
    pub collector: Arc<dyn ChartCollector>,
}

impl CollectorDescriptor {
    pub fn new(
        slug: &str,
        name: &str,
        homepage: &str,
        description: &str,
        collector: Arc<dyn ChartCollector>,
    ) -> Self {
        Self {
            slug: slug.to_string(),
            name: name.to_string(),
            homepage: homepage.to_string(),
            description: description.to_string(),
            collector,
        }
    }

    pub fn info(&self) -> PlatformInfo {
        PlatformInfo {
            platform: self.slug.clone(),
            display_name: self.name.clone(),
            homepage: self.homepage.clone(),
            description: self.description.clone(),
        }
    }
}

impl std::fmt::Debug for CollectorDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectorDescriptor")
            .field("slug", &self.slug)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// The set of known platforms. Built once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct CollectorRegistry {
    descriptors: Vec<CollectorDescriptor>,
}

impl CollectorRegistry {
    pub fn new(descriptors: Vec<CollectorDescriptor>) -> Result<Self, HarvestError> {
        let mut seen = HashSet::new();
        for descriptor in &descriptors {
            if !seen.insert(descriptor.slug.as_str()) {
                return Err(HarvestError::DuplicatePlatform(descriptor.slug.clone()));
            }
        }
        Ok(Self { descriptors })
    }

    /// The five chart sources the service ships with.
    ///
    /// `sources` maps a slug to a URL replacing that collector's default.
    pub fn default_platforms(http: &ChartHttpClient, sources: &HashMap<String, String>) -> Self {
        let url = |slug: &str, default: &str| source_url(sources, slug, default);
        let descriptors = vec![
            CollectorDescriptor::new(
                "audiomack",
                "Audiomack Trending",
                "https://audiomack.com/trending",
                "Trending songs scraped from the public Audiomack charts page.",
                Arc::new(AudiomackCollector::new(
                    http.clone(),
                    url("audiomack", AUDIOMACK_TRENDING_URL),
                )),
            ),
            CollectorDescriptor::new(
                "apple-music",
                "Apple Music Top Songs Nigeria",
                "https://music.apple.com/ng/playlist/top-songs-in-nigeria/pl.2a7a5b0c62724d42af7d19e7936e70ef",
                "Official Apple Music Nigeria Top Songs RSS feed.",
                Arc::new(AppleMusicCollector::new(
                    http.clone(),
                    url("apple-music", APPLE_MUSIC_FEED_URL),
                )),
            ),
            CollectorDescriptor::new(
                "deezer",
                "Deezer Global Chart",
                "https://www.deezer.com/en/channels/explore",
                "Top tracks from Deezer's public chart API.",
                Arc::new(DeezerCollector::new(
                    http.clone(),
                    url("deezer", DEEZER_CHART_URL),
                )),
            ),
            CollectorDescriptor::new(
                "boomplay",
                "Boomplay Top 100 Nigeria",
                "https://www.boomplay.com/charts/Top100Nigeria",
                "Scraped Boomplay Top 100 Nigeria chart.",
                Arc::new(BoomplayCollector::new(
                    http.clone(),
                    url("boomplay", BOOMPLAY_CHART_URL),
                )),
            ),
            CollectorDescriptor::new(
                "turntable",
                "TurnTable Top 100",
                "https://www.turntablecharts.com/",
                "TurnTable Charts (Nigeria) weekly rankings scraped for top songs.",
                Arc::new(TurntableCollector::new(
                    http.clone(),
                    url("turntable", TURNTABLE_CHART_URL),
                )),
            ),
        ];
        Self { descriptors }
    }

    pub fn get(&self, slug: &str) -> Option<&CollectorDescriptor> {
        self.descriptors.iter().find(|d| d.slug == slug)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CollectorDescriptor> {
        self.descriptors.iter()
    }

    /// Descriptive metadata of every platform, in registration order.
    pub fn list_platforms(&self) -> impl Iterator<Item = PlatformInfo> + '_ {
        self.descriptors.iter().map(CollectorDescriptor::info)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Upstream URL for `slug`, honouring configured overrides.
pub fn source_url(sources: &HashMap<String, String>, slug: &str, default: &str) -> String {
    sources
        .get(slug)
        .cloned()
        .unwrap_or_else(|| default.to_string())
}
