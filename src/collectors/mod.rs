//! Per-platform chart collectors.
//!
//! Every collector implements [`ChartCollector`]. The live attempt
//! (`try_fetch`) reports failures as a typed [`FetchError`]; the provided
//! `fetch` method is the boundary that turns any failure, or an empty result,
//! into the collector's deterministic fallback dataset.

pub mod apple_music;
pub mod audiomack;
pub mod boomplay;
pub mod deezer;
pub mod http;
pub mod turntable;

pub use apple_music::AppleMusicCollector;
pub use audiomack::AudiomackCollector;
pub use boomplay::BoomplayCollector;
pub use deezer::DeezerCollector;
pub use http::{ChartHttpClient, DEFAULT_USER_AGENT};
pub use turntable::TurntableCollector;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::harvest::RawTrack;
use crate::server::metrics::record_collector_outcome;

/// Why a live fetch produced no usable data.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("upstream returned HTTP {0}")]
    Status(u16),

    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("unparseable markup: {0}")]
    Markup(String),

    #[error("no entries found in upstream payload")]
    Empty,
}

#[async_trait]
pub trait ChartCollector: Send + Sync {
    /// Registry slug, used for logs and metrics.
    fn slug(&self) -> &'static str;

    /// One live attempt against the upstream source.
    async fn try_fetch(&self, limit: usize) -> Result<Vec<RawTrack>, FetchError>;

    /// Deterministic sample served whenever the live attempt fails.
    fn fallback(&self) -> Vec<RawTrack>;

    /// Fetch at most `limit` entries. Never fails.
    async fn fetch(&self, limit: usize) -> Vec<RawTrack> {
        let mut tracks = match self.try_fetch(limit).await {
            Ok(tracks) if !tracks.is_empty() => {
                debug!("{}: fetched {} live entries", self.slug(), tracks.len());
                record_collector_outcome(self.slug(), "live");
                tracks
            }
            Ok(_) => {
                warn!("{}: {}; serving fallback dataset", self.slug(), FetchError::Empty);
                record_collector_outcome(self.slug(), "fallback");
                self.fallback()
            }
            Err(err) => {
                warn!("{}: {}; serving fallback dataset", self.slug(), err);
                record_collector_outcome(self.slug(), "fallback");
                self.fallback()
            }
        };
        tracks.truncate(limit);
        tracks
    }
}

/// Builds a fallback dataset from `(title, artist)` pairs, numbered from 1.
pub(crate) fn sample_tracks(sample: &[(&str, &str)]) -> Vec<RawTrack> {
    sample
        .iter()
        .enumerate()
        .map(|(index, (title, artist))| RawTrack::new(*title, Some(artist)).at(index as i64 + 1))
        .collect()
}

/// Resolves a possibly relative link against a site origin.
pub(crate) fn absolute_url(origin: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if href.starts_with('/') {
        format!("{}{}", origin.trim_end_matches('/'), href)
    } else {
        format!("{}/{}", origin.trim_end_matches('/'), href)
    }
}

/// Parses a CSS selector, reporting failure as a markup error.
pub(crate) fn selector(css: &str) -> Result<scraper::Selector, FetchError> {
    scraper::Selector::parse(css).map_err(|e| FetchError::Markup(format!("{css}: {e}")))
}

/// Collapsed text content of an element.
pub(crate) fn element_text(element: &scraper::ElementRef) -> String {
    let text: String = element.text().collect();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_url() {
        assert_eq!(
            absolute_url("https://audiomack.com", "/song/rema/calm-down"),
            "https://audiomack.com/song/rema/calm-down"
        );
        assert_eq!(
            absolute_url("https://audiomack.com/", "song/x"),
            "https://audiomack.com/song/x"
        );
        assert_eq!(
            absolute_url("https://audiomack.com", "https://cdn.example.com/x"),
            "https://cdn.example.com/x"
        );
    }

    #[test]
    fn test_sample_tracks_are_numbered() {
        let tracks = sample_tracks(&[("A", "x"), ("B", "y")]);
        assert_eq!(tracks[0].position, Some(1));
        assert_eq!(tracks[1].position, Some(2));
        assert_eq!(tracks[1].artist.as_deref(), Some("y"));
    }

    #[test]
    fn test_element_text_collapses_whitespace() {
        let html = scraper::Html::parse_fragment("<p>  Calm <b>Down</b>\n </p>");
        let sel = selector("p").unwrap();
        let p = html.select(&sel).next().unwrap();
        assert_eq!(element_text(&p), "Calm Down");
    }
}
