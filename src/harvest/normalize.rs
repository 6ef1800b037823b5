//! Conversion of collector output into canonical [`TrackRecord`]s.

use super::models::{RawTrack, TrackRecord};

pub const UNKNOWN_TITLE: &str = "Unknown";

/// Normalizes a collector's output.
///
/// Positions come from the origin rank when it is present and valid (>= 1),
/// otherwise from the 1-based order in which the collector returned entries.
/// Blank titles become [`UNKNOWN_TITLE`]; artist and link pass through.
pub fn normalize_tracks(tracks: &[RawTrack]) -> Vec<TrackRecord> {
    tracks
        .iter()
        .enumerate()
        .map(|(index, track)| TrackRecord {
            position: track
                .position
                .and_then(|p| u32::try_from(p).ok())
                .filter(|p| *p >= 1)
                .unwrap_or(index as u32 + 1),
            title: track
                .title
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .unwrap_or(UNKNOWN_TITLE)
                .to_string(),
            artist: track.artist.clone(),
            source_url: track.source_url.clone(),
        })
        .collect()
}

/// Parses a rank as printed by chart pages ("1", "#12", " 7 ").
pub fn parse_rank(text: &str) -> Option<i64> {
    text.trim()
        .trim_start_matches('#')
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|rank| *rank >= 1)
}
