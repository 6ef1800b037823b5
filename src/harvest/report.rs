//! Artist-level view over an embedded chart.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::embedded_json::ChartEntry;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtistTrack {
    pub rank: u32,
    pub title: String,
    pub streams: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtistStats {
    pub artist: String,
    pub total_tracks: usize,
    pub total_streams: u64,
    /// Best (numerically lowest) rank reached by any of the artist's tracks.
    pub highest_rank: u32,
    pub avg_rank: f64,
    pub tracks: Vec<ArtistTrack>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartReport {
    pub top_artists: Vec<ArtistStats>,
    pub full_chart: Vec<ChartEntry>,
    pub total_tracks: usize,
    pub total_artists: usize,
    pub last_updated: DateTime<Utc>,
}

impl ChartReport {
    pub fn from_entries(entries: Vec<ChartEntry>) -> Self {
        let mut order: Vec<String> = Vec::new();
        let mut by_artist: HashMap<String, ArtistStats> = HashMap::new();

        for entry in &entries {
            let stats = by_artist.entry(entry.artist.clone()).or_insert_with(|| {
                order.push(entry.artist.clone());
                ArtistStats {
                    artist: entry.artist.clone(),
                    total_tracks: 0,
                    total_streams: 0,
                    highest_rank: entry.rank,
                    avg_rank: 0.0,
                    tracks: Vec::new(),
                }
            });
            stats.total_tracks += 1;
            stats.total_streams += entry.estimated_streams;
            stats.highest_rank = stats.highest_rank.min(entry.rank);
            stats.tracks.push(ArtistTrack {
                rank: entry.rank,
                title: entry.title.clone(),
                streams: entry.estimated_streams,
            });
        }

        let mut artists: Vec<ArtistStats> = order
            .into_iter()
            .filter_map(|artist| by_artist.remove(&artist))
            .map(|mut stats| {
                let rank_sum: u64 = stats.tracks.iter().map(|t| t.rank as u64).sum();
                stats.avg_rank = rank_sum as f64 / stats.total_tracks as f64;
                stats
            })
            .collect();
        // Stable sort: equal totals keep first-appearance order.
        artists.sort_by(|a, b| b.total_streams.cmp(&a.total_streams));

        Self {
            total_tracks: entries.len(),
            total_artists: artists.len(),
            top_artists: artists,
            full_chart: entries,
            last_updated: Utc::now(),
        }
    }
}
