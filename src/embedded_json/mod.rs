//! Chart extraction from JSON blobs embedded in server-rendered pages.
//!
//! Chart sites built on Next.js inline their page state in a
//! `__NEXT_DATA__` script. Its shape moves between deployments, so lookups go
//! from the known paths to a generic depth-first search for a list of
//! track-like objects. Every failure degrades to an empty result.

mod demo;
mod entry;
mod locate;
mod search;

pub use demo::demo_chart;
pub use entry::{extract_entries, ChartEntry, ChartMeta, MAX_ENTRIES, UNKNOWN_ARTIST};
pub use locate::locate_next_data;
pub use search::{default_signatures, find_first_list, lookup_list, lookup_path, KeySignature};

use serde_json::Value;
use tracing::debug;

/// Paths under `props.pageProps` where chart items have been observed.
const KNOWN_ITEM_PATHS: &[&[&str]] = &[
    &["chartData", "chartItems"],
    &["chart", "items"],
    &["chart", "songs"],
    &["data", "chart", "items"],
    &["data", "chart", "songs"],
];

#[derive(Debug, Clone)]
pub struct EmbeddedChartExtractor {
    signatures: Vec<KeySignature>,
}

impl Default for EmbeddedChartExtractor {
    fn default() -> Self {
        Self {
            signatures: default_signatures(),
        }
    }
}

impl EmbeddedChartExtractor {
    /// Adds signatures recognised by the depth-first search.
    pub fn with_signatures<I>(mut self, signatures: I) -> Self
    where
        I: IntoIterator<Item = KeySignature>,
    {
        self.signatures.extend(signatures);
        self
    }

    pub fn signatures(&self) -> &[KeySignature] {
        &self.signatures
    }

    /// Extracts chart entries from a raw page. Empty when nothing usable is found.
    pub fn extract(&self, page: &str) -> Vec<ChartEntry> {
        match locate_next_data(page) {
            Some(data) => self.extract_from_value(&data),
            None => {
                debug!("No embedded chart data in page");
                Vec::new()
            }
        }
    }

    /// Extracts chart entries from an already parsed `__NEXT_DATA__` value.
    pub fn extract_from_value(&self, data: &Value) -> Vec<ChartEntry> {
        let Some(page_props) = lookup_path(data, &["props", "pageProps"]) else {
            return Vec::new();
        };

        let items = KNOWN_ITEM_PATHS
            .iter()
            .find_map(|path| lookup_list(page_props, path))
            .or_else(|| {
                find_first_list(page_props, &|object| {
                    self.signatures.iter().any(|s| s.matches(object))
                })
            });
        let Some(items) = items else {
            debug!("No track-like list found in embedded chart data");
            return Vec::new();
        };

        extract_entries(items, &chart_meta(page_props))
    }
}

fn chart_meta(page_props: &Value) -> ChartMeta {
    let text = |key: &str| {
        lookup_path(page_props, &["chartData", key])
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    ChartMeta {
        category: text("category"),
        week: text("dateCreated").or_else(|| text("week")),
    }
}
