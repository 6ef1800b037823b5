//! Deezer public chart API.

use async_trait::async_trait;
use serde::Deserialize;

use super::{sample_tracks, ChartCollector, ChartHttpClient, FetchError};
use crate::harvest::RawTrack;

pub const DEEZER_CHART_URL: &str = "https://api.deezer.com/chart/0/tracks";

const FALLBACK: &[(&str, &str)] = &[
    ("Calm Down", "Rema"),
    ("Rush", "Ayra Starr"),
    ("Soweto", "Victony"),
    ("Who Is Your Guy?", "Spyro"),
    ("Bounce", "Rema"),
    ("City Boys", "Burna Boy"),
    ("Lonely At The Top", "Asake"),
    ("Peru", "Fireboy DML"),
    ("Bandana", "Fireboy DML & Asake"),
    ("Essence", "Wizkid"),
];

#[derive(Deserialize)]
struct ChartResponse {
    #[serde(default)]
    data: Vec<DeezerTrack>,
}

#[derive(Deserialize)]
struct DeezerTrack {
    position: Option<i64>,
    title: Option<String>,
    artist: Option<DeezerArtist>,
    link: Option<String>,
}

#[derive(Deserialize)]
struct DeezerArtist {
    name: Option<String>,
}

pub struct DeezerCollector {
    http: ChartHttpClient,
    url: String,
}

impl DeezerCollector {
    pub fn new(http: ChartHttpClient, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    fn parse(body: ChartResponse, limit: usize) -> Vec<RawTrack> {
        body.data
            .into_iter()
            .take(limit)
            .map(|item| RawTrack {
                position: item.position,
                title: item.title,
                artist: item.artist.and_then(|a| a.name),
                source_url: item.link,
            })
            .collect()
    }
}

#[async_trait]
impl ChartCollector for DeezerCollector {
    fn slug(&self) -> &'static str {
        "deezer"
    }

    async fn try_fetch(&self, limit: usize) -> Result<Vec<RawTrack>, FetchError> {
        let body: ChartResponse = self
            .http
            .get_json_with_query(&self.url, &[("limit", limit)])
            .await?;
        Ok(Self::parse(body, limit))
    }

    fn fallback(&self) -> Vec<RawTrack> {
        sample_tracks(FALLBACK)
    }
}
