//! Apple Music most-played feed (Marketing Tools RSS, JSON flavour).

use async_trait::async_trait;
use serde::Deserialize;

use super::{sample_tracks, ChartCollector, ChartHttpClient, FetchError};
use crate::harvest::RawTrack;

pub const APPLE_MUSIC_FEED_URL: &str =
    "https://rss.applemarketingtools.com/api/v2/ng/music/most-played/50/tracks.json";

const FALLBACK: &[(&str, &str)] = &[
    ("Calm Down", "Rema & Selena Gomez"),
    ("Unavailable", "Davido feat. Musa Keys"),
    ("Soso", "Omah Lay"),
    ("Charm", "Rema"),
    ("Reason", "Omah Lay"),
    ("People", "Libianca"),
    ("FEEL", "Davido"),
    ("Over Me", "Davido"),
    ("City Boys", "Burna Boy"),
    ("Lonely At The Top", "Asake"),
];

#[derive(Deserialize)]
struct FeedResponse {
    feed: Option<Feed>,
}

#[derive(Deserialize)]
struct Feed {
    #[serde(default)]
    results: Vec<FeedResult>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedResult {
    name: Option<String>,
    artist_name: Option<String>,
    url: Option<String>,
}

pub struct AppleMusicCollector {
    http: ChartHttpClient,
    url: String,
}

impl AppleMusicCollector {
    pub fn new(http: ChartHttpClient, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    // The feed is already ordered and carries no rank field.
    fn parse(body: FeedResponse, limit: usize) -> Vec<RawTrack> {
        body.feed
            .map(|feed| feed.results)
            .unwrap_or_default()
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(index, item)| RawTrack {
                position: Some(index as i64 + 1),
                title: item.name,
                artist: item.artist_name,
                source_url: item.url,
            })
            .collect()
    }
}

#[async_trait]
impl ChartCollector for AppleMusicCollector {
    fn slug(&self) -> &'static str {
        "apple-music"
    }

    async fn try_fetch(&self, limit: usize) -> Result<Vec<RawTrack>, FetchError> {
        let body: FeedResponse = self.http.get_json(&self.url).await?;
        Ok(Self::parse(body, limit))
    }

    fn fallback(&self) -> Vec<RawTrack> {
        sample_tracks(FALLBACK)
    }
}
