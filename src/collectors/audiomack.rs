//! Audiomack trending page scraper.
//!
//! Audiomack has no documented chart API, so the public trending page is
//! parsed instead.

use async_trait::async_trait;
use scraper::Html;

use super::{
    absolute_url, element_text, sample_tracks, selector, ChartCollector, ChartHttpClient,
    FetchError,
};
use crate::harvest::RawTrack;

pub const AUDIOMACK_TRENDING_URL: &str = "https://audiomack.com/trending";
const AUDIOMACK_ORIGIN: &str = "https://audiomack.com";

const FALLBACK: &[(&str, &str)] = &[
    ("Alone", "Burna Boy"),
    ("Sability", "Ayra Starr"),
    ("Party No Dey Stop", "Adekunle Gold"),
    ("Who Is Your Guy", "Spyro"),
    ("Unavailable", "Davido"),
    ("Charm", "Rema"),
    ("Feel", "Davido"),
    ("Gwagwalada", "BNXN"),
    ("City Boys", "Burna Boy"),
    ("Asiwaju", "Ruger"),
];

pub struct AudiomackCollector {
    http: ChartHttpClient,
    url: String,
}

impl AudiomackCollector {
    pub fn new(http: ChartHttpClient, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    fn parse(page: &str, limit: usize) -> Result<Vec<RawTrack>, FetchError> {
        let document = Html::parse_document(page);
        let item_sel = selector("article.music__item")?;
        let title_sel = selector(".music__title")?;
        let artist_sel = selector(".music__artist")?;
        let link_sel = selector("a[href]")?;

        let mut tracks = Vec::new();
        for (index, node) in document.select(&item_sel).enumerate() {
            let title = node
                .value()
                .attr("data-title")
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .or_else(|| node.select(&title_sel).next().map(|t| element_text(&t)))
                .filter(|t| !t.is_empty());
            // Nodes without a title are layout filler, not chart entries.
            let Some(title) = title else { continue };

            let artist = node
                .select(&artist_sel)
                .next()
                .map(|a| element_text(&a))
                .filter(|a| !a.is_empty());
            let source_url = node
                .select(&link_sel)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(|href| absolute_url(AUDIOMACK_ORIGIN, href));

            tracks.push(RawTrack {
                position: Some(index as i64 + 1),
                title: Some(title),
                artist,
                source_url,
            });
            if tracks.len() >= limit {
                break;
            }
        }
        Ok(tracks)
    }
}

#[async_trait]
impl ChartCollector for AudiomackCollector {
    fn slug(&self) -> &'static str {
        "audiomack"
    }

    async fn try_fetch(&self, limit: usize) -> Result<Vec<RawTrack>, FetchError> {
        let page = self.http.get_text(&self.url).await?;
        Self::parse(&page, limit)
    }

    fn fallback(&self) -> Vec<RawTrack> {
        sample_tracks(FALLBACK)
    }
}
