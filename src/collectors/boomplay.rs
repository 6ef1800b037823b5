//! Boomplay Top 100 Nigeria chart scraper.

use async_trait::async_trait;
use scraper::{ElementRef, Html};

use super::{
    absolute_url, element_text, sample_tracks, selector, ChartCollector, ChartHttpClient,
    FetchError,
};
use crate::harvest::RawTrack;

pub const BOOMPLAY_CHART_URL: &str = "https://www.boomplay.com/charts/Top100Nigeria";
const BOOMPLAY_ORIGIN: &str = "https://www.boomplay.com";

const FALLBACK: &[(&str, &str)] = &[
    ("Calm Down", "Rema"),
    ("Ku Lo Sa", "Oxlade"),
    ("Rush", "Ayra Starr"),
    ("Last Last", "Burna Boy"),
    ("Organise", "Asake"),
    ("Bandana", "Fireboy DML"),
    ("Terminator", "Asake"),
    ("Sugarcane", "Camidoh"),
    ("Electricity", "Pheelz"),
    ("Soso", "Omah Lay"),
];

pub struct BoomplayCollector {
    http: ChartHttpClient,
    url: String,
}

impl BoomplayCollector {
    pub fn new(http: ChartHttpClient, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    fn parse(page: &str, limit: usize) -> Result<Vec<RawTrack>, FetchError> {
        let document = Html::parse_document(page);
        let item_sel = selector(".chart-list .chart-item")?;
        let title_sel = selector(".title")?;
        let artist_sel = selector(".artist")?;
        let link_sel = selector("a[href]")?;

        let mut tracks = Vec::new();
        for item in document.select(&item_sel) {
            let Some(title_node) = item.select(&title_sel).next() else {
                continue;
            };
            let title = element_text(&title_node);
            if title.is_empty() {
                continue;
            }
            let artist = item
                .select(&artist_sel)
                .next()
                .map(|a| element_text(&a))
                .filter(|a| !a.is_empty());
            let href = enclosing_link(&title_node)
                .or_else(|| item.select(&link_sel).next())
                .and_then(|a| a.value().attr("href"))
                .map(|href| absolute_url(BOOMPLAY_ORIGIN, href));

            tracks.push(RawTrack {
                position: Some(tracks.len() as i64 + 1),
                title: Some(title),
                artist,
                source_url: href,
            });
            if tracks.len() >= limit {
                break;
            }
        }
        Ok(tracks)
    }
}

fn enclosing_link<'a>(node: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    node.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "a" && el.value().attr("href").is_some())
}

#[async_trait]
impl ChartCollector for BoomplayCollector {
    fn slug(&self) -> &'static str {
        "boomplay"
    }

    async fn try_fetch(&self, limit: usize) -> Result<Vec<RawTrack>, FetchError> {
        let page = self.http.get_text(&self.url).await?;
        Self::parse(&page, limit)
    }

    fn fallback(&self) -> Vec<RawTrack> {
        sample_tracks(FALLBACK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::test_support::{client, UNREACHABLE};

    const PAGE: &str = r#"
        <div class="chart-list">
          <div class="chart-item">
            <a href="/songs/1001"><span class="title">Calm Down</span></a>
            <p class="artist">Rema</p>
          </div>
          <div class="chart-item">
            <span class="title"></span>
          </div>
          <div class="chart-item">
            <span class="title">Ku Lo Sa</span>
            <p class="artist">Oxlade</p>
            <a href="https://www.boomplay.com/songs/1002">Listen</a>
          </div>
        </div>
    "#;

    #[test]
    fn test_parse_chart_items() {
        let tracks = BoomplayCollector::parse(PAGE, 10).unwrap();

        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].title.as_deref(), Some("Calm Down"));
        assert_eq!(
            tracks[0].source_url.as_deref(),
            Some("https://www.boomplay.com/songs/1001")
        );
        assert_eq!(tracks[1].position, Some(2));
        assert_eq!(tracks[1].artist.as_deref(), Some("Oxlade"));
        assert_eq!(
            tracks[1].source_url.as_deref(),
            Some("https://www.boomplay.com/songs/1002")
        );
    }

    #[tokio::test]
    async fn test_falls_back_when_unreachable() {
        let collector = BoomplayCollector::new(client(), UNREACHABLE);

        let tracks = collector.fetch(1).await;

        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].title.as_deref(), Some("Calm Down"));
        assert_eq!(tracks[0].position, Some(1));
    }
}
