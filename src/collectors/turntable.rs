//! TurnTable Charts (Nigeria) Top 100.
//!
//! The chart page is server-rendered by Next.js. The embedded page state is
//! read first; the rendered table is the second choice.

use async_trait::async_trait;
use scraper::Html;
use tracing::warn;

use super::{
    absolute_url, element_text, sample_tracks, selector, ChartCollector, ChartHttpClient,
    FetchError,
};
use crate::embedded_json::{demo_chart, ChartEntry, EmbeddedChartExtractor, MAX_ENTRIES};
use crate::harvest::{normalize::parse_rank, RawTrack};

pub const TURNTABLE_CHART_URL: &str = "https://www.turntablecharts.com/charts/1";
const TURNTABLE_ORIGIN: &str = "https://www.turntablecharts.com";

const FALLBACK: &[(&str, &str)] = &[
    ("Water", "Tyla"),
    ("Lonely At The Top", "Asake"),
    ("Pay Me", "FAVE"),
    ("Ngozi", "Crayon feat. Ayra Starr"),
    ("Party No Dey Stop", "Adekunle Gold"),
    ("Jaho", "Kizz Daniel"),
    ("My G", "Kizz Daniel"),
    ("Bandana", "Fireboy DML & Asake"),
    ("Sittin' On Top Of The World", "Burna Boy"),
    ("Feel", "Davido"),
];

pub struct TurntableCollector {
    http: ChartHttpClient,
    url: String,
    extractor: EmbeddedChartExtractor,
}

impl TurntableCollector {
    pub fn new(http: ChartHttpClient, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
            extractor: EmbeddedChartExtractor::default(),
        }
    }

    pub fn with_extractor(mut self, extractor: EmbeddedChartExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// The full embedded chart with its extra columns, or the demo chart
    /// when the page cannot be fetched or carries no recognisable chart.
    pub async fn fetch_chart(&self) -> Vec<ChartEntry> {
        let page = match self.http.get_text(&self.url).await {
            Ok(page) => page,
            Err(err) => {
                warn!("turntable: {}; serving demo chart", err);
                return demo_chart(MAX_ENTRIES);
            }
        };
        let entries = self.extractor.extract(&page);
        if entries.is_empty() {
            warn!("turntable: no embedded chart found; serving demo chart");
            return demo_chart(MAX_ENTRIES);
        }
        entries
    }

    fn parse(&self, page: &str, limit: usize) -> Result<Vec<RawTrack>, FetchError> {
        let embedded = self.extractor.extract(page);
        if !embedded.is_empty() {
            return Ok(embedded.iter().take(limit).map(RawTrack::from).collect());
        }
        parse_table(page, limit)
    }
}

fn parse_table(page: &str, limit: usize) -> Result<Vec<RawTrack>, FetchError> {
    let document = Html::parse_document(page);
    let row_sel = selector("table tbody tr")?;
    let cell_sel = selector("td")?;
    let link_sel = selector("a[href]")?;

    let mut tracks = Vec::new();
    for row in document.select(&row_sel) {
        let cells: Vec<_> = row.select(&cell_sel).collect();
        if cells.len() < 4 {
            continue;
        }
        let title = element_text(&cells[1]);
        if title.is_empty() {
            continue;
        }
        let position = parse_rank(&element_text(&cells[0])).unwrap_or(tracks.len() as i64 + 1);
        let artist = Some(element_text(&cells[2])).filter(|a| !a.is_empty());
        let source_url = cells[1]
            .select(&link_sel)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(|href| absolute_url(TURNTABLE_ORIGIN, href));

        tracks.push(RawTrack {
            position: Some(position),
            title: Some(title),
            artist,
            source_url,
        });
        if tracks.len() >= limit {
            break;
        }
    }

    if tracks.is_empty() {
        return Err(FetchError::Empty);
    }
    Ok(tracks)
}

#[async_trait]
impl ChartCollector for TurntableCollector {
    fn slug(&self) -> &'static str {
        "turntable"
    }

    async fn try_fetch(&self, limit: usize) -> Result<Vec<RawTrack>, FetchError> {
        let page = self.http.get_text(&self.url).await?;
        self.parse(&page, limit)
    }

    fn fallback(&self) -> Vec<RawTrack> {
        sample_tracks(FALLBACK)
    }
}
