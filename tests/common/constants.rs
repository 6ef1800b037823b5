//! Shared constants for end-to-end tests
//!
//! Upstream payloads served by the fake chart sites live here too, so the
//! expected titles and artists are next to the data that produces them.

/// Maximum time to wait for a spawned server to answer (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Delay between readiness polls (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 20;

/// Timeout for each request a test client makes (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Every registered platform, in registration order
pub const PLATFORM_SLUGS: [&str; 5] = ["audiomack", "apple-music", "deezer", "boomplay", "turntable"];

/// First Deezer fallback entry, served when the upstream is down
pub const DEEZER_FALLBACK_FIRST_TITLE: &str = "Calm Down";

// ============================================================================
// Fake upstream payloads
// ============================================================================

pub const DEEZER_PAYLOAD: &str = r#"{
  "data": [
    {"position": 1, "title": "Live Deezer One", "artist": {"name": "Rema"}, "link": "https://www.deezer.com/track/1"},
    {"position": 2, "title": "Live Deezer Two", "artist": {"name": "Tems"}, "link": "https://www.deezer.com/track/2"},
    {"position": 3, "title": "Live Deezer Three", "artist": {"name": "Asake"}}
  ]
}"#;

pub const APPLE_MUSIC_PAYLOAD: &str = r#"{
  "feed": {
    "results": [
      {"name": "Live Apple One", "artistName": "Burna Boy", "url": "https://music.apple.com/ng/song/1"},
      {"name": "Live Apple Two", "artistName": "Wizkid"}
    ]
  }
}"#;

pub const AUDIOMACK_PAYLOAD: &str = r#"<html><body>
  <article class="music__item" data-title="Live Audiomack One">
    <a href="/song/ayra-starr/one">listen</a>
    <span class="music__artist">Ayra Starr</span>
  </article>
  <article class="music__item">
    <h2 class="music__title">Live Audiomack Two</h2>
    <span class="music__artist">Omah Lay</span>
  </article>
</body></html>"#;

pub const BOOMPLAY_PAYLOAD: &str = r#"<html><body>
  <ul class="chart-list">
    <li class="chart-item"><a href="/songs/1"><span class="title">Live Boomplay One</span></a><span class="artist">Kizz Daniel</span></li>
    <li class="chart-item"><span class="title">Live Boomplay Two</span><span class="artist">Olamide</span></li>
  </ul>
</body></html>"#;

pub const TURNTABLE_PAYLOAD: &str = r#"<html><body>
  <script id="__NEXT_DATA__" type="application/json">
    {"props": {"pageProps": {"chartData": {"category": "Top 100", "dateCreated": "2024-06-01", "chartItems": [
      {"position": 1, "title": "Live Turntable One", "artiste": "Tyla", "weeksOnChart": 4},
      {"position": 2, "title": "Live Turntable Two", "artiste": "Asake", "lastPosition": 1},
      {"position": 3, "title": "Live Turntable Three", "artiste": "Tyla"}
    ]}}}}
  </script>
</body></html>"#;
