use rand::{rngs::StdRng, Rng, SeedableRng};

use super::entry::{estimate_streams, ChartEntry};

const DEMO_SEED: u64 = 42;
const DEMO_CATEGORY: &str = "Top 100";

const ROSTER: &[&str] = &[
    "Rema",
    "Burna Boy",
    "Wizkid",
    "Davido",
    "Asake",
    "Ayra Starr",
    "Fireboy DML",
    "Omah Lay",
    "Oxlade",
    "Tems",
    "Kizz Daniel",
    "Tiwa Savage",
    "Olamide",
    "Ckay",
    "Ruger",
    "Joeboy",
    "Victony",
    "Ladipoe",
    "Mayorkun",
    "Zinoleesky",
];

/// Deterministic stand-in chart used when no live chart could be extracted.
pub fn demo_chart(size: usize) -> Vec<ChartEntry> {
    let mut rng = StdRng::seed_from_u64(DEMO_SEED);
    let span = (size + 5) as f64;
    (0..size)
        .map(|index| {
            let rank = index as u32 + 1;
            let artist = ROSTER[rng.random_range(0..ROSTER.len())];
            let jitter = rng.random_range(0.85..1.05);
            ChartEntry {
                rank,
                title: format!("{artist} - Hit Song {rank}"),
                artist: artist.to_string(),
                estimated_streams: estimate_streams(index, span, jitter),
                last_position: None,
                weeks_on_chart: None,
                image_url: None,
                music_link: None,
                chart_category: Some(DEMO_CATEGORY.to_string()),
                chart_week: None,
            }
        })
        .collect()
}
