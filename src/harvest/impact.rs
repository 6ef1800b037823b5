//! Economic impact estimate derived from harvested chart sizes.

use serde::{Deserialize, Serialize};

use super::PlatformSnapshot;

/// Tunable constants of the impact model. Every field can be overridden from
/// the `[impact]` table of the config file.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ImpactParameters {
    /// USD paid out per stream.
    pub payout_per_stream_usd: f64,
    /// Streams credited to every charted track.
    pub streams_per_charted_track: u64,
    /// Live-event revenue added on top of streaming, in USD.
    pub concert_revenue_usd: f64,
    pub economic_multiplier: f64,
    pub jobs_per_million_usd: f64,
    /// Share of direct streaming revenue earned abroad.
    pub export_share: f64,
}

impl Default for ImpactParameters {
    fn default() -> Self {
        Self {
            payout_per_stream_usd: 0.003,
            streams_per_charted_track: 5_000_000,
            concert_revenue_usd: 1_200_000_000.0,
            economic_multiplier: 1.75,
            jobs_per_million_usd: 50.0,
            export_share: 0.42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EconomicImpact {
    pub platforms: usize,
    pub charted_tracks: usize,
    pub estimated_streams: u64,
    pub direct_streaming_revenue_usd: f64,
    pub direct_revenue_usd: f64,
    pub gdp_contribution_usd: f64,
    pub jobs_supported: u64,
    pub export_revenue_usd: f64,
    pub parameters: ImpactParameters,
}

impl ImpactParameters {
    pub fn validate(&self) -> Result<(), String> {
        let non_negative = [
            ("payout_per_stream_usd", self.payout_per_stream_usd),
            ("concert_revenue_usd", self.concert_revenue_usd),
            ("economic_multiplier", self.economic_multiplier),
            ("jobs_per_million_usd", self.jobs_per_million_usd),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("impact.{} must be a non-negative number", name));
            }
        }
        if !(0.0..=1.0).contains(&self.export_share) {
            return Err("impact.export_share must be between 0 and 1".to_string());
        }
        Ok(())
    }

    pub fn estimate(&self, snapshots: &[PlatformSnapshot]) -> EconomicImpact {
        let charted_tracks: usize = snapshots.iter().map(|s| s.tracks.len()).sum();
        let estimated_streams = self
            .streams_per_charted_track
            .saturating_mul(charted_tracks as u64);

        let direct_streaming_revenue_usd = estimated_streams as f64 * self.payout_per_stream_usd;
        let direct_revenue_usd = direct_streaming_revenue_usd + self.concert_revenue_usd;
        let gdp_contribution_usd = direct_revenue_usd * self.economic_multiplier;
        let jobs_supported =
            (gdp_contribution_usd / 1_000_000.0 * self.jobs_per_million_usd).round() as u64;

        EconomicImpact {
            platforms: snapshots.len(),
            charted_tracks,
            estimated_streams,
            direct_streaming_revenue_usd,
            direct_revenue_usd,
            gdp_contribution_usd,
            jobs_supported,
            export_revenue_usd: direct_streaming_revenue_usd * self.export_share,
            parameters: self.clone(),
        }
    }
}
