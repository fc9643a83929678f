pub mod sgr;
pub mod simulator;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Seed state for one tank's simulation, as observed right now.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TankSnapshot {
    pub tank_id: String,
    pub batch_id: String,
    pub current_weight_g: f64,
    pub current_count: u64,
    #[serde(default)]
    pub sgr_percent: Option<f64>,
}

impl TankSnapshot {
    /// Usable as a simulation seed: a live population with a positive weight.
    pub fn has_usable_seed(&self) -> bool {
        self.current_count > 0 && self.current_weight_g > 0.0
    }
}

/// One simulated day of a tank projection. Day 0 is the seed observation
/// (zero feed, zero mortality).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrowthProjection {
    pub day: u32,
    pub date: NaiveDate,
    pub avg_weight_g: f64,
    pub fish_count: u64,
    pub biomass_kg: f64,
    pub feed_code: Option<String>,
    pub feeding_rate_percent: f64,
    pub daily_feed_kg: f64,
    pub cumulative_feed_kg: f64,
    pub fcr: Option<f64>,
    pub temperature: f64,
    pub mortality: u64,
    pub cumulative_mortality: u64,
}

/// Aggregate view of a finished projection.
///
/// `avg_fcr` is computed at population-biomass level and reported as 0 when
/// the biomass gain is non-positive, even if feed was consumed. Conservative
/// by convention; do not use it for cost accounting without checking gain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub days: u32,
    pub start_weight_g: f64,
    pub end_weight_g: f64,
    pub start_biomass_kg: f64,
    pub end_biomass_kg: f64,
    pub total_feed_kg: f64,
    pub avg_fcr: f64,
    pub total_mortality: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TankSimulation {
    pub tank_id: String,
    pub batch_id: String,
    pub sgr_percent: f64,
    pub projections: Vec<GrowthProjection>,
    pub summary: SimulationSummary,
}
