//! Feed selection: which feed a batch should receive at its current weight,
//! and at what rate.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::SimulationDefaults;
use crate::rates::{curve, matrix, round2, FeedingCurvePoint, FeedingMatrix2D};

/// Weight-banded mapping of a feed to a batch. The applicable entry is the
/// first one (priority ascending, then min weight ascending) whose
/// `[min_weight_g, max_weight_g)` band contains the current average weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedAssignmentEntry {
    pub feed_id: String,
    pub min_weight_g: f64,
    pub max_weight_g: f64,
    pub priority: i32,
}

impl FeedAssignmentEntry {
    pub fn contains(&self, weight_g: f64) -> bool {
        weight_g >= self.min_weight_g && weight_g < self.max_weight_g
    }
}

/// Feed metadata as served by the catalog: identity plus whichever rate
/// sources (1-D curve, 2-D matrix) are configured for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedDefinition {
    pub feed_id: String,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub feeding_curve: Option<Vec<FeedingCurvePoint>>,
    #[serde(default)]
    pub feeding_matrix: Option<FeedingMatrix2D>,
}

/// A batch's feeding setup, prefetched once so day-by-day selection never
/// touches a repository.
#[derive(Debug, Clone, Default)]
pub struct BatchFeedPlan {
    pub assignments: Vec<FeedAssignmentEntry>,
    pub feeds: HashMap<String, FeedDefinition>,
}

/// The resolved feed for one simulated day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedInfo {
    pub feed_code: String,
    pub feed_name: String,
    pub feeding_rate_percent: f64,
    pub fcr: Option<f64>,
    pub daily_feed_kg: f64,
    pub used_matrix_2d: bool,
}

/// Selection outcome. `NoAssignment` (nothing configured for this weight) and
/// `LookupFailed` (data access broke) are distinct: both mean "feed unknown"
/// to the simulator, but only the latter is a data problem worth surfacing.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedSelection {
    Selected(FeedInfo),
    NoAssignment,
    LookupFailed(String),
}

impl FeedSelection {
    pub fn feed(&self) -> Option<&FeedInfo> {
        match self {
            FeedSelection::Selected(info) => Some(info),
            _ => None,
        }
    }
}

/// Pick the feed for a batch at `avg_weight_g` and compute its daily ration.
///
/// Prefers the 2-D matrix when one exists and a water temperature is known;
/// falls back to the 1-D curve otherwise. Never fails: problems degrade to
/// `NoAssignment` or `LookupFailed` so the caller's day loop keeps running.
pub fn select_feed_for_batch(
    plan: &BatchFeedPlan,
    defaults: &SimulationDefaults,
    avg_weight_g: f64,
    biomass_kg: f64,
    water_temperature: Option<f64>,
) -> FeedSelection {
    let mut entries: Vec<&FeedAssignmentEntry> = plan.assignments.iter().collect();
    entries.sort_by(|a, b| {
        a.priority.cmp(&b.priority).then(
            a.min_weight_g
                .partial_cmp(&b.min_weight_g)
                .unwrap_or(std::cmp::Ordering::Equal),
        )
    });

    let Some(entry) = entries.into_iter().find(|e| e.contains(avg_weight_g)) else {
        return FeedSelection::NoAssignment;
    };

    let Some(feed) = plan.feeds.get(&entry.feed_id) else {
        let reason = format!("feed {} missing from catalog", entry.feed_id);
        warn!(feed_id = %entry.feed_id, "feed selection failed: {reason}");
        return FeedSelection::LookupFailed(reason);
    };

    let (rate, fcr, used_matrix_2d) = match (&feed.feeding_matrix, water_temperature) {
        (Some(matrix), Some(temperature)) => {
            let result = matrix::interpolate(matrix, temperature, avg_weight_g);
            (result.feeding_rate_percent, result.fcr, true)
        }
        _ => {
            let points = feed.feeding_curve.as_deref().unwrap_or(&[]);
            (
                curve::resolve_rate(points, avg_weight_g, defaults.feeding_rate_percent),
                curve::resolve_fcr(points, avg_weight_g),
                false,
            )
        }
    };

    FeedSelection::Selected(FeedInfo {
        feed_code: feed.code.clone(),
        feed_name: feed.name.clone(),
        feeding_rate_percent: rate,
        fcr,
        daily_feed_kg: daily_feed_kg(biomass_kg, rate),
        used_matrix_2d,
    })
}

/// Daily ration in kg for a biomass fed at `rate_percent` %BW/day.
/// Clamped to >= 0 and never NaN.
pub fn daily_feed_kg(biomass_kg: f64, rate_percent: f64) -> f64 {
    let feed = biomass_kg * rate_percent / 100.0;
    if !feed.is_finite() || feed < 0.0 {
        return 0.0;
    }
    round2(feed)
}
