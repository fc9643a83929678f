pub mod curve;
pub mod matrix;

use serde::{Deserialize, Serialize};

/// One sample of a 1-D feeding curve: at (or above) this fish weight, feed at
/// this percentage of body weight per day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedingCurvePoint {
    pub fish_weight_g: f64,
    pub feeding_rate_percent: f64,
    pub fcr: f64,
}

/// Temperature x weight feeding-rate grid. Both axes ascending; `rates` is
/// indexed `[temperature][weight]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedingMatrix2D {
    pub temperatures: Vec<f64>,
    pub weights: Vec<f64>,
    pub rates: Vec<Vec<f64>>,
    #[serde(default)]
    pub fcr_matrix: Option<Vec<Vec<f64>>>,
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
