//! 1-D feeding curve lookup.
//!
//! A curve is a step function sampled at descending fish weights: the
//! applicable point is the nearest threshold at or below the current weight.

use crate::rates::FeedingCurvePoint;

/// Resolve the feeding rate (%BW/day) for `weight_g`.
///
/// Falls back to `default_rate` when the curve is empty or the weight sits
/// below the smallest threshold.
pub fn resolve_rate(curve: &[FeedingCurvePoint], weight_g: f64, default_rate: f64) -> f64 {
    match resolve_point(curve, weight_g) {
        Some(point) => point.feeding_rate_percent,
        None => default_rate,
    }
}

/// Resolve the FCR for `weight_g`; `None` means the curve carries no answer.
pub fn resolve_fcr(curve: &[FeedingCurvePoint], weight_g: f64) -> Option<f64> {
    resolve_point(curve, weight_g).map(|point| point.fcr)
}

fn resolve_point(curve: &[FeedingCurvePoint], weight_g: f64) -> Option<&FeedingCurvePoint> {
    let mut points: Vec<&FeedingCurvePoint> = curve.iter().collect();
    points.sort_by(|a, b| {
        b.fish_weight_g
            .partial_cmp(&a.fish_weight_g)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    points
        .into_iter()
        .find(|point| point.fish_weight_g <= weight_g)
}
