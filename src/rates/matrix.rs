//! Bilinear interpolation over a temperature x weight feeding-rate matrix.

use serde::{Deserialize, Serialize};

use crate::rates::{round2, FeedingMatrix2D};

/// Fallback cell values for missing or non-finite matrix entries. A malformed
/// matrix degrades to these rather than aborting the lookup.
pub const FALLBACK_RATE_PERCENT: f64 = 3.0;
pub const FALLBACK_FCR: f64 = 1.0;

/// Axis indices bounding the query point, after clamping to the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub temp_low: usize,
    pub temp_high: usize,
    pub weight_low: usize,
    pub weight_high: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpolatedRate {
    pub feeding_rate_percent: f64,
    pub fcr: Option<f64>,
    pub bounding_box: BoundingBox,
}

/// Interpolate the feeding rate (and FCR, when a matrix is present) at
/// `(temperature, weight_g)`.
///
/// Queries outside the grid clamp to the nearest edge. Always returns a
/// best-effort number, even for a matrix that fails [`validate_matrix`].
pub fn interpolate(matrix: &FeedingMatrix2D, temperature: f64, weight_g: f64) -> InterpolatedRate {
    let (t_low, t_high) = axis_bounds(&matrix.temperatures, temperature);
    let (w_low, w_high) = axis_bounds(&matrix.weights, weight_g);
    let bounding_box = BoundingBox {
        temp_low: t_low,
        temp_high: t_high,
        weight_low: w_low,
        weight_high: w_high,
    };

    let rate = interpolate_grid(
        &matrix.rates,
        &matrix.temperatures,
        &matrix.weights,
        temperature,
        weight_g,
        &bounding_box,
        FALLBACK_RATE_PERCENT,
    );
    let fcr = matrix.fcr_matrix.as_ref().map(|grid| {
        interpolate_grid(
            grid,
            &matrix.temperatures,
            &matrix.weights,
            temperature,
            weight_g,
            &bounding_box,
            FALLBACK_FCR,
        )
    });

    InterpolatedRate {
        feeding_rate_percent: round2(rate),
        fcr: fcr.map(round2),
        bounding_box,
    }
}

/// Structural checks: non-empty, dimension-consistent, strictly ascending
/// axes. Returns the list of violations; an empty list means the matrix is
/// well formed. Never fails: `interpolate` stays usable regardless.
pub fn validate_matrix(matrix: &FeedingMatrix2D) -> Vec<String> {
    let mut violations = Vec::new();

    if matrix.temperatures.is_empty() {
        violations.push("temperature axis is empty".to_string());
    }
    if matrix.weights.is_empty() {
        violations.push("weight axis is empty".to_string());
    }
    if !strictly_ascending(&matrix.temperatures) {
        violations.push("temperature axis is not strictly ascending".to_string());
    }
    if !strictly_ascending(&matrix.weights) {
        violations.push("weight axis is not strictly ascending".to_string());
    }
    if matrix.rates.len() != matrix.temperatures.len() {
        violations.push(format!(
            "rate rows ({}) do not match temperature axis ({})",
            matrix.rates.len(),
            matrix.temperatures.len()
        ));
    }
    for (idx, row) in matrix.rates.iter().enumerate() {
        if row.len() != matrix.weights.len() {
            violations.push(format!(
                "rate row {} has {} cells, weight axis has {}",
                idx,
                row.len(),
                matrix.weights.len()
            ));
        }
    }
    if let Some(grid) = &matrix.fcr_matrix {
        if grid.len() != matrix.temperatures.len() {
            violations.push(format!(
                "fcr rows ({}) do not match temperature axis ({})",
                grid.len(),
                matrix.temperatures.len()
            ));
        }
        for (idx, row) in grid.iter().enumerate() {
            if row.len() != matrix.weights.len() {
                violations.push(format!(
                    "fcr row {} has {} cells, weight axis has {}",
                    idx,
                    row.len(),
                    matrix.weights.len()
                ));
            }
        }
    }

    violations
}

fn strictly_ascending(axis: &[f64]) -> bool {
    axis.windows(2).all(|pair| pair[0] < pair[1])
}

/// Bounding indices for `value` on an ascending axis, clamped at both ends.
fn axis_bounds(axis: &[f64], value: f64) -> (usize, usize) {
    if axis.is_empty() {
        return (0, 0);
    }
    let last = axis.len() - 1;
    if value <= axis[0] {
        return (0, 0);
    }
    if value >= axis[last] {
        return (last, last);
    }
    for i in 0..last {
        if axis[i] <= value && value < axis[i + 1] {
            return (i, i + 1);
        }
    }
    (last, last)
}

fn cell(grid: &[Vec<f64>], t: usize, w: usize, fallback: f64) -> f64 {
    grid.get(t)
        .and_then(|row| row.get(w))
        .copied()
        .filter(|v| v.is_finite())
        .unwrap_or(fallback)
}

fn interpolate_grid(
    grid: &[Vec<f64>],
    temperatures: &[f64],
    weights: &[f64],
    temperature: f64,
    weight_g: f64,
    bounds: &BoundingBox,
    fallback: f64,
) -> f64 {
    let q00 = cell(grid, bounds.temp_low, bounds.weight_low, fallback);
    let q01 = cell(grid, bounds.temp_low, bounds.weight_high, fallback);
    let q10 = cell(grid, bounds.temp_high, bounds.weight_low, fallback);
    let q11 = cell(grid, bounds.temp_high, bounds.weight_high, fallback);

    if q00 == q01 && q00 == q10 && q00 == q11 {
        return q00;
    }

    let t0 = temperatures.get(bounds.temp_low).copied().unwrap_or(temperature);
    let t1 = temperatures.get(bounds.temp_high).copied().unwrap_or(temperature);
    let w0 = weights.get(bounds.weight_low).copied().unwrap_or(weight_g);
    let w1 = weights.get(bounds.weight_high).copied().unwrap_or(weight_g);

    let t_span = t1 - t0;
    let w_span = w1 - w0;

    // Degenerate spans collapse to linear interpolation on the live axis.
    if t_span == 0.0 && w_span == 0.0 {
        return q00;
    }
    if t_span == 0.0 {
        let frac = (weight_g - w0) / w_span;
        return q00 + frac * (q01 - q00);
    }
    if w_span == 0.0 {
        let frac = (temperature - t0) / t_span;
        return q00 + frac * (q10 - q00);
    }

    let t_frac = (temperature - t0) / t_span;
    let w_frac = (weight_g - w0) / w_span;
    let low = q00 + t_frac * (q10 - q00);
    let high = q01 + t_frac * (q11 - q01);
    low + w_frac * (high - low)
}

#[cfg(test)]
mod tests {
    use super::{interpolate, validate_matrix};
    use crate::rates::FeedingMatrix2D;

    fn sample_matrix() -> FeedingMatrix2D {
        FeedingMatrix2D {
            temperatures: vec![12.0, 16.0],
            weights: vec![5.0, 50.0],
            rates: vec![vec![3.0, 1.5], vec![4.0, 2.0]],
            fcr_matrix: Some(vec![vec![0.9, 1.1], vec![1.0, 1.2]]),
        }
    }

    #[test]
    fn interpolates_interior_point() {
        let result = interpolate(&sample_matrix(), 14.0, 27.5);
        assert!((result.feeding_rate_percent - 2.625).abs() < 0.01);
    }

    #[test]
    fn grid_points_return_exact_cell_values() {
        let matrix = sample_matrix();
        for (ti, t) in matrix.temperatures.iter().enumerate() {
            for (wi, w) in matrix.weights.iter().enumerate() {
                let result = interpolate(&matrix, *t, *w);
                assert_eq!(result.feeding_rate_percent, matrix.rates[ti][wi]);
            }
        }
    }

    #[test]
    fn result_stays_within_corner_bounds() {
        let matrix = sample_matrix();
        for t in [12.0, 13.7, 15.2, 16.0] {
            for w in [5.0, 17.0, 42.5, 50.0] {
                let rate = interpolate(&matrix, t, w).feeding_rate_percent;
                assert!((1.5..=4.0).contains(&rate), "rate {rate} out of bounds");
            }
        }
    }

    #[test]
    fn out_of_range_queries_clamp_to_edges() {
        let matrix = sample_matrix();
        let below = interpolate(&matrix, 5.0, 27.5);
        let at_min = interpolate(&matrix, 12.0, 27.5);
        assert_eq!(below.feeding_rate_percent, at_min.feeding_rate_percent);

        let above = interpolate(&matrix, 30.0, 27.5);
        let at_max = interpolate(&matrix, 16.0, 27.5);
        assert_eq!(above.feeding_rate_percent, at_max.feeding_rate_percent);

        let heavy = interpolate(&matrix, 14.0, 2_000.0);
        let at_edge = interpolate(&matrix, 14.0, 50.0);
        assert_eq!(heavy.feeding_rate_percent, at_edge.feeding_rate_percent);
    }

    #[test]
    fn single_cell_matrix_is_constant() {
        let matrix = FeedingMatrix2D {
            temperatures: vec![15.0],
            weights: vec![100.0],
            rates: vec![vec![2.5]],
            fcr_matrix: None,
        };
        let result = interpolate(&matrix, 22.0, 640.0);
        assert_eq!(result.feeding_rate_percent, 2.5);
        assert_eq!(result.fcr, None);
    }

    #[test]
    fn missing_cells_fall_back_instead_of_panicking() {
        let matrix = FeedingMatrix2D {
            temperatures: vec![10.0, 20.0],
            weights: vec![5.0, 50.0],
            rates: vec![vec![f64::NAN, 2.0]], // short row count, NaN cell
            fcr_matrix: None,
        };
        let result = interpolate(&matrix, 15.0, 27.5);
        assert!(result.feeding_rate_percent.is_finite());
    }

    #[test]
    fn validation_reports_structural_violations() {
        let matrix = FeedingMatrix2D {
            temperatures: vec![16.0, 12.0],
            weights: vec![],
            rates: vec![vec![1.0]],
            fcr_matrix: None,
        };
        let violations = validate_matrix(&matrix);
        assert!(violations.iter().any(|v| v.contains("weight axis is empty")));
        assert!(violations
            .iter()
            .any(|v| v.contains("not strictly ascending")));
        assert!(!violations.is_empty());
    }

    #[test]
    fn well_formed_matrix_passes_validation() {
        assert!(validate_matrix(&sample_matrix()).is_empty());
    }
}
