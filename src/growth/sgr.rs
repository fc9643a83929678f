//! Specific Growth Rate helpers: back-calculation from two weighings,
//! species/temperature estimation, and harvest-date projection.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// SGR (%/day) observed between two weighings `days` apart.
/// Degenerate inputs (non-positive weights or days) report 0 rather than
/// erroring: they reflect incomplete operational data.
pub fn calculate_sgr(start_weight_g: f64, end_weight_g: f64, days: f64) -> f64 {
    if days <= 0.0 || start_weight_g <= 0.0 || end_weight_g <= 0.0 {
        return 0.0;
    }
    (end_weight_g.ln() - start_weight_g.ln()) / days * 100.0
}

/// Expected SGR for a species at a given water temperature: a base rate per
/// species scaled by a temperature multiplier. Unknown species use the
/// generic base rate.
pub fn estimate_sgr(species: &str, temperature_c: f64) -> f64 {
    let base = match species.to_lowercase().as_str() {
        "seabass" => 1.5,
        "seabream" => 1.4,
        "trout" => 2.0,
        "salmon" => 1.8,
        "tilapia" => 2.5,
        _ => 1.5,
    };
    base * temperature_multiplier(temperature_c)
}

/// Most-extreme breakpoint wins: very cold and very warm water both slow
/// growth more than the adjacent band.
fn temperature_multiplier(temperature_c: f64) -> f64 {
    if temperature_c < 10.0 {
        0.5
    } else if temperature_c < 15.0 {
        0.75
    } else if temperature_c > 25.0 {
        0.8
    } else if temperature_c > 22.0 {
        0.9
    } else {
        1.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvestProjection {
    pub days_to_harvest: u32,
    pub harvest_date: NaiveDate,
    pub projected_weight_g: f64,
}

/// Closed-form inversion of the daily-compounded growth model:
/// `days = ceil(ln(target / current) / (sgr / 100))`.
/// Already at target, or a non-positive SGR, projects harvest today.
pub fn project_harvest_date(
    current_weight_g: f64,
    target_weight_g: f64,
    sgr_percent: f64,
    start: NaiveDate,
) -> HarvestProjection {
    let days = if sgr_percent <= 0.0
        || current_weight_g <= 0.0
        || target_weight_g <= current_weight_g
    {
        0
    } else {
        ((target_weight_g / current_weight_g).ln() / (sgr_percent / 100.0)).ceil() as u32
    };
    let projected_weight_g = if current_weight_g > 0.0 {
        current_weight_g * (sgr_percent / 100.0 * days as f64).exp()
    } else {
        current_weight_g
    };
    HarvestProjection {
        days_to_harvest: days,
        harvest_date: start + chrono::Duration::days(days as i64),
        projected_weight_g,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{calculate_sgr, estimate_sgr, project_harvest_date};

    fn day0() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    #[test]
    fn sgr_round_trips_through_growth_formula() {
        for sgr in [0.5f64, 1.5, 2.4] {
            for days in [7.0, 30.0, 90.0] {
                let w0 = 12.0;
                let w1 = w0 * (sgr / 100.0 * days).exp();
                let back = calculate_sgr(w0, w1, days);
                assert!((back - sgr).abs() < 1e-9, "sgr {sgr} came back as {back}");
            }
        }
    }

    #[test]
    fn degenerate_sgr_inputs_report_zero() {
        assert_eq!(calculate_sgr(10.0, 20.0, 0.0), 0.0);
        assert_eq!(calculate_sgr(10.0, 20.0, -3.0), 0.0);
        assert_eq!(calculate_sgr(0.0, 20.0, 10.0), 0.0);
        assert_eq!(calculate_sgr(10.0, 0.0, 10.0), 0.0);
    }

    #[test]
    fn species_table_and_temperature_bands() {
        assert_eq!(estimate_sgr("trout", 18.0), 2.0);
        assert_eq!(estimate_sgr("Tilapia", 18.0), 2.5);
        assert_eq!(estimate_sgr("unknown-species", 18.0), 1.5);
        assert_eq!(estimate_sgr("salmon", 8.0), 1.8 * 0.5);
        assert_eq!(estimate_sgr("salmon", 12.0), 1.8 * 0.75);
        assert_eq!(estimate_sgr("salmon", 23.5), 1.8 * 0.9);
        assert_eq!(estimate_sgr("salmon", 27.0), 1.8 * 0.8);
    }

    #[test]
    fn harvest_projection_never_undershoots_target() {
        for (w0, target, sgr) in [(10.0, 400.0, 1.5), (120.0, 450.0, 0.8), (5.0, 5000.0, 2.5)] {
            let projection = project_harvest_date(w0, target, sgr, day0());
            assert!(
                projection.projected_weight_g >= target,
                "projected {} < target {target}",
                projection.projected_weight_g
            );
            // One day earlier must undershoot, otherwise ceil overshot.
            if projection.days_to_harvest > 0 {
                let days = projection.days_to_harvest as f64 - 1.0;
                let earlier = w0 * (sgr / 100.0 * days).exp();
                assert!(earlier < target);
            }
        }
    }

    #[test]
    fn harvest_projection_degenerate_cases() {
        let at_target = project_harvest_date(500.0, 400.0, 1.5, day0());
        assert_eq!(at_target.days_to_harvest, 0);
        assert_eq!(at_target.harvest_date, day0());

        let no_growth = project_harvest_date(10.0, 400.0, 0.0, day0());
        assert_eq!(no_growth.days_to_harvest, 0);
    }
}
