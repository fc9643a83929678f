//! Day-by-day growth and feed projection for a single tank.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::config::SimulationDefaults;
use crate::growth::{GrowthProjection, SimulationSummary, TankSimulation, TankSnapshot};
use crate::rates::round2;
use crate::selector::{self, BatchFeedPlan, FeedSelection};

/// Everything a simulation run needs besides the tank itself. Cheap to share
/// across tanks; carries no mutable state.
#[derive(Debug, Clone)]
pub struct SimulationParams {
    pub defaults: SimulationDefaults,
    pub mortality_rate: f64,
    pub temperature_forecast: Vec<f64>,
    pub start_date: NaiveDate,
}

impl SimulationParams {
    pub fn new(defaults: SimulationDefaults, start_date: NaiveDate) -> Self {
        Self {
            defaults,
            mortality_rate: 0.0001,
            temperature_forecast: Vec::new(),
            start_date,
        }
    }

    fn temperature_for_day(&self, day: usize) -> f64 {
        self.temperature_forecast
            .get(day)
            .copied()
            .unwrap_or(self.defaults.water_temp_c)
    }
}

/// Coarse %BW/day bands used when no feed can be resolved for a day.
pub fn fallback_rate_for_weight(weight_g: f64) -> f64 {
    if weight_g < 5.0 {
        8.0
    } else if weight_g < 20.0 {
        5.0
    } else if weight_g < 50.0 {
        4.0
    } else if weight_g < 100.0 {
        3.0
    } else if weight_g < 200.0 {
        2.5
    } else if weight_g < 500.0 {
        2.0
    } else if weight_g < 1000.0 {
        1.5
    } else {
        1.2
    }
}

/// Project `days` days of growth, mortality and feed consumption for one tank.
///
/// Day 0 records the seed observation; weight then compounds daily by
/// `e^(sgr/100)`. The population is floored at 1 fish so biomass and rate
/// math never divide by zero.
pub fn simulate_tank(
    tank: &TankSnapshot,
    plan: Option<&BatchFeedPlan>,
    days: u32,
    params: &SimulationParams,
) -> TankSimulation {
    let sgr_percent = tank.sgr_percent.unwrap_or(params.defaults.sgr_percent);
    let growth_factor = (sgr_percent / 100.0).exp();

    let mut weight_g = tank.current_weight_g;
    let mut count = tank.current_count.max(1);
    let mut cumulative_feed_kg = 0.0;
    let mut cumulative_mortality = 0u64;
    let mut projections = Vec::with_capacity(days as usize + 1);

    for day in 0..=days {
        let mortality = if day == 0 {
            0
        } else {
            (count as f64 * params.mortality_rate).floor() as u64
        };
        count = count.saturating_sub(mortality).max(1);
        cumulative_mortality += mortality;

        let biomass_kg = weight_g * count as f64 / 1000.0;
        let temperature = params.temperature_for_day(day as usize);

        let selection = match plan {
            Some(plan) => selector::select_feed_for_batch(
                plan,
                &params.defaults,
                weight_g,
                biomass_kg,
                Some(temperature),
            ),
            None => FeedSelection::NoAssignment,
        };
        let (feed_code, feeding_rate_percent, fcr) = match selection.feed() {
            Some(info) => (
                Some(info.feed_code.clone()),
                info.feeding_rate_percent,
                info.fcr,
            ),
            None => (None, fallback_rate_for_weight(weight_g), None),
        };

        let daily_feed_kg = if day == 0 {
            0.0
        } else {
            selector::daily_feed_kg(biomass_kg, feeding_rate_percent)
        };
        cumulative_feed_kg = round2(cumulative_feed_kg + daily_feed_kg);

        projections.push(GrowthProjection {
            day,
            date: params.start_date + chrono::Duration::days(day as i64),
            avg_weight_g: round2(weight_g),
            fish_count: count,
            biomass_kg: round2(biomass_kg),
            feed_code,
            feeding_rate_percent,
            daily_feed_kg,
            cumulative_feed_kg,
            fcr,
            temperature,
            mortality,
            cumulative_mortality,
        });

        weight_g *= growth_factor;
    }

    let summary = summarize(&projections, days);
    debug!(
        tank_id = %tank.tank_id,
        end_weight_g = summary.end_weight_g,
        total_feed_kg = summary.total_feed_kg,
        "tank simulation finished"
    );

    TankSimulation {
        tank_id: tank.tank_id.clone(),
        batch_id: tank.batch_id.clone(),
        sgr_percent,
        projections,
        summary,
    }
}

fn summarize(projections: &[GrowthProjection], days: u32) -> SimulationSummary {
    let first = projections.first();
    let last = projections.last();
    let start_biomass_kg = first.map(|p| p.biomass_kg).unwrap_or(0.0);
    let end_biomass_kg = last.map(|p| p.biomass_kg).unwrap_or(0.0);
    let total_feed_kg = last.map(|p| p.cumulative_feed_kg).unwrap_or(0.0);
    let gain = end_biomass_kg - start_biomass_kg;
    // Net-loss or flat periods report FCR 0, not a negative or infinite ratio.
    let avg_fcr = if gain > 0.0 {
        round2(total_feed_kg / gain)
    } else {
        0.0
    };

    SimulationSummary {
        days,
        start_weight_g: first.map(|p| p.avg_weight_g).unwrap_or(0.0),
        end_weight_g: last.map(|p| p.avg_weight_g).unwrap_or(0.0),
        start_biomass_kg,
        end_biomass_kg,
        total_feed_kg,
        avg_fcr,
        total_mortality: last.map(|p| p.cumulative_mortality).unwrap_or(0),
    }
}

/// Run independent projections for several tanks, for side-by-side
/// comparison. Tanks without a usable seed are skipped.
pub fn simulate_multi_tank(
    tanks: &[TankSnapshot],
    plans: &HashMap<String, BatchFeedPlan>,
    days: u32,
    params: &SimulationParams,
) -> Vec<TankSimulation> {
    tanks
        .iter()
        .filter(|tank| {
            let usable = tank.has_usable_seed();
            if !usable {
                debug!(tank_id = %tank.tank_id, "skipping tank without usable seed data");
            }
            usable
        })
        .map(|tank| simulate_tank(tank, plans.get(&tank.batch_id), days, params))
        .collect()
}
