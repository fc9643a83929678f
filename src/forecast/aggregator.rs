//! Farm-wide consumption forecast: simulate every live tank, fold the
//! per-day rations into per-feed-code series, and derive stockout and
//! reorder timing.
//!
//! The data-access phase runs first and produces an immutable snapshot; the
//! per-tank simulations then fan out as independent tasks and are folded once
//! all of them finish. A stock change mid-computation is ignored until the
//! next run; forecasts are advisory.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::config::Config;
use crate::forecast::{alerts, ConsumptionForecast, FeedConsumptionByType};
use crate::growth::simulator::{simulate_tank, SimulationParams};
use crate::growth::{TankSimulation, TankSnapshot};
use crate::rates::round2;
use crate::repository::{BatchAssignmentRepository, FeedCatalogRepository, TankStateRepository};
use crate::selector::BatchFeedPlan;

/// Read-only snapshot of everything one forecast run needs.
pub struct ForecastInputs {
    pub tanks: Vec<TankSnapshot>,
    pub plans: HashMap<String, BatchFeedPlan>,
    pub inventory: HashMap<String, f64>,
    pub tanks_skipped: usize,
}

/// Assemble the snapshot: live tanks, one batched SGR pass, each batch's
/// feeding plan, and current inventory. Per-entity failures are logged and
/// the affected tank or feed is excluded; only the tank listing itself is
/// load-bearing enough to fail the call.
pub async fn load_inputs(
    catalog: &dyn FeedCatalogRepository,
    assignments: &dyn BatchAssignmentRepository,
    tank_state: &dyn TankStateRepository,
) -> Result<ForecastInputs> {
    let mut tanks = tank_state.live_tanks().await?;
    let mut tanks_skipped = 0usize;

    let batch_ids: Vec<String> = tanks
        .iter()
        .map(|t| t.batch_id.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    // One pass for every batch's SGR; never a lookup per tank per day.
    let sgr_by_batch = match tank_state.sgr_by_batch(&batch_ids).await {
        Ok(map) => map,
        Err(err) => {
            warn!(%err, "batched SGR lookup failed; falling back to defaults");
            HashMap::new()
        }
    };
    for tank in &mut tanks {
        if tank.sgr_percent.is_none() {
            tank.sgr_percent = sgr_by_batch.get(&tank.batch_id).copied();
        }
    }

    let mut plans: HashMap<String, BatchFeedPlan> = HashMap::new();
    let mut failed_batches: BTreeSet<String> = BTreeSet::new();
    for batch_id in &batch_ids {
        let entries = match assignments.active_assignments(batch_id).await {
            Ok(entries) => entries,
            Err(err) => {
                warn!(batch_id, %err, "assignment lookup failed; excluding batch");
                failed_batches.insert(batch_id.clone());
                continue;
            }
        };

        let mut plan = BatchFeedPlan {
            assignments: entries,
            feeds: HashMap::new(),
        };
        let feed_ids: BTreeSet<String> = plan
            .assignments
            .iter()
            .map(|e| e.feed_id.clone())
            .collect();
        for feed_id in feed_ids {
            match catalog.get_feed_by_id(&feed_id).await {
                Ok(Some(feed)) => {
                    plan.feeds.insert(feed_id, feed);
                }
                Ok(None) => {
                    warn!(batch_id, feed_id, "assigned feed not found in catalog");
                }
                Err(err) => {
                    warn!(batch_id, feed_id, %err, "feed lookup failed; excluding feed");
                }
            }
        }
        plans.insert(batch_id.clone(), plan);
    }

    let before = tanks.len();
    tanks.retain(|t| !failed_batches.contains(&t.batch_id));
    tanks_skipped += before - tanks.len();

    let inventory = match catalog.inventory_by_feed_code().await {
        Ok(map) => map,
        Err(err) => {
            warn!(%err, "inventory lookup failed; treating all stock as unknown");
            HashMap::new()
        }
    };

    Ok(ForecastInputs {
        tanks,
        plans,
        inventory,
        tanks_skipped,
    })
}

/// Scatter-gather over all tanks, then fold into the per-feed forecast.
pub async fn run_forecast(
    inputs: ForecastInputs,
    config: &Config,
    start_date: NaiveDate,
) -> ConsumptionForecast {
    let horizon_days = config.forecast.forecast_days;
    let params = SimulationParams {
        defaults: config.simulation.clone(),
        mortality_rate: config.forecast.mortality_rate,
        temperature_forecast: config.forecast.temperature_forecast.clone(),
        start_date,
    };

    let mut tanks_skipped = inputs.tanks_skipped;
    let plans = Arc::new(inputs.plans);
    let params = Arc::new(params);

    let mut join_set = JoinSet::new();
    let mut spawned = 0usize;
    for tank in inputs.tanks {
        if !tank.has_usable_seed() {
            warn!(tank_id = %tank.tank_id, "skipping tank without usable seed data");
            tanks_skipped += 1;
            continue;
        }
        let plans = Arc::clone(&plans);
        let params = Arc::clone(&params);
        spawned += 1;
        join_set.spawn_blocking(move || {
            simulate_tank(&tank, plans.get(&tank.batch_id), horizon_days, &params)
        });
    }

    let mut simulations: Vec<TankSimulation> = Vec::with_capacity(spawned);
    let mut partial = false;
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok(simulation) => simulations.push(simulation),
            Err(err) => {
                warn!(%err, "tank simulation task lost; forecast is partial");
                partial = true;
            }
        }
    }

    let feed_types = fold_consumption(
        &simulations,
        &inputs.inventory,
        config,
        start_date,
        horizon_days,
    );
    let alerts = alerts::evaluate_alerts(&feed_types, &config.forecast, horizon_days);

    info!(
        tanks = simulations.len(),
        feed_types = feed_types.len(),
        alerts = alerts.len(),
        "consumption forecast complete"
    );

    ConsumptionForecast {
        generated_at: Utc::now(),
        start_date,
        horizon_days,
        feed_types,
        alerts,
        tanks_simulated: simulations.len(),
        tanks_skipped,
        partial,
    }
}

/// Load the snapshot and run the full forecast in one call.
pub async fn forecast_consumption(
    catalog: &dyn FeedCatalogRepository,
    assignments: &dyn BatchAssignmentRepository,
    tank_state: &dyn TankStateRepository,
    config: &Config,
    start_date: NaiveDate,
) -> Result<ConsumptionForecast> {
    let inputs = load_inputs(catalog, assignments, tank_state).await?;
    Ok(run_forecast(inputs, config, start_date).await)
}

struct FoldedFeed {
    daily: Vec<f64>,
    tanks: BTreeSet<String>,
}

fn fold_consumption(
    simulations: &[TankSimulation],
    inventory: &HashMap<String, f64>,
    config: &Config,
    start_date: NaiveDate,
    horizon_days: u32,
) -> Vec<FeedConsumptionByType> {
    let mut folded: BTreeMap<String, FoldedFeed> = BTreeMap::new();

    for simulation in simulations {
        for row in &simulation.projections {
            if row.day == 0 {
                continue;
            }
            let Some(code) = &row.feed_code else {
                continue;
            };
            let entry = folded.entry(code.clone()).or_insert_with(|| FoldedFeed {
                daily: vec![0.0; horizon_days as usize],
                tanks: BTreeSet::new(),
            });
            let idx = (row.day - 1) as usize;
            if let Some(slot) = entry.daily.get_mut(idx) {
                *slot += row.daily_feed_kg;
            }
            entry.tanks.insert(simulation.tank_id.clone());
        }
    }

    folded
        .into_iter()
        .map(|(code, fold)| {
            let stock = inventory.get(&code).copied().unwrap_or(0.0);
            derive_feed_type(code, fold, stock, config, start_date, horizon_days)
        })
        .collect()
}

fn derive_feed_type(
    feed_code: String,
    fold: FoldedFeed,
    current_stock_kg: f64,
    config: &Config,
    start_date: NaiveDate,
    horizon_days: u32,
) -> FeedConsumptionByType {
    let daily: Vec<f64> = fold.daily.iter().map(|v| round2(*v)).collect();
    let total: f64 = round2(daily.iter().sum());
    let avg_daily = if horizon_days > 0 {
        total / horizon_days as f64
    } else {
        0.0
    };

    let mut days_until_stockout = horizon_days + 1;
    let mut cumulative = 0.0;
    if total > 0.0 {
        for (idx, amount) in daily.iter().enumerate() {
            cumulative += amount;
            if cumulative >= current_stock_kg {
                days_until_stockout = idx as u32;
                break;
            }
        }
    }

    let stockout_date = (days_until_stockout <= horizon_days)
        .then(|| start_date + chrono::Duration::days(days_until_stockout as i64));
    // A stockout closer than the lead time means the reorder is already
    // overdue; no date is produced for it.
    let reorder_date = stockout_date
        .filter(|_| days_until_stockout > config.forecast.lead_time_days)
        .map(|date| date - chrono::Duration::days(config.forecast.lead_time_days as i64));
    // Standing order: a month of average draw plus the safety buffer,
    // independent of the horizon length.
    let reorder_quantity_kg =
        (avg_daily * (30.0 + config.forecast.safety_stock_days as f64)).ceil();

    FeedConsumptionByType {
        feed_code,
        daily_consumption: daily,
        total_consumption_kg: total,
        avg_daily_kg: round2(avg_daily),
        current_stock_kg,
        days_until_stockout,
        stockout_date,
        reorder_date,
        reorder_quantity_kg,
        contributing_tanks: fold.tanks.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use chrono::NaiveDate;

    use super::{forecast_consumption, load_inputs, run_forecast};
    use crate::config::Config;
    use crate::forecast::AlertKind;
    use crate::growth::TankSnapshot;
    use crate::repository::dataset::JsonDataset;
    use crate::repository::{
        BatchAssignmentRepository, FeedCatalogRepository, TankStateRepository,
    };
    use crate::selector::{FeedAssignmentEntry, FeedDefinition};

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    /// Two tanks on the same flat-rate feed; combined draw 5 kg/day.
    /// With sgr 0 and a 1 %BW/day curve point, each tank's ration is flat.
    fn flat_dataset(stock: f64) -> JsonDataset {
        let json = format!(
            r#"{{
                "feeds": [
                    {{
                        "feed_id": "f1",
                        "code": "GROWER1",
                        "name": "Grower 1",
                        "feeding_curve": [
                            {{"fish_weight_g": 1.0, "feeding_rate_percent": 1.0, "fcr": 1.0}}
                        ]
                    }}
                ],
                "tanks": [
                    {{"tank_id": "T1", "batch_id": "B1", "current_weight_g": 100.0, "current_count": 2500, "sgr_percent": 0.0}},
                    {{"tank_id": "T2", "batch_id": "B1", "current_weight_g": 100.0, "current_count": 2500, "sgr_percent": 0.0}}
                ],
                "assignments": [
                    {{"batch_id": "B1", "feed_id": "f1", "min_weight_g": 0.0, "max_weight_g": 10000.0, "priority": 1}}
                ],
                "inventory": {{"GROWER1": {stock}}},
                "batch_sgr": {{}}
            }}"#
        );
        JsonDataset::from_json(&json).expect("dataset parses")
    }

    fn quiet_config() -> Config {
        let mut config = Config::default();
        config.forecast.mortality_rate = 0.0;
        config
    }

    #[tokio::test]
    async fn flat_consumption_hits_stockout_at_day_nine() {
        // 2500 fish x 100 g = 250 kg biomass per tank; 1 %BW -> 2.5 kg/day
        // each, 5 kg/day combined. 47 kg of stock covers 9 full days.
        let dataset = flat_dataset(47.0);
        let config = quiet_config();
        let forecast = forecast_consumption(&dataset, &dataset, &dataset, &config, start())
            .await
            .expect("forecast runs");

        assert_eq!(forecast.feed_types.len(), 1);
        let grower = &forecast.feed_types[0];
        assert_eq!(grower.feed_code, "GROWER1");
        assert_eq!(grower.daily_consumption.len(), 30);
        assert!((grower.daily_consumption[0] - 5.0).abs() < 1e-9);
        assert_eq!(grower.days_until_stockout, 9);
        assert!(grower.stockout_date.is_some());
        assert_eq!(grower.contributing_tanks, vec!["T1", "T2"]);
    }

    #[tokio::test]
    async fn more_stock_never_means_an_earlier_stockout() {
        let config = quiet_config();
        let mut previous = 0;
        for stock in [10.0, 47.0, 100.0, 149.0] {
            let dataset = flat_dataset(stock);
            let forecast = forecast_consumption(&dataset, &dataset, &dataset, &config, start())
                .await
                .unwrap();
            let days = forecast.feed_types[0].days_until_stockout;
            assert!(days >= previous, "stock {stock} gave earlier stockout");
            previous = days;
        }
    }

    #[tokio::test]
    async fn ample_stock_reports_sentinel_and_no_alerts() {
        let dataset = flat_dataset(100_000.0);
        let config = quiet_config();
        let forecast = forecast_consumption(&dataset, &dataset, &dataset, &config, start())
            .await
            .unwrap();
        let grower = &forecast.feed_types[0];
        assert_eq!(grower.days_until_stockout, 31);
        assert!(grower.stockout_date.is_none());
        assert!(grower.reorder_date.is_none());
        assert!(forecast.alerts.is_empty());
    }

    #[tokio::test]
    async fn imminent_stockout_raises_the_most_urgent_alert() {
        let dataset = flat_dataset(8.0); // two covered days
        let config = quiet_config();
        let forecast = forecast_consumption(&dataset, &dataset, &dataset, &config, start())
            .await
            .unwrap();
        assert_eq!(forecast.alerts.len(), 1);
        assert_eq!(forecast.alerts[0].kind, AlertKind::StockoutImminent);
        // Reorder already overdue: no reorder date inside the lead time.
        assert!(forecast.feed_types[0].reorder_date.is_none());
    }

    #[tokio::test]
    async fn reorder_quantity_sizes_a_month_plus_safety() {
        let dataset = flat_dataset(47.0);
        let config = quiet_config();
        let forecast = forecast_consumption(&dataset, &dataset, &dataset, &config, start())
            .await
            .unwrap();
        // 5 kg/day x (30 + 5) days = 175 kg.
        assert_eq!(forecast.feed_types[0].reorder_quantity_kg, 175.0);
    }

    struct FailingAssignments;

    #[async_trait]
    impl BatchAssignmentRepository for FailingAssignments {
        async fn active_assignments(&self, _batch_id: &str) -> Result<Vec<FeedAssignmentEntry>> {
            Err(anyhow!("assignment backend down"))
        }
    }

    struct EmptyCatalog;

    #[async_trait]
    impl FeedCatalogRepository for EmptyCatalog {
        async fn get_feed_by_id(&self, _feed_id: &str) -> Result<Option<FeedDefinition>> {
            Ok(None)
        }

        async fn inventory_by_feed_code(&self) -> Result<HashMap<String, f64>> {
            Ok(HashMap::new())
        }
    }

    struct TwoTanks;

    #[async_trait]
    impl TankStateRepository for TwoTanks {
        async fn live_tanks(&self) -> Result<Vec<TankSnapshot>> {
            Ok(vec![
                TankSnapshot {
                    tank_id: "T1".to_string(),
                    batch_id: "B1".to_string(),
                    current_weight_g: 100.0,
                    current_count: 1000,
                    sgr_percent: None,
                },
                TankSnapshot {
                    tank_id: "T2".to_string(),
                    batch_id: "B1".to_string(),
                    current_weight_g: 0.0,
                    current_count: 1000,
                    sgr_percent: None,
                },
            ])
        }

        async fn sgr_by_batch(&self, _batch_ids: &[String]) -> Result<HashMap<String, f64>> {
            Err(anyhow!("sgr backend down"))
        }
    }

    #[tokio::test]
    async fn upstream_failures_degrade_instead_of_aborting() {
        let config = quiet_config();
        let inputs = load_inputs(&EmptyCatalog, &FailingAssignments, &TwoTanks)
            .await
            .expect("load still succeeds");
        // Every tank rode on batch B1, whose assignments failed.
        assert!(inputs.tanks.is_empty());
        assert_eq!(inputs.tanks_skipped, 2);

        let forecast = run_forecast(inputs, &config, start()).await;
        assert_eq!(forecast.tanks_simulated, 0);
        assert_eq!(forecast.tanks_skipped, 2);
        assert!(forecast.feed_types.is_empty());
        assert!(forecast.alerts.is_empty());
    }

    #[tokio::test]
    async fn unusable_seeds_are_counted_as_skipped() {
        let dataset = flat_dataset(47.0);
        let config = quiet_config();
        let mut inputs = load_inputs(&dataset, &dataset, &dataset).await.unwrap();
        inputs.tanks.push(TankSnapshot {
            tank_id: "T-empty".to_string(),
            batch_id: "B1".to_string(),
            current_weight_g: 0.0,
            current_count: 5,
            sgr_percent: None,
        });
        let forecast = run_forecast(inputs, &config, start()).await;
        assert_eq!(forecast.tanks_simulated, 2);
        assert_eq!(forecast.tanks_skipped, 1);
        assert!(!forecast.partial);
    }
}
