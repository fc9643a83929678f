pub mod aggregator;
pub mod alerts;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Forecast horizon folded to one feed type across all contributing tanks.
///
/// `daily_consumption[d]` is the combined ration on the d-th forecast day
/// (0-based). `days_until_stockout` is the index of the first day whose
/// running total reaches current stock, i.e. the count of fully covered
/// feeding days; `horizon + 1` is the "no stockout in horizon" sentinel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConsumptionByType {
    pub feed_code: String,
    pub daily_consumption: Vec<f64>,
    pub total_consumption_kg: f64,
    pub avg_daily_kg: f64,
    pub current_stock_kg: f64,
    pub days_until_stockout: u32,
    pub stockout_date: Option<NaiveDate>,
    pub reorder_date: Option<NaiveDate>,
    pub reorder_quantity_kg: f64,
    pub contributing_tanks: Vec<String>,
}

impl FeedConsumptionByType {
    pub fn stockout_within(&self, horizon_days: u32) -> bool {
        self.days_until_stockout <= horizon_days
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    StockoutImminent,
    ReorderNow,
    LowStock,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastAlert {
    pub feed_code: String,
    pub kind: AlertKind,
    pub message: String,
    pub days_until_stockout: u32,
}

/// The complete forecast handed to the presentation layer. Always
/// structurally complete: excluded entities shrink the lists, they never
/// turn the whole run into an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumptionForecast {
    pub generated_at: DateTime<Utc>,
    pub start_date: NaiveDate,
    pub horizon_days: u32,
    pub feed_types: Vec<FeedConsumptionByType>,
    pub alerts: Vec<ForecastAlert>,
    pub tanks_simulated: usize,
    pub tanks_skipped: usize,
    /// True when some per-tank simulations were lost (e.g. an aborted
    /// scatter-gather); the forecast still stands for what completed.
    pub partial: bool,
}
