//! Stock alert ladder, most urgent first: imminent stockout, reorder window
//! already open, then low stock.

use crate::config::ForecastConfig;
use crate::forecast::{AlertKind, FeedConsumptionByType, ForecastAlert};

const IMMINENT_DAYS: u32 = 3;

/// One alert per feed code at most; feeds whose stock outlasts the horizon
/// raise nothing.
pub fn evaluate_alerts(
    feed_types: &[FeedConsumptionByType],
    config: &ForecastConfig,
    horizon_days: u32,
) -> Vec<ForecastAlert> {
    let lead = config.lead_time_days;
    let safety = config.safety_stock_days;

    let mut alerts: Vec<ForecastAlert> = feed_types
        .iter()
        .filter(|ft| ft.stockout_within(horizon_days))
        .filter_map(|ft| {
            let days = ft.days_until_stockout;
            let (kind, message) = if days <= IMMINENT_DAYS {
                (
                    AlertKind::StockoutImminent,
                    format!(
                        "{} stock covers only {} more day(s) of feeding",
                        ft.feed_code, days
                    ),
                )
            } else if days <= lead {
                (
                    AlertKind::ReorderNow,
                    format!(
                        "{} runs out in {} days, inside the {}-day lead time",
                        ft.feed_code, days, lead
                    ),
                )
            } else if days <= lead + safety {
                (
                    AlertKind::LowStock,
                    format!(
                        "{} runs out in {} days, within lead time plus safety stock",
                        ft.feed_code, days
                    ),
                )
            } else {
                return None;
            };
            Some(ForecastAlert {
                feed_code: ft.feed_code.clone(),
                kind,
                message,
                days_until_stockout: days,
            })
        })
        .collect();

    alerts.sort_by(|a, b| {
        a.kind
            .cmp(&b.kind)
            .then(a.days_until_stockout.cmp(&b.days_until_stockout))
    });
    alerts
}
