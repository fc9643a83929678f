use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};

use crate::forecast::{AlertKind, ConsumptionForecast, ForecastAlert};
use crate::growth::sgr::HarvestProjection;
use crate::growth::TankSimulation;

pub fn render_projection_table(simulation: &TankSimulation) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "Day",
        "Date",
        "Avg Weight (g)",
        "Count",
        "Biomass (kg)",
        "Feed",
        "Rate (%BW)",
        "Feed (kg)",
        "Cum. Feed (kg)",
        "Temp (C)",
        "Mortality",
    ]);

    for row in &simulation.projections {
        table.add_row(Row::from(vec![
            Cell::new(row.day),
            Cell::new(row.date),
            Cell::new(format!("{:.2}", row.avg_weight_g)),
            Cell::new(row.fish_count),
            Cell::new(format!("{:.2}", row.biomass_kg)),
            Cell::new(row.feed_code.as_deref().unwrap_or("-")),
            Cell::new(format!("{:.2}", row.feeding_rate_percent)),
            Cell::new(format!("{:.2}", row.daily_feed_kg)),
            Cell::new(format!("{:.2}", row.cumulative_feed_kg)),
            Cell::new(format!("{:.1}", row.temperature)),
            Cell::new(row.mortality),
        ]));
    }
    table.to_string()
}

pub fn render_summary_table(simulations: &[TankSimulation]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "Tank",
        "Batch",
        "SGR (%/d)",
        "Start (g)",
        "End (g)",
        "End Biomass (kg)",
        "Feed (kg)",
        "Avg FCR",
        "Mortality",
    ]);

    for s in simulations {
        table.add_row(Row::from(vec![
            Cell::new(&s.tank_id),
            Cell::new(&s.batch_id),
            Cell::new(format!("{:.2}", s.sgr_percent)),
            Cell::new(format!("{:.2}", s.summary.start_weight_g)),
            Cell::new(format!("{:.2}", s.summary.end_weight_g)),
            Cell::new(format!("{:.2}", s.summary.end_biomass_kg)),
            Cell::new(format!("{:.2}", s.summary.total_feed_kg)),
            Cell::new(format!("{:.2}", s.summary.avg_fcr)),
            Cell::new(s.summary.total_mortality),
        ]));
    }
    table.to_string()
}

pub fn render_consumption_table(forecast: &ConsumptionForecast) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "Feed",
        "Total (kg)",
        "Avg/Day (kg)",
        "Stock (kg)",
        "Days to Stockout",
        "Stockout",
        "Reorder By",
        "Reorder Qty (kg)",
        "Tanks",
    ]);

    for ft in &forecast.feed_types {
        let stockout = if ft.stockout_within(forecast.horizon_days) {
            Cell::new(ft.days_until_stockout).fg(Color::Red)
        } else {
            Cell::new("none in horizon").fg(Color::Green)
        };
        table.add_row(Row::from(vec![
            Cell::new(&ft.feed_code),
            Cell::new(format!("{:.2}", ft.total_consumption_kg)),
            Cell::new(format!("{:.2}", ft.avg_daily_kg)),
            Cell::new(format!("{:.2}", ft.current_stock_kg)),
            stockout,
            Cell::new(
                ft.stockout_date
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(
                ft.reorder_date
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(format!("{:.0}", ft.reorder_quantity_kg)),
            Cell::new(ft.contributing_tanks.len()),
        ]));
    }
    table.to_string()
}

pub fn render_alerts_table(alerts: &[ForecastAlert]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Severity", "Feed", "Days Left", "Message"]);

    for alert in alerts {
        let (label, color) = match alert.kind {
            AlertKind::StockoutImminent => ("STOCKOUT_IMMINENT", Color::Red),
            AlertKind::ReorderNow => ("REORDER_NOW", Color::Yellow),
            AlertKind::LowStock => ("LOW_STOCK", Color::Blue),
        };
        table.add_row(Row::from(vec![
            Cell::new(label).fg(color),
            Cell::new(&alert.feed_code),
            Cell::new(alert.days_until_stockout),
            Cell::new(&alert.message),
        ]));
    }
    table.to_string()
}

pub fn render_harvest(projection: &HarvestProjection) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Days to Harvest", "Harvest Date", "Projected Weight (g)"]);
    table.add_row(Row::from(vec![
        Cell::new(projection.days_to_harvest),
        Cell::new(projection.harvest_date),
        Cell::new(format!("{:.1}", projection.projected_weight_g)),
    ]));
    table.to_string()
}
