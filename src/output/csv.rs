use anyhow::Result;

use crate::forecast::ConsumptionForecast;
use crate::growth::TankSimulation;

pub fn projection_to_csv(simulation: &TankSimulation) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "day",
        "date",
        "avg_weight_g",
        "fish_count",
        "biomass_kg",
        "feed_code",
        "feeding_rate_percent",
        "daily_feed_kg",
        "cumulative_feed_kg",
        "temperature",
        "mortality",
        "cumulative_mortality",
    ])?;
    for row in &simulation.projections {
        writer.write_record([
            row.day.to_string(),
            row.date.to_string(),
            format!("{:.2}", row.avg_weight_g),
            row.fish_count.to_string(),
            format!("{:.2}", row.biomass_kg),
            row.feed_code.clone().unwrap_or_default(),
            format!("{:.2}", row.feeding_rate_percent),
            format!("{:.2}", row.daily_feed_kg),
            format!("{:.2}", row.cumulative_feed_kg),
            format!("{:.1}", row.temperature),
            row.mortality.to_string(),
            row.cumulative_mortality.to_string(),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

pub fn consumption_to_csv(forecast: &ConsumptionForecast) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "feed_code",
        "total_consumption_kg",
        "avg_daily_kg",
        "current_stock_kg",
        "days_until_stockout",
        "stockout_date",
        "reorder_date",
        "reorder_quantity_kg",
        "contributing_tanks",
    ])?;
    for ft in &forecast.feed_types {
        writer.write_record([
            ft.feed_code.clone(),
            format!("{:.2}", ft.total_consumption_kg),
            format!("{:.2}", ft.avg_daily_kg),
            format!("{:.2}", ft.current_stock_kg),
            ft.days_until_stockout.to_string(),
            ft.stockout_date.map(|d| d.to_string()).unwrap_or_default(),
            ft.reorder_date.map(|d| d.to_string()).unwrap_or_default(),
            format!("{:.0}", ft.reorder_quantity_kg),
            ft.contributing_tanks.join(";"),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}
