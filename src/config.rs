use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub simulation: SimulationDefaults,
    #[serde(default)]
    pub forecast: ForecastConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_dataset_path")]
    pub dataset_path: String,
}

/// The named defaults the simulation falls back to when operational data is
/// missing: feeding rate, FCR, water temperature and growth rate. Injected
/// everywhere instead of per-call-site magic numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationDefaults {
    #[serde(default = "default_feeding_rate")]
    pub feeding_rate_percent: f64,
    #[serde(default = "default_fcr")]
    pub fcr: f64,
    #[serde(default = "default_water_temp")]
    pub water_temp_c: f64,
    #[serde(default = "default_sgr")]
    pub sgr_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    #[serde(default = "default_forecast_days")]
    pub forecast_days: u32,
    #[serde(default = "default_lead_time_days")]
    pub lead_time_days: u32,
    #[serde(default = "default_safety_stock_days")]
    pub safety_stock_days: u32,
    #[serde(default = "default_mortality_rate")]
    pub mortality_rate: f64,
    #[serde(default)]
    pub temperature_forecast: Vec<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub dataset_path: Option<String>,
    pub forecast_days: Option<u32>,
    pub mortality_rate: Option<f64>,
}

impl Config {
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config/feedcast/config.toml")
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed reading config: {}", path.display()))?;
        let parsed: Self = toml::from_str(&data)
            .with_context(|| format!("failed parsing TOML config: {}", path.display()))?;
        Ok(parsed)
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(dataset_path) = overrides.dataset_path {
            self.data.dataset_path = dataset_path;
        }
        if let Some(forecast_days) = overrides.forecast_days {
            self.forecast.forecast_days = forecast_days;
        }
        if let Some(mortality_rate) = overrides.mortality_rate {
            self.forecast.mortality_rate = mortality_rate;
        }
    }

    pub fn write_template(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating config directory: {}", parent.display())
            })?;
        }
        fs::write(path, Self::default_template())
            .with_context(|| format!("failed writing config template: {}", path.display()))
    }

    pub fn resolved_dataset_path(&self) -> PathBuf {
        expand_tilde(&self.data.dataset_path)
    }

    pub fn default_template() -> String {
        let template = r#"[data]
dataset_path = "~/.local/share/feedcast/farm.json"

[simulation]
feeding_rate_percent = 3.0
fcr = 1.0
water_temp_c = 15.0
sgr_percent = 1.5

[forecast]
forecast_days = 30
lead_time_days = 7
safety_stock_days = 5
mortality_rate = 0.0001
temperature_forecast = []
"#;
        template.to_string()
    }

    /// Water temperature on forecast day `day`: the supplied forecast value
    /// when present, the configured constant otherwise.
    pub fn temperature_for_day(&self, day: usize) -> f64 {
        self.forecast
            .temperature_forecast
            .get(day)
            .copied()
            .unwrap_or(self.simulation.water_temp_c)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dataset_path: default_dataset_path(),
        }
    }
}

impl Default for SimulationDefaults {
    fn default() -> Self {
        Self {
            feeding_rate_percent: default_feeding_rate(),
            fcr: default_fcr(),
            water_temp_c: default_water_temp(),
            sgr_percent: default_sgr(),
        }
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            forecast_days: default_forecast_days(),
            lead_time_days: default_lead_time_days(),
            safety_stock_days: default_safety_stock_days(),
            mortality_rate: default_mortality_rate(),
            temperature_forecast: Vec::new(),
        }
    }
}

fn default_dataset_path() -> String {
    "~/.local/share/feedcast/farm.json".to_string()
}

fn default_feeding_rate() -> f64 {
    3.0
}

fn default_fcr() -> f64 {
    1.0
}

fn default_water_temp() -> f64 {
    15.0
}

fn default_sgr() -> f64 {
    1.5
}

fn default_forecast_days() -> u32 {
    30
}

fn default_lead_time_days() -> u32 {
    7
}

fn default_safety_stock_days() -> u32 {
    5
}

fn default_mortality_rate() -> f64 {
    0.0001
}
