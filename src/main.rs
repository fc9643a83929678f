use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use feedcast::config::{Config, ConfigOverrides};
use feedcast::forecast::aggregator::{forecast_consumption, load_inputs};
use feedcast::growth::simulator::{simulate_multi_tank, simulate_tank, SimulationParams};
use feedcast::growth::sgr::{calculate_sgr, estimate_sgr, project_harvest_date};
use feedcast::output::csv::{consumption_to_csv, projection_to_csv};
use feedcast::output::json::render_json;
use feedcast::output::table::{
    render_alerts_table, render_consumption_table, render_harvest, render_projection_table,
    render_summary_table,
};
use feedcast::rates::matrix::validate_matrix;
use feedcast::repository::dataset::JsonDataset;
use feedcast::repository::FeedCatalogRepository;
use feedcast::selector::{daily_feed_kg, select_feed_for_batch, BatchFeedPlan};
use serde_json::json;
use tracing::info;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Parser)]
#[command(name = "feedcast", about = "Fish growth and feed consumption forecasting")]
struct Cli {
    /// Path to the TOML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Path to the farm dataset (JSON).
    #[arg(short, long)]
    data: Option<PathBuf>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve the feeding rate for a feed at a given weight (and temperature).
    Rate {
        #[arg(long)]
        feed: String,
        #[arg(long)]
        weight: f64,
        #[arg(long)]
        temperature: Option<f64>,
        /// Biomass in kg; when set, the daily ration is reported too.
        #[arg(long)]
        biomass: Option<f64>,
    },
    /// Structural validation of a feed's 2-D rate matrix.
    Validate {
        #[arg(long)]
        feed: String,
    },
    /// Back-calculate SGR from two weighings.
    Sgr {
        #[arg(long = "start-weight")]
        start_weight: f64,
        #[arg(long = "end-weight")]
        end_weight: f64,
        #[arg(long)]
        days: f64,
    },
    /// Estimate SGR for a species at a water temperature.
    EstimateSgr {
        #[arg(long)]
        species: String,
        #[arg(long)]
        temperature: f64,
    },
    /// Project the harvest date for a target weight.
    Harvest {
        #[arg(long)]
        weight: f64,
        #[arg(long)]
        target: f64,
        #[arg(long)]
        sgr: f64,
    },
    /// Day-by-day projection for one tank, or a summary across all tanks.
    Simulate {
        #[arg(long)]
        tank: Option<String>,
        #[arg(long)]
        days: Option<u32>,
    },
    /// Farm-wide feed consumption forecast with stockout and reorder dates.
    Forecast {
        #[arg(long)]
        days: Option<u32>,
        #[arg(long)]
        mortality: Option<f64>,
    },
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(Some(&config_path))?;
    let (forecast_days, mortality) = match &cli.command {
        Commands::Forecast { days, mortality } => (*days, *mortality),
        Commands::Simulate { days, .. } => (*days, None),
        _ => (None, None),
    };
    config.apply_overrides(ConfigOverrides {
        dataset_path: cli
            .data
            .as_ref()
            .map(|p| p.to_string_lossy().to_string()),
        forecast_days,
        mortality_rate: mortality,
    });

    match cli.command {
        Commands::Rate {
            feed,
            weight,
            temperature,
            biomass,
        } => {
            let dataset = open_dataset(&config)?;
            let definition = dataset
                .get_feed_by_id(&feed)
                .await?
                .ok_or_else(|| anyhow!("feed {feed} not found in dataset"))?;
            let plan = BatchFeedPlan {
                assignments: vec![feedcast::selector::FeedAssignmentEntry {
                    feed_id: definition.feed_id.clone(),
                    min_weight_g: 0.0,
                    max_weight_g: f64::MAX,
                    priority: 0,
                }],
                feeds: [(definition.feed_id.clone(), definition)].into(),
            };
            let selection = select_feed_for_batch(
                &plan,
                &config.simulation,
                weight,
                biomass.unwrap_or(0.0),
                temperature,
            );
            let info = selection
                .feed()
                .ok_or_else(|| anyhow!("no feeding rate resolvable for feed {feed}"))?;
            let payload = json!({
                "feed_code": info.feed_code,
                "feeding_rate_percent": info.feeding_rate_percent,
                "fcr": info.fcr,
                "used_matrix_2d": info.used_matrix_2d,
                "daily_feed_kg": biomass.map(|b| daily_feed_kg(b, info.feeding_rate_percent)),
            });
            match cli.output {
                OutputFormat::Json => println!("{}", render_json(&payload)?),
                _ => {
                    println!(
                        "{}: {:.2} %BW/day ({})",
                        info.feed_code,
                        info.feeding_rate_percent,
                        if info.used_matrix_2d { "2-D matrix" } else { "1-D curve" }
                    );
                    if let Some(fcr) = info.fcr {
                        println!("FCR: {fcr:.2}");
                    }
                    if let Some(b) = biomass {
                        println!(
                            "Daily feed: {:.2} kg for {:.2} kg biomass",
                            daily_feed_kg(b, info.feeding_rate_percent),
                            b
                        );
                    }
                }
            }
        }
        Commands::Validate { feed } => {
            let dataset = open_dataset(&config)?;
            let definition = dataset
                .get_feed_by_id(&feed)
                .await?
                .ok_or_else(|| anyhow!("feed {feed} not found in dataset"))?;
            match definition.feeding_matrix {
                None => println!("{feed}: no 2-D matrix configured"),
                Some(matrix) => {
                    let violations = validate_matrix(&matrix);
                    if violations.is_empty() {
                        println!("{feed}: matrix is well formed");
                    } else {
                        for violation in &violations {
                            println!("{feed}: {violation}");
                        }
                        bail!("{} violation(s) found", violations.len());
                    }
                }
            }
        }
        Commands::Sgr {
            start_weight,
            end_weight,
            days,
        } => {
            let sgr = calculate_sgr(start_weight, end_weight, days);
            match cli.output {
                OutputFormat::Json => {
                    println!("{}", render_json(&json!({ "sgr_percent": sgr }))?)
                }
                _ => println!("SGR: {sgr:.3} %/day"),
            }
        }
        Commands::EstimateSgr {
            species,
            temperature,
        } => {
            let sgr = estimate_sgr(&species, temperature);
            match cli.output {
                OutputFormat::Json => {
                    println!("{}", render_json(&json!({ "sgr_percent": sgr }))?)
                }
                _ => println!("Estimated SGR for {species} at {temperature} C: {sgr:.3} %/day"),
            }
        }
        Commands::Harvest {
            weight,
            target,
            sgr,
        } => {
            let projection =
                project_harvest_date(weight, target, sgr, Utc::now().date_naive());
            match cli.output {
                OutputFormat::Json => println!("{}", render_json(&projection)?),
                _ => println!("{}", render_harvest(&projection)),
            }
        }
        Commands::Simulate { tank, .. } => {
            let dataset = open_dataset(&config)?;
            let inputs = load_inputs(&dataset, &dataset, &dataset).await?;
            let params = SimulationParams {
                defaults: config.simulation.clone(),
                mortality_rate: config.forecast.mortality_rate,
                temperature_forecast: config.forecast.temperature_forecast.clone(),
                start_date: Utc::now().date_naive(),
            };
            let days = config.forecast.forecast_days;
            match tank {
                Some(tank_id) => {
                    let tank = inputs
                        .tanks
                        .iter()
                        .find(|t| t.tank_id == tank_id)
                        .ok_or_else(|| anyhow!("tank {tank_id} not found or not live"))?;
                    let simulation =
                        simulate_tank(tank, inputs.plans.get(&tank.batch_id), days, &params);
                    match cli.output {
                        OutputFormat::Table => {
                            println!("{}", render_projection_table(&simulation))
                        }
                        OutputFormat::Json => println!("{}", render_json(&simulation)?),
                        OutputFormat::Csv => println!("{}", projection_to_csv(&simulation)?),
                    }
                }
                None => {
                    let simulations =
                        simulate_multi_tank(&inputs.tanks, &inputs.plans, days, &params);
                    info!(tanks = simulations.len(), "multi-tank simulation complete");
                    match cli.output {
                        OutputFormat::Json => println!("{}", render_json(&simulations)?),
                        _ => println!("{}", render_summary_table(&simulations)),
                    }
                }
            }
        }
        Commands::Forecast { .. } => {
            let dataset = open_dataset(&config)?;
            let forecast = forecast_consumption(
                &dataset,
                &dataset,
                &dataset,
                &config,
                Utc::now().date_naive(),
            )
            .await?;
            match cli.output {
                OutputFormat::Table => {
                    println!("{}", render_consumption_table(&forecast));
                    if !forecast.alerts.is_empty() {
                        println!("{}", render_alerts_table(&forecast.alerts));
                    }
                    println!(
                        "Simulated {} tank(s), skipped {}{}",
                        forecast.tanks_simulated,
                        forecast.tanks_skipped,
                        if forecast.partial { " (partial)" } else { "" }
                    );
                }
                OutputFormat::Json => println!("{}", render_json(&forecast)?),
                OutputFormat::Csv => println!("{}", consumption_to_csv(&forecast)?),
            }
        }
        Commands::Config { init, show } => {
            if init {
                Config::write_template(&config_path)?;
                println!("Wrote config template to {}", config_path.display());
            }
            if show || !init {
                println!("{}", toml::to_string_pretty(&config)?);
            }
        }
    }

    Ok(())
}

fn open_dataset(config: &Config) -> Result<JsonDataset> {
    let path = config.resolved_dataset_path();
    Ok(JsonDataset::open(&path)?)
}
