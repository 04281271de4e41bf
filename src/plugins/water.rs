use crate::core::auth::{User, View};
use crate::core::error;
use crate::core::output::{self, OutputFormat};
use crate::core::repository::{
    NewObservation, ObservationRepository, SortOrder, SqliteRepository, WaterParameterRecord, WaterReading,
};
use crate::core::store::Store;
use crate::core::time;
use clap::{Parser, Subcommand};
use serde::Serialize;

#[derive(Parser, Debug)]
#[clap(name = "water", about = "Record and review water parameters")]
pub struct WaterCli {
    #[clap(subcommand)]
    pub command: WaterCommand,
}

#[derive(Subcommand, Debug)]
pub enum WaterCommand {
    /// Record a water reading.
    Add {
        #[clap(long)]
        aquarium: i64,
        /// Degrees Celsius (0..=40).
        #[clap(long, default_value = "25")]
        temperature: f64,
        /// 0..=14.
        #[clap(long, default_value = "7")]
        ph: f64,
        /// mg/L (0..=20).
        #[clap(long, default_value = "10")]
        oxygen: f64,
    },
    /// Show readings, newest first.
    List {
        #[clap(long)]
        aquarium: i64,
    },
    /// Export readings oldest first as chart-ready JSON series.
    Series {
        #[clap(long)]
        aquarium: i64,
    },
}

/// Column-oriented readings, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WaterSeries {
    pub aquarium_id: i64,
    pub dates: Vec<String>,
    pub temperature: Vec<f64>,
    pub ph: Vec<f64>,
    pub oxygen: Vec<f64>,
}

impl WaterSeries {
    pub fn from_records(aquarium_id: i64, records: &[WaterParameterRecord]) -> Self {
        let mut series = Self {
            aquarium_id,
            ..Self::default()
        };
        for r in records {
            series.dates.push(r.measured_at.clone());
            series.temperature.push(r.temperature);
            series.ph.push(r.ph);
            series.oxygen.push(r.oxygen_level);
        }
        series
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

pub fn water_series(store: &Store, actor: &str, aquarium_id: i64) -> Result<WaterSeries, error::AquaError> {
    let repo = SqliteRepository::new(store, actor);
    let records = repo.water_history(aquarium_id, SortOrder::Ascending)?;
    Ok(WaterSeries::from_records(aquarium_id, &records))
}

pub fn run_water_cli(
    store: &Store,
    user: &User,
    format: OutputFormat,
    cli: WaterCli,
) -> Result<(), error::AquaError> {
    user.require(View::Operational)?;
    let repo = SqliteRepository::new(store, &user.login);
    match cli.command {
        WaterCommand::Add {
            aquarium,
            temperature,
            ph,
            oxygen,
        } => {
            let id = repo.record(&NewObservation::Water {
                aquarium_id: aquarium,
                reading: WaterReading {
                    temperature,
                    ph,
                    oxygen_level: oxygen,
                },
            })?;
            match format {
                OutputFormat::Json => {
                    let env = time::command_envelope("ops.water.add", "ok", serde_json::json!({ "id": id }));
                    println!("{}", serde_json::to_string_pretty(&env)?);
                }
                OutputFormat::Text => println!("Water parameters recorded: {}", id),
            }
        }
        WaterCommand::List { aquarium } => {
            let history = repo.water_history(aquarium, SortOrder::NewestFirst)?;
            match format {
                OutputFormat::Json => {
                    let env = time::command_envelope("ops.water.list", "ok", serde_json::json!({ "history": history }));
                    println!("{}", serde_json::to_string_pretty(&env)?);
                }
                OutputFormat::Text => {
                    let table: Vec<Vec<String>> = history
                        .iter()
                        .map(|r| {
                            vec![
                                r.parameter_id.to_string(),
                                r.measured_at.clone(),
                                format!("{:.1}", r.temperature),
                                format!("{:.1}", r.ph),
                                format!("{:.1}", r.oxygen_level),
                            ]
                        })
                        .collect();
                    println!(
                        "{}",
                        output::render_table(&["ID", "Measured", "Temperature", "pH", "Oxygen"], &table)
                    );
                }
            }
        }
        WaterCommand::Series { aquarium } => {
            let series = water_series(store, &user.login, aquarium)?;
            if series.is_empty() {
                match format {
                    OutputFormat::Json => {
                        let env = time::command_envelope(
                            "ops.water.series",
                            "ok",
                            serde_json::json!({ "series": null, "message": "No data" }),
                        );
                        println!("{}", serde_json::to_string_pretty(&env)?);
                    }
                    OutputFormat::Text => println!("No data for aquarium {}", aquarium),
                }
                return Ok(());
            }
            // Series are always JSON; the chart renderer is an external consumer.
            let env = time::command_envelope("ops.water.series", "ok", serde_json::json!({ "series": series }));
            println!("{}", serde_json::to_string_pretty(&env)?);
        }
    }
    Ok(())
}
