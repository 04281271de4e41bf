use crate::core::auth::{User, View};
use crate::core::error;
use crate::core::output::{self, OutputFormat};
use crate::core::repository::{NewObservation, ObservationRepository, SqliteRepository};
use crate::core::scoring::{FilterState, GlassState, TankObservation};
use crate::core::store::Store;
use crate::core::time;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[clap(name = "tank", about = "Record and review tank condition checks")]
pub struct TankCli {
    #[clap(subcommand)]
    pub command: TankCommand,
}

#[derive(Subcommand, Debug)]
pub enum TankCommand {
    /// Record a tank check and print its overall condition.
    Add {
        #[clap(long)]
        aquarium: i64,
        /// 0 = non-functional, 1 = needs cleaning, 2 = working normally.
        #[clap(long, default_value = "2")]
        filter: i64,
        /// 0 = heavily soiled, 1 = lightly soiled, 2 = clean.
        #[clap(long, default_value = "2")]
        glass: i64,
        /// Algae coverage, percent.
        #[clap(long, default_value = "0")]
        algae: f64,
        /// Water clarity, percent.
        #[clap(long, default_value = "80")]
        clarity: f64,
    },
    /// Show the check history of an aquarium, newest first.
    List {
        #[clap(long)]
        aquarium: i64,
    },
}

pub fn run_tank_cli(
    store: &Store,
    user: &User,
    format: OutputFormat,
    cli: TankCli,
) -> Result<(), error::AquaError> {
    user.require(View::Operational)?;
    let repo = SqliteRepository::new(store, &user.login);
    match cli.command {
        TankCommand::Add {
            aquarium,
            filter,
            glass,
            algae,
            clarity,
        } => {
            let observation = TankObservation {
                filter_state: filter,
                glass_state: glass,
                algae_level: algae,
                water_clarity: clarity,
            };
            let id = repo.record(&NewObservation::Tank {
                aquarium_id: aquarium,
                observation,
            })?;
            let condition = observation.condition();
            if !condition.is_determined() {
                log::warn!("tank check {} could not be scored", id);
            }
            match format {
                OutputFormat::Json => {
                    let env = time::command_envelope(
                        "ops.tank.add",
                        "ok",
                        serde_json::json!({ "id": id, "condition": condition }),
                    );
                    println!("{}", serde_json::to_string_pretty(&env)?);
                }
                OutputFormat::Text => {
                    println!("Tank state recorded: {}", id);
                    println!("Overall condition: {}", output::tank_label(condition));
                }
            }
        }
        TankCommand::List { aquarium } => {
            let history = repo.tank_history(aquarium)?;
            match format {
                OutputFormat::Json => {
                    let rows: Vec<serde_json::Value> = history
                        .iter()
                        .map(|r| {
                            serde_json::json!({
                                "id": r.tank_state_id,
                                "checked_at": r.checked_at,
                                "filter_state": r.observation.filter_state,
                                "glass_state": r.observation.glass_state,
                                "algae_level": r.observation.algae_level,
                                "water_clarity": r.observation.water_clarity,
                                "condition": r.condition(),
                            })
                        })
                        .collect();
                    let env = time::command_envelope("ops.tank.list", "ok", serde_json::json!({ "history": rows }));
                    println!("{}", serde_json::to_string_pretty(&env)?);
                }
                OutputFormat::Text => {
                    let table: Vec<Vec<String>> = history
                        .iter()
                        .map(|r| {
                            vec![
                                r.tank_state_id.to_string(),
                                r.checked_at.clone(),
                                FilterState::describe(r.observation.filter_state).to_string(),
                                GlassState::describe(r.observation.glass_state).to_string(),
                                format!("{:.1}%", r.observation.algae_level),
                                format!("{:.1}%", r.observation.water_clarity),
                                output::tank_label(r.condition()).to_string(),
                            ]
                        })
                        .collect();
                    println!(
                        "{}",
                        output::render_table(
                            &["ID", "Date", "Filter", "Glass", "Algae", "Clarity", "Overall"],
                            &table
                        )
                    );
                }
            }
        }
    }
    Ok(())
}
