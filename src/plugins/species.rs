use crate::core::auth::{User, View};
use crate::core::error;
use crate::core::output::{self, OutputFormat};
use crate::core::repository::{NewObservation, ObservationRepository, SpeciesCheck, SqliteRepository};
use crate::core::scoring::SpeciesPopulationObservation;
use crate::core::store::Store;
use crate::core::time;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[clap(name = "species", about = "Record and review species population checks")]
pub struct SpeciesCli {
    #[clap(subcommand)]
    pub command: SpeciesCommand,
}

#[derive(Subcommand, Debug)]
pub enum SpeciesCommand {
    /// Record a population check for the aquarium's species.
    Add {
        #[clap(long)]
        aquarium: i64,
        #[clap(long)]
        total: u32,
        #[clap(long, default_value = "0")]
        damaged: u32,
        #[clap(long, default_value = "0")]
        abnormal: u32,
        #[clap(long, default_value = "0")]
        dead: u32,
        /// Average current size.
        #[clap(long, default_value = "0")]
        avg_size: f64,
        /// Average current weight.
        #[clap(long, default_value = "0")]
        avg_weight: f64,
    },
    /// Show the latest checks, newest first.
    List {
        #[clap(long)]
        aquarium: i64,
        /// Overrides `history.species_limit`.
        #[clap(long)]
        limit: Option<usize>,
    },
}

pub fn run_species_cli(
    store: &Store,
    user: &User,
    format: OutputFormat,
    cli: SpeciesCli,
) -> Result<(), error::AquaError> {
    user.require(View::Operational)?;
    let repo = SqliteRepository::new(store, &user.login);
    match cli.command {
        SpeciesCommand::Add {
            aquarium,
            total,
            damaged,
            abnormal,
            dead,
            avg_size,
            avg_weight,
        } => {
            let population = SpeciesPopulationObservation {
                total,
                damaged,
                abnormal,
                dead,
            };
            let id = repo.record(&NewObservation::Species {
                aquarium_id: aquarium,
                check: SpeciesCheck {
                    population,
                    avg_size,
                    avg_weight,
                },
            })?;
            let health = population.health();
            if !health.is_determined() {
                log::warn!("species check {} has an empty population", id);
            }
            match format {
                OutputFormat::Json => {
                    let env = time::command_envelope(
                        "ops.species.add",
                        "ok",
                        serde_json::json!({ "id": id, "health": health }),
                    );
                    println!("{}", serde_json::to_string_pretty(&env)?);
                }
                OutputFormat::Text => {
                    println!("Species state recorded: {}", id);
                    println!("Health: {}", output::species_label(health));
                }
            }
        }
        SpeciesCommand::List { aquarium, limit } => {
            let species = repo.aquarium_species(aquarium)?.ok_or_else(|| {
                error::AquaError::NotFound(format!("seafood in aquarium {}", aquarium))
            })?;
            let limit = limit.unwrap_or(store.config.history.species_limit);
            let history = repo.species_history(aquarium, species.seafood_id, limit)?;
            match format {
                OutputFormat::Json => {
                    let rows: Vec<serde_json::Value> = history
                        .iter()
                        .map(|r| {
                            serde_json::json!({
                                "id": r.health_id,
                                "measured_at": r.measured_at,
                                "population": r.population,
                                "avg_size": r.avg_size,
                                "avg_weight": r.avg_weight,
                                "health": r.health(),
                            })
                        })
                        .collect();
                    let env = time::command_envelope(
                        "ops.species.list",
                        "ok",
                        serde_json::json!({ "seafood_id": species.seafood_id, "history": rows }),
                    );
                    println!("{}", serde_json::to_string_pretty(&env)?);
                }
                OutputFormat::Text => {
                    let table: Vec<Vec<String>> = history
                        .iter()
                        .map(|r| {
                            vec![
                                r.health_id.to_string(),
                                r.measured_at.clone(),
                                r.population.total.to_string(),
                                r.population.damaged.to_string(),
                                r.population.abnormal.to_string(),
                                r.population.dead.to_string(),
                                output::fixed2(r.avg_size),
                                output::fixed2(r.avg_weight),
                                output::species_label(r.health()).to_string(),
                            ]
                        })
                        .collect();
                    println!(
                        "{}",
                        output::render_table(
                            &["ID", "Date", "Total", "Damaged", "Abnormal", "Dead", "Avg size", "Avg weight", "Health"],
                            &table
                        )
                    );
                }
            }
        }
    }
    Ok(())
}
