use crate::core::auth::{User, View};
use crate::core::error;
use crate::core::output::{self, OutputFormat};
use crate::core::repository::{Feeding, FoodType, NewObservation, ObservationRepository, SqliteRepository};
use crate::core::store::Store;
use crate::core::time;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[clap(name = "feeding", about = "Record and review feedings")]
pub struct FeedingCli {
    #[clap(subcommand)]
    pub command: FeedingCommand,
}

#[derive(Subcommand, Debug)]
pub enum FeedingCommand {
    /// Record a feeding of the aquarium's species.
    Add {
        #[clap(long)]
        aquarium: i64,
        /// YYYY-MM-DD.
        #[clap(long)]
        date: String,
        /// Dry, Live, Frozen or Plant.
        #[clap(long, default_value = "Dry")]
        food_type: String,
        /// Grams.
        #[clap(long)]
        total: f64,
    },
    /// Show feedings, newest first.
    List {
        #[clap(long)]
        aquarium: i64,
    },
}

pub fn run_feeding_cli(
    store: &Store,
    user: &User,
    format: OutputFormat,
    cli: FeedingCli,
) -> Result<(), error::AquaError> {
    user.require(View::Operational)?;
    let repo = SqliteRepository::new(store, &user.login);
    match cli.command {
        FeedingCommand::Add {
            aquarium,
            date,
            food_type,
            total,
        } => {
            let food_type: FoodType = food_type.parse()?;
            let id = repo.record(&NewObservation::Feeding {
                aquarium_id: aquarium,
                feeding: Feeding {
                    date,
                    food_type,
                    total_feed: total,
                },
            })?;
            match format {
                OutputFormat::Json => {
                    let env = time::command_envelope("ops.feeding.add", "ok", serde_json::json!({ "id": id }));
                    println!("{}", serde_json::to_string_pretty(&env)?);
                }
                OutputFormat::Text => println!("Feeding recorded: {}", id),
            }
        }
        FeedingCommand::List { aquarium } => {
            let history = repo.feeding_history(aquarium)?;
            match format {
                OutputFormat::Json => {
                    let env = time::command_envelope("ops.feeding.list", "ok", serde_json::json!({ "history": history }));
                    println!("{}", serde_json::to_string_pretty(&env)?);
                }
                OutputFormat::Text => {
                    let table: Vec<Vec<String>> = history
                        .iter()
                        .map(|r| {
                            vec![
                                r.feeding_id.to_string(),
                                r.fed_at.clone(),
                                r.food_type.clone(),
                                format!("{:.2} g", r.total_feed),
                                r.species_name.clone().unwrap_or_default(),
                            ]
                        })
                        .collect();
                    println!(
                        "{}",
                        output::render_table(&["ID", "Date", "Food type", "Total", "Species"], &table)
                    );
                }
            }
        }
    }
    Ok(())
}
