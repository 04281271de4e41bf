use crate::core::auth::{User, View};
use crate::core::broker::DbBroker;
use crate::core::error;
use crate::core::output::{self, OutputFormat};
use crate::core::store::Store;
use crate::core::time;
use rusqlite::{OptionalExtension, params};
use serde::Serialize;

const NO_DATA: &str = "No data";

/// One line of the operational aquarium overview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AquariumSummary {
    pub aquarium_id: i64,
    pub aquarium_type: Option<String>,
    pub responsible: Option<String>,
    pub volume: Option<f64>,
    pub status: Option<String>,
    pub species_name: String,
    pub last_check: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeciesParameters {
    pub species_name: Option<String>,
    pub normal_weight: Option<f64>,
    pub normal_size: Option<f64>,
    pub food_type: Option<String>,
    pub feed_per_individual: Option<f64>,
    pub group_mortality: Option<f64>,
    pub optimal_temperature: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AquariumInfo {
    pub summary: AquariumSummary,
    pub species: Option<SpeciesParameters>,
}

const SUMMARY_SQL: &str = "
    SELECT a.aquarium_id,
           a.aquarium_type,
           u.name,
           a.volume,
           a.status,
           COALESCE((SELECT s.species_name FROM seafood s WHERE s.aquarium_id = a.aquarium_id
                     ORDER BY s.seafood_id LIMIT 1), 'No data'),
           COALESCE((SELECT MAX(t.checked_at) FROM tank_states t WHERE t.aquarium_id = a.aquarium_id), 'No data')
    FROM aquariums a
    LEFT JOIN users u ON a.responsible_user = u.user_id
";

fn map_summary(row: &rusqlite::Row<'_>) -> rusqlite::Result<AquariumSummary> {
    Ok(AquariumSummary {
        aquarium_id: row.get(0)?,
        aquarium_type: row.get(1)?,
        responsible: row.get(2)?,
        volume: row.get(3)?,
        status: row.get(4)?,
        species_name: row.get(5)?,
        last_check: row.get(6)?,
    })
}

pub fn overview(store: &Store, actor: &str) -> Result<Vec<AquariumSummary>, error::AquaError> {
    let broker = DbBroker::new(store);
    broker.with_conn(actor, "aquarium.overview", |conn| {
        let mut stmt = conn.prepare(&format!("{} ORDER BY a.aquarium_id", SUMMARY_SQL))?;
        let rows = stmt
            .query_map([], map_summary)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(error::AquaError::RusqliteError)?;
        Ok(rows)
    })
}

pub fn info(store: &Store, actor: &str, aquarium_id: i64) -> Result<AquariumInfo, error::AquaError> {
    let broker = DbBroker::new(store);
    broker.with_conn(actor, "aquarium.info", |conn| {
        let summary = conn
            .query_row(
                &format!("{} WHERE a.aquarium_id = ?1", SUMMARY_SQL),
                params![aquarium_id],
                map_summary,
            )
            .optional()?
            .ok_or_else(|| error::AquaError::NotFound(format!("aquarium {}", aquarium_id)))?;

        let species = conn
            .query_row(
                "SELECT s.species_name, s.normal_weight, s.normal_size, s.food_type,
                        s.feed_per_individual, s.group_mortality, o.optimal_temperature
                 FROM seafood s
                 LEFT JOIN optimal_parameters o ON s.seafood_id = o.seafood_id
                 WHERE s.aquarium_id = ?1
                 ORDER BY s.seafood_id, o.optimal_params_id
                 LIMIT 1",
                params![aquarium_id],
                |row| {
                    Ok(SpeciesParameters {
                        species_name: row.get(0)?,
                        normal_weight: row.get(1)?,
                        normal_size: row.get(2)?,
                        food_type: row.get(3)?,
                        feed_per_individual: row.get(4)?,
                        group_mortality: row.get(5)?,
                        optimal_temperature: row.get(6)?,
                    })
                },
            )
            .optional()?;

        Ok(AquariumInfo { summary, species })
    })
}

fn or_no_data(value: Option<String>) -> String {
    value.unwrap_or_else(|| NO_DATA.to_string())
}

fn num_or_no_data(value: Option<f64>) -> String {
    value.map_or_else(|| NO_DATA.to_string(), |v| v.to_string())
}

pub fn print_overview(store: &Store, user: &User, format: OutputFormat) -> Result<(), error::AquaError> {
    user.require(View::Operational)?;
    let rows = overview(store, &user.login)?;
    match format {
        OutputFormat::Json => {
            let env = time::command_envelope("ops.aquariums", "ok", serde_json::json!({ "aquariums": rows }));
            println!("{}", serde_json::to_string_pretty(&env)?);
        }
        OutputFormat::Text => {
            let table: Vec<Vec<String>> = rows
                .into_iter()
                .map(|r| {
                    vec![
                        r.aquarium_id.to_string(),
                        r.aquarium_type.unwrap_or_default(),
                        r.responsible.unwrap_or_default(),
                        output::fixed2(r.volume),
                        r.status.unwrap_or_default(),
                        r.species_name,
                        r.last_check,
                    ]
                })
                .collect();
            println!(
                "{}",
                output::render_table(
                    &["ID", "Type", "Responsible", "Volume (l)", "Status", "Species", "Last check"],
                    &table
                )
            );
        }
    }
    Ok(())
}

pub fn print_info(store: &Store, user: &User, aquarium_id: i64, format: OutputFormat) -> Result<(), error::AquaError> {
    user.require(View::Operational)?;
    let info = info(store, &user.login, aquarium_id)?;
    match format {
        OutputFormat::Json => {
            let env = time::command_envelope("ops.info", "ok", serde_json::json!({ "aquarium": info }));
            println!("{}", serde_json::to_string_pretty(&env)?);
        }
        OutputFormat::Text => {
            let s = &info.summary;
            println!("Aquarium:     {}", s.aquarium_id);
            println!("Type:         {}", or_no_data(s.aquarium_type.clone()));
            println!("Responsible:  {}", or_no_data(s.responsible.clone()));
            println!("Volume (l):   {}", num_or_no_data(s.volume));
            println!("Status:       {}", or_no_data(s.status.clone()));
            println!("Last check:   {}", s.last_check);
            println!("Species:      {}", s.species_name);
            if let Some(p) = info.species {
                println!();
                println!(
                    "{}",
                    output::render_table(
                        &["Normal weight", "Normal size", "Food type", "Feed norm", "Mortality", "Optimal temp"],
                        &[vec![
                            num_or_no_data(p.normal_weight),
                            num_or_no_data(p.normal_size),
                            or_no_data(p.food_type),
                            num_or_no_data(p.feed_per_individual),
                            num_or_no_data(p.group_mortality),
                            num_or_no_data(p.optimal_temperature),
                        ]]
                    )
                );
            }
        }
    }
    Ok(())
}
