//! Observation storage behind a repository seam.
//!
//! Screens read histories and write observations through
//! [`ObservationRepository`]; the scoring core never sees a connection.
//! [`SqliteRepository`] is the only backend, routed through [`DbBroker`]
//! so every call shows up in the audit log.

use crate::core::broker::DbBroker;
use crate::core::error::AquaError;
use crate::core::scoring::{
    SpeciesHealth, SpeciesPopulationObservation, TankCondition, TankObservation,
};
use crate::core::store::Store;
use crate::core::time;
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const TEMPERATURE_RANGE: (f64, f64) = (0.0, 40.0);
pub const PH_RANGE: (f64, f64) = (0.0, 14.0);
pub const OXYGEN_RANGE: (f64, f64) = (0.0, 20.0);
pub const MAX_TOTAL_FEED_GRAMS: f64 = 999_999.99;
pub const MAX_SPECIES_COUNT: u32 = 9_999;
pub const AVG_SIZE_RANGE: (f64, f64) = (0.0, 999.99);
pub const AVG_WEIGHT_RANGE: (f64, f64) = (0.0, 9_999.99);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FoodType {
    Dry,
    Live,
    Frozen,
    Plant,
}

impl FoodType {
    pub const ALL: [FoodType; 4] = [Self::Dry, Self::Live, Self::Frozen, Self::Plant];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dry => "Dry",
            Self::Live => "Live",
            Self::Frozen => "Frozen",
            Self::Plant => "Plant",
        }
    }
}

impl fmt::Display for FoodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FoodType {
    type Err = AquaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                AquaError::ValidationError(format!(
                    "unknown food type '{}' (expected Dry, Live, Frozen or Plant)",
                    s
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    NewestFirst,
    Ascending,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeciesCheck {
    pub population: SpeciesPopulationObservation,
    pub avg_size: f64,
    pub avg_weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaterReading {
    pub temperature: f64,
    pub ph: f64,
    pub oxygen_level: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feeding {
    /// `YYYY-MM-DD`.
    pub date: String,
    pub food_type: FoodType,
    pub total_feed: f64,
}

/// An observation ready to be written for one aquarium.
#[derive(Debug, Clone, PartialEq)]
pub enum NewObservation {
    Tank { aquarium_id: i64, observation: TankObservation },
    Species { aquarium_id: i64, check: SpeciesCheck },
    Water { aquarium_id: i64, reading: WaterReading },
    Feeding { aquarium_id: i64, feeding: Feeding },
}

impl NewObservation {
    pub fn aquarium_id(&self) -> i64 {
        match self {
            Self::Tank { aquarium_id, .. }
            | Self::Species { aquarium_id, .. }
            | Self::Water { aquarium_id, .. }
            | Self::Feeding { aquarium_id, .. } => *aquarium_id,
        }
    }

    /// Input-surface checks; nothing is written when this fails.
    pub fn validate(&self) -> Result<(), AquaError> {
        match self {
            Self::Tank { observation, .. } => observation.validate(),
            Self::Species { check, .. } => {
                check.population.validate()?;
                if check.population.total > MAX_SPECIES_COUNT {
                    return Err(AquaError::ValidationError(format!(
                        "total count must be at most {} (got {})",
                        MAX_SPECIES_COUNT, check.population.total
                    )));
                }
                check_range("average size", check.avg_size, AVG_SIZE_RANGE)?;
                check_range("average weight", check.avg_weight, AVG_WEIGHT_RANGE)
            }
            Self::Water { reading, .. } => {
                check_range("temperature", reading.temperature, TEMPERATURE_RANGE)?;
                check_range("pH", reading.ph, PH_RANGE)?;
                check_range("oxygen level", reading.oxygen_level, OXYGEN_RANGE)
            }
            Self::Feeding { feeding, .. } => {
                if !time::is_calendar_date(&feeding.date) {
                    return Err(AquaError::ValidationError(format!(
                        "feeding date must be a calendar date as YYYY-MM-DD (got '{}')",
                        feeding.date
                    )));
                }
                check_range("total feed", feeding.total_feed, (0.0, MAX_TOTAL_FEED_GRAMS))
            }
        }
    }

    fn op_name(&self) -> &'static str {
        match self {
            Self::Tank { .. } => "tank.record",
            Self::Species { .. } => "species.record",
            Self::Water { .. } => "water.record",
            Self::Feeding { .. } => "feeding.record",
        }
    }
}

fn check_range(field: &str, value: f64, (min, max): (f64, f64)) -> Result<(), AquaError> {
    if !(min..=max).contains(&value) {
        return Err(AquaError::ValidationError(format!(
            "{} must be within {}..={} (got {})",
            field, min, max, value
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TankStateRecord {
    pub tank_state_id: i64,
    pub aquarium_id: i64,
    pub checked_at: String,
    pub observation: TankObservation,
}

impl TankStateRecord {
    pub fn condition(&self) -> TankCondition {
        self.observation.condition()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeciesStateRecord {
    pub health_id: i64,
    pub aquarium_id: i64,
    pub seafood_id: i64,
    pub measured_at: String,
    pub population: SpeciesPopulationObservation,
    pub avg_size: Option<f64>,
    pub avg_weight: Option<f64>,
}

impl SpeciesStateRecord {
    pub fn health(&self) -> SpeciesHealth {
        self.population.health()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaterParameterRecord {
    pub parameter_id: i64,
    pub aquarium_id: i64,
    pub measured_at: String,
    pub temperature: f64,
    pub ph: f64,
    pub oxygen_level: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedingRecord {
    pub feeding_id: i64,
    pub aquarium_id: i64,
    pub fed_at: String,
    pub food_type: String,
    pub total_feed: f64,
    pub species_name: Option<String>,
}

/// The species living in an aquarium, as used by feeding and species checks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AquariumSpecies {
    pub seafood_id: i64,
    pub species_name: Option<String>,
}

pub trait ObservationRepository {
    fn tank_history(&self, aquarium_id: i64) -> Result<Vec<TankStateRecord>, AquaError>;

    fn species_history(
        &self,
        aquarium_id: i64,
        seafood_id: i64,
        limit: usize,
    ) -> Result<Vec<SpeciesStateRecord>, AquaError>;

    fn water_history(
        &self,
        aquarium_id: i64,
        order: SortOrder,
    ) -> Result<Vec<WaterParameterRecord>, AquaError>;

    fn feeding_history(&self, aquarium_id: i64) -> Result<Vec<FeedingRecord>, AquaError>;

    /// Validates and writes one observation, returning the new row id.
    fn record(&self, observation: &NewObservation) -> Result<i64, AquaError>;
}

pub struct SqliteRepository<'a> {
    store: &'a Store,
    actor: String,
}

impl<'a> SqliteRepository<'a> {
    pub fn new(store: &'a Store, actor: &str) -> Self {
        Self {
            store,
            actor: actor.to_string(),
        }
    }

    fn with_conn<F, R>(&self, op_name: &str, f: F) -> Result<R, AquaError>
    where
        F: FnOnce(&Connection) -> Result<R, AquaError>,
    {
        DbBroker::new(self.store).with_conn(&self.actor, op_name, f)
    }

    /// First species registered in the aquarium, if any.
    pub fn aquarium_species(&self, aquarium_id: i64) -> Result<Option<AquariumSpecies>, AquaError> {
        self.with_conn("aquarium.species", |conn| species_in(conn, aquarium_id))
    }
}

fn species_in(conn: &Connection, aquarium_id: i64) -> Result<Option<AquariumSpecies>, AquaError> {
    let species = conn
        .query_row(
            "SELECT seafood_id, species_name FROM seafood WHERE aquarium_id = ?1 ORDER BY seafood_id LIMIT 1",
            params![aquarium_id],
            |row| {
                Ok(AquariumSpecies {
                    seafood_id: row.get(0)?,
                    species_name: row.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(species)
}

fn require_aquarium(conn: &Connection, aquarium_id: i64) -> Result<(), AquaError> {
    let exists: Option<i64> = conn
        .query_row(
            "SELECT aquarium_id FROM aquariums WHERE aquarium_id = ?1",
            params![aquarium_id],
            |row| row.get(0),
        )
        .optional()?;
    match exists {
        Some(_) => Ok(()),
        None => Err(AquaError::NotFound(format!("aquarium {}", aquarium_id))),
    }
}

fn require_species(conn: &Connection, aquarium_id: i64) -> Result<AquariumSpecies, AquaError> {
    species_in(conn, aquarium_id)?.ok_or_else(|| {
        AquaError::ValidationError(format!("aquarium {} has no seafood registered", aquarium_id))
    })
}

impl ObservationRepository for SqliteRepository<'_> {
    fn tank_history(&self, aquarium_id: i64) -> Result<Vec<TankStateRecord>, AquaError> {
        self.with_conn("tank.history", |conn| {
            let mut stmt = conn.prepare(
                "SELECT tank_state_id, aquarium_id, checked_at, filter_state, glass_state, algae_level, water_clarity
                 FROM tank_states WHERE aquarium_id = ?1
                 ORDER BY checked_at DESC, tank_state_id DESC",
            )?;
            let rows = stmt
                .query_map(params![aquarium_id], |row| {
                    Ok(TankStateRecord {
                        tank_state_id: row.get(0)?,
                        aquarium_id: row.get(1)?,
                        checked_at: row.get(2)?,
                        observation: TankObservation {
                            filter_state: row.get(3)?,
                            glass_state: row.get(4)?,
                            algae_level: row.get(5)?,
                            water_clarity: row.get(6)?,
                        },
                    })
                })?
                .collect::<Result<Vec<_>, _>>()
                .map_err(AquaError::RusqliteError)?;
            Ok(rows)
        })
    }

    fn species_history(
        &self,
        aquarium_id: i64,
        seafood_id: i64,
        limit: usize,
    ) -> Result<Vec<SpeciesStateRecord>, AquaError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.with_conn("species.history", |conn| {
            let mut stmt = conn.prepare(
                "SELECT health_id, aquarium_id, seafood_id, measured_at,
                        total_count, damaged_count, abnormal_count, dead_count, avg_size, avg_weight
                 FROM species_states WHERE aquarium_id = ?1 AND seafood_id = ?2
                 ORDER BY measured_at DESC, health_id DESC
                 LIMIT ?3",
            )?;
            let rows = stmt
                .query_map(params![aquarium_id, seafood_id, limit], |row| {
                    Ok(SpeciesStateRecord {
                        health_id: row.get(0)?,
                        aquarium_id: row.get(1)?,
                        seafood_id: row.get(2)?,
                        measured_at: row.get(3)?,
                        population: SpeciesPopulationObservation {
                            total: row.get(4)?,
                            damaged: row.get(5)?,
                            abnormal: row.get(6)?,
                            dead: row.get(7)?,
                        },
                        avg_size: row.get(8)?,
                        avg_weight: row.get(9)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()
                .map_err(AquaError::RusqliteError)?;
            Ok(rows)
        })
    }

    fn water_history(
        &self,
        aquarium_id: i64,
        order: SortOrder,
    ) -> Result<Vec<WaterParameterRecord>, AquaError> {
        let sql = match order {
            SortOrder::NewestFirst => {
                "SELECT parameter_id, aquarium_id, measured_at, temperature, ph, oxygen_level
                 FROM water_parameters WHERE aquarium_id = ?1
                 ORDER BY measured_at DESC, parameter_id DESC"
            }
            SortOrder::Ascending => {
                "SELECT parameter_id, aquarium_id, measured_at, temperature, ph, oxygen_level
                 FROM water_parameters WHERE aquarium_id = ?1
                 ORDER BY measured_at ASC, parameter_id ASC"
            }
        };
        self.with_conn("water.history", |conn| {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt
                .query_map(params![aquarium_id], |row| {
                    Ok(WaterParameterRecord {
                        parameter_id: row.get(0)?,
                        aquarium_id: row.get(1)?,
                        measured_at: row.get(2)?,
                        temperature: row.get(3)?,
                        ph: row.get(4)?,
                        oxygen_level: row.get(5)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()
                .map_err(AquaError::RusqliteError)?;
            Ok(rows)
        })
    }

    fn feeding_history(&self, aquarium_id: i64) -> Result<Vec<FeedingRecord>, AquaError> {
        self.with_conn("feeding.history", |conn| {
            let mut stmt = conn.prepare(
                "SELECT f.feeding_id, f.aquarium_id, f.fed_at, f.food_type, f.total_feed, s.species_name
                 FROM feedings f
                 JOIN seafood s ON f.seafood_id = s.seafood_id
                 WHERE f.aquarium_id = ?1
                 ORDER BY f.fed_at DESC, f.feeding_id DESC",
            )?;
            let rows = stmt
                .query_map(params![aquarium_id], |row| {
                    Ok(FeedingRecord {
                        feeding_id: row.get(0)?,
                        aquarium_id: row.get(1)?,
                        fed_at: row.get(2)?,
                        food_type: row.get(3)?,
                        total_feed: row.get(4)?,
                        species_name: row.get(5)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()
                .map_err(AquaError::RusqliteError)?;
            Ok(rows)
        })
    }

    fn record(&self, observation: &NewObservation) -> Result<i64, AquaError> {
        observation.validate()?;
        let aquarium_id = observation.aquarium_id();

        let id = self.with_conn(observation.op_name(), |conn| {
            require_aquarium(conn, aquarium_id)?;
            match observation {
                NewObservation::Tank { observation: obs, .. } => {
                    conn.execute(
                        "INSERT INTO tank_states(aquarium_id, filter_state, glass_state, algae_level, water_clarity) VALUES(?1, ?2, ?3, ?4, ?5)",
                        params![
                            aquarium_id,
                            obs.filter_state,
                            obs.glass_state,
                            obs.algae_level,
                            obs.water_clarity
                        ],
                    )?;
                }
                NewObservation::Species { check, .. } => {
                    let species = require_species(conn, aquarium_id)?;
                    let p = &check.population;
                    conn.execute(
                        "INSERT INTO species_states(aquarium_id, seafood_id, total_count, damaged_count, abnormal_count, dead_count, avg_size, avg_weight) VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                        params![
                            aquarium_id,
                            species.seafood_id,
                            p.total,
                            p.damaged,
                            p.abnormal,
                            p.dead,
                            check.avg_size,
                            check.avg_weight
                        ],
                    )?;
                }
                NewObservation::Water { reading, .. } => {
                    conn.execute(
                        "INSERT INTO water_parameters(aquarium_id, temperature, ph, oxygen_level) VALUES(?1, ?2, ?3, ?4)",
                        params![aquarium_id, reading.temperature, reading.ph, reading.oxygen_level],
                    )?;
                }
                NewObservation::Feeding { feeding, .. } => {
                    let species = require_species(conn, aquarium_id)?;
                    conn.execute(
                        "INSERT INTO feedings(aquarium_id, seafood_id, fed_at, food_type, total_feed) VALUES(?1, ?2, ?3, ?4, ?5)",
                        params![
                            aquarium_id,
                            species.seafood_id,
                            feeding.date,
                            feeding.food_type.as_str(),
                            feeding.total_feed
                        ],
                    )?;
                }
            }
            Ok(conn.last_insert_rowid())
        })?;

        log::info!("{} for aquarium {} stored as row {}", observation.op_name(), aquarium_id, id);
        Ok(id)
    }
}
