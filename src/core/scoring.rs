//! Condition scoring for tanks and species cohorts.
//!
//! Both scorers are pure functions over their inputs. They never fail: an
//! input that cannot be scored yields a soft label (`Undetermined` or
//! `NoData`) that callers render like any other outcome.
//!
//! The tank formula tops out at 90 points for in-range input, and the
//! species categories may overlap (damaged + abnormal + dead can exceed the
//! total). Both behaviours are relied on by stored history and are covered
//! by tests; change them only together with the product owners.

use crate::core::error::AquaError;
use serde::{Deserialize, Serialize};
use std::fmt;

const EXCELLENT_TANK_SCORE: f64 = 80.0;
const GOOD_TANK_SCORE: f64 = 60.0;
const SATISFACTORY_TANK_SCORE: f64 = 40.0;

const EXCELLENT_HEALTHY_PERCENT: f64 = 80.0;
const GOOD_HEALTHY_PERCENT: f64 = 60.0;
const SATISFACTORY_HEALTHY_PERCENT: f64 = 40.0;
/// Share of dead individuals above which a cohort is critical outright.
const CRITICAL_DEAD_RATIO: f64 = 0.3;

/// Overall tank condition derived from a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TankCondition {
    Excellent,
    Good,
    Satisfactory,
    Critical,
    Undetermined,
}

impl TankCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Satisfactory => "Satisfactory",
            Self::Critical => "Critical",
            Self::Undetermined => "Undetermined",
        }
    }

    pub fn is_determined(&self) -> bool {
        !matches!(self, Self::Undetermined)
    }
}

impl fmt::Display for TankCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Health classification of a species cohort in one tank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpeciesHealth {
    Excellent,
    Good,
    Satisfactory,
    Poor,
    Critical,
    #[serde(rename = "No data")]
    NoData,
}

impl SpeciesHealth {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Satisfactory => "Satisfactory",
            Self::Poor => "Poor",
            Self::Critical => "Critical",
            Self::NoData => "No data",
        }
    }

    pub fn is_determined(&self) -> bool {
        !matches!(self, Self::NoData)
    }
}

impl fmt::Display for SpeciesHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterState {
    NonFunctional = 0,
    NeedsCleaning = 1,
    Normal = 2,
}

impl FilterState {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::NonFunctional),
            1 => Some(Self::NeedsCleaning),
            2 => Some(Self::Normal),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::NonFunctional => "Non-functional",
            Self::NeedsCleaning => "Needs cleaning",
            Self::Normal => "Working normally",
        }
    }

    /// Display name for a stored code; unknown codes render as "Unknown".
    pub fn describe(code: i64) -> &'static str {
        Self::from_code(code).map_or("Unknown", |s| s.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GlassState {
    HeavilySoiled = 0,
    LightlySoiled = 1,
    Clean = 2,
}

impl GlassState {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::HeavilySoiled),
            1 => Some(Self::LightlySoiled),
            2 => Some(Self::Clean),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::HeavilySoiled => "Heavily soiled",
            Self::LightlySoiled => "Lightly soiled",
            Self::Clean => "Clean",
        }
    }

    pub fn describe(code: i64) -> &'static str {
        Self::from_code(code).map_or("Unknown", |s| s.label())
    }
}

/// One tank check as entered by staff.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TankObservation {
    pub filter_state: i64,
    pub glass_state: i64,
    /// Percent, 0..=100.
    pub algae_level: f64,
    /// Percent, 0..=100.
    pub water_clarity: f64,
}

impl TankObservation {
    /// Input-surface check. The scorer itself accepts anything.
    pub fn validate(&self) -> Result<(), AquaError> {
        if FilterState::from_code(self.filter_state).is_none() {
            return Err(AquaError::ValidationError(format!(
                "filter state must be 0, 1 or 2 (got {})",
                self.filter_state
            )));
        }
        if GlassState::from_code(self.glass_state).is_none() {
            return Err(AquaError::ValidationError(format!(
                "glass state must be 0, 1 or 2 (got {})",
                self.glass_state
            )));
        }
        check_percent("algae level", self.algae_level)?;
        check_percent("water clarity", self.water_clarity)?;
        Ok(())
    }

    pub fn condition(&self) -> TankCondition {
        score_tank_condition(
            self.filter_state as f64,
            self.glass_state as f64,
            self.algae_level,
            self.water_clarity,
        )
    }
}

fn check_percent(field: &str, value: f64) -> Result<(), AquaError> {
    if !(0.0..=100.0).contains(&value) {
        return Err(AquaError::ValidationError(format!(
            "{} must be within 0..=100 percent (got {})",
            field, value
        )));
    }
    Ok(())
}

/// Population counts from one species check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesPopulationObservation {
    pub total: u32,
    pub damaged: u32,
    pub abnormal: u32,
    pub dead: u32,
}

impl SpeciesPopulationObservation {
    /// Each category is bounded by the total on its own; their sum is not.
    pub fn validate(&self) -> Result<(), AquaError> {
        if self.damaged > self.total || self.abnormal > self.total || self.dead > self.total {
            return Err(AquaError::ValidationError(
                "damaged, abnormal and dead counts may not exceed the total count".to_string(),
            ));
        }
        Ok(())
    }

    pub fn health(&self) -> SpeciesHealth {
        score_species_health(self.total, self.damaged, self.abnormal, self.dead)
    }
}

/// Raw tank score, or `None` when an input is not a number.
pub fn tank_score(filter_state: f64, glass_state: f64, algae_level: f64, water_clarity: f64) -> Option<f64> {
    if [filter_state, glass_state, algae_level, water_clarity]
        .iter()
        .any(|v| v.is_nan())
    {
        return None;
    }

    let mut score = 0.0;
    score += filter_state * 10.0;
    score += glass_state * 10.0;
    score += (20.0 - algae_level / 5.0).max(0.0);
    score += water_clarity * 0.3;
    Some(score)
}

pub fn score_tank_condition(
    filter_state: f64,
    glass_state: f64,
    algae_level: f64,
    water_clarity: f64,
) -> TankCondition {
    match tank_score(filter_state, glass_state, algae_level, water_clarity) {
        None => TankCondition::Undetermined,
        Some(score) if score >= EXCELLENT_TANK_SCORE => TankCondition::Excellent,
        Some(score) if score >= GOOD_TANK_SCORE => TankCondition::Good,
        Some(score) if score >= SATISFACTORY_TANK_SCORE => TankCondition::Satisfactory,
        Some(_) => TankCondition::Critical,
    }
}

/// Scores text input as delivered by a form field. Any field that does not
/// parse as a real number makes the whole check `Undetermined`.
pub fn score_tank_condition_raw(
    filter_state: &str,
    glass_state: &str,
    algae_level: &str,
    water_clarity: &str,
) -> TankCondition {
    let parsed: Result<Vec<f64>, _> = [filter_state, glass_state, algae_level, water_clarity]
        .iter()
        .map(|s| s.trim().parse::<f64>())
        .collect();
    match parsed.as_deref() {
        Ok([f, g, a, c]) => score_tank_condition(*f, *g, *a, *c),
        _ => TankCondition::Undetermined,
    }
}

pub fn score_species_health(total: u32, damaged: u32, abnormal: u32, dead: u32) -> SpeciesHealth {
    if total == 0 {
        return SpeciesHealth::NoData;
    }

    let healthy = i64::from(total) - i64::from(damaged) - i64::from(abnormal) - i64::from(dead);
    let healthy_percent = healthy as f64 / f64::from(total) * 100.0;

    // Mortality wins over the healthy-share ladder.
    if f64::from(dead) > f64::from(total) * CRITICAL_DEAD_RATIO {
        SpeciesHealth::Critical
    } else if healthy_percent >= EXCELLENT_HEALTHY_PERCENT {
        SpeciesHealth::Excellent
    } else if healthy_percent >= GOOD_HEALTHY_PERCENT {
        SpeciesHealth::Good
    } else if healthy_percent >= SATISFACTORY_HEALTHY_PERCENT {
        SpeciesHealth::Satisfactory
    } else {
        SpeciesHealth::Poor
    }
}
