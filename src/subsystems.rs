//! Schema registration. Centralizes every table `init` creates.
//!
//! Adding a table: append one entry to `SCHEMAS`.

use crate::core::schemas;

/// Table schemas in creation order. Referenced tables come first.
pub(crate) const SCHEMAS: &[(&str, &str)] = &[
    ("users", schemas::USERS_SCHEMA),
    ("aquariums", schemas::AQUARIUMS_SCHEMA),
    ("seafood", schemas::SEAFOOD_SCHEMA),
    ("optimal_parameters", schemas::OPTIMAL_PARAMETERS_SCHEMA),
    ("product_readiness", schemas::PRODUCT_READINESS_SCHEMA),
    ("fridges", schemas::FRIDGES_SCHEMA),
    ("tank_states", schemas::TANK_STATES_SCHEMA),
    ("species_states", schemas::SPECIES_STATES_SCHEMA),
    ("water_parameters", schemas::WATER_PARAMETERS_SCHEMA),
    ("feedings", schemas::FEEDINGS_SCHEMA),
];
