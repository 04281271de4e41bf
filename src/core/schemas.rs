//! Centralized database schema definitions.
//!
//! All operational and reference tables live in a single SQLite file
//! (`aquarium.db` unless overridden in `config.toml`). Statements are
//! idempotent so `init` can run against an existing store.

pub const DEFAULT_DB_NAME: &str = "aquarium.db";
pub const AUDIT_LOG_NAME: &str = "broker.events.jsonl";

// --- People and tanks ---

pub const USERS_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        user_id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT,
        role TEXT,
        login TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        is_operational INTEGER NOT NULL DEFAULT 0,
        is_management INTEGER NOT NULL DEFAULT 0
    )
";

pub const AQUARIUMS_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS aquariums (
        aquarium_id INTEGER PRIMARY KEY AUTOINCREMENT,
        responsible_user INTEGER REFERENCES users(user_id),
        volume REAL,
        status TEXT DEFAULT 'Active',
        aquarium_type TEXT DEFAULT 'Commercial'
    )
";

// --- Species reference data ---

pub const SEAFOOD_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS seafood (
        seafood_id INTEGER PRIMARY KEY AUTOINCREMENT,
        species_name TEXT,
        normal_weight REAL,
        normal_size REAL,
        food_type TEXT,
        feed_per_individual REAL,
        group_mortality REAL,
        aquarium_id INTEGER REFERENCES aquariums(aquarium_id)
    )
";

pub const OPTIMAL_PARAMETERS_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS optimal_parameters (
        optimal_params_id INTEGER PRIMARY KEY AUTOINCREMENT,
        seafood_id INTEGER REFERENCES seafood(seafood_id),
        optimal_temperature REAL,
        temperature_tolerance REAL,
        oxygen_level REAL,
        oxygen_tolerance REAL,
        ph_level REAL,
        ph_tolerance REAL,
        water_per_individual REAL
    )
";

pub const PRODUCT_READINESS_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS product_readiness (
        readiness_id INTEGER PRIMARY KEY AUTOINCREMENT,
        seafood_id INTEGER REFERENCES seafood(seafood_id),
        sale_weight REAL,
        sale_size REAL
    )
";

pub const FRIDGES_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS fridges (
        fridge_id INTEGER PRIMARY KEY AUTOINCREMENT,
        seafood_id INTEGER REFERENCES seafood(seafood_id),
        shelf_life_days INTEGER,
        quantity INTEGER,
        fridge_state TEXT DEFAULT 'Working',
        last_checked TEXT
    )
";

// --- Observations ---

pub const TANK_STATES_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS tank_states (
        tank_state_id INTEGER PRIMARY KEY AUTOINCREMENT,
        aquarium_id INTEGER NOT NULL REFERENCES aquariums(aquarium_id),
        checked_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        filter_state INTEGER NOT NULL,
        glass_state INTEGER NOT NULL,
        algae_level REAL NOT NULL,
        water_clarity REAL NOT NULL
    )
";

pub const SPECIES_STATES_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS species_states (
        health_id INTEGER PRIMARY KEY AUTOINCREMENT,
        aquarium_id INTEGER NOT NULL REFERENCES aquariums(aquarium_id),
        seafood_id INTEGER NOT NULL REFERENCES seafood(seafood_id),
        measured_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        total_count INTEGER NOT NULL,
        damaged_count INTEGER NOT NULL,
        abnormal_count INTEGER NOT NULL,
        dead_count INTEGER NOT NULL,
        avg_size REAL,
        avg_weight REAL
    )
";

pub const WATER_PARAMETERS_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS water_parameters (
        parameter_id INTEGER PRIMARY KEY AUTOINCREMENT,
        aquarium_id INTEGER NOT NULL REFERENCES aquariums(aquarium_id),
        measured_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        temperature REAL NOT NULL,
        ph REAL NOT NULL,
        oxygen_level REAL NOT NULL
    )
";

pub const FEEDINGS_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS feedings (
        feeding_id INTEGER PRIMARY KEY AUTOINCREMENT,
        aquarium_id INTEGER NOT NULL REFERENCES aquariums(aquarium_id),
        seafood_id INTEGER NOT NULL REFERENCES seafood(seafood_id),
        fed_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        total_feed REAL NOT NULL,
        food_type TEXT NOT NULL
    )
";

pub const OBSERVATION_INDEXES: &str = "
    CREATE INDEX IF NOT EXISTS idx_tank_states_aquarium ON tank_states(aquarium_id, checked_at);
    CREATE INDEX IF NOT EXISTS idx_species_states_aquarium ON species_states(aquarium_id, seafood_id, measured_at);
    CREATE INDEX IF NOT EXISTS idx_water_parameters_aquarium ON water_parameters(aquarium_id, measured_at);
    CREATE INDEX IF NOT EXISTS idx_feedings_aquarium ON feedings(aquarium_id, fed_at);
";
