//! aquadesk: an aquaculture operations desk.
//!
//! Records water-quality readings, feeding logs and tank/species condition
//! checks in a local SQLite store, and scores each check into a qualitative
//! label.
//!
//! # Architecture
//!
//! ## Scoring core
//!
//! [`core::scoring`] holds the two condition scorers. They are pure
//! functions over plain numbers and depend on nothing else in the crate.
//!
//! ## The Thin Waist
//!
//! All reads and writes of the record store route through `DbBroker` for:
//! - Serialization (in-process lock)
//! - Audit logging (`broker.events.jsonl`)
//!
//! ## Views
//!
//! - `ops`: the operational view (aquarium overview, tank, species, water, feeding)
//! - `manage`: the management view (reference tables, staff accounts)
//!
//! A user may hold either role or both. Scoring needs no login.
//!
//! # Examples
//!
//! ```bash
//! aquadesk init --admin-login admin --admin-password secret
//! aquadesk score tank --filter 2 --glass 2 --algae 0 --clarity 100
//! aquadesk --login admin --password secret ops aquariums
//! aquadesk --login admin --password secret manage aquariums add --set volume=250
//! ```
//!
//! # Crate Structure
//!
//! - [`core`]: scoring, store, broker, repository, auth, config
//! - [`plugins`]: command groups of the two views

pub mod core;
pub mod plugins;

mod cli;
mod subsystems;

use crate::cli::{AuthCommand, Cli, Command, InitCli, OpsCommand, ScoreCli, ScoreCommand};
use crate::core::{
    auth::{self, NewUser, User},
    broker,
    config::Config,
    db,
    error::AquaError,
    output::{self, OutputFormat},
    scoring,
    store::{DATA_DIR_NAME, Store},
    time,
};
use crate::plugins::{aquarium, feeding, manage, species, tank, water};

use clap::Parser;
use std::fs;
use std::path::Path;

/// Environment variable holding the `env_logger` filter.
pub const LOG_ENV: &str = "AQUADESK_LOG";

/// Actor recorded in the audit log for store bootstrap.
const SYSTEM_ACTOR: &str = "aquadesk";

fn init_logging(default_level: &str) {
    let env = env_logger::Env::new().filter_or(LOG_ENV, default_level);
    // A second init (e.g. in-process tests) keeps the first logger.
    let _ = env_logger::Builder::from_env(env).try_init();
}

fn open_store(current_dir: &Path) -> Result<Store, AquaError> {
    let store = Store::discover(current_dir)?;
    init_logging(&store.config.log.level);
    log::debug!("using store at {}", store.root.display());
    Ok(store)
}

fn resolve_session(store: &Store, login: Option<String>, password: Option<String>) -> Result<User, AquaError> {
    match (login, password) {
        (Some(login), Some(password)) => auth::authenticate(store, &login, &password),
        _ => Err(AquaError::AuthError(
            "login required: pass --login and --password or set AQUADESK_LOGIN and AQUADESK_PASSWORD".to_string(),
        )),
    }
}

fn run_init(current_dir: &Path, args: InitCli, format: OutputFormat) -> Result<(), AquaError> {
    let target = args.dir.unwrap_or_else(|| current_dir.to_path_buf());
    let data_dir = target.join(DATA_DIR_NAME);
    fs::create_dir_all(&data_dir).map_err(AquaError::IoError)?;

    let wrote_config = Config::write_default(&data_dir)?;
    let store = Store::open(&data_dir)?;
    init_logging(&store.config.log.level);
    db::initialize_store(&store)?;

    let mut admin_created = false;
    if let Some(login) = args.admin_login {
        let password = args.admin_password.ok_or_else(|| {
            AquaError::ValidationError("--admin-password is required with --admin-login".to_string())
        })?;
        let existing = auth::list_users(&store, SYSTEM_ACTOR)?;
        if existing.iter().any(|u| u.login == login) {
            log::warn!("user '{}' already exists; leaving it unchanged", login);
        } else {
            auth::create_user(
                &store,
                SYSTEM_ACTOR,
                &NewUser {
                    name: args.admin_name.unwrap_or_else(|| "Administrator".to_string()),
                    role: "Administrator".to_string(),
                    login,
                    password,
                    is_operational: true,
                    is_management: true,
                },
            )?;
            admin_created = true;
        }
    }

    match format {
        OutputFormat::Json => {
            let env = time::command_envelope(
                "init",
                "ok",
                serde_json::json!({
                    "store": store.root.display().to_string(),
                    "config_written": wrote_config,
                    "admin_created": admin_created,
                }),
            );
            println!("{}", serde_json::to_string_pretty(&env)?);
        }
        OutputFormat::Text => {
            println!("Initialized aquadesk store at {}", store.root.display());
            if admin_created {
                println!("Created administrator account");
            }
        }
    }
    Ok(())
}

fn run_score(args: ScoreCli, format: OutputFormat) -> Result<(), AquaError> {
    match args.command {
        ScoreCommand::Tank {
            filter,
            glass,
            algae,
            clarity,
        } => {
            let condition = scoring::score_tank_condition_raw(&filter, &glass, &algae, &clarity);
            if !condition.is_determined() {
                log::warn!(
                    "tank inputs are not all numeric (filter={:?} glass={:?} algae={:?} clarity={:?})",
                    filter,
                    glass,
                    algae,
                    clarity
                );
            }
            match format {
                OutputFormat::Json => {
                    let env = time::command_envelope("score.tank", "ok", serde_json::json!({ "condition": condition }));
                    println!("{}", serde_json::to_string_pretty(&env)?);
                }
                OutputFormat::Text => println!("Overall condition: {}", output::tank_label(condition)),
            }
        }
        ScoreCommand::Species {
            total,
            damaged,
            abnormal,
            dead,
        } => {
            let health = scoring::score_species_health(total, damaged, abnormal, dead);
            if !health.is_determined() {
                log::warn!("species population is empty; nothing to score");
            }
            match format {
                OutputFormat::Json => {
                    let env = time::command_envelope("score.species", "ok", serde_json::json!({ "health": health }));
                    println!("{}", serde_json::to_string_pretty(&env)?);
                }
                OutputFormat::Text => println!("Health: {}", output::species_label(health)),
            }
        }
    }
    Ok(())
}

fn run_login(user: &User, format: OutputFormat) -> Result<(), AquaError> {
    let view = user.primary_view().ok_or_else(|| {
        AquaError::AuthError(format!("user '{}' has no access rights", user.login))
    })?;
    match format {
        OutputFormat::Json => {
            let env = time::command_envelope(
                "auth.login",
                "ok",
                serde_json::json!({
                    "login": user.login,
                    "view": view.to_string(),
                    "operational": user.is_operational,
                    "management": user.is_management,
                }),
            );
            println!("{}", serde_json::to_string_pretty(&env)?);
        }
        OutputFormat::Text => println!("Logged in as {}; opening the {} view", user.login, view),
    }
    Ok(())
}

fn run_audit(store: &Store, format: OutputFormat) -> Result<(), AquaError> {
    let events = broker::read_audit_log(store)?;
    match format {
        OutputFormat::Json => {
            let env = time::command_envelope("audit", "ok", serde_json::json!({ "events": events }));
            println!("{}", serde_json::to_string_pretty(&env)?);
        }
        OutputFormat::Text => {
            let rows: Vec<Vec<String>> = events
                .into_iter()
                .map(|e| vec![e.ts, e.actor, e.op, e.status, e.event_id])
                .collect();
            println!(
                "{}",
                output::render_table(&["Time", "Actor", "Operation", "Status", "Event"], &rows)
            );
        }
    }
    Ok(())
}

pub fn run() -> Result<(), AquaError> {
    let cli = Cli::parse();
    let current_dir = std::env::current_dir()?;
    let format = cli.format;

    match cli.command {
        Command::Version => {
            // Version command - simple output for scripts/parsing
            println!("v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Command::Init(args) => run_init(&current_dir, args, format),
        Command::Score(args) => {
            init_logging(&Config::default().log.level);
            run_score(args, format)
        }
        Command::Auth(args) => {
            let store = open_store(&current_dir)?;
            let user = resolve_session(&store, cli.login, cli.password)?;
            match args.command {
                AuthCommand::Login => run_login(&user, format),
            }
        }
        Command::Ops(args) => {
            let store = open_store(&current_dir)?;
            let user = resolve_session(&store, cli.login, cli.password)?;
            match args.command {
                OpsCommand::Aquariums => aquarium::print_overview(&store, &user, format),
                OpsCommand::Info { aquarium } => aquarium::print_info(&store, &user, aquarium, format),
                OpsCommand::Tank(c) => tank::run_tank_cli(&store, &user, format, c),
                OpsCommand::Species(c) => species::run_species_cli(&store, &user, format, c),
                OpsCommand::Water(c) => water::run_water_cli(&store, &user, format, c),
                OpsCommand::Feeding(c) => feeding::run_feeding_cli(&store, &user, format, c),
            }
        }
        Command::Manage(args) => {
            let store = open_store(&current_dir)?;
            let user = resolve_session(&store, cli.login, cli.password)?;
            manage::run_manage_cli(&store, &user, format, args)
        }
        Command::Audit => {
            let store = open_store(&current_dir)?;
            let user = resolve_session(&store, cli.login, cli.password)?;
            user.require(auth::View::Management)?;
            run_audit(&store, format)
        }
    }
}
