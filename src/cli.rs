//! CLI struct definitions for the aquadesk command line.
//!
//! All top-level clap-derived types live here. Dispatch lives in `lib.rs`;
//! each plugin owns the clap tree of its own command group.

use crate::core::output::OutputFormat;
use crate::plugins::{feeding, manage, species, tank, water};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "aquadesk",
    version = env!("CARGO_PKG_VERSION"),
    about = "Aquaculture operations desk: condition checks, water logs and feeding records over a local SQLite store",
    disable_version_flag = true
)]
pub(crate) struct Cli {
    #[clap(subcommand)]
    pub command: Command,
    /// Staff login for commands that touch the record store.
    #[clap(long, global = true, env = "AQUADESK_LOGIN")]
    pub login: Option<String>,
    #[clap(long, global = true, env = "AQUADESK_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
    #[clap(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(clap::Args, Debug)]
pub(crate) struct InitCli {
    /// Directory to initialize (defaults to current working directory).
    #[clap(short, long)]
    pub dir: Option<PathBuf>,
    /// Create a user holding both roles.
    #[clap(long, requires = "admin_password")]
    pub admin_login: Option<String>,
    #[clap(long, requires = "admin_login")]
    pub admin_password: Option<String>,
    #[clap(long, requires = "admin_login")]
    pub admin_name: Option<String>,
}

#[derive(clap::Args, Debug)]
pub(crate) struct ScoreCli {
    #[clap(subcommand)]
    pub command: ScoreCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum ScoreCommand {
    /// Score a tank check. Inputs are taken verbatim; a non-numeric field
    /// yields `Undetermined`.
    Tank {
        #[clap(long, allow_hyphen_values = true)]
        filter: String,
        #[clap(long, allow_hyphen_values = true)]
        glass: String,
        #[clap(long, allow_hyphen_values = true)]
        algae: String,
        #[clap(long, allow_hyphen_values = true)]
        clarity: String,
    },
    /// Score a species population check.
    Species {
        #[clap(long)]
        total: u32,
        #[clap(long, default_value = "0")]
        damaged: u32,
        #[clap(long, default_value = "0")]
        abnormal: u32,
        #[clap(long, default_value = "0")]
        dead: u32,
    },
}

#[derive(clap::Args, Debug)]
pub(crate) struct AuthCli {
    #[clap(subcommand)]
    pub command: AuthCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum AuthCommand {
    /// Check credentials and print the view the user lands on.
    Login,
}

#[derive(clap::Args, Debug)]
pub(crate) struct OpsCli {
    #[clap(subcommand)]
    pub command: OpsCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum OpsCommand {
    /// List every aquarium with its species and last check.
    Aquariums,
    /// Show one aquarium with its species parameters.
    Info {
        #[clap(long)]
        aquarium: i64,
    },
    Tank(tank::TankCli),
    Species(species::SpeciesCli),
    Water(water::WaterCli),
    Feeding(feeding::FeedingCli),
}

// ===== Main Command Enum =====

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Create the local record store
    #[clap(name = "init", visible_alias = "i")]
    Init(InitCli),

    /// Show version information
    #[clap(name = "version")]
    Version,

    /// Condition scoring, no login required
    #[clap(name = "score", visible_alias = "s")]
    Score(ScoreCli),

    /// Session checks
    #[clap(name = "auth")]
    Auth(AuthCli),

    /// Operational view: observations and aquarium overview
    #[clap(name = "ops", visible_alias = "o")]
    Ops(OpsCli),

    /// Management view: reference tables and staff accounts
    #[clap(name = "manage", visible_alias = "m")]
    Manage(manage::ManageCli),

    /// Show the audit log of brokered operations
    #[clap(name = "audit")]
    Audit,
}
