//! Row maintenance for the reference tables.
//!
//! Each table is described once by a static [`TableSpec`]; list, add,
//! update and delete are generic over that description. Column names in
//! SQL only ever come from a `TableSpec`; values are always bound.

use crate::core::auth::{self, NewUser, User, View};
use crate::core::broker::DbBroker;
use crate::core::error::AquaError;
use crate::core::output::{self, OutputFormat};
use crate::core::store::Store;
use crate::core::time;
use clap::{Parser, Subcommand};
use rusqlite::params_from_iter;
use rusqlite::types::{Value, ValueRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Real,
    Bool,
    /// `YYYY-MM-DD` text.
    Date,
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ColumnKind,
    /// False for columns fixed once the row exists.
    pub editable: bool,
}

const fn col(name: &'static str, kind: ColumnKind) -> ColumnSpec {
    ColumnSpec {
        name,
        kind,
        editable: true,
    }
}

#[derive(Debug)]
pub struct TableSpec {
    /// Name used on the command line.
    pub name: &'static str,
    pub table: &'static str,
    pub key: &'static str,
    pub columns: &'static [ColumnSpec],
    pub list_query: &'static str,
    /// Rows are created elsewhere (e.g. users need a password hash).
    pub insert_via: Option<&'static str>,
}

impl TableSpec {
    pub fn column(&self, name: &str) -> Option<&'static ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }
}

pub const TABLES: &[TableSpec] = &[
    TableSpec {
        name: "aquariums",
        table: "aquariums",
        key: "aquarium_id",
        columns: &[
            col("responsible_user", ColumnKind::Integer),
            col("volume", ColumnKind::Real),
            col("status", ColumnKind::Text),
            col("aquarium_type", ColumnKind::Text),
        ],
        list_query: "SELECT a.aquarium_id, a.responsible_user, u.name AS responsible, a.volume, a.status, a.aquarium_type
                     FROM aquariums a LEFT JOIN users u ON a.responsible_user = u.user_id
                     ORDER BY a.aquarium_id",
        insert_via: None,
    },
    TableSpec {
        name: "seafood",
        table: "seafood",
        key: "seafood_id",
        columns: &[
            col("species_name", ColumnKind::Text),
            col("normal_weight", ColumnKind::Real),
            col("normal_size", ColumnKind::Real),
            col("food_type", ColumnKind::Text),
            col("feed_per_individual", ColumnKind::Real),
            col("group_mortality", ColumnKind::Real),
            col("aquarium_id", ColumnKind::Integer),
        ],
        list_query: "SELECT seafood_id, species_name, normal_weight, normal_size, food_type,
                            feed_per_individual, group_mortality, aquarium_id
                     FROM seafood ORDER BY seafood_id",
        insert_via: None,
    },
    TableSpec {
        name: "users",
        table: "users",
        key: "user_id",
        columns: &[
            col("name", ColumnKind::Text),
            col("role", ColumnKind::Text),
            ColumnSpec {
                name: "login",
                kind: ColumnKind::Text,
                editable: false,
            },
            col("is_operational", ColumnKind::Bool),
            col("is_management", ColumnKind::Bool),
        ],
        list_query: "SELECT user_id, name, role, login, is_operational, is_management
                     FROM users ORDER BY user_id",
        insert_via: Some("manage user-add"),
    },
    TableSpec {
        name: "fridges",
        table: "fridges",
        key: "fridge_id",
        columns: &[
            col("seafood_id", ColumnKind::Integer),
            col("shelf_life_days", ColumnKind::Integer),
            col("quantity", ColumnKind::Integer),
            col("fridge_state", ColumnKind::Text),
            col("last_checked", ColumnKind::Date),
        ],
        list_query: "SELECT f.fridge_id, f.seafood_id, s.species_name, f.shelf_life_days, f.quantity,
                            f.fridge_state, f.last_checked
                     FROM fridges f LEFT JOIN seafood s ON f.seafood_id = s.seafood_id
                     ORDER BY f.fridge_id",
        insert_via: None,
    },
    TableSpec {
        name: "optimal-parameters",
        table: "optimal_parameters",
        key: "optimal_params_id",
        columns: &[
            col("seafood_id", ColumnKind::Integer),
            col("optimal_temperature", ColumnKind::Real),
            col("temperature_tolerance", ColumnKind::Real),
            col("oxygen_level", ColumnKind::Real),
            col("oxygen_tolerance", ColumnKind::Real),
            col("ph_level", ColumnKind::Real),
            col("ph_tolerance", ColumnKind::Real),
            col("water_per_individual", ColumnKind::Real),
        ],
        list_query: "SELECT o.optimal_params_id, o.seafood_id, s.species_name, o.optimal_temperature,
                            o.temperature_tolerance, o.oxygen_level, o.oxygen_tolerance, o.ph_level,
                            o.ph_tolerance, o.water_per_individual
                     FROM optimal_parameters o LEFT JOIN seafood s ON o.seafood_id = s.seafood_id
                     ORDER BY o.optimal_params_id",
        insert_via: None,
    },
    TableSpec {
        name: "readiness",
        table: "product_readiness",
        key: "readiness_id",
        columns: &[
            col("seafood_id", ColumnKind::Integer),
            col("sale_weight", ColumnKind::Real),
            col("sale_size", ColumnKind::Real),
        ],
        list_query: "SELECT r.readiness_id, r.seafood_id, s.species_name, r.sale_weight, r.sale_size
                     FROM product_readiness r LEFT JOIN seafood s ON r.seafood_id = s.seafood_id
                     ORDER BY r.readiness_id",
        insert_via: None,
    },
];

pub fn table_spec(name: &str) -> Result<&'static TableSpec, AquaError> {
    TABLES.iter().find(|t| t.name == name).ok_or_else(|| {
        AquaError::NotFound(format!("table '{}'", name))
    })
}

/// Parses one raw value for a column. An empty string stores NULL.
pub fn parse_value(kind: ColumnKind, raw: &str) -> Result<Value, AquaError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Value::Null);
    }
    let invalid = |what: &str| AquaError::ValidationError(format!("'{}' is not {}", raw, what));
    match kind {
        ColumnKind::Text => Ok(Value::Text(raw.to_string())),
        ColumnKind::Integer => raw
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| invalid("an integer")),
        ColumnKind::Real => match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Value::Real(v)),
            _ => Err(invalid("a number")),
        },
        ColumnKind::Bool => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(Value::Integer(1)),
            "0" | "false" | "no" => Ok(Value::Integer(0)),
            _ => Err(invalid("a boolean")),
        },
        ColumnKind::Date => {
            if time::is_calendar_date(raw) {
                Ok(Value::Text(raw.to_string()))
            } else {
                Err(invalid("a YYYY-MM-DD date"))
            }
        }
    }
}

/// Turns `col=value` pairs into typed values, rejecting unknown, repeated
/// and (for updates) non-editable columns.
pub fn parse_assignments(
    spec: &TableSpec,
    pairs: &[String],
    for_update: bool,
) -> Result<Vec<(&'static str, Value)>, AquaError> {
    if pairs.is_empty() {
        return Err(AquaError::ValidationError(
            "at least one --set column=value is required".to_string(),
        ));
    }
    let mut out: Vec<(&'static str, Value)> = Vec::with_capacity(pairs.len());
    for pair in pairs {
        let (name, raw) = pair.split_once('=').ok_or_else(|| {
            AquaError::ValidationError(format!("expected column=value, got '{}'", pair))
        })?;
        let name = name.trim();
        let column = spec.column(name).ok_or_else(|| {
            AquaError::ValidationError(format!("'{}' has no column '{}'", spec.name, name))
        })?;
        if for_update && !column.editable {
            return Err(AquaError::ValidationError(format!(
                "column '{}' of '{}' cannot be changed",
                name, spec.name
            )));
        }
        if out.iter().any(|(n, _)| *n == column.name) {
            return Err(AquaError::ValidationError(format!("column '{}' set twice", name)));
        }
        out.push((column.name, parse_value(column.kind, raw)?));
    }
    Ok(out)
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRows {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

pub fn list_rows(store: &Store, actor: &str, spec: &TableSpec) -> Result<TableRows, AquaError> {
    let broker = DbBroker::new(store);
    broker.with_conn(actor, &format!("manage.{}.list", spec.name), |conn| {
        let mut stmt = conn.prepare(spec.list_query)?;
        let headers: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let width = headers.len();
        let rows = stmt
            .query_map([], |row| {
                (0..width)
                    .map(|i| row.get::<_, Value>(i))
                    .collect::<Result<Vec<_>, _>>()
            })?
            .collect::<Result<Vec<_>, _>>()
            .map_err(AquaError::RusqliteError)?;
        Ok(TableRows { headers, rows })
    })
}

pub fn add_row(store: &Store, actor: &str, spec: &TableSpec, pairs: &[String]) -> Result<i64, AquaError> {
    if let Some(command) = spec.insert_via {
        return Err(AquaError::ValidationError(format!(
            "rows of '{}' are created with `{}`",
            spec.name, command
        )));
    }
    let values = parse_assignments(spec, pairs, false)?;
    let columns: Vec<&str> = values.iter().map(|(n, _)| *n).collect();
    let placeholders: Vec<String> = (1..=values.len()).map(|i| format!("?{}", i)).collect();
    let sql = format!(
        "INSERT INTO {}({}) VALUES({})",
        spec.table,
        columns.join(", "),
        placeholders.join(", ")
    );

    let broker = DbBroker::new(store);
    let id = broker.with_conn(actor, &format!("manage.{}.add", spec.name), |conn| {
        conn.execute(&sql, params_from_iter(values.iter().map(|(_, v)| v)))?;
        Ok(conn.last_insert_rowid())
    })?;
    log::info!("{} row {} added by {}", spec.name, id, actor);
    Ok(id)
}

pub fn update_row(
    store: &Store,
    actor: &str,
    spec: &TableSpec,
    id: i64,
    pairs: &[String],
) -> Result<(), AquaError> {
    let values = parse_assignments(spec, pairs, true)?;
    let assignments: Vec<String> = values
        .iter()
        .enumerate()
        .map(|(i, (n, _))| format!("{} = ?{}", n, i + 1))
        .collect();
    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ?{}",
        spec.table,
        assignments.join(", "),
        spec.key,
        values.len() + 1
    );
    let mut bound: Vec<Value> = values.into_iter().map(|(_, v)| v).collect();
    bound.push(Value::Integer(id));

    let broker = DbBroker::new(store);
    broker.with_conn(actor, &format!("manage.{}.update", spec.name), |conn| {
        let changed = conn.execute(&sql, params_from_iter(bound.iter()))?;
        if changed == 0 {
            return Err(AquaError::NotFound(format!("{} row {}", spec.name, id)));
        }
        Ok(())
    })?;
    log::info!("{} row {} updated by {}", spec.name, id, actor);
    Ok(())
}

pub fn delete_row(store: &Store, actor: &str, spec: &TableSpec, id: i64) -> Result<(), AquaError> {
    let sql = format!("DELETE FROM {} WHERE {} = ?1", spec.table, spec.key);
    let broker = DbBroker::new(store);
    broker.with_conn(actor, &format!("manage.{}.delete", spec.name), |conn| {
        let changed = conn.execute(&sql, [id])?;
        if changed == 0 {
            return Err(AquaError::NotFound(format!("{} row {}", spec.name, id)));
        }
        Ok(())
    })?;
    log::info!("{} row {} deleted by {}", spec.name, id, actor);
    Ok(())
}

fn cell_text(value: &Value) -> String {
    match ValueRef::from(value) {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(r) => format!("{:.2}", r),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

fn cell_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Integer(i) => serde_json::json!(i),
        Value::Real(r) => serde_json::json!(r),
        Value::Text(t) => serde_json::json!(t),
        Value::Blob(b) => serde_json::json!(b.len()),
    }
}

#[derive(Parser, Debug)]
#[clap(name = "manage", about = "Maintain reference tables and staff accounts")]
pub struct ManageCli {
    #[clap(subcommand)]
    pub command: ManageCommand,
}

#[derive(Subcommand, Debug)]
pub enum ManageCommand {
    Aquariums(TableCli),
    Seafood(TableCli),
    Users(TableCli),
    Fridges(TableCli),
    #[clap(name = "optimal-parameters")]
    OptimalParameters(TableCli),
    Readiness(TableCli),
    /// Create a staff account.
    UserAdd {
        /// Login of the new account.
        #[clap(long)]
        account: String,
        #[clap(long)]
        new_password: String,
        #[clap(long, default_value = "")]
        name: String,
        #[clap(long, default_value = "")]
        role: String,
        #[clap(long)]
        operational: bool,
        #[clap(long)]
        management: bool,
    },
    /// Reset a user's password.
    Passwd {
        #[clap(long)]
        account: String,
        #[clap(long)]
        new_password: String,
    },
}

#[derive(clap::Args, Debug)]
pub struct TableCli {
    #[clap(subcommand)]
    pub command: TableCommand,
}

#[derive(Subcommand, Debug)]
pub enum TableCommand {
    List,
    Add {
        #[clap(long = "set", value_name = "COLUMN=VALUE")]
        set: Vec<String>,
    },
    Update {
        #[clap(long)]
        id: i64,
        #[clap(long = "set", value_name = "COLUMN=VALUE")]
        set: Vec<String>,
    },
    Delete {
        #[clap(long)]
        id: i64,
    },
}

fn print_ok(cmd: &str, format: OutputFormat, extra: serde_json::Value, text: String) -> Result<(), AquaError> {
    match format {
        OutputFormat::Json => {
            let env = time::command_envelope(cmd, "ok", extra);
            println!("{}", serde_json::to_string_pretty(&env)?);
        }
        OutputFormat::Text => println!("{}", text),
    }
    Ok(())
}

fn run_table_cli(
    store: &Store,
    user: &User,
    format: OutputFormat,
    spec: &TableSpec,
    cli: TableCli,
) -> Result<(), AquaError> {
    let actor = user.login.as_str();
    match cli.command {
        TableCommand::List => {
            let listing = list_rows(store, actor, spec)?;
            match format {
                OutputFormat::Json => {
                    let rows: Vec<serde_json::Value> = listing
                        .rows
                        .iter()
                        .map(|row| {
                            let obj: serde_json::Map<String, serde_json::Value> = listing
                                .headers
                                .iter()
                                .cloned()
                                .zip(row.iter().map(cell_json))
                                .collect();
                            serde_json::Value::Object(obj)
                        })
                        .collect();
                    let env = time::command_envelope(
                        &format!("manage.{}.list", spec.name),
                        "ok",
                        serde_json::json!({ "rows": rows }),
                    );
                    println!("{}", serde_json::to_string_pretty(&env)?);
                }
                OutputFormat::Text => {
                    let headers: Vec<&str> = listing.headers.iter().map(String::as_str).collect();
                    let cells: Vec<Vec<String>> = listing
                        .rows
                        .iter()
                        .map(|row| row.iter().map(cell_text).collect())
                        .collect();
                    println!("{}", output::render_table(&headers, &cells));
                }
            }
        }
        TableCommand::Add { set } => {
            let id = add_row(store, actor, spec, &set)?;
            print_ok(
                &format!("manage.{}.add", spec.name),
                format,
                serde_json::json!({ "id": id }),
                format!("Added {} row {}", spec.name, id),
            )?;
        }
        TableCommand::Update { id, set } => {
            update_row(store, actor, spec, id, &set)?;
            print_ok(
                &format!("manage.{}.update", spec.name),
                format,
                serde_json::json!({ "id": id }),
                format!("Updated {} row {}", spec.name, id),
            )?;
        }
        TableCommand::Delete { id } => {
            delete_row(store, actor, spec, id)?;
            print_ok(
                &format!("manage.{}.delete", spec.name),
                format,
                serde_json::json!({ "id": id }),
                format!("Deleted {} row {}", spec.name, id),
            )?;
        }
    }
    Ok(())
}

pub fn run_manage_cli(
    store: &Store,
    user: &User,
    format: OutputFormat,
    cli: ManageCli,
) -> Result<(), AquaError> {
    user.require(View::Management)?;
    let (table, table_cli) = match cli.command {
        ManageCommand::Aquariums(c) => ("aquariums", c),
        ManageCommand::Seafood(c) => ("seafood", c),
        ManageCommand::Users(c) => ("users", c),
        ManageCommand::Fridges(c) => ("fridges", c),
        ManageCommand::OptimalParameters(c) => ("optimal-parameters", c),
        ManageCommand::Readiness(c) => ("readiness", c),
        ManageCommand::UserAdd {
            account,
            new_password,
            name,
            role,
            operational,
            management,
        } => {
            let id = auth::create_user(
                store,
                &user.login,
                &NewUser {
                    name,
                    role,
                    login: account.clone(),
                    password: new_password,
                    is_operational: operational,
                    is_management: management,
                },
            )?;
            return print_ok(
                "manage.user_add",
                format,
                serde_json::json!({ "id": id, "login": account }),
                format!("Created user {} ({})", account, id),
            );
        }
        ManageCommand::Passwd { account, new_password } => {
            auth::set_password(store, &user.login, &account, &new_password)?;
            return print_ok(
                "manage.passwd",
                format,
                serde_json::json!({ "login": account }),
                format!("Password updated for {}", account),
            );
        }
    };
    run_table_cli(store, user, format, table_spec(table)?, table_cli)
}
