use crate::core::broker::DbBroker;
use crate::core::error;
use crate::core::schemas;
use crate::core::store::Store;
use rusqlite::Connection;
use std::fs;
use std::time::Duration;

pub fn db_connect(db_path: &str, busy_timeout_secs: u64) -> Result<Connection, error::AquaError> {
    log::debug!("opening sqlite database {}", db_path);
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(Duration::from_secs(busy_timeout_secs))
        .map_err(error::AquaError::RusqliteError)?;
    conn.query_row("PRAGMA journal_mode=WAL;", [], |_| Ok(()))
        .map_err(error::AquaError::RusqliteError)?;
    conn.execute("PRAGMA foreign_keys=ON;", [])
        .map_err(error::AquaError::RusqliteError)?;
    Ok(conn)
}

/// Creates the data directory and every table the subsystems own.
pub fn initialize_store(store: &Store) -> Result<(), error::AquaError> {
    fs::create_dir_all(&store.root).map_err(error::AquaError::IoError)?;

    let broker = DbBroker::new(store);
    broker.with_conn("aquadesk", "store.init", |conn| {
        for (name, schema) in crate::subsystems::SCHEMAS {
            log::debug!("initializing {} schema", name);
            conn.execute_batch(schema)?;
        }
        conn.execute_batch(schemas::OBSERVATION_INDEXES)?;
        Ok(())
    })
}
