use crate::core::db;
use crate::core::error;
use crate::core::store::Store;
use crate::core::time;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

/// Every read and write of the record store goes through the broker, which
/// serializes access in-process and appends one audit event per operation.
pub struct DbBroker {
    db_path: PathBuf,
    audit_log_path: PathBuf,
    busy_timeout_secs: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BrokerEvent {
    pub ts: String,
    pub event_id: String,
    pub actor: String,
    pub op: String,
    pub db_id: String,
    pub status: String,
}

impl DbBroker {
    pub fn new(store: &Store) -> Self {
        Self {
            db_path: store.db_path(),
            audit_log_path: store.audit_log_path(),
            busy_timeout_secs: store.config.database.busy_timeout_secs,
        }
    }

    /// Execute a closure with a serialized connection to the record store.
    pub fn with_conn<F, R>(&self, actor: &str, op_name: &str, f: F) -> Result<R, error::AquaError>
    where
        F: FnOnce(&Connection) -> Result<R, error::AquaError>,
    {
        static DB_LOCK: Mutex<()> = Mutex::new(());
        let _lock = DB_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let db_id = self
            .db_path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let conn = db::db_connect(&self.db_path.to_string_lossy(), self.busy_timeout_secs)?;

        let result = f(&conn);

        let status = if result.is_ok() { "success" } else { "error" };
        self.log_event(actor, op_name, &db_id, status)?;

        result
    }

    fn log_event(&self, actor: &str, op: &str, db_id: &str, status: &str) -> Result<(), error::AquaError> {
        let ev = BrokerEvent {
            ts: time::now_epoch_z(),
            event_id: time::new_event_id(),
            actor: actor.to_string(),
            op: op.to_string(),
            db_id: db_id.to_string(),
            status: status.to_string(),
        };

        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.audit_log_path)
            .map_err(error::AquaError::IoError)?;

        writeln!(f, "{}", serde_json::to_string(&ev)?).map_err(error::AquaError::IoError)?;
        Ok(())
    }
}

/// Reads the audit log, oldest event first. A missing log is empty.
pub fn read_audit_log(store: &Store) -> Result<Vec<BrokerEvent>, error::AquaError> {
    let path = store.audit_log_path();
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(&path).map_err(error::AquaError::IoError)?;
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(error::AquaError::SerializationError))
        .collect()
}
