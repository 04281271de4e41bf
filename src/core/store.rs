//! Store handle for the aquadesk data directory.
//!
//! A store is the `.aquadesk/` directory of a site: the SQLite record file,
//! the broker audit log and the optional `config.toml`.

use crate::core::config::Config;
use crate::core::error::AquaError;
use crate::core::schemas;
use std::path::{Path, PathBuf};

/// Name of the per-site data directory.
pub const DATA_DIR_NAME: &str = ".aquadesk";

#[derive(Debug, Clone)]
pub struct Store {
    /// Absolute path to the `.aquadesk` directory.
    pub root: PathBuf,
    pub config: Config,
}

impl Store {
    /// Opens the store at `root`, loading `config.toml` when present.
    pub fn open(root: &Path) -> Result<Self, AquaError> {
        let config = Config::load(root)?;
        Ok(Self {
            root: root.to_path_buf(),
            config,
        })
    }

    /// Walks up from `start_dir` looking for a `.aquadesk` directory.
    pub fn discover(start_dir: &Path) -> Result<Self, AquaError> {
        let mut current_dir = PathBuf::from(start_dir);
        loop {
            let candidate = current_dir.join(DATA_DIR_NAME);
            if candidate.is_dir() {
                return Self::open(&candidate);
            }
            if !current_dir.pop() {
                return Err(AquaError::NotFound(
                    "'.aquadesk' directory not found in current or parent directories. Run `aquadesk init` first.".to_string(),
                ));
            }
        }
    }

    pub fn db_path(&self) -> PathBuf {
        let file = if self.config.database.file.trim().is_empty() {
            schemas::DEFAULT_DB_NAME
        } else {
            self.config.database.file.as_str()
        };
        self.root.join(file)
    }

    pub fn audit_log_path(&self) -> PathBuf {
        self.root.join(schemas::AUDIT_LOG_NAME)
    }
}
