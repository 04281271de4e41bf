//! Staff accounts and role resolution.
//!
//! Passwords are stored as SHA-256 hex digests. A user may hold the
//! operational role, the management role, or both; the first view opened
//! after login follows the operational-first precedence of the desk.

use crate::core::broker::DbBroker;
use crate::core::error::AquaError;
use crate::core::store::Store;
use rusqlite::{OptionalExtension, params};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum View {
    Operational,
    Management,
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Operational => write!(f, "operational"),
            View::Management => write!(f, "management"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub user_id: i64,
    pub name: Option<String>,
    pub role: Option<String>,
    pub login: String,
    pub is_operational: bool,
    pub is_management: bool,
}

impl User {
    pub fn primary_view(&self) -> Option<View> {
        if self.is_operational {
            Some(View::Operational)
        } else if self.is_management {
            Some(View::Management)
        } else {
            None
        }
    }

    pub fn can_open(&self, view: View) -> bool {
        match view {
            View::Operational => self.is_operational,
            View::Management => self.is_management,
        }
    }

    /// Errors with `AuthError` unless the user holds `view`.
    pub fn require(&self, view: View) -> Result<(), AquaError> {
        if self.can_open(view) {
            Ok(())
        } else {
            Err(AquaError::AuthError(format!(
                "user '{}' has no {} role",
                self.login, view
            )))
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub role: String,
    pub login: String,
    pub password: String,
    pub is_operational: bool,
    pub is_management: bool,
}

pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn create_user(store: &Store, actor: &str, user: &NewUser) -> Result<i64, AquaError> {
    if user.login.trim().is_empty() {
        return Err(AquaError::ValidationError("login may not be empty".to_string()));
    }
    if user.password.is_empty() {
        return Err(AquaError::ValidationError("password may not be empty".to_string()));
    }

    let broker = DbBroker::new(store);
    broker.with_conn(actor, "auth.user_add", |conn| {
        let taken: Option<i64> = conn
            .query_row(
                "SELECT user_id FROM users WHERE login = ?1",
                params![user.login],
                |row| row.get(0),
            )
            .optional()?;
        if taken.is_some() {
            return Err(AquaError::ValidationError(format!(
                "login '{}' is already in use",
                user.login
            )));
        }
        conn.execute(
            "INSERT INTO users(name, role, login, password_hash, is_operational, is_management) VALUES(?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user.name,
                user.role,
                user.login,
                hash_password(&user.password),
                user.is_operational,
                user.is_management
            ],
        )?;
        let id = conn.last_insert_rowid();
        log::info!("created user {} ({})", user.login, id);
        Ok(id)
    })
}

pub fn set_password(store: &Store, actor: &str, login: &str, password: &str) -> Result<(), AquaError> {
    if password.is_empty() {
        return Err(AquaError::ValidationError("password may not be empty".to_string()));
    }
    let broker = DbBroker::new(store);
    broker.with_conn(actor, "auth.passwd", |conn| {
        let changed = conn.execute(
            "UPDATE users SET password_hash = ?1 WHERE login = ?2",
            params![hash_password(password), login],
        )?;
        if changed == 0 {
            return Err(AquaError::NotFound(format!("user '{}'", login)));
        }
        Ok(())
    })
}

/// Checks credentials. Unknown logins and wrong passwords fail the same way.
pub fn authenticate(store: &Store, login: &str, password: &str) -> Result<User, AquaError> {
    let broker = DbBroker::new(store);
    let found = broker.with_conn(login, "auth.login", |conn| {
        let row = conn
            .query_row(
                "SELECT user_id, name, role, login, password_hash, is_operational, is_management FROM users WHERE login = ?1",
                params![login],
                |row| {
                    Ok((
                        User {
                            user_id: row.get(0)?,
                            name: row.get(1)?,
                            role: row.get(2)?,
                            login: row.get(3)?,
                            is_operational: row.get(5)?,
                            is_management: row.get(6)?,
                        },
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;
        Ok(row)
    })?;

    match found {
        Some((user, stored_hash)) if stored_hash == hash_password(password) => Ok(user),
        _ => Err(AquaError::AuthError("Invalid login or password".to_string())),
    }
}

pub fn list_users(store: &Store, actor: &str) -> Result<Vec<User>, AquaError> {
    let broker = DbBroker::new(store);
    broker.with_conn(actor, "auth.user_list", |conn| {
        let mut stmt = conn.prepare(
            "SELECT user_id, name, role, login, is_operational, is_management FROM users ORDER BY user_id",
        )?;
        let users = stmt
            .query_map([], |row| {
                Ok(User {
                    user_id: row.get(0)?,
                    name: row.get(1)?,
                    role: row.get(2)?,
                    login: row.get(3)?,
                    is_operational: row.get(4)?,
                    is_management: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .map_err(AquaError::RusqliteError)?;
        Ok(users)
    })
}
