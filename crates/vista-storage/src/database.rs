//! Database connection and operations

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;

use crate::migrations::run_migrations;
use crate::Result;

/// A persisted tab snapshot. `state` is opaque to storage.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredTab {
    pub name: String,
    pub title: String,
    pub state: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for better concurrent performance
        let _: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;

        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        self.with_connection(|conn| {
            let value = conn
                .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(value)
        })
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let updated_at = Utc::now().to_rfc3339();
        self.with_connection(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![key, value, updated_at],
            )?;
            Ok(())
        })?;

        Ok(())
    }

    /// Insert or replace the snapshot stored under `name`
    pub fn save_tab_state(&self, name: &str, title: &str, state: &serde_json::Value) -> Result<()> {
        let state_json = serde_json::to_string(state)?;
        let updated_at = Utc::now().to_rfc3339();

        self.with_connection(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO tab_states (name, title, state, updated_at)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![name, title, state_json, updated_at],
            )?;
            Ok(())
        })
    }

    pub fn load_tab_state(&self, name: &str) -> Result<Option<StoredTab>> {
        let row = self.with_connection(|conn| {
            let row = conn
                .query_row(
                    "SELECT name, title, state, updated_at FROM tab_states WHERE name = ?1",
                    [name],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, String>(3)?,
                        ))
                    },
                )
                .optional()?;
            Ok(row)
        })?;

        row.map(|(name, title, state, updated)| stored_tab(name, title, &state, &updated))
            .transpose()
    }

    pub fn list_tab_states(&self) -> Result<Vec<StoredTab>> {
        let rows = self.with_connection(|conn| {
            let mut stmt = conn
                .prepare("SELECT name, title, state, updated_at FROM tab_states ORDER BY name")?;

            let rows: Vec<(String, String, String, String)> = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)))?
                .filter_map(|r| r.ok())
                .collect();

            Ok(rows)
        })?;

        rows.into_iter()
            .map(|(name, title, state, updated)| stored_tab(name, title, &state, &updated))
            .collect()
    }

    /// Returns true if a snapshot was removed
    pub fn delete_tab_state(&self, name: &str) -> Result<bool> {
        self.with_connection(|conn| {
            let removed = conn.execute("DELETE FROM tab_states WHERE name = ?1", [name])?;
            Ok(removed > 0)
        })
    }
}

fn stored_tab(name: String, title: String, state: &str, updated: &str) -> Result<StoredTab> {
    let updated_at = DateTime::parse_from_rfc3339(updated)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());

    Ok(StoredTab {
        name,
        title,
        state: serde_json::from_str(state)?,
        updated_at,
    })
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
        }
    }
}
