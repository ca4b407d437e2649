//! Database migrations
//!
//! Content is always re-downloadable, so schema upgrades are destructive: any
//! stored schema version other than the current one drops and recreates every
//! table. Handwritten notes are lost in that case.

use crate::error::{BibleError, Result};
use crate::storage::schema::*;
use rusqlite::Connection;

/// Outcome of bringing a database to the current schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// Fresh database, tables created
    Created,
    /// Schema already current
    UpToDate,
    /// Older or newer schema found and wiped
    Recreated { from: i64 },
}

/// Database migration manager
#[derive(Debug, Clone, Copy, Default)]
pub struct MigrationManager;

impl MigrationManager {
    pub fn new() -> Self {
        Self
    }

    /// Bring the connection's schema to `SCHEMA_VERSION`
    pub fn run_migrations(&self, conn: &mut Connection) -> Result<MigrationOutcome> {
        let current = Self::current_version(conn)?;

        let outcome = match current {
            0 => {
                log::info!("Creating database schema version {}", SCHEMA_VERSION);
                MigrationOutcome::Created
            }
            v if v == SCHEMA_VERSION => MigrationOutcome::UpToDate,
            v => {
                log::warn!(
                    "Schema version {} does not match {}, recreating all tables (stored notes are discarded)",
                    v,
                    SCHEMA_VERSION
                );
                MigrationOutcome::Recreated { from: v }
            }
        };

        let tx = conn
            .transaction()
            .map_err(|e| BibleError::Storage(format!("Failed to start migration: {}", e)))?;

        if let MigrationOutcome::Recreated { .. } = outcome {
            for table in ALL_TABLES {
                tx.execute_batch(&format!("DROP TABLE IF EXISTS {};", table))
                    .map_err(|e| {
                        BibleError::Storage(format!("Failed to drop table {}: {}", table, e))
                    })?;
            }
        }

        for (name, sql) in [
            ("bible_versions", CREATE_VERSIONS_TABLE),
            ("verses", CREATE_VERSES_TABLE),
            ("handwritten_notes", CREATE_NOTES_TABLE),
            ("verse indexes", CREATE_VERSES_INDEXES),
        ] {
            tx.execute_batch(sql)
                .map_err(|e| BibleError::Storage(format!("Failed to create {}: {}", name, e)))?;
        }

        tx.pragma_update(None, "user_version", SCHEMA_VERSION)
            .map_err(|e| BibleError::Storage(format!("Failed to set schema version: {}", e)))?;

        tx.commit()
            .map_err(|e| BibleError::Storage(format!("Failed to commit migration: {}", e)))?;

        Ok(outcome)
    }

    /// Schema version recorded in the database file (0 for a new file)
    pub fn current_version(conn: &Connection) -> Result<i64> {
        conn.pragma_query_value(None, "user_version", |row| row.get(0))
            .map_err(|e| BibleError::Storage(format!("Failed to read schema version: {}", e)))
    }
}
