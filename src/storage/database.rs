//! SQLite database operations for notes-bible
//!
//! This module owns the connection and every query against the local tables.
//! It is synchronous; [`crate::storage::LocalStore`] drives it from async code.

use crate::config::DatabaseConfig;
use crate::error::{BibleError, Result};
use crate::storage::migrations::MigrationManager;
use crate::storage::records::*;
use rusqlite::types::ToSql;
use rusqlite::{Connection, OptionalExtension, Row, Transaction, params};
use std::time::Duration;

const VERSE_COLUMNS: usize = 6;

/// Database connection and operations
pub struct Database {
    conn: Connection,
    insert_batch_size: usize,
}

impl Database {
    /// Open (or create) the database described by `config`
    pub fn open(config: &DatabaseConfig) -> Result<Self> {
        let conn = Connection::open(&config.path).map_err(|e| {
            BibleError::Storage(format!(
                "Failed to open database {}: {}",
                config.path.display(),
                e
            ))
        })?;

        let mut db = Self {
            conn,
            insert_batch_size: config.insert_batch_size.max(1),
        };
        db.initialize(config)?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    pub fn memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            BibleError::Storage(format!("Failed to create in-memory database: {}", e))
        })?;

        let config = DatabaseConfig::default();
        let mut db = Self {
            conn,
            insert_batch_size: config.insert_batch_size,
        };
        db.initialize(&config)?;
        Ok(db)
    }

    /// Override the multi-row insert chunk size
    pub fn with_insert_batch_size(mut self, size: usize) -> Self {
        self.insert_batch_size = size.max(1);
        self
    }

    fn initialize(&mut self, config: &DatabaseConfig) -> Result<()> {
        // In-memory databases answer "memory" here, which is fine
        let _: String = self
            .conn
            .query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))
            .map_err(|e| BibleError::Storage(format!("Failed to enable WAL mode: {}", e)))?;

        self.conn
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
            .map_err(|e| BibleError::Storage(format!("Failed to set busy timeout: {}", e)))?;

        let outcome = MigrationManager::new().run_migrations(&mut self.conn)?;
        log::info!("Database ready ({:?})", outcome);
        Ok(())
    }

    // ----- versions -----

    /// All downloaded versions ordered by (language, name)
    pub fn get_versions(&self) -> Result<Vec<VersionRecord>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, name, language, abbreviation, description, last_downloaded, total_verses
             FROM bible_versions ORDER BY language, name",
        )?;

        let rows = stmt.query_map([], row_to_version)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| BibleError::Storage(format!("Failed to read versions: {}", e)))
    }

    pub fn find_version(&self, id: &str) -> Result<Option<VersionRecord>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, name, language, abbreviation, description, last_downloaded, total_verses
             FROM bible_versions WHERE id = ? LIMIT 1",
        )?;

        let version = stmt
            .query_row(params![id], row_to_version)
            .optional()
            .map_err(|e| BibleError::Storage(format!("Failed to query version {}: {}", id, e)))?;
        Ok(version)
    }

    /// Insert or replace a version row by id
    pub fn upsert_version(&self, record: &VersionRecord) -> Result<()> {
        upsert_version_in(&self.conn, record)
    }

    /// Delete a version row; verses are left alone
    pub fn delete_version(&self, id: &str) -> Result<usize> {
        let deleted = self
            .conn
            .execute("DELETE FROM bible_versions WHERE id = ?", params![id])?;
        Ok(deleted)
    }

    // ----- verses -----

    /// Insert or replace verses in chunks, inside one transaction
    pub fn insert_verses(&mut self, verses: &[VerseRecord]) -> Result<usize> {
        let batch_size = self.insert_batch_size;
        let tx = self.begin()?;
        let inserted = insert_verses_in(&tx, verses, batch_size)?;
        commit(tx)?;
        Ok(inserted)
    }

    pub fn delete_verses_for_version(&self, version_id: &str) -> Result<usize> {
        let deleted = self
            .conn
            .execute("DELETE FROM verses WHERE version_id = ?", params![version_id])
            .map_err(|e| {
                BibleError::Storage(format!("Failed to delete verses for {}: {}", version_id, e))
            })?;
        Ok(deleted)
    }

    pub fn count_verses(&self, version_id: &str) -> Result<u32> {
        let count: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM verses WHERE version_id = ?",
            params![version_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Replace every verse of `version.id` and its version row in one transaction.
    ///
    /// Either the old verses and record survive untouched or the new ones are
    /// fully visible; nothing in between is ever committed.
    pub fn replace_version(&mut self, version: &VersionRecord, verses: &[VerseRecord]) -> Result<usize> {
        let batch_size = self.insert_batch_size;
        let tx = self.begin()?;

        let removed = tx
            .execute("DELETE FROM verses WHERE version_id = ?", params![version.id])
            .map_err(|e| {
                BibleError::Storage(format!("Failed to delete verses for {}: {}", version.id, e))
            })?;

        let inserted = insert_verses_in(&tx, verses, batch_size)?;
        upsert_version_in(&tx, version)?;
        commit(tx)?;

        log::info!(
            "Replaced {} verses of {} with {}",
            removed,
            version.id,
            inserted
        );
        Ok(inserted)
    }

    /// Books of a version with their chapter counts, ordered by document position
    pub fn books_summary(&self, version_id: &str) -> Result<Vec<BookProjection>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT book, book_index, MAX(chapter_number)
             FROM verses
             WHERE version_id = ?
             GROUP BY book, book_index
             ORDER BY book_index",
        )?;

        let rows = stmt.query_map(params![version_id], |row| {
            Ok(BookProjection {
                name: row.get(0)?,
                book_index: row.get(1)?,
                chapter_count: row.get(2)?,
            })
        })?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| BibleError::Storage(format!("Failed to summarize books: {}", e)))
    }

    /// Verses of one chapter ordered by verse number
    pub fn chapter(&self, version_id: &str, book: &str, chapter: u32) -> Result<Vec<VerseRecord>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT version_id, book, book_index, chapter_number, verse_number, text
             FROM verses
             WHERE version_id = ? AND book = ? AND chapter_number = ?
             ORDER BY verse_number",
        )?;

        let rows = stmt.query_map(params![version_id, book, chapter], row_to_verse)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(|e| {
            BibleError::Storage(format!("Failed to read {} {} ({}): {}", book, chapter, version_id, e))
        })
    }

    // ----- notes -----

    pub fn note(&self, key: &NoteKey) -> Result<Option<NoteRecord>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT strokes, updated_at FROM handwritten_notes
             WHERE version_id = ? AND book = ? AND chapter = ? AND verse = ?
             LIMIT 1",
        )?;

        let note = stmt
            .query_row(params![key.version_id, key.book, key.chapter, key.verse], |row| {
                Ok(NoteRecord {
                    key: key.clone(),
                    strokes: row.get(0)?,
                    updated_at: row.get(1)?,
                })
            })
            .optional()
            .map_err(|e| BibleError::Storage(format!("Failed to query note: {}", e)))?;
        Ok(note)
    }

    /// Insert or replace a note by its location key
    pub fn upsert_note(&self, note: &NoteRecord) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO handwritten_notes (version_id, book, chapter, verse, strokes, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
                params![
                    note.key.version_id,
                    note.key.book,
                    note.key.chapter,
                    note.key.verse,
                    note.strokes,
                    note.updated_at,
                ],
            )
            .map_err(|e| BibleError::Storage(format!("Failed to save note: {}", e)))?;
        Ok(())
    }

    fn begin(&mut self) -> Result<Transaction<'_>> {
        self.conn
            .transaction()
            .map_err(|e| BibleError::Storage(format!("Failed to start transaction: {}", e)))
    }

    #[cfg(test)]
    pub(crate) fn execute_raw(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }
}

fn commit(tx: Transaction<'_>) -> Result<()> {
    tx.commit()
        .map_err(|e| BibleError::Storage(format!("Failed to commit transaction: {}", e)))
}

fn upsert_version_in(conn: &Connection, record: &VersionRecord) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO bible_versions
            (id, name, language, abbreviation, description, last_downloaded, total_verses)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
        params![
            record.id,
            record.name,
            record.language,
            record.abbreviation,
            record.description,
            record.last_downloaded,
            record.total_verses,
        ],
    )
    .map_err(|e| BibleError::Storage(format!("Failed to upsert version {}: {}", record.id, e)))?;
    Ok(())
}

/// Multi-row `INSERT OR REPLACE` in chunks of `batch_size` rows
fn insert_verses_in(conn: &Connection, verses: &[VerseRecord], batch_size: usize) -> Result<usize> {
    let mut inserted = 0;

    for batch in verses.chunks(batch_size.max(1)) {
        let mut stmt = conn.prepare_cached(&insert_sql(batch.len()))?;

        let mut values: Vec<&dyn ToSql> = Vec::with_capacity(batch.len() * VERSE_COLUMNS);
        for verse in batch {
            values.push(&verse.version_id);
            values.push(&verse.book);
            values.push(&verse.book_index);
            values.push(&verse.chapter_number);
            values.push(&verse.verse_number);
            values.push(&verse.text);
        }

        inserted += stmt.execute(values.as_slice()).map_err(|e| {
            BibleError::Storage(format!(
                "Failed to insert verse batch at offset {}: {}",
                inserted, e
            ))
        })?;
    }

    Ok(inserted)
}

fn insert_sql(rows: usize) -> String {
    let row = "(?, ?, ?, ?, ?, ?)";
    let mut sql = String::from(
        "INSERT OR REPLACE INTO verses (version_id, book, book_index, chapter_number, verse_number, text) VALUES ",
    );
    sql.push_str(&vec![row; rows].join(", "));
    sql
}

fn row_to_version(row: &Row) -> rusqlite::Result<VersionRecord> {
    Ok(VersionRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        language: row.get(2)?,
        abbreviation: row.get(3)?,
        description: row.get(4)?,
        last_downloaded: row.get(5)?,
        total_verses: row.get(6)?,
    })
}

fn row_to_verse(row: &Row) -> rusqlite::Result<VerseRecord> {
    Ok(VerseRecord {
        version_id: row.get(0)?,
        book: row.get(1)?,
        book_index: row.get(2)?,
        chapter_number: row.get(3)?,
        verse_number: row.get(4)?,
        text: row.get(5)?,
    })
}
