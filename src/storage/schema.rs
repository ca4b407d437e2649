//! Database schema definitions

/// Database schema version, stored in `PRAGMA user_version`.
/// Bumping it wipes and recreates every table on next open.
pub const SCHEMA_VERSION: i64 = 2;

/// SQL for creating the downloaded versions table
pub const CREATE_VERSIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS bible_versions (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    language TEXT NOT NULL,
    abbreviation TEXT NOT NULL,
    description TEXT NOT NULL,
    last_downloaded INTEGER NOT NULL,
    total_verses INTEGER NOT NULL
);
"#;

/// SQL for creating the flat verses table
pub const CREATE_VERSES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS verses (
    version_id TEXT NOT NULL,
    book TEXT NOT NULL,
    book_index INTEGER NOT NULL CHECK (book_index >= 0),
    chapter_number INTEGER NOT NULL CHECK (chapter_number >= 1),
    verse_number INTEGER NOT NULL CHECK (verse_number >= 1),
    text TEXT NOT NULL,
    PRIMARY KEY (version_id, book_index, chapter_number, verse_number)
);
"#;

/// SQL for creating the handwritten notes table
pub const CREATE_NOTES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS handwritten_notes (
    version_id TEXT NOT NULL,
    book TEXT NOT NULL,
    chapter INTEGER NOT NULL,
    verse INTEGER NOT NULL DEFAULT 0,
    strokes TEXT NOT NULL,
    updated_at INTEGER NOT NULL,
    PRIMARY KEY (version_id, book, chapter, verse)
);
"#;

/// Index backing chapter lookups by book name
pub const CREATE_VERSES_INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_verses_chapter ON verses(version_id, book, chapter_number);
"#;

/// Tables dropped on a destructive schema upgrade
pub const ALL_TABLES: &[&str] = &["bible_versions", "verses", "handwritten_notes"];
