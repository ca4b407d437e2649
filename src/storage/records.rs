//! Row types persisted by the local store

use crate::text::ParsedVerse;
use serde::{Deserialize, Serialize};

/// A downloaded version. Absence of a row means "not downloaded".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VersionRecord {
    pub id: String,
    pub name: String,
    pub language: String,
    pub abbreviation: String,
    pub description: String,

    /// Unix timestamp in milliseconds
    pub last_downloaded: i64,

    pub total_verses: u32,
}

/// One verse row, keyed by (version_id, book_index, chapter_number, verse_number)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerseRecord {
    pub version_id: String,
    pub book: String,
    pub book_index: u32,
    pub chapter_number: u32,
    pub verse_number: u32,
    pub text: String,
}

impl From<ParsedVerse> for VerseRecord {
    fn from(parsed: ParsedVerse) -> Self {
        Self {
            version_id: parsed.version_id,
            book: parsed.book,
            book_index: parsed.book_index,
            chapter_number: parsed.chapter_number,
            verse_number: parsed.verse_number,
            text: parsed.text,
        }
    }
}

/// Location a note is attached to. `verse == 0` is a whole-chapter note.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct NoteKey {
    pub version_id: String,
    pub book: String,
    pub chapter: u32,
    pub verse: u32,
}

impl NoteKey {
    pub fn new(version_id: impl Into<String>, book: impl Into<String>, chapter: u32, verse: u32) -> Self {
        Self {
            version_id: version_id.into(),
            book: book.into(),
            chapter,
            verse,
        }
    }

    /// Key for a note covering the whole chapter
    pub fn chapter(version_id: impl Into<String>, book: impl Into<String>, chapter: u32) -> Self {
        Self::new(version_id, book, chapter, 0)
    }
}

/// A stored note with its strokes still serialized
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NoteRecord {
    pub key: NoteKey,
    pub strokes: String,

    /// Unix timestamp in milliseconds
    pub updated_at: i64,
}

/// `GROUP BY book` projection over the verses table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookProjection {
    pub name: String,
    pub book_index: u32,
    pub chapter_count: u32,
}
