//! Read-model projections handed to the presentation layer

use crate::catalog::VersionDefinition;
use crate::storage::records::{BookProjection, VerseRecord, VersionRecord};
use serde::{Deserialize, Serialize};

/// A catalog entry joined with its local download state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BibleVersion {
    pub id: String,
    pub name: String,
    pub language: String,
    pub abbreviation: String,
    pub description: String,
    pub is_downloaded: bool,
    pub total_verses: u32,
    pub last_downloaded_at: Option<i64>,
}

impl BibleVersion {
    pub fn from_catalog(definition: &VersionDefinition, local: Option<&VersionRecord>) -> Self {
        Self {
            id: definition.id.to_string(),
            name: definition.name.to_string(),
            language: definition.language.to_string(),
            abbreviation: definition.abbreviation.to_string(),
            description: definition.description.to_string(),
            is_downloaded: local.is_some(),
            total_verses: local.map(|r| r.total_verses).unwrap_or(0),
            last_downloaded_at: local.map(|r| r.last_downloaded),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookSummary {
    pub name: String,
    pub book_index: u32,
    pub chapter_count: u32,
}

impl From<BookProjection> for BookSummary {
    fn from(projection: BookProjection) -> Self {
        Self {
            name: projection.name,
            book_index: projection.book_index,
            chapter_count: projection.chapter_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Verse {
    pub verse_number: u32,
    pub text: String,
}

impl From<VerseRecord> for Verse {
    fn from(record: VerseRecord) -> Self {
        Self {
            verse_number: record.verse_number,
            text: record.text,
        }
    }
}
