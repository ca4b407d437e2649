//! Handwritten notes
//!
//! A note is an ordered list of freehand strokes attached to a chapter (verse 0)
//! or a single verse. Strokes are stored as a JSON array:
//!
//! ```json
//! [{"color": 4278190080, "strokeWidth": 4.0, "points": [{"x": 1.0, "y": 2.0}]}]
//! ```

use crate::error::Result;
use crate::storage::records::{NoteKey, NoteRecord};
use serde::{Deserialize, Serialize};

/// A point on the drawing canvas
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DrawPoint {
    pub x: f32,
    pub y: f32,
}

impl DrawPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// One continuous ink path
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Stroke {
    /// ARGB color
    pub color: i64,
    pub stroke_width: f32,
    pub points: Vec<DrawPoint>,
}

/// Strokes attached to a location
#[derive(Debug, Clone, PartialEq)]
pub struct HandwrittenNote {
    pub key: NoteKey,
    pub strokes: Vec<Stroke>,

    /// Unix timestamp in milliseconds; refreshed on save
    pub updated_at: i64,
}

impl HandwrittenNote {
    pub fn new(key: NoteKey, strokes: Vec<Stroke>) -> Self {
        Self {
            key,
            strokes,
            updated_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Human readable location, e.g. `John 3` or `John 3:16`
    pub fn reference(&self) -> String {
        if self.key.verse == 0 {
            format!("{} {}", self.key.book, self.key.chapter)
        } else {
            format!("{} {}:{}", self.key.book, self.key.chapter, self.key.verse)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    /// Serialize for storage, stamping `updated_at`
    pub fn to_record(&self, updated_at: i64) -> Result<NoteRecord> {
        Ok(NoteRecord {
            key: self.key.clone(),
            strokes: encode_strokes(&self.strokes)?,
            updated_at,
        })
    }

    pub fn from_record(record: NoteRecord) -> Result<Self> {
        Ok(Self {
            strokes: decode_strokes(&record.strokes)?,
            key: record.key,
            updated_at: record.updated_at,
        })
    }
}

pub fn encode_strokes(strokes: &[Stroke]) -> Result<String> {
    Ok(serde_json::to_string(strokes)?)
}

/// An empty or blank payload is an empty note
pub fn decode_strokes(payload: &str) -> Result<Vec<Stroke>> {
    if payload.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(payload)?)
}
