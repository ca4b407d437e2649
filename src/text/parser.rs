//! Bible JSON parsing
//!
//! Turns a downloaded Bible document into flat verse rows. The expected shape is
//! an array of books, each with a `chapters` array of verse-text arrays:
//!
//! ```json
//! [{"book": "Genesis", "chapters": [["In the beginning...", "And the earth..."]]}]
//! ```
//!
//! Every nesting level is best-effort. Anything that does not match is skipped or
//! replaced by a fallback; parsing never fails.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One flattened verse, in document traversal order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParsedVerse {
    pub version_id: String,
    pub book: String,

    /// 0-based position of the book in the document array
    pub book_index: u32,

    /// 1-based position within the book's chapters
    pub chapter_number: u32,

    /// 1-based position within the chapter
    pub verse_number: u32,

    pub text: String,
}

/// Stateless parser for Bible JSON payloads
#[derive(Debug, Clone, Default)]
pub struct BibleJsonParser;

impl BibleJsonParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse raw JSON text into verses for `version_id`.
    ///
    /// Returns an empty list when the text is not JSON or its top level is not an
    /// array.
    pub fn parse(&self, version_id: &str, raw_json: &str) -> Vec<ParsedVerse> {
        let books = match serde_json::from_str::<Value>(raw_json) {
            Ok(Value::Array(books)) => books,
            Ok(_) => {
                log::debug!("Payload for {} is not a JSON array, nothing to parse", version_id);
                return Vec::new();
            }
            Err(e) => {
                log::debug!("Payload for {} is not valid JSON: {}", version_id, e);
                return Vec::new();
            }
        };

        let mut verses = Vec::new();

        for (book_index, book_value) in books.iter().enumerate() {
            let Some(book) = book_value.as_object() else {
                continue;
            };
            let Some(chapters) = book.get("chapters").and_then(Value::as_array) else {
                continue;
            };

            let book_index = book_index as u32;
            let book_name = book_name(book, book_index);

            for (chapter_index, chapter_value) in chapters.iter().enumerate() {
                let Some(chapter) = chapter_value.as_array() else {
                    continue;
                };

                for (verse_index, verse_value) in chapter.iter().enumerate() {
                    verses.push(ParsedVerse {
                        version_id: version_id.to_string(),
                        book: book_name.clone(),
                        book_index,
                        chapter_number: chapter_index as u32 + 1,
                        verse_number: verse_index as u32 + 1,
                        text: verse_text(verse_value),
                    });
                }
            }
        }

        verses
    }
}

/// `book`, then `name`, then a positional placeholder
fn book_name(book: &Map<String, Value>, book_index: u32) -> String {
    ["book", "name"]
        .iter()
        .filter_map(|key| book.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Book {}", book_index + 1))
}

fn verse_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.trim().to_string(),
        other => other.to_string().trim().to_string(),
    }
}
