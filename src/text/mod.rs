//! Text processing for notes-bible
//!
//! This module turns downloaded Bible documents into flat verse records.

pub mod parser;

// Re-export main types
pub use parser::{BibleJsonParser, ParsedVerse};
