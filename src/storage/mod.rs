//! Storage functionality for notes-bible
//!
//! This module provides the embedded SQLite store, its schema and migrations,
//! and the invalidation bus that keeps live queries current.

pub mod database;
pub mod invalidation;
pub mod migrations;
pub mod records;
pub mod schema;
pub mod store;

// Re-export main types
pub use database::Database;
pub use invalidation::{Invalidation, InvalidationBus, QueryShape};
pub use records::{BookProjection, NoteKey, NoteRecord, VerseRecord, VersionRecord};
pub use store::{LiveQuery, LocalStore};
