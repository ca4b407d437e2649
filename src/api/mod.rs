//! API layer for notes-bible
//!
//! This module provides the interfaces the presentation layer observes and
//! commands: the offline-first repository, the version list, reading sessions
//! and note editing sessions.

pub mod models;
pub mod note;
pub mod reader;
pub mod repository;
pub mod versions;

// Re-export main API types
pub use models::{BibleVersion, BookSummary, Verse};
pub use note::{NoteSession, NoteState};
pub use reader::{ReaderSelection, ReaderSession, ReaderState};
pub use repository::{DownloadStatus, DownloadStream, OfflineFirstRepository};
pub use versions::{VersionItem, VersionListModel};
