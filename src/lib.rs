//! # notes-bible
//!
//! Offline-first Bible reader core with handwritten notes. Versions are
//! downloaded once as JSON, flattened into an embedded SQLite store and read
//! back through live queries that re-emit whenever the underlying rows change.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use notes_bible::{AppContainer, Config, DownloadStatus};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let app = AppContainer::new(Config::default())?;
//!
//!     // Download a version, following its progress
//!     let mut statuses = app.repository().download_version("en_kjv")?;
//!     while let Some(status) = statuses.next().await {
//!         if let DownloadStatus::Success(verses) = status {
//!             println!("Stored {} verses", verses);
//!         }
//!     }
//!
//!     // Read a chapter
//!     let mut chapter = app.repository().observe_chapter("en_kjv", "Genesis", 1);
//!     if let Some(verses) = chapter.next().await {
//!         for verse in verses? {
//!             println!("{} {}", verse.verse_number, verse.text);
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

// Core modules
pub mod api;
pub mod app;
pub mod catalog;
pub mod config;
pub mod error;
pub mod notes;
pub mod remote;
pub mod storage;
pub mod text;

// Re-export main API types
pub use api::{
    BibleVersion, BookSummary, DownloadStatus, NoteSession, NoteState, OfflineFirstRepository,
    ReaderSession, ReaderState, Verse, VersionItem, VersionListModel,
};
pub use app::AppContainer;
pub use config::Config;
pub use error::{BibleError, Result};

// Re-export commonly used types
pub use notes::{DrawPoint, HandwrittenNote, Stroke};
pub use storage::{LiveQuery, LocalStore, NoteKey};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_imports() {
        // Ensure all major types can be imported
        let _config = Config::default();
        let _status = DownloadStatus::default();
    }
}
