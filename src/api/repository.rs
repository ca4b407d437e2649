//! OfflineFirstRepository - the core API consumed by the presentation layer
//!
//! The network is only a bulk import source. Everything readable (versions,
//! books, chapters, notes) comes from the local store as live queries, and a
//! download lands as one atomic replace that those queries pick up.

use crate::api::models::{BibleVersion, BookSummary, Verse};
use crate::catalog::Catalog;
use crate::error::{BibleError, Result};
use crate::notes::HandwrittenNote;
use crate::remote::BibleApi;
use crate::storage::{LiveQuery, LocalStore, NoteKey, VerseRecord, VersionRecord};
use crate::text::BibleJsonParser;
use futures::StreamExt;
use futures::stream::BoxStream;
use std::collections::HashMap;
use std::sync::Arc;

/// Progress reported once the download starts
pub const PROGRESS_STARTED: f32 = 0.0;
/// Progress reported once the payload has been fetched
pub const PROGRESS_FETCHED: f32 = 0.45;
/// Progress reported once the payload has been parsed
pub const PROGRESS_PARSED: f32 = 0.75;
/// Progress reported once the store has committed
pub const PROGRESS_COMMITTED: f32 = 1.0;

/// Status of one download invocation
#[derive(Debug, Clone, Default)]
pub enum DownloadStatus {
    /// Nothing started for this version
    #[default]
    Idle,
    InProgress(f32),
    /// Terminal: number of verse rows committed
    Success(usize),
    /// Terminal: the store is unchanged
    Error(Arc<BibleError>),
}

impl DownloadStatus {
    pub fn is_in_progress(&self) -> bool {
        matches!(self, DownloadStatus::InProgress(_))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DownloadStatus::Success(_) | DownloadStatus::Error(_))
    }
}

/// Ordered status events of one download
pub type DownloadStream = BoxStream<'static, DownloadStatus>;

/// Offline-first repository over the local store and a fetch client
#[derive(Clone)]
pub struct OfflineFirstRepository {
    api: Arc<dyn BibleApi>,
    parser: BibleJsonParser,
    store: LocalStore,
    catalog: Arc<Catalog>,
}

impl OfflineFirstRepository {
    pub fn new(api: Arc<dyn BibleApi>, store: LocalStore, catalog: Catalog) -> Self {
        Self {
            api,
            parser: BibleJsonParser::new(),
            store,
            catalog: Arc::new(catalog),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    /// Every catalog entry, in catalog order, with its download state
    pub fn observe_available_versions(&self) -> LiveQuery<Vec<BibleVersion>> {
        let catalog = Arc::clone(&self.catalog);
        self.store
            .observe_versions()
            .map(move |records| {
                records.map(|records| {
                    let local: HashMap<&str, &VersionRecord> =
                        records.iter().map(|r| (r.id.as_str(), r)).collect();
                    catalog
                        .versions()
                        .iter()
                        .map(|definition| {
                            BibleVersion::from_catalog(definition, local.get(definition.id).copied())
                        })
                        .collect::<Vec<_>>()
                })
            })
            .boxed()
    }

    /// Download, parse and atomically store a version.
    ///
    /// An id outside the catalog is rejected here, before any event. Every later
    /// failure ends the stream with [`DownloadStatus::Error`] and leaves the store
    /// as it was. Events, in order: `InProgress(0.0)`, `InProgress(0.45)`,
    /// `InProgress(0.75)`, `InProgress(1.0)`, `Success(n)`.
    pub fn download_version(&self, version_id: &str) -> Result<DownloadStream> {
        let definition = self
            .catalog
            .find(version_id)
            .cloned()
            .ok_or_else(|| BibleError::UnsupportedVersion(version_id.to_string()))?;

        let api = Arc::clone(&self.api);
        let parser = self.parser.clone();
        let store = self.store.clone();

        Ok(async_stream::stream! {
            yield DownloadStatus::InProgress(PROGRESS_STARTED);

            let raw = match api.download_version(definition.download_url).await {
                Ok(raw) => raw,
                Err(e) => {
                    log::error!("Download of {} failed: {}", definition.id, e);
                    yield DownloadStatus::Error(Arc::new(e));
                    return;
                }
            };
            yield DownloadStatus::InProgress(PROGRESS_FETCHED);

            let verses: Vec<VerseRecord> = parser
                .parse(definition.id, &raw)
                .into_iter()
                .map(VerseRecord::from)
                .collect();
            drop(raw);
            if verses.is_empty() {
                log::warn!("Payload for {} parsed to zero verses, committing an empty version", definition.id);
            }
            yield DownloadStatus::InProgress(PROGRESS_PARSED);

            let record = VersionRecord {
                id: definition.id.to_string(),
                name: definition.name.to_string(),
                language: definition.language.to_string(),
                abbreviation: definition.abbreviation.to_string(),
                description: definition.description.to_string(),
                last_downloaded: chrono::Utc::now().timestamp_millis(),
                total_verses: verses.len() as u32,
            };

            let inserted = match store.replace_version(record, verses).await {
                Ok(inserted) => inserted,
                Err(e) => {
                    log::error!("Storing {} failed, previous data kept: {}", definition.id, e);
                    yield DownloadStatus::Error(Arc::new(e));
                    return;
                }
            };

            log::info!("Downloaded {} ({} verses)", definition.id, inserted);
            yield DownloadStatus::InProgress(PROGRESS_COMMITTED);
            yield DownloadStatus::Success(inserted);
        }
        .boxed())
    }

    /// Books of a downloaded version, ordered by document position
    pub fn observe_books(&self, version_id: &str) -> LiveQuery<Vec<BookSummary>> {
        self.store
            .observe_books_summary(version_id)
            .map(|books| books.map(|books| books.into_iter().map(BookSummary::from).collect::<Vec<_>>()))
            .boxed()
    }

    pub fn observe_chapter(&self, version_id: &str, book: &str, chapter: u32) -> LiveQuery<Vec<Verse>> {
        self.store
            .observe_chapter(version_id, book, chapter)
            .map(|verses| verses.map(|verses| verses.into_iter().map(Verse::from).collect::<Vec<_>>()))
            .boxed()
    }

    /// Note at a location; `verse == 0` is the whole-chapter note
    pub fn observe_note(&self, version_id: &str, book: &str, chapter: u32, verse: u32) -> LiveQuery<Option<HandwrittenNote>> {
        self.store
            .observe_note(NoteKey::new(version_id, book, chapter, verse))
            .map(|record| record.and_then(|record| record.map(HandwrittenNote::from_record).transpose()))
            .boxed()
    }

    /// Serialize and upsert a note, stamping it with the current time
    pub async fn save_note(&self, note: &HandwrittenNote) -> Result<()> {
        let record = note.to_record(chrono::Utc::now().timestamp_millis())?;
        self.store.upsert_note(record).await?;
        log::info!("Saved note for {} ({} strokes)", note.reference(), note.strokes.len());
        Ok(())
    }
}
