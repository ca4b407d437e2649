//! Async local store with live queries
//!
//! [`LocalStore`] wraps the synchronous [`Database`] behind a mutex and runs every
//! operation on tokio's blocking pool. Writes publish invalidations after they
//! commit; `observe_*` streams re-run their query whenever a matching
//! invalidation arrives.

use crate::config::Config;
use crate::error::{BibleError, Result};
use crate::storage::database::Database;
use crate::storage::invalidation::{Invalidation, InvalidationBus, QueryShape};
use crate::storage::records::*;
use futures::stream::BoxStream;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast::error::RecvError;

/// A live query: emits the current result, then a fresh one after every
/// matching write, until dropped
pub type LiveQuery<T> = BoxStream<'static, Result<T>>;

/// Shared handle to the local database
#[derive(Clone)]
pub struct LocalStore {
    database: Arc<Mutex<Database>>,
    bus: InvalidationBus,
}

impl LocalStore {
    pub fn new(database: Database, bus: InvalidationBus) -> Self {
        Self {
            database: Arc::new(Mutex::new(database)),
            bus,
        }
    }

    /// Open the on-disk store described by `config`
    pub fn open(config: &Config) -> Result<Self> {
        let database = Database::open(&config.database)?;
        Ok(Self::new(
            database,
            InvalidationBus::new(config.events.channel_capacity),
        ))
    }

    /// In-memory store (for testing)
    pub fn memory() -> Result<Self> {
        Ok(Self::new(Database::memory()?, InvalidationBus::default()))
    }

    // ----- versions -----

    /// All downloaded versions ordered by (language, name)
    pub fn observe_versions(&self) -> LiveQuery<Vec<VersionRecord>> {
        self.observe(QueryShape::Versions, |db| db.get_versions())
    }

    pub async fn find_version(&self, id: &str) -> Result<Option<VersionRecord>> {
        let id = id.to_string();
        self.run(move |db| db.find_version(&id)).await
    }

    pub async fn upsert_version(&self, record: VersionRecord) -> Result<()> {
        self.run(move |db| db.upsert_version(&record)).await?;
        self.bus.publish(Invalidation::Versions);
        Ok(())
    }

    pub async fn delete_version(&self, id: &str) -> Result<usize> {
        let id = id.to_string();
        let deleted = self.run(move |db| db.delete_version(&id)).await?;
        self.bus.publish(Invalidation::Versions);
        Ok(deleted)
    }

    // ----- verses -----

    /// Insert or replace verses. Every version touched is invalidated.
    pub async fn insert_verses(&self, verses: Vec<VerseRecord>) -> Result<usize> {
        let mut touched: Vec<String> = verses.iter().map(|v| v.version_id.clone()).collect();
        touched.sort();
        touched.dedup();

        let inserted = self.run(move |db| db.insert_verses(&verses)).await?;
        for version_id in touched {
            self.bus.publish(Invalidation::Verses { version_id });
        }
        Ok(inserted)
    }

    pub async fn delete_verses_for_version(&self, version_id: &str) -> Result<usize> {
        let id = version_id.to_string();
        let deleted = self.run(move |db| db.delete_verses_for_version(&id)).await?;
        self.bus.publish(Invalidation::Verses {
            version_id: version_id.to_string(),
        });
        Ok(deleted)
    }

    pub async fn count_verses(&self, version_id: &str) -> Result<u32> {
        let id = version_id.to_string();
        self.run(move |db| db.count_verses(&id)).await
    }

    /// Atomically swap a version's verses and record.
    ///
    /// The transaction and its invalidations run on a detached task, so they
    /// complete even if the caller stops awaiting.
    pub async fn replace_version(&self, version: VersionRecord, verses: Vec<VerseRecord>) -> Result<usize> {
        let store = self.clone();
        tokio::spawn(async move {
            let version_id = version.id.clone();
            let inserted = store
                .run(move |db| db.replace_version(&version, &verses))
                .await?;

            store.bus.publish(Invalidation::Verses { version_id });
            store.bus.publish(Invalidation::Versions);
            Ok::<_, BibleError>(inserted)
        })
        .await?
    }

    /// Books of a version with chapter counts, ordered by book index
    pub fn observe_books_summary(&self, version_id: &str) -> LiveQuery<Vec<BookProjection>> {
        let id = version_id.to_string();
        self.observe(
            QueryShape::Verses {
                version_id: id.clone(),
            },
            move |db| db.books_summary(&id),
        )
    }

    /// Verses of one chapter ordered by verse number
    pub fn observe_chapter(&self, version_id: &str, book: &str, chapter: u32) -> LiveQuery<Vec<VerseRecord>> {
        let id = version_id.to_string();
        let book = book.to_string();
        self.observe(
            QueryShape::Verses {
                version_id: id.clone(),
            },
            move |db| db.chapter(&id, &book, chapter),
        )
    }

    // ----- notes -----

    pub fn observe_note(&self, key: NoteKey) -> LiveQuery<Option<NoteRecord>> {
        self.observe(QueryShape::Note { key: key.clone() }, move |db| db.note(&key))
    }

    pub async fn upsert_note(&self, note: NoteRecord) -> Result<()> {
        let key = note.key.clone();
        self.run(move |db| db.upsert_note(&note)).await?;
        self.bus.publish(Invalidation::Note { key });
        Ok(())
    }

    /// Run `op` against the database on the blocking pool
    pub(crate) async fn run<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&mut Database) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let database = Arc::clone(&self.database);
        tokio::task::spawn_blocking(move || {
            let mut db = lock(&database)?;
            op(&mut *db)
        })
        .await?
    }

    fn observe<T, F>(&self, shape: QueryShape, query: F) -> LiveQuery<T>
    where
        F: Fn(&Database) -> Result<T> + Send + Sync + 'static,
        T: Send + 'static,
    {
        let database = Arc::clone(&self.database);
        let query = Arc::new(query);
        // Subscribe before the first query so no write can slip in between
        let mut invalidations = self.bus.subscribe();

        Box::pin(async_stream::stream! {
            loop {
                let db = Arc::clone(&database);
                let query = Arc::clone(&query);
                let result = tokio::task::spawn_blocking(move || {
                    let guard = lock(&db)?;
                    query(&*guard)
                })
                .await;

                yield match result {
                    Ok(value) => value,
                    Err(join_error) => Err(BibleError::from(join_error)),
                };

                loop {
                    match invalidations.recv().await {
                        Ok(invalidation) if shape.is_affected_by(&invalidation) => break,
                        Ok(_) => continue,
                        Err(RecvError::Lagged(missed)) => {
                            log::debug!("Live query {:?} lagged by {} invalidations, re-running", shape, missed);
                            break;
                        }
                        Err(RecvError::Closed) => return,
                    }
                }

                log::debug!("Re-running live query {:?}", shape);
            }
        })
    }
}

fn lock(database: &Mutex<Database>) -> Result<MutexGuard<'_, Database>> {
    database
        .lock()
        .map_err(|_| BibleError::Storage("Database lock poisoned".to_string()))
}
