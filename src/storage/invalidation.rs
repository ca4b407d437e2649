//! Write invalidations for live queries
//!
//! Every committed write publishes an [`Invalidation`] naming the table and key
//! range it touched. Live queries describe what they read as a [`QueryShape`] and
//! re-run when a matching invalidation arrives.

use crate::storage::records::NoteKey;
use tokio::sync::broadcast;

/// Table and key range touched by a committed write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalidation {
    Versions,
    Verses { version_id: String },
    Note { key: NoteKey },
}

/// Table and key range read by a live query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryShape {
    Versions,
    Verses { version_id: String },
    Note { key: NoteKey },
}

impl QueryShape {
    /// Whether a write described by `invalidation` can change this query's result
    pub fn is_affected_by(&self, invalidation: &Invalidation) -> bool {
        match (self, invalidation) {
            (QueryShape::Versions, Invalidation::Versions) => true,
            (QueryShape::Verses { version_id: q }, Invalidation::Verses { version_id: w }) => q == w,
            (QueryShape::Note { key: q }, Invalidation::Note { key: w }) => q == w,
            _ => false,
        }
    }
}

/// Broadcast bus carrying invalidations to live queries
#[derive(Debug, Clone)]
pub struct InvalidationBus {
    sender: broadcast::Sender<Invalidation>,
}

impl InvalidationBus {
    /// Create a new bus with the given per-subscriber capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an invalidation
    pub fn publish(&self, invalidation: Invalidation) {
        log::debug!("Publishing invalidation {:?}", invalidation);
        // No live queries is fine
        let _ = self.sender.send(invalidation);
    }

    /// Subscribe to invalidations
    pub fn subscribe(&self) -> broadcast::Receiver<Invalidation> {
        self.sender.subscribe()
    }
}

impl Default for InvalidationBus {
    fn default() -> Self {
        Self::new(256)
    }
}
