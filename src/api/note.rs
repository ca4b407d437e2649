//! Note editing session for one fixed location

use crate::api::repository::OfflineFirstRepository;
use crate::error::Result;
use crate::notes::{HandwrittenNote, Stroke};
use crate::storage::NoteKey;
use futures::StreamExt;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Snapshot of a note session
#[derive(Debug, Clone, PartialEq)]
pub struct NoteState {
    pub key: NoteKey,
    /// Human readable location, e.g. `John 3:16`
    pub reference: String,
    /// Stored strokes; empty when no note exists yet
    pub strokes: Vec<Stroke>,
    pub is_saving: bool,
}

impl NoteState {
    fn empty(key: NoteKey) -> Self {
        let reference = HandwrittenNote::new(key.clone(), Vec::new()).reference();
        Self {
            key,
            reference,
            strokes: Vec::new(),
            is_saving: false,
        }
    }
}

/// Live note session; stops when dropped
pub struct NoteSession {
    saves: mpsc::UnboundedSender<Vec<Stroke>>,
    state: watch::Receiver<NoteState>,
    task: JoinHandle<()>,
}

impl NoteSession {
    /// Start a session for `key` on the current tokio runtime
    pub fn start(repository: OfflineFirstRepository, key: NoteKey) -> Self {
        let (saves, save_rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(NoteState::empty(key.clone()));

        let task = tokio::spawn(drive(repository, key, save_rx, state_tx));

        Self { saves, state, task }
    }

    /// Replace the note's strokes. Saves are applied in order.
    pub fn save_strokes(&self, strokes: Vec<Stroke>) {
        let _ = self.saves.send(strokes);
    }

    pub fn state(&self) -> NoteState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<NoteState> {
        self.state.clone()
    }
}

impl Drop for NoteSession {
    fn drop(&mut self) {
        self.task.abort();
    }
}

enum Event {
    Note(Option<Result<Option<HandwrittenNote>>>),
    Save(Option<Vec<Stroke>>),
}

async fn drive(
    repository: OfflineFirstRepository,
    key: NoteKey,
    mut saves: mpsc::UnboundedReceiver<Vec<Stroke>>,
    state: watch::Sender<NoteState>,
) {
    let mut note = repository.observe_note(&key.version_id, &key.book, key.chapter, key.verse);

    loop {
        let event = tokio::select! {
            next = note.next() => Event::Note(next),
            strokes = saves.recv() => Event::Save(strokes),
        };

        match event {
            Event::Note(Some(Ok(current))) => {
                let strokes = current.map(|n| n.strokes).unwrap_or_default();
                state.send_if_modified(|s| {
                    if s.strokes == strokes {
                        return false;
                    }
                    s.strokes = strokes;
                    true
                });
            }
            Event::Note(Some(Err(e))) => log::warn!("Note query for {:?} failed: {}", key, e),
            Event::Note(None) | Event::Save(None) => break,
            Event::Save(Some(strokes)) => {
                state.send_modify(|s| s.is_saving = true);

                let result = repository
                    .save_note(&HandwrittenNote::new(key.clone(), strokes))
                    .await;
                if let Err(e) = result {
                    log::error!("Saving note for {:?} failed: {}", key, e);
                }

                state.send_modify(|s| s.is_saving = false);
            }
        }
    }
}
