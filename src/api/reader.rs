//! Reading session over one downloaded version
//!
//! [`ReaderSelection`] holds the selection rules. [`ReaderSession`] drives them
//! from the live book list and chapter queries and publishes a [`ReaderState`].

use crate::api::models::{BookSummary, Verse};
use crate::api::repository::OfflineFirstRepository;
use crate::error::Result;
use crate::storage::LiveQuery;
use futures::StreamExt;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Which book and chapter a reader is looking at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderSelection {
    selected_book: Option<String>,
    selected_chapter: u32,
}

impl Default for ReaderSelection {
    fn default() -> Self {
        Self {
            selected_book: None,
            selected_chapter: 1,
        }
    }
}

impl ReaderSelection {
    pub fn selected_book(&self) -> Option<&str> {
        self.selected_book.as_deref()
    }

    pub fn selected_chapter(&self) -> u32 {
        self.selected_chapter
    }

    /// Reconcile the selection with a fresh book list.
    ///
    /// With nothing selected, or with a selected book that is no longer listed,
    /// the first book and chapter 1 are selected. An empty list changes nothing.
    /// Returns whether the selection changed.
    pub fn apply_books(&mut self, books: &[BookSummary]) -> bool {
        let Some(first) = books.first() else {
            return false;
        };

        let still_listed = self
            .selected_book
            .as_ref()
            .is_some_and(|selected| books.iter().any(|b| &b.name == selected));
        if still_listed {
            return false;
        }

        self.selected_book = Some(first.name.clone());
        self.selected_chapter = 1;
        true
    }

    /// Select a book; the chapter always goes back to 1
    pub fn select_book(&mut self, book: impl Into<String>) {
        self.selected_book = Some(book.into());
        self.selected_chapter = 1;
    }

    pub fn select_chapter(&mut self, chapter: u32) {
        self.selected_chapter = chapter;
    }
}

/// Snapshot of a reading session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderState {
    pub version_id: String,
    pub book_names: Vec<String>,
    pub selected_book: Option<String>,
    pub chapter_count: u32,
    pub selected_chapter: u32,
    pub verses: Vec<Verse>,
}

impl ReaderState {
    fn empty(version_id: &str) -> Self {
        Self {
            version_id: version_id.to_string(),
            book_names: Vec::new(),
            selected_book: None,
            chapter_count: 0,
            selected_chapter: 1,
            verses: Vec::new(),
        }
    }

    pub fn has_content(&self) -> bool {
        !self.book_names.is_empty()
    }
}

#[derive(Debug)]
enum ReaderCommand {
    SelectBook(String),
    SelectChapter(u32),
}

/// Live reading session; stops when dropped
pub struct ReaderSession {
    commands: mpsc::UnboundedSender<ReaderCommand>,
    state: watch::Receiver<ReaderState>,
    task: JoinHandle<()>,
}

impl ReaderSession {
    /// Start a session for `version_id` on the current tokio runtime
    pub fn start(repository: OfflineFirstRepository, version_id: impl Into<String>) -> Self {
        let version_id = version_id.into();
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(ReaderState::empty(&version_id));

        let task = tokio::spawn(drive(repository, version_id, command_rx, state_tx));

        Self {
            commands,
            state,
            task,
        }
    }

    pub fn select_book(&self, book: impl Into<String>) {
        let _ = self.commands.send(ReaderCommand::SelectBook(book.into()));
    }

    pub fn select_chapter(&self, chapter: u32) {
        let _ = self.commands.send(ReaderCommand::SelectChapter(chapter));
    }

    /// Current snapshot
    pub fn state(&self) -> ReaderState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<ReaderState> {
        self.state.clone()
    }
}

impl Drop for ReaderSession {
    fn drop(&mut self) {
        self.task.abort();
    }
}

enum Event {
    Books(Option<Result<Vec<BookSummary>>>),
    Command(Option<ReaderCommand>),
    Verses(Option<Result<Vec<Verse>>>),
}

async fn drive(
    repository: OfflineFirstRepository,
    version_id: String,
    mut commands: mpsc::UnboundedReceiver<ReaderCommand>,
    state: watch::Sender<ReaderState>,
) {
    let mut books_stream = repository.observe_books(&version_id);
    let mut books: Vec<BookSummary> = Vec::new();
    let mut selection = ReaderSelection::default();
    let mut verses: Vec<Verse> = Vec::new();
    let mut chapter_stream: Option<LiveQuery<Vec<Verse>>> = None;
    let mut subscribed: Option<(String, u32)> = None;

    loop {
        let wanted = selection
            .selected_book()
            .map(|book| (book.to_string(), selection.selected_chapter()));
        if wanted != subscribed {
            chapter_stream = wanted
                .as_ref()
                .map(|(book, chapter)| repository.observe_chapter(&version_id, book, *chapter));
            verses.clear();
            subscribed = wanted;
        }

        let next_state = snapshot(&version_id, &books, &selection, &verses);
        state.send_if_modified(|current| {
            if *current == next_state {
                return false;
            }
            *current = next_state;
            true
        });

        let event = tokio::select! {
            next = books_stream.next() => Event::Books(next),
            command = commands.recv() => Event::Command(command),
            next = next_verses(&mut chapter_stream) => Event::Verses(next),
        };

        match event {
            Event::Books(Some(Ok(current))) => {
                if selection.apply_books(&current) {
                    log::debug!("Reader for {} moved to {:?}", version_id, selection.selected_book());
                }
                books = current;
            }
            Event::Books(Some(Err(e))) => log::warn!("Book list for {} failed: {}", version_id, e),
            Event::Books(None) | Event::Command(None) => break,
            Event::Command(Some(ReaderCommand::SelectBook(book))) => selection.select_book(book),
            Event::Command(Some(ReaderCommand::SelectChapter(chapter))) => {
                selection.select_chapter(chapter)
            }
            Event::Verses(Some(Ok(current))) => verses = current,
            Event::Verses(Some(Err(e))) => log::warn!("Chapter query for {} failed: {}", version_id, e),
            Event::Verses(None) => chapter_stream = None,
        }
    }
}

async fn next_verses(stream: &mut Option<LiveQuery<Vec<Verse>>>) -> Option<Result<Vec<Verse>>> {
    match stream {
        Some(stream) => stream.next().await,
        None => futures::future::pending().await,
    }
}

fn snapshot(version_id: &str, books: &[BookSummary], selection: &ReaderSelection, verses: &[Verse]) -> ReaderState {
    let selected_book = selection.selected_book().map(str::to_string);
    let chapter_count = selected_book
        .as_ref()
        .and_then(|name| books.iter().find(|b| &b.name == name))
        .map(|b| b.chapter_count)
        .unwrap_or(0);

    ReaderState {
        version_id: version_id.to_string(),
        book_names: books.iter().map(|b| b.name.clone()).collect(),
        selected_book,
        chapter_count,
        selected_chapter: selection.selected_chapter(),
        verses: verses.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(name: &str, index: u32, chapters: u32) -> BookSummary {
        BookSummary {
            name: name.to_string(),
            book_index: index,
            chapter_count: chapters,
        }
    }

    #[test]
    fn test_first_book_list_selects_first_book() {
        let mut selection = ReaderSelection::default();
        assert!(!selection.apply_books(&[]));
        assert_eq!(selection.selected_book(), None);

        assert!(selection.apply_books(&[book("Genesis", 0, 50), book("Exodus", 1, 40)]));
        assert_eq!(selection.selected_book(), Some("Genesis"));
        assert_eq!(selection.selected_chapter(), 1);
    }

    #[test]
    fn test_select_book_resets_chapter() {
        let mut selection = ReaderSelection::default();
        selection.select_book("Genesis");
        selection.select_chapter(17);
        assert_eq!(selection.selected_chapter(), 17);

        selection.select_book("Exodus");
        assert_eq!(selection.selected_chapter(), 1);

        selection.select_chapter(3);
        selection.select_book("Exodus");
        assert_eq!(selection.selected_chapter(), 1);
    }

    #[test]
    fn test_missing_book_falls_back_to_first() {
        let mut selection = ReaderSelection::default();
        selection.select_book("Genesis");
        selection.select_chapter(5);

        assert!(!selection.apply_books(&[book("Genesis", 0, 50)]));
        assert_eq!(selection.selected_chapter(), 5);

        assert!(selection.apply_books(&[book("Génesis", 0, 50)]));
        assert_eq!(selection.selected_book(), Some("Génesis"));
        assert_eq!(selection.selected_chapter(), 1);
    }

    #[test]
    fn test_snapshot_chapter_count() {
        let mut selection = ReaderSelection::default();
        let books = vec![book("Genesis", 0, 50), book("Exodus", 1, 40)];
        selection.select_book("Exodus");

        let state = snapshot("en_kjv", &books, &selection, &[]);
        assert_eq!(state.chapter_count, 40);
        assert_eq!(state.book_names, vec!["Genesis", "Exodus"]);
        assert!(state.has_content());
        assert!(!ReaderState::empty("en_kjv").has_content());
    }
}
