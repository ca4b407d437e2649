//! End-to-end tests of the download pipeline, the read models and notes

mod common;

use approx::assert_relative_eq;
use common::{FakeApi, SMALL_BIBLE, SMALL_BIBLE_ES, init_logging, next};
use futures::StreamExt;
use notes_bible::api::repository::{
    PROGRESS_COMMITTED, PROGRESS_FETCHED, PROGRESS_PARSED, PROGRESS_STARTED,
};
use notes_bible::catalog::Catalog;
use notes_bible::config::Config;
use notes_bible::notes::{DrawPoint, HandwrittenNote, Stroke};
use notes_bible::{AppContainer, DownloadStatus, LocalStore, NoteKey, OfflineFirstRepository};
use std::sync::Arc;

fn repository_with(api: Arc<FakeApi>) -> OfflineFirstRepository {
    OfflineFirstRepository::new(api, LocalStore::memory().unwrap(), Catalog::default())
}

fn progress(status: &DownloadStatus) -> f32 {
    match status {
        DownloadStatus::InProgress(p) => *p,
        other => panic!("expected progress, got {:?}", other),
    }
}

#[tokio::test]
async fn test_download_status_sequence() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let repo = repository_with(Arc::new(FakeApi::serving(SMALL_BIBLE)));
    let statuses: Vec<_> = repo.download_version("en_kjv")?.collect().await;

    assert_eq!(statuses.len(), 5);
    assert_relative_eq!(progress(&statuses[0]), PROGRESS_STARTED);
    assert_relative_eq!(progress(&statuses[1]), PROGRESS_FETCHED);
    assert_relative_eq!(progress(&statuses[2]), PROGRESS_PARSED);
    assert_relative_eq!(progress(&statuses[3]), PROGRESS_COMMITTED);
    assert_relative_eq!(PROGRESS_FETCHED, 0.45);
    assert_relative_eq!(PROGRESS_PARSED, 0.75);
    assert!(matches!(statuses[4], DownloadStatus::Success(5)));

    Ok(())
}

#[tokio::test]
async fn test_redownload_is_idempotent() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let api = Arc::new(FakeApi::serving(SMALL_BIBLE));
    let repo = repository_with(Arc::clone(&api));

    let _: Vec<_> = repo.download_version("en_kjv")?.collect().await;
    let first_chapter = next(&mut repo.observe_chapter("en_kjv", "Genesis", 1)).await;

    let statuses: Vec<_> = repo.download_version("en_kjv")?.collect().await;
    assert!(matches!(statuses.last(), Some(DownloadStatus::Success(5))));
    assert_eq!(api.calls(), 2);

    assert_eq!(repo.store().count_verses("en_kjv").await?, 5);
    let again = next(&mut repo.observe_chapter("en_kjv", "Genesis", 1)).await;
    assert_eq!(again, first_chapter);

    Ok(())
}

#[tokio::test]
async fn test_transport_failure_leaves_store_untouched() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let api = Arc::new(FakeApi::serving(SMALL_BIBLE));
    let repo = repository_with(Arc::clone(&api));
    let _: Vec<_> = repo.download_version("en_kjv")?.collect().await;
    let before = repo.store().find_version("en_kjv").await?.unwrap();

    api.set_payload(None);
    let statuses: Vec<_> = repo.download_version("en_kjv")?.collect().await;

    assert_eq!(statuses.len(), 2);
    assert_relative_eq!(progress(&statuses[0]), PROGRESS_STARTED);
    match &statuses[1] {
        DownloadStatus::Error(e) => assert!(e.to_string().contains("connection reset")),
        other => panic!("expected error, got {:?}", other),
    }

    let after = repo.store().find_version("en_kjv").await?.unwrap();
    assert_eq!(after, before);
    assert_eq!(repo.store().count_verses("en_kjv").await?, 5);

    // A version never downloaded stays absent
    let failing = repository_with(Arc::new(FakeApi::failing()));
    let _: Vec<_> = failing.download_version("es_rvc")?.collect().await;
    assert!(failing.store().find_version("es_rvc").await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_books_follow_document_order() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let repo = repository_with(Arc::new(FakeApi::serving(SMALL_BIBLE)));
    let mut books = repo.observe_books("en_kjv");
    assert!(next(&mut books).await.is_empty());

    let _: Vec<_> = repo.download_version("en_kjv")?.collect().await;

    let books = next(&mut books).await;
    assert_eq!(books.len(), 2);
    assert_eq!(books[0].name, "Genesis");
    assert_eq!(books[0].chapter_count, 3);
    assert_eq!(books[1].name, "Exodus");
    assert_eq!(books[1].book_index, 1);
    assert_eq!(books[1].chapter_count, 1);

    Ok(())
}

#[tokio::test]
async fn test_changed_content_replaces_old_rows() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let api = Arc::new(FakeApi::serving(SMALL_BIBLE));
    let repo = repository_with(Arc::clone(&api));
    let _: Vec<_> = repo.download_version("es_rvc")?.collect().await;

    api.set_payload(Some(SMALL_BIBLE_ES));
    let statuses: Vec<_> = repo.download_version("es_rvc")?.collect().await;
    assert!(matches!(statuses.last(), Some(DownloadStatus::Success(3))));

    assert!(next(&mut repo.observe_chapter("es_rvc", "Genesis", 1)).await.is_empty());
    let chapter = next(&mut repo.observe_chapter("es_rvc", "Génesis", 2)).await;
    assert_eq!(chapter.len(), 1);
    assert_eq!(chapter[0].verse_number, 1);

    let version = repo.store().find_version("es_rvc").await?.unwrap();
    assert_eq!(version.total_verses, 3);

    Ok(())
}

fn sample_strokes() -> Vec<Stroke> {
    (0..2)
        .map(|s| Stroke {
            color: 0xFF000000 + s as i64,
            stroke_width: 2.5 + s as f32,
            points: (0..5)
                .map(|p| DrawPoint::new(p as f32 * 10.0, s as f32 * 7.5 + 0.25))
                .collect(),
        })
        .collect()
}

#[tokio::test]
async fn test_note_round_trip_on_disk() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let temp_dir = tempfile::tempdir()?;
    let mut config = Config::default();
    config.database.path = temp_dir.path().join("notes.db");

    let key = NoteKey::new("en_kjv", "John", 3, 16);
    let note = HandwrittenNote::new(key.clone(), sample_strokes());

    {
        let store = LocalStore::open(&config)?;
        let app = AppContainer::with_parts(config.clone(), store, Arc::new(FakeApi::failing()));
        app.repository().save_note(&note).await?;
    }

    let store = LocalStore::open(&config)?;
    let app = AppContainer::with_parts(config, store, Arc::new(FakeApi::failing()));
    let loaded = next(&mut app.repository().observe_note("en_kjv", "John", 3, 16))
        .await
        .expect("note should persist");

    assert_eq!(loaded.key, key);
    assert_eq!(loaded.strokes.len(), 2);
    for (saved, original) in loaded.strokes.iter().zip(note.strokes.iter()) {
        assert_eq!(saved.color, original.color);
        assert_relative_eq!(saved.stroke_width, original.stroke_width);
        assert_eq!(saved.points.len(), 5);
        for (a, b) in saved.points.iter().zip(original.points.iter()) {
            assert_relative_eq!(a.x, b.x);
            assert_relative_eq!(a.y, b.y);
        }
    }
    assert!(loaded.updated_at > 0);

    // Chapter note is a separate slot
    assert!(next(&mut app.repository().observe_note("en_kjv", "John", 3, 0)).await.is_none());

    Ok(())
}

#[tokio::test]
async fn test_download_survives_reopen() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let temp_dir = tempfile::tempdir()?;
    let mut config = Config::default();
    config.database.path = temp_dir.path().join("bible.db");
    config.database.insert_batch_size = 2;

    {
        let app = AppContainer::with_parts(
            config.clone(),
            LocalStore::open(&config)?,
            Arc::new(FakeApi::serving(SMALL_BIBLE)),
        );
        let handle = app.version_list().download("en_bbe")?;
        assert!(matches!(handle.await?, DownloadStatus::Success(5)));
    }

    let app = AppContainer::with_parts(
        config.clone(),
        LocalStore::open(&config)?,
        Arc::new(FakeApi::failing()),
    );
    let versions = next(&mut app.repository().observe_available_versions()).await;
    let bbe = versions.iter().find(|v| v.id == "en_bbe").unwrap();
    assert!(bbe.is_downloaded);
    assert_eq!(bbe.total_verses, 5);
    assert!(versions.iter().filter(|v| v.id != "en_bbe").all(|v| !v.is_downloaded));

    Ok(())
}

/// `books` books of `chapters` chapters with `verses` verses each
fn generated_bible(books: usize, chapters: usize, verses: usize) -> String {
    let books: Vec<_> = (1..=books)
        .map(|b| {
            let chapters: Vec<Vec<String>> = (1..=chapters)
                .map(|c| (1..=verses).map(|v| format!("Book {} {}:{}", b, c, v)).collect())
                .collect();
            serde_json::json!({ "book": format!("Book {}", b), "chapters": chapters })
        })
        .collect();
    serde_json::Value::Array(books).to_string()
}

#[tokio::test]
async fn test_full_size_download_with_default_chunks() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let repo = repository_with(Arc::new(FakeApi::serving(&generated_bible(66, 25, 20))));
    let statuses: Vec<_> = repo.download_version("en_kjv")?.collect().await;
    assert!(matches!(statuses.last(), Some(DownloadStatus::Success(33_000))));

    assert_eq!(repo.store().count_verses("en_kjv").await?, 33_000);
    let books = next(&mut repo.observe_books("en_kjv")).await;
    assert_eq!(books.len(), 66);
    assert!(books.iter().all(|b| b.chapter_count == 25));
    assert_eq!(books[65].name, "Book 66");

    let last = next(&mut repo.observe_chapter("en_kjv", "Book 66", 25)).await;
    assert_eq!(last.len(), 20);
    assert_eq!(last[19].text, "Book 66 25:20");

    Ok(())
}

#[tokio::test]
async fn test_note_session_follows_saves_from_elsewhere() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let app = AppContainer::with_parts(
        Config::default(),
        LocalStore::memory()?,
        Arc::new(FakeApi::failing()),
    );
    let key = NoteKey::new("en_kjv", "Psalms", 23, 1);
    let session = app.note(key.clone());
    let mut state = session.subscribe();
    assert_eq!(session.state().reference, "Psalms 23:1");

    app.repository()
        .save_note(&HandwrittenNote::new(key, sample_strokes()))
        .await?;

    let seen = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        state.wait_for(|s| s.strokes.len() == 2),
    )
    .await?
    .map(|s| (*s).clone())?;
    assert!(!seen.is_saving);
    assert_eq!(seen.strokes[1].points.len(), 5);

    Ok(())
}
