//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use futures::StreamExt;
use notes_bible::remote::BibleApi;
use notes_bible::{BibleError, LiveQuery, Result};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Two books: Genesis with 3 chapters and Exodus with 1
pub const SMALL_BIBLE: &str = r#"[
    {"abbrev": "gn", "book": "Genesis", "chapters": [
        ["In the beginning God created the heaven and the earth.", "And the earth was without form, and void."],
        ["Thus the heavens and the earth were finished."],
        ["Now the serpent was more subtil than any beast of the field."]
    ]},
    {"abbrev": "ex", "book": "Exodus", "chapters": [
        ["Now these are the names of the children of Israel."]
    ]}
]"#;

/// Same layout as [`SMALL_BIBLE`] with translated book names
pub const SMALL_BIBLE_ES: &str = r#"[
    {"abbrev": "gn", "book": "Génesis", "chapters": [
        ["En el principio creó Dios los cielos y la tierra."],
        ["Fueron, pues, acabados los cielos y la tierra."]
    ]},
    {"abbrev": "ex", "book": "Éxodo", "chapters": [
        ["Estos son los nombres de los hijos de Israel."]
    ]}
]"#;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Serves a swappable payload; `None` fails like a dropped connection
pub struct FakeApi {
    payload: Mutex<Option<String>>,
    calls: AtomicUsize,
}

impl FakeApi {
    pub fn serving(payload: &str) -> Self {
        Self {
            payload: Mutex::new(Some(payload.to_string())),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            payload: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_payload(&self, payload: Option<&str>) {
        *self.payload.lock().unwrap() = payload.map(str::to_string);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BibleApi for FakeApi {
    async fn download_version(&self, _url: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let payload = self.payload.lock().unwrap().clone();
        payload.ok_or_else(|| BibleError::Network("connection reset by peer".to_string()))
    }
}

/// Next emission of a live query, failing the test after 5 seconds
pub async fn next<T>(query: &mut LiveQuery<T>) -> T {
    tokio::time::timeout(Duration::from_secs(5), query.next())
        .await
        .expect("live query did not emit")
        .expect("live query ended")
        .expect("live query failed")
}
