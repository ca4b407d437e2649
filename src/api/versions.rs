//! Version list read model
//!
//! Joins the available versions with the status of the downloads started from
//! this model, and refuses to start a second download for a version that is
//! still in progress.

use crate::api::models::BibleVersion;
use crate::api::repository::{DownloadStatus, OfflineFirstRepository};
use crate::error::{BibleError, Result};
use crate::storage::LiveQuery;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// One row of the version list
#[derive(Debug, Clone)]
pub struct VersionItem {
    pub version: BibleVersion,
    pub download_status: DownloadStatus,
}

type StatusMap = HashMap<String, DownloadStatus>;

/// Tracks download status per version id
pub struct VersionListModel {
    repository: OfflineFirstRepository,
    downloads: Arc<watch::Sender<StatusMap>>,
}

impl VersionListModel {
    pub fn new(repository: OfflineFirstRepository) -> Self {
        let (downloads, _) = watch::channel(StatusMap::new());
        Self {
            repository,
            downloads: Arc::new(downloads),
        }
    }

    /// Latest status for a version (`Idle` if never started here)
    pub fn status(&self, version_id: &str) -> DownloadStatus {
        self.downloads
            .borrow()
            .get(version_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Start a download in the background.
    ///
    /// Fails with `UnsupportedVersion` for ids outside the catalog and with
    /// `DownloadInProgress` while a download of the same id is running.
    pub fn download(&self, version_id: &str) -> Result<JoinHandle<DownloadStatus>> {
        let mut statuses = self.repository.download_version(version_id)?;

        let mut claimed = false;
        self.downloads.send_if_modified(|map| {
            if map.get(version_id).is_some_and(DownloadStatus::is_in_progress) {
                return false;
            }
            map.insert(version_id.to_string(), DownloadStatus::InProgress(0.0));
            claimed = true;
            true
        });

        if !claimed {
            log::warn!("Download of {} already in progress, ignoring request", version_id);
            return Err(BibleError::DownloadInProgress(version_id.to_string()));
        }

        let guard = ResetUnfinished {
            downloads: Arc::clone(&self.downloads),
            id: version_id.to_string(),
        };
        Ok(tokio::spawn(async move {
            let mut last = DownloadStatus::Idle;
            while let Some(status) = statuses.next().await {
                guard.downloads.send_modify(|map| {
                    map.insert(guard.id.clone(), status.clone());
                });
                last = status;
            }
            last
        }))
    }

    /// Available versions with their download status, re-emitted whenever
    /// either side changes
    pub fn observe(&self) -> LiveQuery<Vec<VersionItem>> {
        let mut versions = self.repository.observe_available_versions();
        let mut statuses = self.downloads.subscribe();

        async_stream::stream! {
            let mut latest: Option<Vec<BibleVersion>> = None;
            let mut statuses_open = true;

            loop {
                let event = tokio::select! {
                    next = versions.next() => Event::Versions(next),
                    changed = statuses.changed(), if statuses_open => Event::Statuses(changed.is_ok()),
                };

                match event {
                    Event::Versions(Some(Ok(current))) => latest = Some(current),
                    Event::Versions(Some(Err(e))) => {
                        yield Err(e);
                        continue;
                    }
                    Event::Versions(None) => break,
                    Event::Statuses(open) => statuses_open = open,
                }

                let Some(current) = latest.as_ref() else {
                    continue;
                };
                let items = {
                    let map = statuses.borrow_and_update();
                    join(current, &map)
                };
                yield Ok(items);
            }
        }
        .boxed()
    }
}

/// Puts a download that ended without a terminal status (panic, abort) back
/// to `Idle`
struct ResetUnfinished {
    downloads: Arc<watch::Sender<StatusMap>>,
    id: String,
}

impl Drop for ResetUnfinished {
    fn drop(&mut self) {
        self.downloads.send_if_modified(|map| {
            if map.get(&self.id).is_some_and(|status| !status.is_terminal()) {
                log::warn!("Download of {} ended without a result", self.id);
                map.insert(self.id.clone(), DownloadStatus::Idle);
                return true;
            }
            false
        });
    }
}

enum Event {
    Versions(Option<Result<Vec<BibleVersion>>>),
    Statuses(bool),
}

fn join(versions: &[BibleVersion], statuses: &StatusMap) -> Vec<VersionItem> {
    versions
        .iter()
        .map(|version| VersionItem {
            version: version.clone(),
            download_status: statuses.get(&version.id).cloned().unwrap_or_default(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::remote::BibleApi;
    use crate::storage::LocalStore;
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::Semaphore;

    /// Holds every fetch until released
    struct GatedApi {
        gate: Arc<Semaphore>,
    }

    #[async_trait]
    impl BibleApi for GatedApi {
        async fn download_version(&self, _url: &str) -> Result<String> {
            let _permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| BibleError::Network(e.to_string()))?;
            Ok(r#"[{"book": "Jonah", "chapters": [["a", "b"]]}]"#.to_string())
        }
    }

    fn model() -> (VersionListModel, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let repository = OfflineFirstRepository::new(
            Arc::new(GatedApi {
                gate: Arc::clone(&gate),
            }),
            LocalStore::memory().unwrap(),
            Catalog::default(),
        );
        (VersionListModel::new(repository), gate)
    }

    #[tokio::test]
    async fn test_second_download_rejected_while_in_progress() {
        let (model, gate) = model();

        let handle = model.download("en_kjv").unwrap();
        assert!(model.status("en_kjv").is_in_progress());
        assert!(matches!(
            model.download("en_kjv"),
            Err(BibleError::DownloadInProgress(_))
        ));

        // Other versions are independent
        let other = model.download("en_bbe").unwrap();

        gate.add_permits(2);

        let last = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(last, DownloadStatus::Success(2)));
        tokio::time::timeout(Duration::from_secs(5), other)
            .await
            .unwrap()
            .unwrap();

        // Terminal state allows a fresh download
        assert!(model.download("en_kjv").is_ok());
    }

    #[tokio::test]
    async fn test_aborted_download_releases_version() {
        let (model, _gate) = model();

        let handle = model.download("en_kjv").unwrap();
        assert!(model.status("en_kjv").is_in_progress());

        handle.abort();
        let joined = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap();
        assert!(joined.unwrap_err().is_cancelled());

        assert!(matches!(model.status("en_kjv"), DownloadStatus::Idle));
        assert!(model.download("en_kjv").is_ok());
    }

    #[tokio::test]
    async fn test_unknown_version_rejected() {
        let (model, _gate) = model();
        assert!(matches!(
            model.download("xx_none"),
            Err(BibleError::UnsupportedVersion(_))
        ));
        assert!(matches!(model.status("xx_none"), DownloadStatus::Idle));
    }

    #[tokio::test]
    async fn test_observe_reflects_status_and_download() {
        let (model, gate) = model();
        let mut items = model.observe();

        let initial = tokio::time::timeout(Duration::from_secs(5), items.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert!(initial.iter().all(|i| matches!(i.download_status, DownloadStatus::Idle)));

        let handle = model.download("es_rvc").unwrap();
        gate.add_permits(1);
        handle.await.unwrap();

        let done = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let rows = items.next().await.unwrap().unwrap();
                let rvc = rows.iter().find(|i| i.version.id == "es_rvc").unwrap().clone();
                if rvc.version.is_downloaded && matches!(rvc.download_status, DownloadStatus::Success(_)) {
                    return rvc;
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(done.version.total_verses, 2);
    }
}
