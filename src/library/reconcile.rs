use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::storage::{FileStore, StorageError};

/// Deletes files in the upload directory that no video record references.
#[derive(Clone)]
pub struct OrphanReconciler {
    files: Arc<dyn FileStore>,

    placeholder: String,
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub removed: Vec<String>,

    /// Files that could not be deleted, with the error message.
    pub failed: Vec<(String, String)>,
}

impl ReconcileReport {
    #[must_use]
    pub fn is_partial_failure(&self) -> bool {
        !self.failed.is_empty()
    }
}

impl OrphanReconciler {
    pub fn new(files: Arc<dyn FileStore>, placeholder: impl Into<String>) -> Self {
        Self {
            files,
            placeholder: placeholder.into(),
        }
    }

    /// Removes every regular file not named in `known_filenames`.
    ///
    /// Directories and the placeholder file are never touched. Per-file delete
    /// failures are collected in the report; only a failure to list the root
    /// aborts the pass.
    pub async fn reconcile(
        &self,
        known_filenames: &HashSet<String>,
    ) -> Result<ReconcileReport, StorageError> {
        let mut report = ReconcileReport::default();

        for entry in self.files.list_dir().await? {
            if entry.is_dir
                || entry.name == self.placeholder
                || known_filenames.contains(&entry.name)
            {
                continue;
            }

            match self.files.delete(&entry.name).await {
                Ok(()) => {
                    debug!("Removed orphaned file: {}", entry.name);
                    report.removed.push(entry.name);
                }
                Err(e) => {
                    warn!("Failed to remove orphaned file {}: {}", entry.name, e);
                    report.failed.push((entry.name, e.to_string()));
                }
            }
        }

        metrics::counter!("orphan_files_removed_total").increment(report.removed.len() as u64);

        if !report.removed.is_empty() || report.is_partial_failure() {
            info!(
                "Orphan cleanup: removed {} files, {} failures",
                report.removed.len(),
                report.failed.len()
            );
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{LocalFileStore, StoredEntry, UploadBody};
    use async_trait::async_trait;
    use std::path::PathBuf;

    fn known(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    fn setup(files: &[&str]) -> (tempfile::TempDir, OrphanReconciler) {
        let dir = tempfile::tempdir().unwrap();
        for name in files {
            std::fs::write(dir.path().join(name), b"data").unwrap();
        }
        let store = Arc::new(LocalFileStore::new(dir.path()));
        (dir, OrphanReconciler::new(store, ".gitkeep"))
    }

    fn remaining(dir: &tempfile::TempDir) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_removes_only_unknown_files() {
        let (dir, reconciler) = setup(&["a.mp4", "b.mp4", "c.mkv", ".gitkeep"]);
        std::fs::create_dir(dir.path().join("subdir")).unwrap();

        let report = reconciler.reconcile(&known(&["a.mp4"])).await.unwrap();

        let mut removed = report.removed.clone();
        removed.sort();
        assert_eq!(removed, vec!["b.mp4", "c.mkv"]);
        assert!(report.failed.is_empty());
        assert_eq!(remaining(&dir), vec![".gitkeep", "a.mp4", "subdir"]);
    }

    #[tokio::test]
    async fn test_second_run_is_a_no_op() {
        let (dir, reconciler) = setup(&["keep.mp4", "orphan.webm"]);
        let known = known(&["keep.mp4"]);

        let first = reconciler.reconcile(&known).await.unwrap();
        assert_eq!(first.removed, vec!["orphan.webm"]);

        let second = reconciler.reconcile(&known).await.unwrap();
        assert!(second.removed.is_empty());
        assert_eq!(remaining(&dir), vec!["keep.mp4"]);
    }

    #[tokio::test]
    async fn test_never_deletes_known_files() {
        let files = ["x.mp4", "y.mov", "z.ogg"];

        // full overlap
        let (dir, reconciler) = setup(&files);
        let report = reconciler.reconcile(&known(&files)).await.unwrap();
        assert!(report.removed.is_empty());
        assert_eq!(remaining(&dir), vec!["x.mp4", "y.mov", "z.ogg"]);

        // superset of what is on disk
        let (dir, reconciler) = setup(&files);
        let report = reconciler
            .reconcile(&known(&["x.mp4", "y.mov", "z.ogg", "gone.mp4"]))
            .await
            .unwrap();
        assert!(report.removed.is_empty());
        assert_eq!(remaining(&dir).len(), 3);

        // empty set removes all regular files
        let (dir, reconciler) = setup(&files);
        let report = reconciler.reconcile(&HashSet::new()).await.unwrap();
        assert_eq!(report.removed.len(), 3);
        assert!(remaining(&dir).is_empty());
    }

    #[derive(Debug)]
    struct FailingStore {
        entries: Vec<StoredEntry>,
    }

    #[async_trait]
    impl FileStore for FailingStore {
        async fn save(&self, _name: &str, _body: UploadBody) -> Result<(), StorageError> {
            Ok(())
        }

        async fn exists(&self, _name: &str) -> Result<bool, StorageError> {
            Ok(true)
        }

        async fn delete(&self, name: &str) -> Result<(), StorageError> {
            if name.starts_with("locked") {
                return Err(StorageError::Io {
                    name: name.to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "locked"),
                });
            }
            Ok(())
        }

        async fn list_dir(&self) -> Result<Vec<StoredEntry>, StorageError> {
            Ok(self.entries.clone())
        }

        fn path_of(&self, name: &str) -> Result<PathBuf, StorageError> {
            Ok(PathBuf::from(name))
        }
    }

    #[tokio::test]
    async fn test_failures_are_collected_not_fatal() {
        let entries = ["locked_1.mp4", "free.mp4", "locked_2.mp4"]
            .iter()
            .map(|name| StoredEntry {
                name: (*name).to_string(),
                is_dir: false,
            })
            .collect();
        let reconciler = OrphanReconciler::new(Arc::new(FailingStore { entries }), ".gitkeep");

        let report = reconciler.reconcile(&HashSet::new()).await.unwrap();

        assert_eq!(report.removed, vec!["free.mp4"]);
        assert_eq!(report.failed.len(), 2);
        assert!(report.is_partial_failure());
    }
}
