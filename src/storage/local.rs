//! Local filesystem ledger.
//!
//! Mirrors the spreadsheet layout on disk for development and dry
//! deployments. A ledger is a directory that must already exist (it is
//! provisioned out of band, like a yearly spreadsheet); each tab is a JSON
//! file holding its row matrix.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! └── {ledger_id}/
//!     └── WaitLog.json      # [[header...], [row...], ...]
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::AsyncWriteExt;

use crate::error::WriteFailure;
use crate::storage::{LedgerSink, WriteResult};

const TAB_EXTENSION: &str = "json";

/// Local filesystem ledger backend.
#[derive(Debug, Clone)]
pub struct LocalLedger {
    root_dir: PathBuf,
}

impl LocalLedger {
    /// Create a new LocalLedger rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Directory of an existing ledger.
    async fn ledger_dir(&self, ledger_id: &str) -> WriteResult<PathBuf> {
        if ledger_id.is_empty()
            || ledger_id.contains(['/', '\\'])
            || ledger_id == "."
            || ledger_id == ".."
        {
            return Err(WriteFailure::unknown(format!(
                "'{ledger_id}' is not a usable local ledger id"
            )));
        }

        let dir = self.root_dir.join(ledger_id);
        match tokio::fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => Ok(dir),
            Ok(_) => Err(WriteFailure::not_found(format!(
                "{} is not a directory",
                dir.display()
            ))),
            Err(e) => Err(io_failure(&format!("open ledger {}", dir.display()), e)),
        }
    }

    fn tab_path(dir: &Path, tab: &str) -> PathBuf {
        dir.join(format!("{tab}.{TAB_EXTENSION}"))
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await
    }

    async fn read_rows(path: &Path) -> WriteResult<Vec<Vec<Value>>> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| io_failure(&format!("read {}", path.display()), e))?;
        serde_json::from_slice(&bytes).map_err(|e| {
            WriteFailure::unknown(format!("{} is not a row matrix: {e}", path.display()))
        })
    }

    async fn write_rows(path: &Path, rows: &[Vec<Value>]) -> WriteResult<()> {
        let bytes = serde_json::to_vec_pretty(rows)
            .map_err(|e| WriteFailure::unknown(format!("encode rows: {e}")))?;
        Self::write_bytes(path, &bytes)
            .await
            .map_err(|e| io_failure(&format!("write {}", path.display()), e))
    }
}

fn io_failure(context: &str, error: std::io::Error) -> WriteFailure {
    match error.kind() {
        std::io::ErrorKind::NotFound => WriteFailure::not_found(format!("{context}: {error}")),
        std::io::ErrorKind::PermissionDenied => WriteFailure::auth(format!("{context}: {error}")),
        _ => WriteFailure::unknown(format!("{context}: {error}")),
    }
}

#[async_trait]
impl LedgerSink for LocalLedger {
    async fn list_tabs(&self, ledger_id: &str) -> WriteResult<Vec<String>> {
        let dir = self.ledger_dir(ledger_id).await?;
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| io_failure(&format!("list {}", dir.display()), e))?;

        let mut tabs = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io_failure(&format!("list {}", dir.display()), e))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some(TAB_EXTENSION) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    tabs.push(stem.to_string());
                }
            }
        }
        tabs.sort();
        Ok(tabs)
    }

    async fn create_tab(&self, ledger_id: &str, tab: &str) -> WriteResult<()> {
        let dir = self.ledger_dir(ledger_id).await?;
        let path = Self::tab_path(&dir, tab);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(WriteFailure::unknown(format!(
                "tab '{tab}' already exists in ledger {ledger_id}"
            )));
        }
        Self::write_rows(&path, &[]).await
    }

    async fn set_header(&self, ledger_id: &str, tab: &str, header: &[Value]) -> WriteResult<()> {
        let dir = self.ledger_dir(ledger_id).await?;
        let path = Self::tab_path(&dir, tab);
        let rows = Self::read_rows(&path).await?;
        if !rows.is_empty() {
            return Err(WriteFailure::unknown(format!(
                "tab '{tab}' in ledger {ledger_id} already has content; header left unchanged"
            )));
        }
        Self::write_rows(&path, &[header.to_vec()]).await
    }

    async fn first_row(&self, ledger_id: &str, tab: &str) -> WriteResult<Option<Vec<Value>>> {
        let dir = self.ledger_dir(ledger_id).await?;
        let rows = Self::read_rows(&Self::tab_path(&dir, tab)).await?;
        Ok(rows.into_iter().next())
    }

    async fn append_rows(
        &self,
        ledger_id: &str,
        tab: &str,
        rows: &[Vec<Value>],
    ) -> WriteResult<usize> {
        let dir = self.ledger_dir(ledger_id).await?;
        let path = Self::tab_path(&dir, tab);
        let mut existing = Self::read_rows(&path).await?;
        existing.extend_from_slice(rows);
        Self::write_rows(&path, &existing).await?;
        Ok(rows.len())
    }

    fn describe(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WriteCategory;
    use crate::models::{LedgerTarget, TAB_NAME, header_cells};
    use crate::storage::append_ledger_rows;
    use serde_json::json;
    use tempfile::TempDir;

    fn provisioned(ledger_id: &str) -> (TempDir, LocalLedger) {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join(ledger_id)).unwrap();
        let ledger = LocalLedger::new(tmp.path());
        (tmp, ledger)
    }

    #[tokio::test]
    async fn test_unprovisioned_ledger_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let ledger = LocalLedger::new(tmp.path());

        let err = ledger.list_tabs("ID1").await.unwrap_err();
        assert_eq!(err.category, WriteCategory::NotFound);
    }

    #[tokio::test]
    async fn test_rejects_path_like_ids() {
        let tmp = TempDir::new().unwrap();
        let ledger = LocalLedger::new(tmp.path());

        for id in ["..", "a/b", ""] {
            assert!(ledger.list_tabs(id).await.is_err(), "{id:?}");
        }
    }

    #[tokio::test]
    async fn test_tab_lifecycle() {
        let (_tmp, ledger) = provisioned("ID1");

        assert!(ledger.list_tabs("ID1").await.unwrap().is_empty());
        ledger.create_tab("ID1", TAB_NAME).await.unwrap();
        assert_eq!(ledger.list_tabs("ID1").await.unwrap(), vec![TAB_NAME]);
        assert_eq!(ledger.first_row("ID1", TAB_NAME).await.unwrap(), None);

        ledger
            .set_header("ID1", TAB_NAME, &header_cells())
            .await
            .unwrap();
        assert_eq!(
            ledger.first_row("ID1", TAB_NAME).await.unwrap(),
            Some(header_cells())
        );
        let written = ledger
            .append_rows("ID1", TAB_NAME, &[vec![json!("a")], vec![json!("b")]])
            .await
            .unwrap();
        assert_eq!(written, 2);

        // Creating again or re-heading must not clobber rows.
        assert!(ledger.create_tab("ID1", TAB_NAME).await.is_err());
        assert!(
            ledger
                .set_header("ID1", TAB_NAME, &header_cells())
                .await
                .is_err()
        );

        let dir = ledger.ledger_dir("ID1").await.unwrap();
        let rows = LocalLedger::read_rows(&LocalLedger::tab_path(&dir, TAB_NAME))
            .await
            .unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], header_cells());
        assert_eq!(rows[2], vec![json!("b")]);
    }

    #[tokio::test]
    async fn test_writer_against_local_ledger() {
        let (_tmp, ledger) = provisioned("ID1");
        let target = LedgerTarget {
            year: "2025".into(),
            ledger_id: "ID1".into(),
            tab_name: TAB_NAME.into(),
        };

        let first = append_ledger_rows(&ledger, &target, &[]).await.unwrap();
        assert!(first.tab_created);
        let second = append_ledger_rows(&ledger, &target, &[]).await.unwrap();
        assert!(!second.tab_created);
    }

    #[tokio::test]
    async fn test_empty_tab_left_by_failed_run_gets_header() {
        let (_tmp, ledger) = provisioned("ID1");
        ledger.create_tab("ID1", TAB_NAME).await.unwrap();
        let target = LedgerTarget {
            year: "2025".into(),
            ledger_id: "ID1".into(),
            tab_name: TAB_NAME.into(),
        };

        let summary = append_ledger_rows(&ledger, &target, &[]).await.unwrap();

        assert!(!summary.tab_created);
        assert_eq!(
            ledger.first_row("ID1", TAB_NAME).await.unwrap(),
            Some(header_cells())
        );
    }
}
