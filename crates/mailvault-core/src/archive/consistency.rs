//! Cross-check of index rows against content files.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;

use super::content::{self, MESSAGES_DIR};
use super::model::EntryRef;

/// Findings of [`Archive::check_consistency`](super::Archive::check_consistency).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsistencyReport {
    /// Index rows checked.
    pub entries_checked: usize,
    /// Rows whose content file is missing. These mean corruption.
    pub orphan_entries: Vec<EntryRef>,
    /// Content files no row points at, relative to the root. Harmless
    /// leftovers of an interrupted run.
    pub orphan_files: Vec<PathBuf>,
}

impl ConsistencyReport {
    /// True when every row has its content.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.orphan_entries.is_empty()
    }
}

pub(crate) async fn check(root: &Path, references: Vec<EntryRef>) -> io::Result<ConsistencyReport> {
    let mut report = ConsistencyReport {
        entries_checked: references.len(),
        ..ConsistencyReport::default()
    };

    let mut referenced = HashSet::with_capacity(references.len());
    for reference in references {
        if fs::try_exists(root.join(&reference.path)).await? {
            referenced.insert(reference.path.clone());
        } else {
            report.orphan_entries.push(reference);
        }
    }

    for file in content_files(root).await? {
        if !referenced.contains(&file) {
            report.orphan_files.push(file);
        }
    }
    report.orphan_files.sort();
    Ok(report)
}

/// Every finished content file, relative to `root`.
async fn content_files(root: &Path) -> io::Result<Vec<PathBuf>> {
    let messages = root.join(MESSAGES_DIR);
    let mut files = Vec::new();
    let mut folders = match fs::read_dir(&messages).await {
        Ok(dir) => dir,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(files),
        Err(e) => return Err(e),
    };

    while let Some(folder) = folders.next_entry().await? {
        if !folder.file_type().await?.is_dir() {
            continue;
        }
        let mut entries = fs::read_dir(folder.path()).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if content::is_temp_file(&path) {
                continue;
            }
            if let Ok(relative) = path.strip_prefix(root) {
                files.push(relative.to_path_buf());
            }
        }
    }
    Ok(files)
}
