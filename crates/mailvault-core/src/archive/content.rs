//! Message content files.
//!
//! Files are named by fingerprint under the folder's path segment. A file
//! only appears under its final name after its bytes reached the disk, so
//! an existing file of the right length is complete.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::model::Fingerprint;
use crate::folder_name;

/// Directory holding the per-folder content directories.
pub(crate) const MESSAGES_DIR: &str = "messages";

const EXTENSION: &str = "eml";
const TEMP_SUFFIX: &str = ".tmp";

/// `messages/<segment>/<fingerprint>.eml`, relative to the archive root.
pub(crate) fn relative_path(folder: &str, fingerprint: &Fingerprint) -> PathBuf {
    let segment = folder_name::to_path_segment(&folder_name::decode(folder));
    PathBuf::from(MESSAGES_DIR)
        .join(segment)
        .join(format!("{fingerprint}.{EXTENSION}"))
}

/// True for leftovers of an interrupted write.
pub(crate) fn is_temp_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.') && n.ends_with(TEMP_SUFFIX))
}

/// Writes `bytes` to `root/relative` through a synced temporary file.
pub(crate) async fn write_atomic(root: &Path, relative: &Path, bytes: &[u8]) -> io::Result<()> {
    let target = root.join(relative);
    if let Ok(meta) = fs::metadata(&target).await
        && meta.len() == bytes.len() as u64
    {
        return Ok(());
    }

    let parent = target
        .parent()
        .ok_or_else(|| io::Error::other("content path has no parent"))?;
    fs::create_dir_all(parent).await?;

    let name = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| io::Error::other("content path has no file name"))?;
    let temp = parent.join(format!(".{name}{TEMP_SUFFIX}"));

    let mut file = fs::File::create(&temp).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);

    fs::rename(&temp, &target).await
}

pub(crate) async fn read(root: &Path, relative: &Path) -> io::Result<Vec<u8>> {
    fs::read(root.join(relative)).await
}
