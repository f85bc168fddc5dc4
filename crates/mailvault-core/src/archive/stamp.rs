//! Watermark of the last fully successful backup.

use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use tokio::fs;
use tokio::io::AsyncWriteExt;

pub(crate) const STAMP_FILE: &str = "stamp";
const STAMP_TEMP: &str = ".stamp.tmp";

/// Reads the stamp; a missing or unreadable stamp counts as none.
pub(crate) async fn read(root: &Path) -> io::Result<Option<DateTime<Utc>>> {
    let text = match fs::read_to_string(root.join(STAMP_FILE)).await {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    match DateTime::parse_from_rfc3339(text.trim()) {
        Ok(at) => Ok(Some(at.with_timezone(&Utc))),
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unreadable stamp");
            Ok(None)
        }
    }
}

/// Replaces the stamp with `at` unless the stored one is later.
///
/// Returns whether the stamp moved.
pub(crate) async fn advance(root: &Path, at: DateTime<Utc>) -> io::Result<bool> {
    if read(root).await?.is_some_and(|current| current >= at) {
        return Ok(false);
    }

    let temp = root.join(STAMP_TEMP);
    let mut file = fs::File::create(&temp).await?;
    file.write_all(at.to_rfc3339().as_bytes()).await?;
    file.sync_all().await?;
    drop(file);
    fs::rename(&temp, root.join(STAMP_FILE)).await?;
    Ok(true)
}
