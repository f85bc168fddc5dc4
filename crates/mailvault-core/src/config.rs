//! Engine configuration.
//!
//! One JSON file, every field optional:
//!
//! ```json
//! {
//!   "host": "imap.gmail.com",
//!   "port": 993,
//!   "connect_timeout_secs": 30,
//!   "command_timeout_secs": 120,
//!   "retry": { "max_attempts": 4, "base_delay_ms": 1000, "max_delay_ms": 30000 },
//!   "include_folders": [],
//!   "exclude_folders": ["[Gmail]/Spam", "[Gmail]/Trash"],
//!   "restore_dedup": true,
//!   "clear_deletes_folders": true,
//!   "index_page_size": 500,
//!   "update_check_url": null
//! }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use mailvault_imap::{Config as ImapConfig, Security};
use serde::{Deserialize, Serialize};

use crate::retry::RetryPolicy;
use crate::{Error, Result};

/// Name of the directory under the platform config dir.
const APP_DIR: &str = "mailvault";
const CONFIG_FILE: &str = "config.json";

/// Everything the engines and the session need besides credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// IMAP server host.
    pub host: String,
    /// IMAP server port, implicit TLS.
    pub port: u16,
    /// Deadline for TCP connect, TLS handshake and greeting.
    pub connect_timeout_secs: u64,
    /// Deadline for one command round trip.
    pub command_timeout_secs: u64,
    /// Backoff for transient failures.
    pub retry: RetryPolicy,
    /// Wire names to back up; empty means every folder.
    pub include_folders: Vec<String>,
    /// Wire names never backed up.
    pub exclude_folders: Vec<String>,
    /// Skip messages already present on the server during restore.
    pub restore_dedup: bool,
    /// Let `clear` delete user folders after emptying them.
    pub clear_deletes_folders: bool,
    /// Rows fetched per index page while iterating the archive.
    pub index_page_size: u32,
    /// Endpoint answering `{"version": "x.y.z"}`; no check when unset.
    pub update_check_url: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            host: "imap.gmail.com".to_string(),
            port: 993,
            connect_timeout_secs: 30,
            command_timeout_secs: 120,
            retry: RetryPolicy::default(),
            include_folders: Vec::new(),
            exclude_folders: Vec::new(),
            restore_dedup: true,
            clear_deletes_folders: true,
            index_page_size: 500,
            update_check_url: None,
        }
    }
}

impl EngineConfig {
    /// `<config dir>/mailvault/config.json`, if the platform has one.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Loads `path`, or the default file when present, or the defaults.
    ///
    /// An explicit `path` must exist; the default location may not.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if a file cannot be read or parsed, or the result
    /// fails [`EngineConfig::validate`].
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Parses one JSON file.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] naming the file on read or parse failure.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), "loading configuration");
        serde_json::from_str(&text).map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    /// Rejects values the engines cannot run with.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] describing the first bad field.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::Config("host must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(Error::Config("port must not be 0".to_string()));
        }
        if self.connect_timeout_secs == 0 || self.command_timeout_secs == 0 {
            return Err(Error::Config("timeouts must be at least one second".to_string()));
        }
        if self.index_page_size == 0 {
            return Err(Error::Config("index_page_size must be positive".to_string()));
        }
        Ok(())
    }

    /// Connection settings for the IMAP session.
    #[must_use]
    pub fn imap_config(&self) -> ImapConfig {
        ImapConfig::builder(self.host.clone())
            .port(self.port)
            .security(Security::Implicit)
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .command_timeout(Duration::from_secs(self.command_timeout_secs))
            .build()
    }

    /// True if the include/exclude lists let `wire_name` through.
    #[must_use]
    pub fn wants_folder(&self, wire_name: &str) -> bool {
        let included = self.include_folders.is_empty()
            || self.include_folders.iter().any(|f| f == wire_name);
        included && !self.exclude_folders.iter().any(|f| f == wire_name)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_target_gmail() {
        let config = EngineConfig::default();
        assert_eq!(config.host, "imap.gmail.com");
        assert_eq!(config.port, 993);
        assert!(config.validate().is_ok());

        let imap = config.imap_config();
        assert_eq!(imap.port, 993);
        assert_eq!(imap.command_timeout, Duration::from_secs(120));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"host": "mail.example.org", "retry": {{"max_attempts": 2}}, "exclude_folders": ["Spam"]}}"#
        )
        .unwrap();

        let config = EngineConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.host, "mail.example.org");
        assert_eq!(config.port, 993);
        assert_eq!(config.retry.max_attempts, 2);
        assert_eq!(config.retry.base_delay_ms, 1_000);
        assert!(!config.wants_folder("Spam"));
        assert!(config.wants_folder("INBOX"));
    }

    #[test]
    fn explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(
            EngineConfig::load(Some(&missing)),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"index_page_size": 0}}"#).unwrap();
        assert!(matches!(
            EngineConfig::load(Some(file.path())),
            Err(Error::Config(_))
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            EngineConfig::load(Some(file.path())),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn include_list_narrows_selection() {
        let config = EngineConfig {
            include_folders: vec!["INBOX".into(), "Work".into()],
            exclude_folders: vec!["Work".into()],
            ..EngineConfig::default()
        };
        assert!(config.wants_folder("INBOX"));
        assert!(!config.wants_folder("Work"));
        assert!(!config.wants_folder("Other"));
    }
}
