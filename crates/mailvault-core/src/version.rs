//! Release version and the optional update check.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::notifier::Notifier;
use crate::{Error, Result};

/// Version of this build.
pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

const CHECK_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct LatestRelease {
    version: String,
}

/// Asks `url` for the latest release and returns it if newer than
/// `current`.
///
/// # Errors
///
/// [`Error::Connection`] if the request fails or the answer is not the
/// expected JSON.
pub async fn fetch_newer_version(url: &str, current: &str) -> Result<Option<String>> {
    let client = Client::builder()
        .timeout(CHECK_TIMEOUT)
        .user_agent(format!("mailvault/{CURRENT_VERSION}"))
        .build()
        .map_err(|e| Error::Connection(e.to_string()))?;

    let response = client
        .get(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| Error::Connection(e.to_string()))?;
    let latest: LatestRelease = response
        .json()
        .await
        .map_err(|e| Error::Connection(e.to_string()))?;

    Ok(is_newer(&latest.version, current).then_some(latest.version))
}

/// Runs the update check and tells `notifier` about a newer release.
///
/// Failures are logged and otherwise ignored.
pub async fn report_new_version(url: Option<&str>, notifier: &dyn Notifier) {
    let Some(url) = url else {
        return;
    };
    match fetch_newer_version(url, CURRENT_VERSION).await {
        Ok(Some(version)) => notifier.on_new_version_available(&version),
        Ok(None) => tracing::debug!(current = CURRENT_VERSION, "up to date"),
        Err(e) => tracing::debug!(error = %e, "update check failed"),
    }
}

/// Compares dotted numeric versions; a leading `v` and any pre-release
/// suffix are ignored.
#[must_use]
pub fn is_newer(candidate: &str, current: &str) -> bool {
    parse_parts(candidate) > parse_parts(current)
}

fn parse_parts(version: &str) -> Vec<u64> {
    let core = version.trim().trim_start_matches('v');
    let core = core.split(['-', '+']).next().unwrap_or(core);
    let mut parts: Vec<u64> = core.split('.').map(|p| p.parse().unwrap_or(0)).collect();
    while parts.last() == Some(&0) {
        parts.pop();
    }
    parts
}
