//! Downloads of remote data sources.
//!
//! Seeding is synchronous, so each download runs on its own
//! current-thread tokio runtime.

use std::path::Path;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Error, Result};

/// Upper bound for a whole request, connect to last byte.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!(
    "vindecoder/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/oxur/vindecoder)"
);

/// Fetch `url` and return the response body.
///
/// # Errors
///
/// Returns [`Error::Download`] if the request fails, times out, or the
/// server answers with an error status.
pub fn fetch(url: &str) -> Result<Vec<u8>> {
    fetch_with_timeout(url, REQUEST_TIMEOUT)
}

fn fetch_with_timeout(url: &str, timeout: Duration) -> Result<Vec<u8>> {
    debug!("GET {url}");
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime
        .block_on(async {
            let client = reqwest::Client::builder()
                .timeout(timeout)
                .user_agent(USER_AGENT)
                .build()?;
            let response = client.get(url).send().await?.error_for_status()?;
            let body = response.bytes().await?;
            Ok(body.to_vec())
        })
        .map_err(|source: reqwest::Error| Error::Download {
            url: url.to_string(),
            source,
        })
}

/// Fetch `url` and write the body to `dest`, creating parent directories.
///
/// # Errors
///
/// Returns an error if the download fails or the file cannot be written.
pub fn download_to(url: &str, dest: &Path) -> Result<usize> {
    info!("Downloading {url}");
    let body = fetch(url)?;

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(dest, &body)?;
    info!("Saved {} bytes to {}", body.len(), dest.display());
    Ok(body.len())
}
