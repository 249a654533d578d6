//! Dataset retrieval.
//!
//! Every dataset is a CSV resource addressed either by an `http(s)` URL or by
//! a local path. Remote requests go through the [`HttpClient`] seam so that
//! authentication can be layered on without touching the callers.

mod basic;
mod client;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;

use crate::error::FetchError;
use tracing::debug;

/// Issues a single GET for `url` and returns the response body.
///
/// # Errors
///
/// Returns [`FetchError`] if the URL is invalid, the request fails, or the
/// server answers with a non-success status.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>, FetchError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| FetchError::InvalidUrl {
        url: url.to_string(),
        message: e.to_string(),
    })?;
    let req = reqwest::Request::new(reqwest::Method::GET, parsed);

    let resp = client.execute(req).await.map_err(|source| FetchError::Http {
        url: url.to_string(),
        source,
    })?;

    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let bytes = resp.bytes().await.map_err(|source| FetchError::Http {
        url: url.to_string(),
        source,
    })?;
    debug!(url, bytes = bytes.len(), "Dataset body received");
    Ok(bytes.to_vec())
}

/// Loads a dataset from a local file path or fetches it over HTTP.
pub async fn load_source<C: HttpClient>(client: &C, source: &str) -> Result<Vec<u8>, FetchError> {
    if is_remote(source) {
        fetch_bytes(client, source).await
    } else {
        std::fs::read(source).map_err(|source_err| FetchError::Io {
            path: source.to_string(),
            source: source_err,
        })
    }
}

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}
