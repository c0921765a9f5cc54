use crate::http::HttpClient;
use crate::runtime::Runtime;
use anyhow::{Context, Result};
use log::info;
use std::path::Path;

/// Downloads a release asset to `temp_path` with retry support.
#[tracing::instrument(skip(runtime, temp_path, http_client))]
pub async fn download_file<R: Runtime>(
    runtime: &R,
    url: &str,
    temp_path: &Path,
    http_client: &HttpClient,
) -> Result<u64> {
    info!("Downloading {}...", url);

    let bytes = http_client
        .download_file(url, || {
            runtime
                .create_file(temp_path)
                .with_context(|| format!("Failed to create temporary file at {:?}", temp_path))
        })
        .await
        .with_context(|| format!("Failed to download {}", url))?;

    info!("Download complete ({} bytes).", bytes);
    Ok(bytes)
}
