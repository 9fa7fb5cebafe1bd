// src/integrations/downloader.rs
//
// Decides whether a URL points at a file rather than a web page.
//
// Two checks:
// - File-extension heuristic on the URL path (no I/O)
// - HEAD probe reading Content-Type / Content-Disposition

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};

use crate::domain::{DownloadCheckResult, Uri};
use crate::error::{AppError, AppResult};
use crate::integrations::http::is_html_content_type;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Downloader: Send + Sync {
    /// `NonDownloadable` also means "inconclusive"; callers may probe next
    fn check_is_non_html_file_ending(&self, uri: &Uri) -> DownloadCheckResult;

    async fn is_non_html_content_uri(&self, uri: &Uri, timeout_ms: u64) -> AppResult<DownloadCheckResult>;
}

/// MIME type guessed from a file name's extension, unless it names a page
pub fn mime_type_for_file_name(file_name: &str) -> Option<String> {
    let guess = mime_guess::from_path(file_name).first()?;
    let mime_type = guess.essence_str();
    (!is_html_content_type(mime_type)).then(|| mime_type.to_string())
}

/// `filename` from a Content-Disposition header value
pub fn file_name_from_disposition(disposition: &str) -> Option<String> {
    disposition.split(';').map(str::trim).find_map(|part| {
        let (key, value) = part.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("filename") {
            let value = value.trim().trim_matches('"');
            (!value.is_empty()).then(|| value.to_string())
        } else {
            None
        }
    })
}

pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    fn check_is_non_html_file_ending(&self, uri: &Uri) -> DownloadCheckResult {
        let Some(file_name) = uri.file_name() else {
            return DownloadCheckResult::NonDownloadable;
        };

        match mime_type_for_file_name(file_name) {
            Some(mime_type) => DownloadCheckResult::Downloadable {
                file_name: Some(file_name.to_string()),
                mime_type,
            },
            None => DownloadCheckResult::NonDownloadable,
        }
    }

    async fn is_non_html_content_uri(&self, uri: &Uri, timeout_ms: u64) -> AppResult<DownloadCheckResult> {
        let request = self
            .client
            .head(uri.as_str())
            .timeout(Duration::from_millis(timeout_ms))
            .send();

        let response = tokio::time::timeout(Duration::from_millis(timeout_ms), request)
            .await
            .map_err(|_| AppError::Timeout(timeout_ms))??;

        if !response.status().is_success() {
            log::debug!("Downloader probe for {} returned {}", uri, response.status());
            return Ok(DownloadCheckResult::NonDownloadable);
        }

        let headers = response.headers();
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        if content_type.is_empty() || is_html_content_type(content_type) {
            return Ok(DownloadCheckResult::NonDownloadable);
        }

        let file_name = headers
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(file_name_from_disposition)
            .or_else(|| uri.file_name().map(str::to_string));

        let mime_type = content_type
            .split(';')
            .next()
            .unwrap_or(content_type)
            .trim()
            .to_string();

        Ok(DownloadCheckResult::Downloadable { file_name, mime_type })
    }
}
