// src/integrations/http.rs
//
// Shared reqwest client construction

use std::time::Duration;

use reqwest::{redirect, Client};

use crate::error::{AppError, AppResult};

pub const USER_AGENT: &str =
    "Mozilla/5.0 (Linux; Android 14) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Mobile Safari/537.36";

/// Upper bound on bytes read from an HTML body
pub const MAX_HTML_BYTES: usize = 512 * 1024;

/// Client that never follows redirects on its own; callers walk the
/// `Location` chain themselves.
pub fn build_client(timeout: Duration) -> AppResult<Client> {
    Client::builder()
        .redirect(redirect::Policy::none())
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| AppError::Other(format!("Failed to create HTTP client: {}", e)))
}

/// Read at most `MAX_HTML_BYTES` of a response body as (lossy) UTF-8.
pub async fn read_html_prefix(mut response: reqwest::Response) -> AppResult<String> {
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        let remaining = MAX_HTML_BYTES - body.len();
        if chunk.len() >= remaining {
            body.extend_from_slice(&chunk[..remaining]);
            break;
        }
        body.extend_from_slice(&chunk);
    }
    Ok(String::from_utf8_lossy(&body).into_owned())
}

/// `text/html` or `application/xhtml+xml`, ignoring parameters
pub fn is_html_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "text/html" || essence == "application/xhtml+xml"
}
