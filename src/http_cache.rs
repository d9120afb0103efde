use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{Context, Result};
use log::debug;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};

#[derive(Debug, Clone)]
struct CacheEntry {
    body: String,
    etag: Option<String>,
    last_modified: Option<String>,
}

/// Per-URL body store that revalidates with `If-None-Match` / `If-Modified-Since`.
///
/// This never serves a body without asking upstream first; freshness windows
/// belong to the snapshot layer. A 304 just saves re-downloading the payload.
#[derive(Debug, Default)]
pub struct ConditionalCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ConditionalCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fetch(&self, client: &Client, url: &str) -> Result<String> {
        let cached_entry = self.lock().get(url).cloned();

        let mut req = client.get(url);
        if let Some(entry) = cached_entry.as_ref() {
            if let Some(etag) = entry.etag.as_ref() {
                req = req.header(IF_NONE_MATCH, etag);
            }
            if let Some(last_modified) = entry.last_modified.as_ref() {
                req = req.header(IF_MODIFIED_SINCE, last_modified);
            }
        }

        let resp = req.send().with_context(|| format!("GET {url} failed"))?;
        let status = resp.status();
        let headers = resp.headers().clone();
        if status == StatusCode::NOT_MODIFIED {
            if let Some(entry) = cached_entry {
                debug!("GET {url} -> 304, reusing {} bytes", entry.body.len());
                return Ok(entry.body);
            }
            return Err(anyhow::anyhow!("received 304 without cache body for {url}"));
        }

        let body = resp.text().context("failed reading body")?;
        if !status.is_success() {
            return Err(anyhow::anyhow!("http {status} for {url}"));
        }
        debug!("GET {url} -> {status} ({} bytes)", body.len());

        let etag = headers
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        let last_modified = headers
            .get(LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        if etag.is_some() || last_modified.is_some() {
            self.lock().insert(
                url.to_string(),
                CacheEntry {
                    body: body.clone(),
                    etag,
                    last_modified,
                },
            );
        }
        Ok(body)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
