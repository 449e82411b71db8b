#![doc = "Dropbox API v2 client: the storage backend behind each user's app folder."]
//
//! # Storage Integration (Dropbox <-> Core)
//!
//! Implements [`StorageClient`] for a single user's app folder and
//! [`StorageConnector`] to hand one out per user.
//!
//! - One shared `reqwest::Client` for all users; each [`DropboxClient`] only
//!   carries the user's bearer token.
//! - Dropbox v2 reports neither a folder hash nor mime types, so both are
//!   derived here: the hash from every entry's path and revision, the mime
//!   type from the file extension.
//! - `409` responses whose error summary names `not_found` map to
//!   [`StorageError::NotFound`].

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use sha2::{Digest, Sha256};
use sv_worker_core::contract::{
    FolderListing, RemoteFileRecord, StorageClient, StorageConnector, StoredFile, User,
};
use sv_worker_core::error::StorageError;

pub const API_URL: &str = "https://api.dropboxapi.com/2";
pub const CONTENT_URL: &str = "https://content.dropboxapi.com/2";

const API_ARG_HEADER: &str = "Dropbox-API-Arg";
const API_RESULT_HEADER: &str = "Dropbox-API-Result";

/// Builds a [`DropboxClient`] per user from one shared HTTP client.
#[derive(Clone)]
pub struct DropboxConnector {
    http: reqwest::Client,
    api_url: String,
    content_url: String,
}

impl DropboxConnector {
    pub fn new(http: reqwest::Client) -> Self {
        Self::with_urls(http, API_URL, CONTENT_URL)
    }

    pub fn with_urls(http: reqwest::Client, api_url: &str, content_url: &str) -> Self {
        Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            content_url: content_url.trim_end_matches('/').to_string(),
        }
    }
}

impl StorageConnector for DropboxConnector {
    fn connect(&self, user: &User) -> Arc<dyn StorageClient> {
        Arc::new(DropboxClient {
            http: self.http.clone(),
            token: user.storage_token.clone(),
            api_url: self.api_url.clone(),
            content_url: self.content_url.clone(),
        })
    }
}

pub struct DropboxClient {
    http: reqwest::Client,
    token: String,
    api_url: String,
    content_url: String,
}

#[derive(Debug, Deserialize)]
struct ListFolderResult {
    entries: Vec<Entry>,
    cursor: String,
    has_more: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Entry {
    #[serde(rename = ".tag")]
    pub tag: String,
    #[serde(default)]
    pub path_display: String,
    #[serde(default)]
    pub rev: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileMetadata {
    rev: String,
}

#[derive(Debug, Deserialize)]
struct SharedLink {
    url: String,
}

#[derive(Debug, Deserialize)]
struct SharedLinks {
    links: Vec<SharedLink>,
}

impl DropboxClient {
    async fn rpc(&self, endpoint: &str, body: serde_json::Value) -> Result<Response, StorageError> {
        let url = format!("{}/{}", self.api_url, endpoint);
        self.http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(StorageError::request)
    }

    async fn list_page(&self, cursor: Option<&str>) -> Result<ListFolderResult, StorageError> {
        let resp = match cursor {
            None => {
                self.rpc(
                    "files/list_folder",
                    json!({ "path": "", "recursive": false }),
                )
                .await?
            }
            Some(cursor) => {
                self.rpc("files/list_folder/continue", json!({ "cursor": cursor }))
                    .await?
            }
        };
        check(resp, "")
            .await?
            .json()
            .await
            .map_err(StorageError::request)
    }
}

#[async_trait]
impl StorageClient for DropboxClient {
    async fn list_folder(&self) -> Result<FolderListing, StorageError> {
        let mut entries = Vec::new();
        let mut page = self.list_page(None).await?;
        loop {
            entries.append(&mut page.entries);
            if !page.has_more {
                break;
            }
            page = self.list_page(Some(&page.cursor)).await?;
        }
        tracing::debug!(entries = entries.len(), "Listed app folder");
        Ok(listing_from_entries(entries))
    }

    async fn fetch(&self, path: &str) -> Result<StoredFile, StorageError> {
        let url = format!("{}/files/download", self.content_url);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .header(API_ARG_HEADER, json!({ "path": path }).to_string())
            .send()
            .await
            .map_err(StorageError::request)?;
        let resp = check(resp, path).await?;

        let result = resp
            .headers()
            .get(API_RESULT_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| StorageError::Response(format!("missing {API_RESULT_HEADER} for {path}")))?;
        let revision = revision_from_api_result(result)?;
        let bytes = resp.bytes().await.map_err(StorageError::request)?;

        Ok(StoredFile {
            bytes: bytes.to_vec(),
            revision,
        })
    }

    async fn put(&self, path: &str, body: Vec<u8>) -> Result<String, StorageError> {
        let url = format!("{}/files/upload", self.content_url);
        let arg = json!({ "path": path, "mode": "overwrite", "mute": true });
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .header(API_ARG_HEADER, arg.to_string())
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(body)
            .send()
            .await
            .map_err(StorageError::request)?;
        let meta: FileMetadata = check(resp, path)
            .await?
            .json()
            .await
            .map_err(StorageError::request)?;
        Ok(meta.rev)
    }

    async fn share_link(&self, path: &str) -> Result<String, StorageError> {
        let resp = self
            .rpc(
                "sharing/create_shared_link_with_settings",
                json!({ "path": path }),
            )
            .await?;

        if resp.status() == StatusCode::CONFLICT {
            let summary = resp.text().await.map_err(StorageError::request)?;
            if !summary.contains("shared_link_already_exists") {
                return Err(error_for(StatusCode::CONFLICT, &summary, path));
            }
            let resp = self
                .rpc(
                    "sharing/list_shared_links",
                    json!({ "path": path, "direct_only": true }),
                )
                .await?;
            let links: SharedLinks = check(resp, path)
                .await?
                .json()
                .await
                .map_err(StorageError::request)?;
            return links
                .links
                .into_iter()
                .next()
                .map(|l| l.url)
                .ok_or_else(|| StorageError::Response(format!("no shared link listed for {path}")));
        }

        let link: SharedLink = check(resp, path)
            .await?
            .json()
            .await
            .map_err(StorageError::request)?;
        Ok(link.url)
    }
}

async fn check(resp: Response, path: &str) -> Result<Response, StorageError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(error_for(status, &body, path))
}

fn error_for(status: StatusCode, body: &str, path: &str) -> StorageError {
    if status == StatusCode::CONFLICT && body.contains("not_found") {
        StorageError::NotFound(path.to_string())
    } else {
        StorageError::Response(format!("{status}: {body}"))
    }
}

/// Pull the revision out of a `Dropbox-API-Result` header.
pub fn revision_from_api_result(header: &str) -> Result<String, StorageError> {
    serde_json::from_str::<FileMetadata>(header)
        .map(|m| m.rev)
        .map_err(|e| StorageError::Response(format!("bad {API_RESULT_HEADER}: {e}")))
}

/// Turn raw entries into records (files only, listing order kept) plus a
/// hash of the whole folder state.
pub fn listing_from_entries(entries: Vec<Entry>) -> FolderListing {
    let hash = folder_hash(&entries);
    let records = entries
        .into_iter()
        .filter(|e| e.tag == "file")
        .map(|e| RemoteFileRecord {
            mime_type: mime_for_path(&e.path_display).to_string(),
            path: e.path_display,
        })
        .collect();
    FolderListing { records, hash }
}

/// Hash over every entry's path and revision, independent of listing order.
pub fn folder_hash(entries: &[Entry]) -> String {
    let mut keys: Vec<(&str, &str)> = entries
        .iter()
        .map(|e| (e.path_display.as_str(), e.rev.as_deref().unwrap_or("")))
        .collect();
    keys.sort_unstable();

    let mut hasher = Sha256::new();
    for (path, rev) in keys {
        hasher.update(path.as_bytes());
        hasher.update([0]);
        hasher.update(rev.as_bytes());
        hasher.update([b'\n']);
    }
    format!("{:x}", hasher.finalize())
}

/// Mime type by extension, for the types the page builder cares about.
pub fn mime_for_path(path: &str) -> &'static str {
    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "css" => "text/css",
        "js" => "application/javascript",
        "html" | "htm" => "text/html",
        "txt" => "text/plain",
        "md" | "markdown" => "text/markdown",
        _ => "application/octet-stream",
    }
}
