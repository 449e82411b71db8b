//! # contract: interfaces to everything outside the pipeline
//!
//! The sweep only ever talks to the outside world through the traits in this
//! module: the user's remote storage folder, the page cache, the user record
//! store, the domain registration service, the page renderer and the metrics
//! sink. Concrete network clients live in the `sv-worker` crate; tests use
//! the `mockall` mocks generated here.
//!
//! ## Mocking & Testing
//! - Every trait is annotated for `mockall`, and the mocks are exported behind
//!   the default `test-export-mocks` feature so integration tests in other
//!   crates can build deterministic collaborators.
//!
//! ## Errors
//! - Storage reports [`StorageError`] so "not found" stays distinguishable
//!   from a failed request.
//! - The other seams return boxed errors; the sweep only logs them.

use std::sync::Arc;

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::error::{BoxError, StorageError};
use crate::metrics::MetricEvent;
use crate::page::Page;

/// A user as held by the persistent store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    /// Access token for the user's storage folder.
    pub storage_token: String,
    /// Account id at the storage provider, part of the cache key.
    pub storage_uid: String,
    /// Display name, also the fallback domain.
    pub name: String,
    /// Folder hash seen at the last successful publish.
    pub folder_checksum: Option<String>,
    /// Revision of the settings document at the last successful write.
    pub settings_revision: Option<String>,
    pub domain: Option<String>,
}

/// One entry of a folder listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFileRecord {
    /// Path relative to the folder root, with a leading `/`.
    pub path: String,
    /// Mime type as reported by storage.
    pub mime_type: String,
}

/// A folder listing plus the opaque hash of the whole folder state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FolderListing {
    pub records: Vec<RemoteFileRecord>,
    pub hash: String,
}

/// A downloaded file and the revision it was downloaded at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub bytes: Vec<u8>,
    pub revision: String,
}

/// Access to one user's storage folder.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// List the folder root.
    async fn list_folder(&self) -> Result<FolderListing, StorageError>;

    /// Download a file and its current revision.
    async fn fetch(&self, path: &str) -> Result<StoredFile, StorageError>;

    /// Upload a file, overwriting what is there. Returns the new revision.
    async fn put(&self, path: &str, body: Vec<u8>) -> Result<String, StorageError>;

    /// Create (or reuse) a permanent, non-shortened public link to a file.
    async fn share_link(&self, path: &str) -> Result<String, StorageError>;
}

/// Hands out a [`StorageClient`] bound to a user's credentials.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait StorageConnector: Send + Sync {
    fn connect(&self, user: &User) -> Arc<dyn StorageClient>;
}

/// Fast-read cache the rendered pages are published to.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait PageCache: Send + Sync {
    async fn set(&self, key: &str, value: &str) -> Result<(), BoxError>;
}

/// Persistent store of user records.
///
/// Safe for concurrent use as long as each caller touches its own user.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn list_users(&self) -> Result<Vec<User>, BoxError>;

    async fn update_domain(
        &self,
        user: &User,
        domain: &str,
        revision: &str,
    ) -> Result<(), BoxError>;

    async fn update_folder_checksum(&self, user: &User, hash: &str) -> Result<(), BoxError>;

    async fn count(&self) -> Result<i64, BoxError>;
}

/// Registers a custom domain so requests for it get routed to the site.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait DomainRegistrar: Send + Sync {
    async fn register(&self, domain: &str) -> Result<(), BoxError>;
}

/// Turns an assembled page into HTML.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait PageRenderer: Send + Sync {
    fn render(&self, page: &Page) -> Result<String, BoxError>;
}

/// Fire-and-forget metrics.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait MetricsSink: Send + Sync {
    fn event(&self, event: MetricEvent);

    fn raw(&self, value: i64, name: &str);
}
