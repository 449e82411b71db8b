//! Error types shared by the sweep pipeline.
//!
//! Nothing in here is fatal to the sweep loop. Storage and settings errors
//! end the current step for one user; validation errors are advisory and
//! get written back into the user's settings document.

use thiserror::Error;

/// Boxed error used at the collaborator seams (cache, store, renderer, ...).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors reported by a [`crate::contract::StorageClient`].
///
/// `NotFound` is kept apart from transport failures so a missing document
/// can be told apart from an unreachable provider.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("not found in storage: {0}")]
    NotFound(String),

    #[error("storage request failed: {0}")]
    Request(#[source] BoxError),

    #[error("unexpected storage response: {0}")]
    Response(String),
}

impl StorageError {
    pub fn request<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        StorageError::Request(err.into())
    }
}

/// Validation problems found while parsing a settings document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("we couldn't parse and update your domain \"{domain}\", it should look like name.example.com")]
    DomainFormat { domain: String },
}

/// Why a settings sync could not complete.
#[derive(Error, Debug)]
pub enum SettingsSyncError {
    #[error("failed to fetch settings document: {0}")]
    Fetch(#[source] StorageError),

    #[error("failed to write settings document: {0}")]
    Write(#[source] StorageError),
}

/// Why a single record could not become an asset.
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("failed to fetch content for {path}: {source}")]
    Fetch {
        path: String,
        #[source]
        source: StorageError,
    },

    #[error("failed to create share link for {path}: {source}")]
    Link {
        path: String,
        #[source]
        source: StorageError,
    },
}
