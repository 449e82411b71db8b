//! The user-editable settings document.
//!
//! Each folder holds a small `key: value` text file with the site title and
//! domain. Every sweep reads it, fills in defaults, and, if the document
//! changed since we last wrote it, writes back a normalised copy with any
//! validation problems listed at the bottom so the user can see them.
//!
//! The revision check is the idempotency gate: an unchanged revision means
//! nothing is written and nothing downstream (domain registration) runs.

use std::fmt::Write as _;

use tracing::{debug, error, info, warn};

use crate::contract::{StorageClient, User};
use crate::error::{SettingsError, SettingsSyncError, StorageError};

const HEADER: &str = "# You can change these, and soon they will be read and updated\n\
                      # Feel free to email broken@smallvictori.es if you need help :-)\n";
const ERRORS_HEADER: &str = "# Any errors will appear here\n";

/// Settings as parsed from the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserSettings {
    pub title: String,
    pub domain: String,
    /// Storage revision of the document these settings were read from or
    /// written as. Empty when unknown.
    pub revision: String,
    pub errors: Vec<SettingsError>,
}

/// Parse a settings document.
///
/// Recognises `domain:` and `title:` at the start of a line; the last line
/// for each key wins. Everything else is ignored. A domain that is not
/// exactly three dot-separated labels is kept but reported.
pub fn parse_settings(content: &str) -> UserSettings {
    let mut settings = UserSettings::default();

    for line in content.lines() {
        if let Some(value) = line.strip_prefix("domain:") {
            let domain = value.trim();
            if domain.split('.').count() != 3 {
                warn!(domain, "Failed to parse domain in settings");
                settings.errors.push(SettingsError::DomainFormat {
                    domain: domain.to_string(),
                });
            }
            settings.domain = domain.to_string();
        } else if let Some(value) = line.strip_prefix("title:") {
            settings.title = value.trim().to_string();
        }
    }

    settings
}

/// Render a settings document; the inverse of [`parse_settings`] when there
/// are no errors.
pub fn render_settings(settings: &UserSettings) -> String {
    let mut out = String::with_capacity(256);
    out.push_str(HEADER);
    out.push('\n');
    let _ = writeln!(out, "domain: {}", settings.domain);
    let _ = writeln!(out, "title: {}", settings.title);
    out.push('\n');
    out.push_str(ERRORS_HEADER);
    out.push('\n');
    for err in &settings.errors {
        let _ = writeln!(out, "# {err}");
        out.push('\n');
    }
    out
}

/// What happened to the settings document this sweep.
#[derive(Debug)]
pub enum SyncStatus {
    /// The document was stale and a normalised copy was written.
    Written { revision: String },
    /// The document has not changed since our last write.
    UpToDate,
    /// Fetching or writing failed; try again next sweep.
    Failed(SettingsSyncError),
}

/// Settings with defaults applied, plus what the sync did.
///
/// `settings` is usable in every state, so the page always has a title.
#[derive(Debug)]
pub struct SettingsOutcome {
    pub settings: UserSettings,
    pub status: SyncStatus,
}

/// Read, default, and (when stale) rewrite a user's settings document.
pub async fn sync_settings<S>(
    storage: &S,
    user: &User,
    path: &str,
    default_title: &str,
) -> SettingsOutcome
where
    S: StorageClient + ?Sized,
{
    let (body, fetched_revision) = match storage.fetch(path).await {
        Ok(file) => (
            String::from_utf8_lossy(&file.bytes).into_owned(),
            Some(file.revision),
        ),
        Err(StorageError::NotFound(_)) => {
            info!(user_id = user.id, path, "No settings document yet, creating one");
            (String::new(), None)
        }
        Err(e) => {
            error!(user_id = user.id, path, error = %e, "Failed to retrieve settings document");
            let settings = with_defaults(UserSettings::default(), user, default_title);
            return SettingsOutcome {
                settings,
                status: SyncStatus::Failed(SettingsSyncError::Fetch(e)),
            };
        }
    };

    let mut settings = with_defaults(parse_settings(&body), user, default_title);

    if let Some(revision) = fetched_revision {
        if user.settings_revision.as_deref() == Some(revision.as_str()) {
            debug!(user_id = user.id, %revision, "Settings revision matches");
            settings.revision = revision;
            return SettingsOutcome {
                settings,
                status: SyncStatus::UpToDate,
            };
        }
    }

    let document = render_settings(&settings);
    match storage.put(path, document.into_bytes()).await {
        Ok(revision) => {
            info!(user_id = user.id, %revision, errors = settings.errors.len(), "Wrote settings document");
            settings.revision = revision.clone();
            SettingsOutcome {
                settings,
                status: SyncStatus::Written { revision },
            }
        }
        Err(e) => {
            error!(user_id = user.id, path, error = %e, "Failed to write settings document");
            SettingsOutcome {
                settings,
                status: SyncStatus::Failed(SettingsSyncError::Write(e)),
            }
        }
    }
}

fn with_defaults(mut settings: UserSettings, user: &User, default_title: &str) -> UserSettings {
    if settings.title.is_empty() {
        settings.title = default_title.to_string();
    }
    if settings.domain.is_empty() {
        settings.domain = user.name.clone();
    }
    settings
}
