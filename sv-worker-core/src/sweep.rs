//! Sweep coordinator: periodically rebuilds every user's page.
//!
//! One sweep lists all users and launches an independent task per user,
//! spaced out by a small delay to go easy on the storage API, then waits for
//! every task before sleeping until the next sweep. At most one sweep is in
//! flight.
//!
//! # Per-user pipeline
//! Strictly sequential within a task:
//! 1. Sync the settings document; if it was rewritten, store the domain and
//!    register it.
//! 2. List the folder.
//! 3. Stop if the folder hash matches the stored checksum.
//! 4. Collect assets; a root `index.html` is published as is.
//! 5. Assemble and render the page.
//! 6. Publish it and store the new folder checksum.
//!
//! # Error Handling
//! Failures are logged and end only the current user's task. Anything not
//! stored (checksum, settings revision) is simply retried next sweep. Tasks
//! share no mutable state; each one hands a [`UserReport`] back through the
//! join set.

use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::aggregate::{collect_assets, CollectOptions, Collected};
use crate::config::WorkerConfig;
use crate::contract::{
    DomainRegistrar, MetricsSink, PageCache, PageRenderer, StorageConnector, User, UserStore,
};
use crate::metrics::MetricEvent;
use crate::page::assemble_page;
use crate::settings::{sync_settings, SyncStatus};

/// Name of the raw metric carrying the total number of users.
pub const TOTAL_USERS_METRIC: &str = "_total_users_created";

/// Everything the sweep talks to. Built once, shared read-only by all tasks.
#[derive(Clone)]
pub struct Services {
    pub storage: Arc<dyn StorageConnector>,
    pub cache: Arc<dyn PageCache>,
    pub store: Arc<dyn UserStore>,
    pub registrar: Arc<dyn DomainRegistrar>,
    pub renderer: Arc<dyn PageRenderer>,
    pub metrics: Arc<dyn MetricsSink>,
}

/// Cache key a user's page is published under.
pub fn cache_key(prefix: &str, user: &User) -> String {
    format!("{prefix}:{}:{}", user.id, user.storage_uid)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SettingsState {
    Written,
    UpToDate,
    Failed,
}

/// How far a user's task got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UserOutcome {
    /// Folder hash unchanged, nothing rebuilt.
    Unchanged,
    /// Generated page rendered and published.
    Published,
    /// The user's own `index.html` was published.
    PublishedOverride,
    ListFailed,
    RenderFailed,
    PublishFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserReport {
    pub user_id: i64,
    pub settings: SettingsState,
    pub outcome: UserOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub users: Vec<UserReport>,
    /// Tasks that panicked instead of reporting.
    pub failed_tasks: usize,
}

#[derive(Clone)]
pub struct Coordinator {
    config: Arc<WorkerConfig>,
    services: Services,
}

impl Coordinator {
    pub fn new(config: WorkerConfig, services: Services) -> Self {
        Self {
            config: Arc::new(config),
            services,
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Sweep forever.
    pub async fn run_forever(&self) {
        loop {
            let report = self.run_sweep().await;
            debug!(users = report.users.len(), failed_tasks = report.failed_tasks, "Sweep finished");
            tokio::time::sleep(self.config.sweep.run_delay()).await;
        }
    }

    /// Run one sweep over all users and wait for every task to finish.
    pub async fn run_sweep(&self) -> SweepReport {
        info!("Starting run");
        match self.services.store.count().await {
            Ok(count) => info!(count, "Number of users"),
            Err(e) => warn!(error = %e, "Failed to count users"),
        }

        let users = match self.services.store.list_users().await {
            Ok(users) => users,
            Err(e) => {
                error!(error = %e, "Error retrieving users");
                Vec::new()
            }
        };

        let mut tasks = JoinSet::new();
        for user in users {
            tokio::time::sleep(self.config.sweep.per_user_delay()).await;
            let worker = self.clone();
            tasks.spawn(async move { worker.process_user(user).await });
        }

        let mut report = SweepReport::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(user_report) => report.users.push(user_report),
                Err(e) => {
                    error!(error = %e, "User task did not complete");
                    report.failed_tasks += 1;
                }
            }
        }
        report.users.sort_by_key(|r| r.user_id);

        info!(processed = report.users.len(), "Run complete");
        self.services.metrics.event(MetricEvent::RunComplete);
        match self.services.store.count().await {
            Ok(total) => self.services.metrics.raw(total, TOTAL_USERS_METRIC),
            Err(e) => warn!(error = %e, "Failed to count users after run"),
        }

        report
    }

    /// Rebuild and publish one user's page.
    pub async fn process_user(&self, user: User) -> UserReport {
        let span = info_span!("worker", user_id = user.id);
        self.process_user_inner(user).instrument(span).await
    }

    async fn process_user_inner(&self, user: User) -> UserReport {
        info!("Starting");
        let storage = self.services.storage.connect(&user);

        let synced = sync_settings(
            storage.as_ref(),
            &user,
            &self.config.settings.path,
            &self.config.settings.default_title,
        )
        .await;
        let settings_state = match &synced.status {
            SyncStatus::Written { revision } => {
                self.store_domain(&user, &synced.settings.domain, revision)
                    .await;
                SettingsState::Written
            }
            SyncStatus::UpToDate => SettingsState::UpToDate,
            SyncStatus::Failed(e) => {
                warn!(error = %e, "Settings sync failed, skipping domain update");
                SettingsState::Failed
            }
        };
        let report = |outcome| UserReport {
            user_id: user.id,
            settings: settings_state,
            outcome,
        };

        let listing = match storage.list_folder().await {
            Ok(listing) => listing,
            Err(e) => {
                error!(error = %e, "Received error trying to list folder");
                return report(UserOutcome::ListFailed);
            }
        };

        if user.folder_checksum.as_deref() == Some(listing.hash.as_str()) {
            self.services.metrics.event(MetricEvent::UserProcessed);
            info!("Folder sum matches, skipping checks");
            return report(UserOutcome::Unchanged);
        }
        info!(files = listing.records.len(), "Retrieved files");

        let options = CollectOptions::from(self.config.as_ref());
        let assets = match collect_assets(storage.as_ref(), &listing.records, &options).await {
            Collected::Assets(assets) => assets,
            Collected::IndexOverride(content) => {
                return if self.publish(&user, &content).await {
                    self.services.metrics.event(MetricEvent::UserProcessed);
                    info!("User page rendered successfully (with index)");
                    report(UserOutcome::PublishedOverride)
                } else {
                    self.services.metrics.event(MetricEvent::PageRenderError);
                    report(UserOutcome::PublishFailed)
                };
            }
        };
        info!(assets = assets.len(), "Evaluated assets");

        let mut page = assemble_page(assets);
        page.title = synced.settings.title.clone();

        let rendered = match self.services.renderer.render(&page) {
            Ok(html) => html,
            Err(e) => {
                error!(error = %e, "Error rendering template");
                self.services.metrics.event(MetricEvent::PageRenderError);
                return report(UserOutcome::RenderFailed);
            }
        };

        if !self.publish(&user, &rendered).await {
            self.services.metrics.event(MetricEvent::PageRenderError);
            return report(UserOutcome::PublishFailed);
        }
        self.services.metrics.event(MetricEvent::UserProcessed);
        info!("User page rendered successfully");

        match self
            .services
            .store
            .update_folder_checksum(&user, &listing.hash)
            .await
        {
            Ok(()) => info!(hash = %listing.hash, "Updated folder checksum"),
            Err(e) => error!(error = %e, "Error updating folder checksum"),
        }

        report(UserOutcome::Published)
    }

    async fn store_domain(&self, user: &User, domain: &str, revision: &str) {
        if let Err(e) = self.services.store.update_domain(user, domain, revision).await {
            error!(error = %e, domain, "Failed to update user domain");
            return;
        }
        match self.services.registrar.register(domain).await {
            Ok(()) => info!(domain, "User domain updated successfully"),
            Err(e) => error!(error = %e, domain, "Failed to register domain"),
        }
    }

    async fn publish(&self, user: &User, page: &str) -> bool {
        let key = cache_key(&self.config.pages.cache_prefix, user);
        match self.services.cache.set(&key, page).await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, key = %key, "Error saving page to cache");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_namespaces_by_user() {
        let user = User {
            id: 7,
            storage_token: "t".into(),
            storage_uid: "dbx42".into(),
            name: "jack".into(),
            folder_checksum: None,
            settings_revision: None,
            domain: None,
        };
        assert_eq!(cache_key("page", &user), "page:7:dbx42");
    }
}
