use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::metadata::OrderRadix;

/// Tunables for the sweep. Every field has a default, so an empty config
/// file yields a working worker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub sweep: SweepConfig,
    pub settings: SettingsConfig,
    pub pages: PagesConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Pause between two sweeps.
    pub run_delay_secs: u64,
    /// Pause before launching each user's task, to spread storage API load.
    pub per_user_delay_ms: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            run_delay_secs: 3,
            per_user_delay_ms: 50,
        }
    }
}

impl SweepConfig {
    pub fn run_delay(&self) -> Duration {
        Duration::from_secs(self.run_delay_secs)
    }

    pub fn per_user_delay(&self) -> Duration {
        Duration::from_millis(self.per_user_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsConfig {
    /// Path of the settings document inside each user's folder.
    pub path: String,
    /// Title used when the settings document has none.
    pub default_title: String,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            path: "/_settings.txt".to_string(),
            default_title: "A Small Victory".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagesConfig {
    pub order_radix: OrderRadix,
    /// First segment of the cache key pages are published under.
    pub cache_prefix: String,
    /// A file at this path replaces the whole generated page.
    pub index_path: String,
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            order_radix: OrderRadix::Decimal,
            cache_prefix: "page".to_string(),
            index_path: "/index.html".to_string(),
        }
    }
}

impl WorkerConfig {
    pub fn trace_loaded(&self) {
        info!(
            run_delay_secs = self.sweep.run_delay_secs,
            per_user_delay_ms = self.sweep.per_user_delay_ms,
            settings_path = %self.settings.path,
            order_radix = ?self.pages.order_radix,
            "Loaded WorkerConfig"
        );
        debug!(?self, "WorkerConfig loaded (full debug)");
    }
}
