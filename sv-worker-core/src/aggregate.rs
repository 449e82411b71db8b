//! First half of page building: walk a folder listing and turn every record
//! into an [`Asset`], fetching text bodies and linking everything else.
//!
//! A failing record is logged and skipped; it never fails the whole folder.
//! A root `index.html` short-circuits everything and is published verbatim.

use tracing::{debug, info, warn};

use crate::classify::classify;
use crate::config::WorkerConfig;
use crate::contract::{RemoteFileRecord, StorageClient};
use crate::error::AssetError;
use crate::link::resolve_link;
use crate::metadata::{parse_metadata, OrderRadix};
use crate::page::{Asset, INJECT_MIME};
use crate::transform::transform;

/// Paths and parsing rules the collector needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectOptions {
    pub settings_path: String,
    pub index_path: String,
    pub radix: OrderRadix,
}

impl From<&WorkerConfig> for CollectOptions {
    fn from(config: &WorkerConfig) -> Self {
        Self {
            settings_path: config.settings.path.clone(),
            index_path: config.pages.index_path.clone(),
            radix: config.pages.order_radix,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Collected {
    Assets(Vec<Asset>),
    /// Raw content of the user's own index page; replaces the generated one.
    IndexOverride(String),
}

enum Step {
    Emit(Asset),
    Skip,
    Override(String),
}

/// Build assets for every record, in listing order.
pub async fn collect_assets<S>(
    storage: &S,
    records: &[RemoteFileRecord],
    options: &CollectOptions,
) -> Collected
where
    S: StorageClient + ?Sized,
{
    let mut assets = Vec::with_capacity(records.len());

    for record in records {
        match collect_one(storage, record, options).await {
            Ok(Step::Emit(asset)) => assets.push(asset),
            Ok(Step::Skip) => debug!(path = %record.path, "Skipped record"),
            Ok(Step::Override(content)) => {
                info!(path = %record.path, "Found index override, skipping page assembly");
                return Collected::IndexOverride(content);
            }
            Err(e) => warn!(path = %record.path, error = %e, "Skipping asset"),
        }
    }

    Collected::Assets(assets)
}

async fn collect_one<S>(
    storage: &S,
    record: &RemoteFileRecord,
    options: &CollectOptions,
) -> Result<Step, AssetError>
where
    S: StorageClient + ?Sized,
{
    let path = record.path.as_str();
    let meta = parse_metadata(path, options.radix);
    let class = classify(path);

    if meta.order.is_fallback() {
        debug!(path, order = ?meta.order, "Using default order");
    }

    let (url, content, mime) = if class.needs_content() {
        if path == options.settings_path {
            return Ok(Step::Skip);
        }
        let file = storage.fetch(path).await.map_err(|source| AssetError::Fetch {
            path: path.to_string(),
            source,
        })?;
        if path == options.index_path {
            return Ok(Step::Override(
                String::from_utf8_lossy(&file.bytes).into_owned(),
            ));
        }
        (
            String::new(),
            transform(&file.bytes, class),
            INJECT_MIME.to_string(),
        )
    } else {
        let url = resolve_link(storage, path)
            .await
            .map_err(|source| AssetError::Link {
                path: path.to_string(),
                source,
            })?;
        (url, String::new(), record.mime_type.clone())
    };

    Ok(Step::Emit(Asset {
        url,
        content,
        mime,
        tag: meta.tag,
        filename: meta.filename,
        order: meta.order.value(),
        is_image: false,
    }))
}
