use tracing::debug;

use crate::contract::StorageClient;
use crate::error::StorageError;

const SHARE_HOST: &str = "www.dropbox";
const DIRECT_HOST: &str = "dl.dropboxusercontent";

/// Rewrite a share link so it serves raw bytes instead of a preview page.
pub fn direct_link(share_url: &str) -> String {
    share_url.replacen(SHARE_HOST, DIRECT_HOST, 1)
}

/// Ask storage for a permanent link to `path` and make it a direct one.
pub async fn resolve_link<S>(storage: &S, path: &str) -> Result<String, StorageError>
where
    S: StorageClient + ?Sized,
{
    let shared = storage.share_link(path).await?;
    let direct = direct_link(&shared);
    debug!(path, url = %direct, "Resolved direct link");
    Ok(direct)
}
