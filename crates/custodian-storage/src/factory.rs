use crate::{LocalStorage, Storage, StorageResult, UrlSigner};
use custodian_core::Config;
use std::sync::Arc;

/// Create the upload storage described by configuration
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    let signer = UrlSigner::new(config.download_url_secret.as_bytes())?;
    let storage = LocalStorage::new(
        config.local_storage_path.clone(),
        config.local_storage_base_url.clone(),
        signer,
    )
    .await?;

    tracing::info!(
        path = %config.local_storage_path,
        base_url = %config.local_storage_base_url,
        "Local upload storage ready"
    );

    Ok(Arc::new(storage))
}
