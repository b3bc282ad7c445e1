#[cfg(feature = "store-memory")]
use crate::InMemoryStore;
#[cfg(feature = "store-rest")]
use crate::RestStore;
use crate::{RemoteStore, StoreBackend, StoreResult};
use crewboard_core::Config;
use std::sync::Arc;

/// Create a store backend based on configuration
pub fn create_store(config: &Config) -> StoreResult<Arc<dyn RemoteStore>> {
    match config.store_backend {
        #[cfg(feature = "store-rest")]
        StoreBackend::Rest => {
            let store = RestStore::from_config(config)?;
            tracing::debug!(url = %store.base_url(), "Using REST store backend");
            Ok(Arc::new(store))
        }

        #[cfg(not(feature = "store-rest"))]
        StoreBackend::Rest => Err(crate::StoreError::ConfigError(
            "REST store backend not available (store-rest feature not enabled)".to_string(),
        )),

        #[cfg(feature = "store-memory")]
        StoreBackend::Memory => {
            tracing::debug!("Using in-memory store backend");
            Ok(Arc::new(InMemoryStore::new()))
        }

        #[cfg(not(feature = "store-memory"))]
        StoreBackend::Memory => Err(crate::StoreError::ConfigError(
            "In-memory store backend not available (store-memory feature not enabled)"
                .to_string(),
        )),
    }
}
