//! ragdb-store
//!
//! Candidate store implementations: [`MemoryStore`] for in-process use and
//! tests, [`LanceStore`] for an on-disk LanceDB table.

pub mod lance;
pub mod memory;
pub mod rank;
pub mod schema;
pub mod search;
pub mod writer;

use std::sync::Arc;

use ragdb_core::settings::StoreConfig;
use ragdb_core::traits::CandidateStore;
use ragdb_core::{Collaborator, Error, Result};

pub use lance::LanceStore;
pub use memory::MemoryStore;

/// Open the store described by `config` (`:memory:` or a LanceDB directory).
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn CandidateStore>> {
    if config.is_memory() {
        return Ok(Arc::new(MemoryStore::new(config.dense_dim)));
    }
    let uri = ragdb_core::config::expand_path(&config.uri);
    let store = LanceStore::open(&uri.to_string_lossy(), &config.table, config.dense_dim)
        .await
        .map_err(|e| Error::upstream(Collaborator::CandidateStore, e))?;
    Ok(Arc::new(store))
}
