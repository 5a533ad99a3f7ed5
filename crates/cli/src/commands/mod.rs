use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use ledger_vectordb_core::{EmbeddingPrecision, StoreSettings, VectorDbConfig};
use ledger_vectordb_engine::{QueryRegistry, VectorDbModule};
use ledger_vectordb_storage::StorageBackend;

pub(crate) mod init;
pub(crate) mod mutate;
pub(crate) mod query;

/// Where the command operates, after CLI flags are laid over the environment.
pub(crate) struct Target {
    pub db: Option<PathBuf>,
    pub database_url: Option<String>,
    pub chain_iid: Option<u64>,
    pub dimensions: usize,
    pub precision: EmbeddingPrecision,
}

impl Target {
    fn settings(&self) -> StoreSettings {
        let mut settings = StoreSettings::from_env();
        if let Some(db) = &self.db {
            settings.sqlite_path = Some(db.clone());
            settings.database_url = None;
        }
        if let Some(url) = &self.database_url {
            settings.database_url = Some(url.clone());
        }
        if let Some(chain_iid) = self.chain_iid {
            settings.chain_iid = chain_iid;
        }
        settings
    }
}

/// Open the store and initialize the schema, as a node does on start.
pub(crate) async fn open_module(target: &Target) -> Result<VectorDbModule> {
    let config = VectorDbConfig::with_precision(target.dimensions, target.precision)?;
    let storage = StorageBackend::from_settings(&target.settings(), &crate::get_db_path()).await?;
    let module = VectorDbModule::new(config, Arc::new(storage), Arc::new(QueryRegistry::new()));
    module.initialize().await?;
    Ok(module)
}

pub(crate) fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
