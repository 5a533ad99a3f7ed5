//! Deployment configuration: the chain's vector block and process settings.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{SQLITE_DEFAULT_POOL_SIZE, VECTOR_DB_CONFIG_KEY};
use crate::env_config::{env_parse_optional, env_parse_with_default};
use crate::error::{InputError, InputResult};

/// Precision of the stored embedding column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingPrecision {
    /// 16-bit floats (pgvector `halfvec`).
    #[default]
    Half,
    /// 32-bit floats (pgvector `vector`).
    Single,
}

impl EmbeddingPrecision {
    /// PostgreSQL column type name.
    #[must_use]
    pub const fn pg_type(self) -> &'static str {
        match self {
            Self::Half => "halfvec",
            Self::Single => "vector",
        }
    }

    /// pgvector operator class for the cosine HNSW index.
    #[must_use]
    pub const fn pg_cosine_ops(self) -> &'static str {
        match self {
            Self::Half => "halfvec_cosine_ops",
            Self::Single => "vector_cosine_ops",
        }
    }

    /// Largest dimensionality pgvector can put behind an HNSW index.
    #[must_use]
    pub const fn max_indexed_dimensions(self) -> usize {
        match self {
            Self::Half => 4000,
            Self::Single => 2000,
        }
    }
}

impl Display for EmbeddingPrecision {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match *self {
            Self::Half => write!(f, "half"),
            Self::Single => write!(f, "single"),
        }
    }
}

impl FromStr for EmbeddingPrecision {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "half" => Ok(Self::Half),
            "single" => Ok(Self::Single),
            other => Err(InputError::InvalidConfig(format!("unknown precision: {other}"))),
        }
    }
}

/// Vector store configuration of one chain.
///
/// Fixed for the lifetime of the table: changing `dimensions` after the
/// schema was initialized requires a data migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorDbConfig {
    /// Number of dimensions of the vectors
    pub dimensions: usize,
    #[serde(default)]
    pub precision: EmbeddingPrecision,
}

impl VectorDbConfig {
    pub fn new(dimensions: usize) -> InputResult<Self> {
        Self::with_precision(dimensions, EmbeddingPrecision::default())
    }

    pub fn with_precision(dimensions: usize, precision: EmbeddingPrecision) -> InputResult<Self> {
        let config = Self { dimensions, precision };
        config.validate()?;
        Ok(config)
    }

    /// Read the `vector_db_extension` block of a chain's raw configuration.
    pub fn from_raw_config(raw: &Value) -> InputResult<Self> {
        let block = raw.get(VECTOR_DB_CONFIG_KEY).ok_or_else(|| {
            InputError::InvalidConfig("No vector db extension config present".to_owned())
        })?;
        let config: Self = serde_json::from_value(block.clone())
            .map_err(|e| InputError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> InputResult<()> {
        if self.dimensions == 0 {
            return Err(InputError::InvalidConfig("dimensions must be positive".to_owned()));
        }
        let max = self.precision.max_indexed_dimensions();
        if self.dimensions > max {
            return Err(InputError::InvalidConfig(format!(
                "{} dimensions exceeds the {max} supported for {} precision",
                self.dimensions, self.precision
            )));
        }
        Ok(())
    }
}

pub const ENV_DATABASE_URL: &str = "VECTORDB_DATABASE_URL";
pub const ENV_SQLITE_PATH: &str = "VECTORDB_SQLITE_PATH";
pub const ENV_DB_POOL_SIZE: &str = "VECTORDB_DB_POOL_SIZE";
pub const ENV_HNSW_EF_SEARCH: &str = "VECTORDB_HNSW_EF_SEARCH";
pub const ENV_CHAIN_IID: &str = "VECTORDB_CHAIN_IID";

/// Process-level storage settings, read from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSettings {
    /// PostgreSQL URL; when set the pgvector backend is used.
    pub database_url: Option<String>,
    /// SQLite database file for the local backend.
    pub sqlite_path: Option<PathBuf>,
    pub pool_size: u32,
    /// `hnsw.ef_search` applied to nearest-neighbor reads (PostgreSQL only).
    pub hnsw_ef_search: Option<u32>,
    pub chain_iid: u64,
}

impl StoreSettings {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            database_url: env_parse_optional(ENV_DATABASE_URL),
            sqlite_path: env_parse_optional(ENV_SQLITE_PATH),
            pool_size: env_parse_with_default(ENV_DB_POOL_SIZE, SQLITE_DEFAULT_POOL_SIZE),
            hnsw_ef_search: env_parse_optional(ENV_HNSW_EF_SEARCH),
            chain_iid: env_parse_with_default(ENV_CHAIN_IID, 0),
        }
    }
}
