//! Runtime configuration from environment variables
//!
//! - `PORT` (default 3000)
//! - `STORE_BACKEND`: `memory` (default) or `duckdb`
//! - `DATABASE_PATH`: DuckDB file (default `plant_care.duckdb`)

use anyhow::{bail, Result};
use std::sync::Arc;

use crate::store::{EntityStore, MemoryStore};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DATABASE_PATH: &str = "plant_care.duckdb";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    DuckDb,
}

impl StoreBackend {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "" | "memory" => Ok(StoreBackend::Memory),
            "duckdb" => Ok(StoreBackend::DuckDb),
            other => bail!("Unknown STORE_BACKEND '{}' (expected 'memory' or 'duckdb')", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub store: StoreBackend,
    pub database_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            store: StoreBackend::Memory,
            database_path: DEFAULT_DATABASE_PATH.to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!("Ignoring unparsable PORT '{}', using {}", raw, DEFAULT_PORT);
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        let store = match lookup("STORE_BACKEND") {
            Some(raw) => StoreBackend::parse(&raw)?,
            None => StoreBackend::Memory,
        };

        let database_path =
            lookup("DATABASE_PATH").unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string());

        Ok(Self { port, store, database_path })
    }

    /// Build the configured entity store
    pub fn open_store(&self) -> Result<Arc<dyn EntityStore>> {
        match self.store {
            StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
            #[cfg(feature = "durable")]
            StoreBackend::DuckDb => {
                let store = crate::store::DuckDbStore::open(&self.database_path)?;
                Ok(Arc::new(store))
            }
            #[cfg(not(feature = "durable"))]
            StoreBackend::DuckDb => {
                bail!("STORE_BACKEND=duckdb requires building with the 'durable' feature")
            }
        }
    }
}
