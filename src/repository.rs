//! Mapping repository: the only code that reads or writes the mapping bucket.

use crate::constants::{MAPPINGS_BUCKET, SHORT_PATH_SEGMENT};
use crate::error::Result;
use crate::storage::Store;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// A persisted short key and the IRI it points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mapping {
    pub key: String,
    pub target: String,
}

/// How the sequence part of a generated key is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum KeyEncoding {
    #[default]
    Decimal,
    Hex,
}

impl KeyEncoding {
    pub fn encode(self, seq: u64) -> String {
        match self {
            KeyEncoding::Decimal => seq.to_string(),
            KeyEncoding::Hex => format!("{seq:x}"),
        }
    }
}

/// Shape of keys produced by [`MappingRepository::create`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyFormat {
    prefix: Option<String>,
    encoding: KeyEncoding,
}

impl KeyFormat {
    /// Bare sequence keys such as `"1"` or `"a"`.
    pub fn short(encoding: KeyEncoding) -> Self {
        Self {
            prefix: None,
            encoding,
        }
    }

    /// Keys of the form `{prefix}s/{seq}`, e.g. `http://localhost:8080/s/1`.
    pub fn prefixed(prefix: impl Into<String>, encoding: KeyEncoding) -> Self {
        Self {
            prefix: Some(prefix.into()),
            encoding,
        }
    }

    pub fn format(&self, seq: u64) -> String {
        let encoded = self.encoding.encode(seq);
        match &self.prefix {
            Some(prefix) => format!("{prefix}{SHORT_PATH_SEGMENT}{encoded}"),
            None => encoded,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MappingRepository {
    store: Arc<Store>,
}

impl MappingRepository {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Store `target` under a freshly generated key and return that key.
    pub fn create(&self, target: &str, format: &KeyFormat) -> Result<String> {
        let key = self.store.update(|tx| {
            let bucket = tx.bucket(MAPPINGS_BUCKET);
            let key = format.format(bucket.next_sequence()?);
            bucket.put(&key, target)?;
            Ok(key)
        })?;
        info!(%key, %target, "mapping created");
        Ok(key)
    }

    /// Upsert: overwrite the target for `key`, creating the mapping if needed.
    pub fn update(&self, key: &str, target: &str) -> Result<()> {
        self.store
            .update(|tx| tx.bucket(MAPPINGS_BUCKET).put(key, target))?;
        info!(%key, %target, "mapping updated");
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<Option<Mapping>> {
        let value = self.store.view(|tx| tx.bucket(MAPPINGS_BUCKET).get(key))?;
        debug!(%key, found = value.is_some(), "mapping lookup");
        Ok(value.filter(|v| !v.is_empty()).map(|target| Mapping {
            key: key.to_string(),
            target,
        }))
    }

    /// Every mapping, highest key first.
    pub fn list(&self) -> Result<Vec<Mapping>> {
        let entries = self.store.view(|tx| tx.bucket(MAPPINGS_BUCKET).entries_rev())?;
        Ok(entries
            .into_iter()
            .map(|(key, target)| Mapping { key, target })
            .collect())
    }

    /// Run a repository operation on the blocking pool.
    pub async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&MappingRepository) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let repo = self.clone();
        tokio::task::spawn_blocking(move || f(&repo)).await?
    }
}
