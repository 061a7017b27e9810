use crate::config::Config;
use crate::document;
use crate::entity::Identity;
use crate::error::{FlatDbError, Result};
use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;

/// Whole-file access to the JSON documents in a store directory.
/// Each entity category owns exactly one file holding a JSON array.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    config: Config,
}

impl DocumentStore {
    /// Open a store, creating its directory if it does not exist yet.
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        if !config.dir.exists() {
            log::debug!("Creating store directory {}", config.dir.display());
            std::fs::create_dir_all(&config.dir)?;
        }
        Ok(DocumentStore { config })
    }

    pub fn root(&self) -> &Path {
        &self.config.dir
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// File backing the given entity type
    pub fn path_for(&self, identity: &Identity) -> PathBuf {
        self.config
            .dir
            .join(format!("{}.{}", identity.category, self.config.extension))
    }

    /// Read the whole document for an entity type.
    /// A missing file is not an error: it yields `Value::Null`.
    pub fn load(&self, identity: &Identity) -> Result<Value> {
        let path = self.path_for(identity);
        if !path.exists() {
            return Ok(Value::Null);
        }

        let content = std::fs::read(&path)?;
        if content.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&content)?)
    }

    /// Load the records of an entity type as an array
    pub fn load_records(&self, identity: &Identity) -> Result<Vec<Value>> {
        let document = self.load(identity)?;
        document::into_records(document, &self.path_for(identity))
    }

    /// Append one record to the entity's array and rewrite the file.
    /// Callers are expected to hold the driver's write lock.
    pub fn append(&self, identity: &Identity, record: Value) -> Result<()> {
        let mut records = self.load_records(identity)?;
        records.push(record);
        self.write_all(identity, &records)
    }

    /// Replace the entity's file with the given records.
    pub fn write_all(&self, identity: &Identity, records: &[Value]) -> Result<()> {
        let path = self.path_for(identity);
        let bytes = if self.config.pretty {
            serde_json::to_vec_pretty(records)?
        } else {
            serde_json::to_vec(records)?
        };

        // Write beside the target so the rename stays on one filesystem
        let mut tmp = NamedTempFile::new_in(&self.config.dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| FlatDbError::Persist {
            path: path.clone(),
            source: Arc::new(e.error),
        })?;

        log::debug!("Wrote {} record(s) to {}", records.len(), path.display());
        Ok(())
    }

    /// Categories that currently have a document file, sorted by name.
    pub fn categories(&self) -> Result<Vec<String>> {
        let pattern = format!(
            "{}/*.{}",
            glob::Pattern::escape(&self.config.dir.to_string_lossy()),
            glob::Pattern::escape(&self.config.extension)
        );
        let mut categories: Vec<String> = glob::glob(&pattern)
            .map_err(|e| FlatDbError::Config(format!("Glob error: {e}")))?
            .filter_map(|r| r.ok())
            .filter(|p| p.is_file())
            .filter_map(|p| {
                p.file_stem()
                    .and_then(|s| s.to_str())
                    .map(|s| s.to_string())
            })
            .collect();
        categories.sort();
        Ok(categories)
    }
}
