//! Store: one JSON document per metadata name, kept as `<name>.json` files.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;
use tokio::fs;
use tracing::debug;

use crate::error::{MetadataError, MetadataResult};

const DOCUMENT_EXTENSION: &str = "json";
const MAX_NAME_LEN: usize = 128;

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// File-backed metadata store rooted at the shipper's metadata directory.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    dir: PathBuf,
}

impl MetadataStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Names are restricted so a request can never address a file outside `dir`.
    pub fn validate_name(name: &str) -> MetadataResult<()> {
        let valid = !name.is_empty()
            && name.len() <= MAX_NAME_LEN
            && !name.starts_with('.')
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

        if valid {
            Ok(())
        } else {
            Err(MetadataError::InvalidName(name.to_string()))
        }
    }

    fn path_for(&self, name: &str) -> MetadataResult<PathBuf> {
        Self::validate_name(name)?;
        Ok(self.dir.join(format!("{}.{}", name, DOCUMENT_EXTENSION)))
    }

    /// Sorted names of all stored documents. A missing directory is an empty store.
    pub async fn list(&self) -> MetadataResult<Vec<String>> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(DOCUMENT_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if Self::validate_name(stem).is_ok() {
                    names.push(stem.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }

    pub async fn get(&self, name: &str) -> MetadataResult<Value> {
        let path = self.path_for(name)?;
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(MetadataError::NotFound(name.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_slice(&bytes).map_err(|source| MetadataError::CorruptDocument {
            name: name.to_string(),
            source,
        })
    }

    /// Write through a temporary file and rename so readers never see a partial document.
    /// Each write gets its own temporary file; concurrent writers to one name
    /// resolve as last rename wins.
    pub async fn put(&self, name: &str, document: &Value) -> MetadataResult<()> {
        let path = self.path_for(name)?;
        fs::create_dir_all(&self.dir).await?;

        let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp = self.dir.join(format!(
            ".{}.{}.{}-{}.tmp",
            name,
            DOCUMENT_EXTENSION,
            std::process::id(),
            seq
        ));
        let bytes = serde_json::to_vec_pretty(document)?;
        if let Err(e) = fs::write(&tmp, bytes).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        debug!(name = name, path = %path.display(), "Stored metadata document");
        Ok(())
    }
}
