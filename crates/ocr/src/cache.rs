use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::types::TextractResponse;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Corrupt cache entry {path}: {source}")]
    Corrupt { path: String, source: serde_json::Error },
    #[error("Failed to serialize response: {0}")]
    Serialize(serde_json::Error),
}

/// Raw OCR responses keyed by document id, one JSON file per document.
///
/// Layout: `<dir>/<document id>.json`
#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
}

impl ResponseCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn entry_path(&self, document_id: &str) -> PathBuf {
        self.dir.join(format!("{document_id}.json"))
    }

    /// `Ok(None)` on a miss.
    pub async fn get(&self, document_id: &str) -> Result<Option<TextractResponse>, CacheError> {
        let path = self.entry_path(document_id);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| CacheError::Corrupt { path: path.display().to_string(), source })
    }

    pub async fn put(&self, document_id: &str, response: &TextractResponse) -> Result<(), CacheError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let json = serde_json::to_string(response).map_err(CacheError::Serialize)?;
        // An interrupted write never leaves a truncated entry under the final name.
        let partial = self.dir.join(format!("{document_id}.json.partial"));
        tokio::fs::write(&partial, json).await?;
        tokio::fs::rename(&partial, self.entry_path(document_id)).await?;
        Ok(())
    }
}
