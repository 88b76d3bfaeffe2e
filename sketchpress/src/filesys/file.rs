//! File operations

use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::errors::AppError;

/// A file wrapper with path
#[derive(Debug, Clone)]
pub struct File {
    path: PathBuf,
}

impl File {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn exists(&self) -> bool {
        fs::metadata(&self.path).await.is_ok()
    }

    pub async fn read_string(&self) -> Result<String, AppError> {
        Ok(fs::read_to_string(&self.path).await?)
    }

    pub async fn read_bytes(&self) -> Result<Vec<u8>, AppError> {
        Ok(fs::read(&self.path).await?)
    }

    pub async fn read_json<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        let contents = self.read_string().await?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Write through a sibling temp file and rename, creating parent directories
    pub async fn write_bytes(&self, contents: &[u8]) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let temp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(contents).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &self.path).await?;
        Ok(())
    }

    pub async fn write_json<T: Serialize>(&self, value: &T) -> Result<(), AppError> {
        let contents = serde_json::to_string_pretty(value)?;
        self.write_bytes(contents.as_bytes()).await
    }
}
