//! Storage layout

use std::path::PathBuf;

use crate::errors::AppError;
use crate::filesys::dir::Dir;
use crate::filesys::file::File;

/// On-disk layout for sketchpress state
#[derive(Debug, Clone)]
pub struct StorageLayout {
    pub base_dir: PathBuf,
}

impl StorageLayout {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn settings_file(&self) -> File {
        File::new(self.base_dir.join("settings.json"))
    }

    pub fn logs_dir(&self) -> Dir {
        Dir::new(self.base_dir.join("logs"))
    }

    /// Create the directories
    pub async fn setup(&self) -> Result<(), AppError> {
        self.logs_dir().create().await?;
        Ok(())
    }
}

impl Default for StorageLayout {
    fn default() -> Self {
        let base_dir = std::env::var_os("SKETCHPRESS_HOME")
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var_os("HOME")
                    .or_else(|| std::env::var_os("USERPROFILE"))
                    .map(|home| PathBuf::from(home).join(".sketchpress"))
            })
            .unwrap_or_else(|| PathBuf::from(".sketchpress"));

        Self::new(base_dir)
    }
}
