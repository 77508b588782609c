//! Writes fetched pages to the output directory

use crate::url::filename_for;
use std::path::PathBuf;

/// A page persisted to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPage {
    /// File name inside the save directory
    pub filename: String,
    /// Full path of the written file
    pub path: PathBuf,
}

/// Output directory holding one HTML file per fetched URL
#[derive(Debug, Clone)]
pub struct PageStore {
    save_dir: PathBuf,
}

impl PageStore {
    pub fn new(save_dir: impl Into<PathBuf>) -> Self {
        Self {
            save_dir: save_dir.into(),
        }
    }

    /// Writes rendered HTML under the URL's derived filename
    ///
    /// The directory is created on demand and an existing file is overwritten.
    pub async fn save(&self, url: &str, html: &str) -> std::io::Result<StoredPage> {
        tokio::fs::create_dir_all(&self.save_dir).await?;

        let filename = filename_for(url);
        let path = self.save_dir.join(&filename);
        tokio::fs::write(&path, html.as_bytes()).await?;

        Ok(StoredPage {
            filename,
            path,
        })
    }
}
