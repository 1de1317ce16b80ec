//! Generation history as a JSON list on disk.
//!
//! Invariant: any image path in history that is not `http(s)://` (or a data
//! URI) is a local file this system owns and may delete. Appending therefore
//! localizes remote and inline images first, so history never depends on
//! external URL liveness.

use std::path::PathBuf;

use tokio::fs;

use crate::error::Result;
use crate::persist::ImageStore;
use crate::types::HistoryRecord;

#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

fn is_remote(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn is_local_path(url: &str) -> bool {
    !url.is_empty() && !is_remote(url) && !url.starts_with("data:")
}

impl HistoryStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(Self { path })
    }

    /// Loads all records. A missing or unparseable file yields an empty
    /// list rather than an error, so a damaged history never bricks the app.
    pub async fn load(&self) -> Result<Vec<HistoryRecord>> {
        let data = match fs::read(&self.path).await {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        match serde_json::from_slice(&data) {
            Ok(records) => Ok(records),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), %err, "history file is corrupt, starting empty");
                Ok(Vec::new())
            }
        }
    }

    pub async fn save(&self, records: &[HistoryRecord]) -> Result<()> {
        let data = serde_json::to_vec_pretty(records)?;
        fs::write(&self.path, data).await?;
        Ok(())
    }

    /// Appends a record, first persisting remote URLs and data URIs into the
    /// image store. Localization failures are logged and the original
    /// reference kept; the record is appended regardless.
    pub async fn append(&self, mut record: HistoryRecord, images: &ImageStore) -> Result<()> {
        for image in &mut record.images {
            if !is_remote(&image.url) && !image.url.starts_with("data:") {
                continue;
            }
            match images.persist(&image.url).await {
                Ok(path) => image.url = path.display().to_string(),
                Err(err) => {
                    tracing::warn!(record = %record.id, %err, "failed to localize history image");
                }
            }
        }

        let mut records = self.load().await?;
        records.push(record);
        self.save(&records).await
    }

    /// Removes a record by id, deleting its local image files unless another
    /// record still references them. File deletion is best-effort: failures
    /// are logged, never propagated.
    pub async fn remove(&self, id: &str) -> Result<()> {
        let records = self.load().await?;
        let (removed, kept): (Vec<HistoryRecord>, Vec<HistoryRecord>) =
            records.into_iter().partition(|record| record.id == id);

        for record in &removed {
            for image in &record.images {
                if !is_local_path(&image.url) {
                    continue;
                }
                let still_referenced = kept
                    .iter()
                    .flat_map(|r| &r.images)
                    .any(|other| other.url == image.url);
                if still_referenced {
                    continue;
                }
                if let Err(err) = fs::remove_file(&image.url).await {
                    tracing::warn!(path = %image.url, %err, "failed to delete history image file");
                }
            }
        }

        self.save(&kept).await
    }
}
