use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::Result;

/// Sink for callbacks the watcher does not act on.
#[async_trait]
pub trait PayloadRecorder: Send + Sync {
    /// Keeps a body that matched neither known payload shape.
    async fn record_unhandled(&self, obj_type: &str, obj_id: &str, body: &[u8]) -> Result<()>;

    /// Notes that the board service verified a callback path with a HEAD probe.
    async fn mark_verified(&self, path: &str) -> Result<()>;
}

/// Writes unhandled bodies and verification markers as files in a log directory.
#[derive(Debug, Clone)]
pub struct FileRecorder {
    dir: PathBuf,
}

impl FileRecorder {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn write(&self, file_name: &str, contents: &[u8]) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(file_name);
        tokio::fs::write(&path, contents).await?;
        Ok(path)
    }
}

fn safe_segment(raw: &str) -> String {
    raw.replace(['/', '\\'], "_")
}

#[async_trait]
impl PayloadRecorder for FileRecorder {
    async fn record_unhandled(&self, obj_type: &str, obj_id: &str, body: &[u8]) -> Result<()> {
        let file_name = format!(
            "{}_{}_{}",
            safe_segment(obj_type),
            safe_segment(obj_id),
            Uuid::new_v4().simple()
        );
        let path = self.write(&file_name, body).await?;
        tracing::info!(obj_type, obj_id, path = %path.display(), "Recorded unhandled payload");
        Ok(())
    }

    async fn mark_verified(&self, path: &str) -> Result<()> {
        let file_name = format!("activated-{}", safe_segment(path));
        self.write(&file_name, &[]).await?;
        tracing::debug!(path, "Callback path verified");
        Ok(())
    }
}
