use anyhow::{bail, Context, Result};
use std::path::{Component, Path, PathBuf};
use tracing::info;

/// Binary object persistence collaborator
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` at `bucket/path` and return a publicly retrievable URL
    async fn upload(&self, bucket: &str, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String>;
}

/// Object store on the local filesystem, served back under
/// `public_base_url` (see the `/media` route)
pub struct LocalObjectStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn ensure_relative(segment: &str) -> Result<()> {
    let ok = !segment.is_empty()
        && Path::new(segment)
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if !ok {
        bail!("Invalid object path: {:?}", segment);
    }
    Ok(())
}

#[async_trait::async_trait]
impl ObjectStore for LocalObjectStore {
    async fn upload(&self, bucket: &str, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        ensure_relative(bucket)?;
        ensure_relative(path)?;

        let target = self.root.join(bucket).join(path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let size = bytes.len();
        tokio::fs::write(&target, bytes)
            .await
            .with_context(|| format!("Failed to write {}", target.display()))?;

        info!("Uploaded {}/{} ({}, {} bytes)", bucket, path, content_type, size);

        Ok(format!(
            "{}/{}/{}",
            self.public_base_url.trim_end_matches('/'),
            bucket,
            path
        ))
    }
}
