//! Artifact store adapters.
//!
//! - [`LocalArtifactStore`]: objects written to a directory on disk.
//! - [`SupabaseStorage`]: Supabase Storage REST API over `reqwest`.
//!
//! Both refuse to overwrite an existing object name.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use attendance_reports_core::contract::{ArtifactStore, StoreError};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{error, info};

use crate::load_config::SupabaseConfig;

/// Object names are flat: no separators, no parent references.
fn validate_name(name: &str) -> Result<(), StoreError> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !name.contains(['/', '\\']) => Ok(()),
        _ => Err(format!("invalid artifact name: {name:?}").into()),
    }
}

/// Write `content` through `writer`; on failure remove the half-written `path`.
async fn write_or_discard<W>(mut writer: W, path: &Path, content: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let written = async {
        writer.write_all(content).await?;
        writer.flush().await
    }
    .await;
    let Err(e) = written else {
        return Ok(());
    };
    error!(error = ?e, path = %path.display(), "Failed to write artifact, removing it");
    drop(writer);
    if let Err(cleanup) = tokio::fs::remove_file(path).await {
        error!(error = ?cleanup, path = %path.display(), "Failed to remove partial artifact");
    }
    Err(e)
}

pub struct LocalArtifactStore {
    dir: PathBuf,
    public_base_url: Option<String>,
}

impl LocalArtifactStore {
    pub fn new(dir: impl Into<PathBuf>, public_base_url: Option<String>) -> Self {
        Self {
            dir: dir.into(),
            public_base_url: public_base_url.map(|u| u.trim_end_matches('/').to_string()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    async fn upload(
        &self,
        name: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError> {
        validate_name(name)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(name);

        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| {
                error!(error = ?e, path = %path.display(), "Failed to create artifact file");
                e
            })?;
        write_or_discard(file, &path, &content).await?;
        info!(
            path = %path.display(),
            bytes = content.len(),
            content_type,
            "Stored artifact on local disk"
        );
        Ok(())
    }

    async fn public_url(&self, name: &str) -> Result<String, StoreError> {
        validate_name(name)?;
        if let Some(base) = &self.public_base_url {
            return Ok(format!("{base}/{name}"));
        }
        let path = tokio::fs::canonicalize(self.dir.join(name)).await?;
        Ok(format!("file://{}", path.display()))
    }

    async fn delete(&self, name: &str) -> Result<(), StoreError> {
        validate_name(name)?;
        let path = self.dir.join(name);
        tokio::fs::remove_file(&path).await?;
        info!(path = %path.display(), "Deleted local artifact");
        Ok(())
    }
}

pub struct SupabaseStorage {
    client: Client,
    url: String,
    key: String,
    bucket: String,
}

impl SupabaseStorage {
    pub fn new(config: SupabaseConfig) -> Self {
        info!(
            url = %config.url,
            bucket = %config.bucket,
            key_set = !config.key.is_empty(),
            "Initialised Supabase storage client"
        );
        Self {
            client: Client::new(),
            url: config.url.trim_end_matches('/').to_string(),
            key: config.key,
            bucket: config.bucket,
        }
    }

    fn object_url(&self, name: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.url, self.bucket, name)
    }
}

async fn ensure_success(
    response: reqwest::Response,
    operation: &str,
    name: &str,
) -> Result<(), StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    error!(%status, body = %body, object = name, operation, "Supabase storage request failed");
    Err(format!("supabase {operation} of {name} failed with {status}: {body}").into())
}

#[async_trait]
impl ArtifactStore for SupabaseStorage {
    async fn upload(
        &self,
        name: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError> {
        validate_name(name)?;
        let bytes = content.len();
        let response = self
            .client
            .post(self.object_url(name))
            .header(AUTHORIZATION, format!("Bearer {}", self.key))
            .header("apikey", &self.key)
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(content)
            .send()
            .await?;
        ensure_success(response, "upload", name).await?;
        info!(object = name, bucket = %self.bucket, bytes, "Uploaded artifact to Supabase");
        Ok(())
    }

    async fn public_url(&self, name: &str) -> Result<String, StoreError> {
        validate_name(name)?;
        Ok(format!(
            "{}/storage/v1/object/public/{}/{}",
            self.url, self.bucket, name
        ))
    }

    async fn delete(&self, name: &str) -> Result<(), StoreError> {
        validate_name(name)?;
        let response = self
            .client
            .delete(self.object_url(name))
            .header(AUTHORIZATION, format!("Bearer {}", self.key))
            .header("apikey", &self.key)
            .send()
            .await?;
        ensure_success(response, "delete", name).await?;
        info!(object = name, bucket = %self.bucket, "Deleted artifact from Supabase");
        Ok(())
    }
}
