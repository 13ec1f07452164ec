use anyhow::{anyhow, Result};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::documents::extract::FileKind;
use crate::models::document::{Category, DocKind};

/// Uploaded file bytes, kept in one S3/MinIO bucket.
#[derive(Clone)]
pub struct ObjectStore {
    client: S3Client,
    bucket: String,
}

/// Key layout: `<cvs|jds>/<category-slug>/<uuid><ext>`.
pub fn object_key(kind: DocKind, category: Category, file_id: Uuid, file_kind: FileKind) -> String {
    format!(
        "{}/{}/{}{}",
        kind.folder(),
        category.slug(),
        file_id,
        file_kind.extension()
    )
}

impl ObjectStore {
    pub fn new(client: S3Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    pub async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| anyhow!("S3 upload failed: {e}"))?;

        info!("Uploaded s3://{}/{}", self.bucket, key);
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Bytes> {
        let object = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| anyhow!("S3 download failed: {e}"))?;

        let data = object
            .body
            .collect()
            .await
            .map_err(|e| anyhow!("S3 body read failed: {e}"))?;
        Ok(data.into_bytes())
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| anyhow!("S3 delete failed: {e}"))?;

        info!("Deleted s3://{}/{}", self.bucket, key);
        Ok(())
    }
}
