//! Cloudinary unsigned uploads.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use super::{DeleteOutcome, MediaFile, MediaKind, ObjectStorage, StoredObject, UploadError, object_path};
use crate::config::CloudinaryConfig;

pub struct CloudinaryStorage {
    http: Client,
    config: CloudinaryConfig,
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

impl CloudinaryStorage {
    pub fn new(config: CloudinaryConfig) -> Result<Self, UploadError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| UploadError::Unavailable(e.to_string()))?;
        Ok(Self { http, config })
    }

    fn upload_url(&self, kind: MediaKind) -> String {
        format!(
            "{}/{}/{}/upload",
            self.config.api_base.trim_end_matches('/'),
            self.config.cloud_name,
            kind.as_str()
        )
    }
}

#[async_trait]
impl ObjectStorage for CloudinaryStorage {
    fn provider(&self) -> &'static str {
        "cloudinary"
    }

    async fn upload(&self, file: &MediaFile, folder: &str) -> Result<StoredObject, UploadError> {
        let kind = file.kind().ok_or_else(|| UploadError::UnsupportedType {
            content_type: file.content_type.clone(),
        })?;

        // Cloudinary appends the extension itself.
        let path = object_path(folder, &file.file_name, Utc::now());
        let (folder_part, name) = path.rsplit_once('/').unwrap_or(("", path.as_str()));
        let id_part = name.rsplit_once('.').map_or(name, |(stem, _)| stem);

        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)
            .map_err(|e| UploadError::UnsupportedType {
                content_type: format!("{} ({e})", file.content_type),
            })?;

        let mut form = Form::new()
            .part("file", part)
            .text("upload_preset", self.config.upload_preset.clone())
            .text("public_id", id_part.to_string());
        if !folder_part.is_empty() {
            form = form.text("folder", folder_part.to_string());
        }

        let response = self
            .http
            .post(self.upload_url(kind))
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            tracing::warn!(status = status.as_u16(), "cloudinary upload failed: {message}");
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| UploadError::Parse(e.to_string()))?;

        Ok(StoredObject {
            url: body.secure_url,
            path: body.public_id,
        })
    }

    /// Deleting needs the signed admin API, which an unsigned preset does not
    /// grant.
    async fn delete(&self, path: &str) -> DeleteOutcome {
        tracing::debug!(path, "cloudinary delete requested without signed API access");
        DeleteOutcome::failed("deleting Cloudinary assets requires a signed API call")
    }
}
