//! Supabase Storage over its REST API.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;

use super::{DeleteOutcome, MediaFile, ObjectStorage, StoredObject, UploadError, object_path};
use crate::config::SupabaseConfig;

pub struct SupabaseStorage {
    http: Client,
    config: SupabaseConfig,
}

#[derive(Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl SupabaseStorage {
    pub fn new(config: SupabaseConfig) -> Result<Self, UploadError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| UploadError::Unavailable(e.to_string()))?;
        Ok(Self { http, config })
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.config.url, self.config.bucket, path)
    }

    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.config.url, self.config.bucket, path
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.config.anon_key)
            .header("apikey", &self.config.anon_key)
    }

    async fn rejection(response: Response) -> (u16, String) {
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&text)
            .ok()
            .and_then(|e| e.message.or(e.error))
            .unwrap_or(text);
        (status, message)
    }
}

#[async_trait]
impl ObjectStorage for SupabaseStorage {
    fn provider(&self) -> &'static str {
        "supabase"
    }

    async fn upload(&self, file: &MediaFile, folder: &str) -> Result<StoredObject, UploadError> {
        let path = object_path(folder, &file.file_name, Utc::now());

        let request = self
            .http
            .post(self.object_url(&path))
            .header(reqwest::header::CONTENT_TYPE, &file.content_type)
            .header("x-upsert", "false")
            .body(file.bytes.clone());

        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| UploadError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let (status, message) = Self::rejection(response).await;
            tracing::warn!(status, path = %path, "supabase upload failed: {message}");
            return Err(UploadError::Rejected { status, message });
        }

        Ok(StoredObject {
            url: self.public_url(&path),
            path,
        })
    }

    async fn delete(&self, path: &str) -> DeleteOutcome {
        let request = self.http.delete(self.object_url(path.trim_start_matches('/')));
        match self.authorized(request).send().await {
            Ok(response) if response.status().is_success() => DeleteOutcome::ok(),
            Ok(response) => {
                let (status, message) = Self::rejection(response).await;
                tracing::warn!(status, path, "supabase delete failed: {message}");
                DeleteOutcome::failed(message)
            }
            Err(e) => {
                tracing::warn!(path, "supabase delete failed: {e}");
                DeleteOutcome::failed(e.to_string())
            }
        }
    }
}
