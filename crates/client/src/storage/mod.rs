//! Object storage for store and event media.
//!
//! Uploads are validated against a [`MediaPolicy`] before any network call.
//! Two providers exist: Cloudinary (unsigned preset uploads) and Supabase
//! Storage. Whichever is configured backs the [`MediaUploader`].

pub mod cloudinary;
pub mod policy;
pub mod supabase;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{CloudinaryConfig, ConfigError, SupabaseConfig};

pub use cloudinary::CloudinaryStorage;
pub use policy::{MediaFile, MediaKind, MediaPolicy};
pub use supabase::SupabaseStorage;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("unsupported file type: {content_type}")]
    UnsupportedType { content_type: String },

    #[error("{kind} too large: {size} bytes (max {max})")]
    TooLarge { kind: MediaKind, size: u64, max: u64 },

    #[error("too many videos (max {max})")]
    TooManyVideos { max: usize },

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("storage rejected the upload ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("invalid storage response: {0}")]
    Parse(String),
}

impl UploadError {
    /// Rejected locally, no request was made.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            UploadError::UnsupportedType { .. } | UploadError::TooLarge { .. } | UploadError::TooManyVideos { .. }
        )
    }

    pub fn user_message(&self) -> String {
        match self {
            UploadError::UnsupportedType { .. } => "Only image and video files can be uploaded.".to_string(),
            UploadError::TooLarge { kind, max, .. } => format!(
                "The {} is too large. The maximum size is {} MB.",
                kind.as_str(),
                max / (1024 * 1024)
            ),
            UploadError::TooManyVideos { max } => format!("At most {max} videos can be attached."),
            UploadError::Unavailable(_) => "File uploads are not available right now.".to_string(),
            UploadError::Network(_) => "The upload failed. Check your connection and try again.".to_string(),
            UploadError::Rejected { message, .. } if !message.trim().is_empty() => message.clone(),
            UploadError::Rejected { .. } | UploadError::Parse(_) => "The upload failed.".to_string(),
        }
    }
}

impl From<ConfigError> for UploadError {
    fn from(e: ConfigError) -> Self {
        UploadError::Unavailable(e.to_string())
    }
}

/// A stored object: public URL plus the provider path used to delete it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    pub url: String,
    pub path: String,
}

/// Result of a delete; never an error, failures are reported inline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeleteOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    fn provider(&self) -> &'static str;

    async fn upload(&self, file: &MediaFile, folder: &str) -> Result<StoredObject, UploadError>;

    async fn delete(&self, path: &str) -> DeleteOutcome;
}

/// `{folder}/{timestamp}-{sanitized file name}`.
pub fn object_path(folder: &str, file_name: &str, now: DateTime<Utc>) -> String {
    let name = sanitize_file_name(file_name);
    let folder = folder.trim_matches('/');
    if folder.is_empty() {
        format!("{}-{name}", now.timestamp_millis())
    } else {
        format!("{folder}/{}-{name}", now.timestamp_millis())
    }
}

/// ASCII letters, digits, `.`, `-` and `_` survive; runs of anything else
/// become a single `_`.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let mut out = String::with_capacity(base.len());
    for c in base.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }

    let trimmed = out.trim_matches(['_', '.']);
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Policy-checked uploads through the configured provider.
#[derive(Clone)]
pub struct MediaUploader {
    storage: Option<Arc<dyn ObjectStorage>>,
    policy: MediaPolicy,
}

impl MediaUploader {
    pub fn new(storage: Arc<dyn ObjectStorage>) -> Self {
        Self {
            storage: Some(storage),
            policy: MediaPolicy::default(),
        }
    }

    /// Supabase when configured, otherwise Cloudinary, otherwise an uploader
    /// that reports itself unavailable.
    pub fn from_env() -> Self {
        Self::from_configs(SupabaseConfig::from_env(), CloudinaryConfig::from_env())
    }

    fn from_configs(
        supabase: Result<SupabaseConfig, ConfigError>,
        cloudinary: Result<CloudinaryConfig, ConfigError>,
    ) -> Self {
        let supabase = supabase.and_then(|config| match SupabaseStorage::new(config) {
            Ok(storage) => Ok(Arc::new(storage) as Arc<dyn ObjectStorage>),
            Err(e) => {
                tracing::warn!("supabase storage disabled: {e}");
                Err(ConfigError::Invalid {
                    var: "SUPABASE_URL",
                    reason: e.to_string(),
                })
            }
        });

        let storage = match supabase {
            Ok(storage) => Some(storage),
            Err(supabase) => match cloudinary {
                Ok(config) => match CloudinaryStorage::new(config) {
                    Ok(storage) => Some(Arc::new(storage) as Arc<dyn ObjectStorage>),
                    Err(e) => {
                        tracing::warn!("cloudinary storage disabled: {e}");
                        None
                    }
                },
                Err(cloudinary) => {
                    tracing::info!(%supabase, %cloudinary, "media uploads disabled");
                    None
                }
            },
        };

        Self {
            storage,
            policy: MediaPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: MediaPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &MediaPolicy {
        &self.policy
    }

    pub fn is_available(&self) -> bool {
        self.storage.is_some()
    }

    fn storage(&self) -> Result<&Arc<dyn ObjectStorage>, UploadError> {
        self.storage
            .as_ref()
            .ok_or_else(|| UploadError::Unavailable("no object storage configured".to_string()))
    }

    pub async fn upload(&self, file: &MediaFile, folder: &str) -> Result<StoredObject, UploadError> {
        self.policy.validate(file)?;
        let storage = self.storage()?;
        let stored = storage.upload(file, folder).await?;
        tracing::info!(provider = storage.provider(), path = %stored.path, size = file.size(), "media uploaded");
        Ok(stored)
    }

    /// Validate the whole batch first, then upload in order. Stops at the
    /// first failure; objects stored before it are logged.
    pub async fn upload_all(
        &self,
        files: &[MediaFile],
        folder: &str,
        existing_videos: usize,
    ) -> Result<Vec<StoredObject>, UploadError> {
        self.policy.validate_batch(files, existing_videos)?;
        let storage = self.storage()?;

        let mut stored = Vec::with_capacity(files.len());
        for file in files {
            match storage.upload(file, folder).await {
                Ok(object) => stored.push(object),
                Err(e) => {
                    tracing::warn!(
                        provider = storage.provider(),
                        uploaded = stored.len(),
                        orphaned = ?stored.iter().map(|o| o.path.as_str()).collect::<Vec<_>>(),
                        "batch upload failed: {e}"
                    );
                    return Err(e);
                }
            }
        }
        Ok(stored)
    }

    pub async fn delete(&self, path: &str) -> DeleteOutcome {
        match self.storage() {
            Ok(storage) => storage.delete(path).await,
            Err(e) => DeleteOutcome::failed(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn object_paths() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let ts = now.timestamp_millis();
        assert_eq!(object_path("stores/7", "Fachada Principal.JPG", now), format!("stores/7/{ts}-fachada_principal.jpg"));
        assert_eq!(object_path("/events/", "../../x.png", now), format!("events/{ts}-x.png"));
        assert_eq!(object_path("", "???", now), format!("{ts}-file"));
    }

    #[derive(Default)]
    struct Counting {
        uploads: AtomicUsize,
    }

    #[async_trait]
    impl ObjectStorage for Counting {
        fn provider(&self) -> &'static str {
            "counting"
        }

        async fn upload(&self, file: &MediaFile, folder: &str) -> Result<StoredObject, UploadError> {
            self.uploads.fetch_add(1, Ordering::SeqCst);
            let path = format!("{folder}/{}", file.file_name);
            Ok(StoredObject {
                url: format!("https://cdn.test/{path}"),
                path,
            })
        }

        async fn delete(&self, _path: &str) -> DeleteOutcome {
            DeleteOutcome::ok()
        }
    }

    fn provider_of(uploader: &MediaUploader) -> Option<&'static str> {
        uploader.storage.as_ref().map(|s| s.provider())
    }

    #[test]
    fn provider_selection_prefers_supabase_then_cloudinary() {
        let supabase = || Ok(SupabaseConfig::new("https://p.supabase.co", "anon"));
        let cloudinary = || Ok(CloudinaryConfig::new("mall", "preset"));
        let missing_supabase = || Err(ConfigError::Missing("SUPABASE_URL"));
        let missing_cloudinary = || Err(ConfigError::Missing("CLOUDINARY_CLOUD_NAME"));

        assert_eq!(provider_of(&MediaUploader::from_configs(supabase(), cloudinary())), Some("supabase"));
        assert_eq!(
            provider_of(&MediaUploader::from_configs(missing_supabase(), cloudinary())),
            Some("cloudinary")
        );

        let none = MediaUploader::from_configs(missing_supabase(), missing_cloudinary());
        assert!(!none.is_available());
    }

    #[tokio::test]
    async fn oversized_image_never_reaches_storage() {
        let storage = Arc::new(Counting::default());
        let uploader = MediaUploader::new(storage.clone());

        let big = MediaFile::new("big.jpg", "image/jpeg", vec![0; 8 * 1024 * 1024]);
        let err = uploader.upload(&big, "stores").await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(storage.uploads.load(Ordering::SeqCst), 0);

        let small = MediaFile::new("small.jpg", "image/jpeg", vec![0; 1024]);
        let stored = uploader.upload(&small, "stores").await.unwrap();
        assert_eq!(stored.path, "stores/small.jpg");
        assert_eq!(storage.uploads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn batch_is_validated_up_front() {
        let storage = Arc::new(Counting::default());
        let uploader = MediaUploader::new(storage.clone());
        let files = vec![
            MediaFile::new("a.png", "image/png", vec![1]),
            MediaFile::new("b.exe", "application/octet-stream", vec![1]),
        ];
        assert!(uploader.upload_all(&files, "events", 0).await.is_err());
        assert_eq!(storage.uploads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unconfigured_uploader_is_unavailable() {
        let uploader = MediaUploader {
            storage: None,
            policy: MediaPolicy::default(),
        };
        assert!(!uploader.is_available());
        let file = MediaFile::new("a.png", "image/png", vec![1]);
        assert!(matches!(uploader.upload(&file, "x").await, Err(UploadError::Unavailable(_))));
        assert!(!uploader.delete("x/a.png").await.success);
    }
}
