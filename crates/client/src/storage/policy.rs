//! Client-side media limits, checked before any upload.

use serde::Serialize;

use super::UploadError;

const MB: u64 = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// `image/*` or `video/*`; anything else is unsupported.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type.split(';').next().unwrap_or_default().trim();
        let (top, sub) = essence.split_once('/')?;
        if sub.is_empty() {
            return None;
        }
        match top.to_ascii_lowercase().as_str() {
            "image" => Some(MediaKind::Image),
            "video" => Some(MediaKind::Video),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file picked for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for MediaFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

impl MediaFile {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn kind(&self) -> Option<MediaKind> {
        MediaKind::from_content_type(&self.content_type)
    }
}

/// Size and count limits for entity media.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaPolicy {
    pub max_image_bytes: u64,
    pub max_video_bytes: u64,
    /// Videos allowed per entity, existing ones included.
    pub max_videos: usize,
}

impl Default for MediaPolicy {
    fn default() -> Self {
        Self {
            max_image_bytes: 5 * MB,
            max_video_bytes: 50 * MB,
            max_videos: 3,
        }
    }
}

impl MediaPolicy {
    pub fn max_bytes(&self, kind: MediaKind) -> u64 {
        match kind {
            MediaKind::Image => self.max_image_bytes,
            MediaKind::Video => self.max_video_bytes,
        }
    }

    /// Type and size check for a single file.
    pub fn validate(&self, file: &MediaFile) -> Result<MediaKind, UploadError> {
        let kind = file.kind().ok_or_else(|| UploadError::UnsupportedType {
            content_type: file.content_type.clone(),
        })?;

        let max = self.max_bytes(kind);
        if file.size() > max {
            return Err(UploadError::TooLarge {
                kind,
                size: file.size(),
                max,
            });
        }
        Ok(kind)
    }

    /// Validate a batch; `existing_videos` counts videos already attached to
    /// the entity.
    pub fn validate_batch(&self, files: &[MediaFile], existing_videos: usize) -> Result<(), UploadError> {
        let mut videos = existing_videos;
        for file in files {
            if self.validate(file)? == MediaKind::Video {
                videos += 1;
            }
        }
        if videos > self.max_videos {
            return Err(UploadError::TooManyVideos { max: self.max_videos });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(content_type: &str, size: usize) -> MediaFile {
        MediaFile::new("f", content_type, vec![0; size])
    }

    #[test]
    fn kinds_from_content_type() {
        assert_eq!(MediaKind::from_content_type("image/png"), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_content_type("Video/mp4; codecs=avc1"), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_content_type("application/pdf"), None);
        assert_eq!(MediaKind::from_content_type("image"), None);
        assert_eq!(MediaKind::from_content_type("image/"), None);
    }

    #[test]
    fn size_limits_are_inclusive() {
        let policy = MediaPolicy::default();
        assert!(policy.validate(&file("image/jpeg", 5 * MB as usize)).is_ok());
        assert!(matches!(
            policy.validate(&file("image/jpeg", 8 * MB as usize)),
            Err(UploadError::TooLarge { kind: MediaKind::Image, .. })
        ));
        assert!(policy.validate(&file("video/mp4", 20 * MB as usize)).is_ok());
        assert!(policy.validate(&file("video/mp4", 51 * MB as usize)).is_err());
    }

    #[test]
    fn unsupported_types_are_rejected() {
        assert!(matches!(
            MediaPolicy::default().validate(&file("text/plain", 10)),
            Err(UploadError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn video_count_includes_existing() {
        let policy = MediaPolicy::default();
        let two = vec![file("video/mp4", 10), file("video/webm", 10), file("image/png", 10)];
        assert!(policy.validate_batch(&two, 1).is_ok());
        assert_eq!(
            policy.validate_batch(&two, 2),
            Err(UploadError::TooManyVideos { max: 3 })
        );
    }
}
