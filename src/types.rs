//! Core data types shared by the pipeline, the session and the candidate client

use image::{DynamicImage, GenericImageView, ImageFormat};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Identity of one upload within a session
///
/// Ids grow monotonically, so an id that differs from the session's current
/// one always belongs to an earlier upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UploadId(pub u64);

impl std::fmt::Display for UploadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "upload-{}", self.0)
    }
}

/// Raw image bytes supplied by the user
///
/// The bytes are shared behind an `Arc` so tickets handed to async work do not
/// copy the payload.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    id: UploadId,
    bytes: Arc<[u8]>,
    file_name: Option<String>,
}

impl UploadedImage {
    #[must_use]
    pub fn new(id: UploadId, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            id,
            bytes: bytes.into(),
            file_name: None,
        }
    }

    /// Attach the original file name, forwarded to the removal service
    #[must_use]
    pub fn with_file_name<S: Into<String>>(mut self, name: S) -> Self {
        self.file_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn id(&self) -> UploadId {
        self.id
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Best-effort MIME type guessed from the payload
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        match image::guess_format(&self.bytes) {
            Ok(ImageFormat::Png) => "image/png",
            Ok(ImageFormat::Jpeg) => "image/jpeg",
            Ok(ImageFormat::WebP) => "image/webp",
            _ => "application/octet-stream",
        }
    }
}

/// Background-removal result for exactly one upload
#[derive(Debug, Clone)]
pub struct CutoutImage {
    source: UploadId,
    image: Arc<DynamicImage>,
}

impl CutoutImage {
    #[must_use]
    pub fn new(source: UploadId, image: DynamicImage) -> Self {
        Self {
            source,
            image: Arc::new(image),
        }
    }

    /// Upload this cutout was derived from
    #[must_use]
    pub fn source(&self) -> UploadId {
        self.source
    }

    #[must_use]
    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// A background option returned by a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundCandidate {
    /// Identifier, unique within one query result
    pub id: String,
    /// Full-size image URL used for compositing
    pub full_url: String,
    /// Small preview URL
    pub thumbnail_url: String,
    /// Credit line, e.g. "Photo by Jane on Unsplash"
    pub attribution: String,
}

/// Composite of one cutout over one background
#[derive(Debug, Clone)]
pub struct CompositeResult {
    /// Upload the embedded cutout was derived from
    pub upload_id: UploadId,
    /// Candidate used as background
    pub background_id: String,
    /// Decoded composite raster
    pub image: DynamicImage,
    /// PNG encoding of `image`
    pub png: Vec<u8>,
}

impl CompositeResult {
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}
