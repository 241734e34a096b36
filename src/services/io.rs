//! Upload I/O operations service
//!
//! Keeps filesystem and stream access out of the session so the pipeline
//! itself only ever sees bytes.

use crate::error::{Result, StudioError};
use image::DynamicImage;
use std::path::Path;

/// Raw bytes read for an upload, plus the name it was read under
#[derive(Debug, Clone)]
pub struct UploadSource {
    pub bytes: Vec<u8>,
    pub file_name: Option<String>,
}

/// Service for reading user uploads and decoding them
pub struct UploadIOService;

impl UploadIOService {
    /// Read an upload from a file path
    ///
    /// # Errors
    /// - The file does not exist or cannot be read
    /// - The extension is not a supported image type
    ///
    /// # Examples
    /// ```rust,no_run
    /// use backdrop_studio::services::UploadIOService;
    ///
    /// # async fn example() -> backdrop_studio::Result<()> {
    /// let upload = UploadIOService::read_upload("portrait.jpg").await?;
    /// assert_eq!(upload.file_name.as_deref(), Some("portrait.jpg"));
    /// # Ok(())
    /// # }
    /// ```
    pub async fn read_upload<P: AsRef<Path>>(path: P) -> Result<UploadSource> {
        let path_ref = path.as_ref();

        if !Self::is_supported_format(path_ref) {
            return Err(StudioError::image_load(format!(
                "unsupported upload type: {}",
                path_ref.display()
            )));
        }

        let bytes = tokio::fs::read(path_ref).await.map_err(|e| {
            StudioError::image_load(format!("failed to read {}: {}", path_ref.display(), e))
        })?;
        log::debug!("Read {} bytes from {}", bytes.len(), path_ref.display());

        Ok(UploadSource {
            bytes,
            file_name: path_ref
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_string),
        })
    }

    /// Read an upload from any async reader
    ///
    /// # Errors
    /// - Read failures from the underlying stream
    pub async fn read_from_reader<R: tokio::io::AsyncRead + Unpin>(
        mut reader: R,
    ) -> Result<UploadSource> {
        use tokio::io::AsyncReadExt;

        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;
        Ok(UploadSource {
            bytes,
            file_name: None,
        })
    }

    /// Check if a file path has a supported image extension
    pub fn is_supported_format<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                let ext = ext.to_ascii_lowercase();
                matches!(ext.as_str(), "jpg" | "jpeg" | "png")
                    || (cfg!(feature = "webp-support") && ext == "webp")
            })
    }

    /// Decode upload bytes into a raster
    ///
    /// # Errors
    /// - `StudioError::ImageLoad` when the bytes are not a decodable image
    pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
        image::load_from_memory(bytes)
            .map_err(|e| StudioError::image_load(format!("failed to decode upload: {}", e)))
    }
}
