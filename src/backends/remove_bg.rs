//! remove.bg HTTP backend

use crate::{
    config::RemovalServiceConfig,
    error::{Result, StudioError},
    removal::BackgroundRemover,
    types::{CutoutImage, UploadedImage},
};
use async_trait::async_trait;
use instant::Instant;
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use tracing::{debug, info, instrument};

const API_KEY_HEADER: &str = "X-Api-Key";
const DEFAULT_FILE_NAME: &str = "upload";

/// Sends uploads to the remove.bg API and decodes the returned PNG
pub struct RemoveBgBackend {
    client: Client,
    config: RemovalServiceConfig,
}

impl RemoveBgBackend {
    #[must_use]
    pub fn new(client: Client, config: RemovalServiceConfig) -> Self {
        Self { client, config }
    }

    fn form(&self, image: &UploadedImage) -> Result<Form> {
        let part = Part::bytes(image.bytes().to_vec())
            .file_name(image.file_name().unwrap_or(DEFAULT_FILE_NAME).to_string())
            .mime_str(image.mime_type())
            .map_err(|e| StudioError::remote_service(format!("invalid upload type: {}", e)))?;

        Ok(Form::new()
            .part("image_file", part)
            .text("size", self.config.size.clone()))
    }
}

#[async_trait]
impl BackgroundRemover for RemoveBgBackend {
    #[instrument(skip(self, image), fields(upload = %image.id(), bytes = image.bytes().len()))]
    async fn remove_background(&self, image: &UploadedImage) -> Result<CutoutImage> {
        let key = self.config.api_key.as_deref().ok_or_else(|| {
            StudioError::invalid_config(format!(
                "{} is not set",
                crate::config::REMOVEBG_API_KEY_ENV
            ))
        })?;

        let start = Instant::now();
        let response = self
            .client
            .post(&self.config.endpoint)
            .header(API_KEY_HEADER, key)
            .multipart(self.form(image)?)
            .send()
            .await
            .map_err(|e| StudioError::remote_service(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StudioError::remote_status(status.as_u16(), &body));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| StudioError::remote_service(format!("failed to read response: {}", e)))?;
        debug!(response_bytes = bytes.len(), "Received cutout");

        let decoded = image::load_from_memory(&bytes).map_err(|e| {
            StudioError::remote_service(format!("service returned an undecodable image: {}", e))
        })?;

        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Background removed"
        );
        Ok(CutoutImage::new(image.id(), decoded))
    }

    fn name(&self) -> &str {
        "remove.bg"
    }
}
