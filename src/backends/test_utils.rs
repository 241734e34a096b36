//! Test utilities and mock collaborators for pipeline testing
//!
//! The mocks record every call so tests can verify memoization and stale
//! response handling without a network.

use crate::{
    compositor::ImageLoader,
    error::{Result, StudioError},
    removal::BackgroundRemover,
    types::{CutoutImage, UploadedImage},
};
use async_trait::async_trait;
use image::{DynamicImage, Rgba, RgbaImage};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Remover returning a fixed-size opaque square, or failing on demand
#[derive(Debug, Clone)]
pub struct MockRemover {
    size: (u32, u32),
    should_fail: Arc<Mutex<bool>>,
    call_history: Arc<Mutex<Vec<crate::types::UploadId>>>,
}

impl MockRemover {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            should_fail: Arc::new(Mutex::new(false)),
            call_history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Toggle simulated service failure for subsequent calls
    pub fn set_failing(&self, failing: bool) {
        *self.should_fail.lock().unwrap() = failing;
    }

    pub fn call_count(&self) -> usize {
        self.call_history.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<crate::types::UploadId> {
        self.call_history.lock().unwrap().clone()
    }
}

#[async_trait]
impl BackgroundRemover for MockRemover {
    async fn remove_background(&self, image: &UploadedImage) -> Result<CutoutImage> {
        self.call_history.lock().unwrap().push(image.id());
        if *self.should_fail.lock().unwrap() {
            return Err(StudioError::remote_status(500, "mock failure"));
        }
        let cutout = RgbaImage::from_pixel(self.size.0, self.size.1, Rgba([255, 0, 0, 255]));
        Ok(CutoutImage::new(image.id(), DynamicImage::ImageRgba8(cutout)))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Loader serving solid-colour images registered per URL
#[derive(Debug, Clone, Default)]
pub struct MockImageLoader {
    images: Arc<Mutex<HashMap<String, (u32, u32)>>>,
    call_history: Arc<Mutex<Vec<String>>>,
}

impl MockImageLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve a `width`x`height` blue image at `url`
    #[must_use]
    pub fn with_image(self, url: &str, width: u32, height: u32) -> Self {
        self.images
            .lock()
            .unwrap()
            .insert(url.to_string(), (width, height));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.call_history.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageLoader for MockImageLoader {
    async fn load(&self, source: &str) -> Result<DynamicImage> {
        self.call_history.lock().unwrap().push(source.to_string());
        let size = self.images.lock().unwrap().get(source).copied();
        match size {
            Some((w, h)) => Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
                w,
                h,
                Rgba([0, 0, 255, 255]),
            ))),
            None => Err(StudioError::image_load_from(source, "HTTP 403")),
        }
    }
}
