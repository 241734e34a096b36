//! Compositing a cutout over a background raster
//!
//! The background fills the output at its native size. The cutout is scaled
//! uniformly to 80% of the largest size that fits, centred, and alpha-blended
//! on top. Decoded rasters live only for the duration of one call.

use crate::{
    error::{Result, StudioError},
    types::{BackgroundCandidate, CompositeResult, CutoutImage},
};
use async_trait::async_trait;
use image::{imageops, imageops::FilterType, DynamicImage, GenericImageView, ImageFormat, RgbaImage};
use reqwest::Client;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Fraction of the fitting size the subject is drawn at, leaving a margin
pub const SUBJECT_SCALE: f64 = 0.8;

/// Where and how large the cutout is drawn on the output raster
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
    pub scale: f64,
}

/// Compute the placement of a `cutout`-sized subject on an `output`-sized canvas
///
/// # Errors
/// - Either size has a zero dimension
pub fn subject_placement(output: (u32, u32), cutout: (u32, u32)) -> Result<Placement> {
    let (out_w, out_h) = output;
    let (cut_w, cut_h) = cutout;
    if out_w == 0 || out_h == 0 || cut_w == 0 || cut_h == 0 {
        return Err(StudioError::image_load(format!(
            "cannot composite {}x{} cutout onto {}x{} background",
            cut_w, cut_h, out_w, out_h
        )));
    }

    let scale = SUBJECT_SCALE
        * (f64::from(out_w) / f64::from(cut_w)).min(f64::from(out_h) / f64::from(cut_h));
    let width = (f64::from(cut_w) * scale).round().max(1.0) as u32;
    let height = (f64::from(cut_h) * scale).round().max(1.0) as u32;

    Ok(Placement {
        x: (i64::from(out_w) - i64::from(width)) / 2,
        y: (i64::from(out_h) - i64::from(height)) / 2,
        width,
        height,
        scale,
    })
}

/// Draw `cutout` centred over `background`, returning a new raster
///
/// # Errors
/// - Zero-sized inputs
pub fn composite_images(cutout: &DynamicImage, background: &DynamicImage) -> Result<RgbaImage> {
    let placement = subject_placement(background.dimensions(), cutout.dimensions())?;

    let mut canvas = background.to_rgba8();
    let subject = imageops::resize(
        &cutout.to_rgba8(),
        placement.width,
        placement.height,
        FilterType::Triangle,
    );
    imageops::overlay(&mut canvas, &subject, placement.x, placement.y);

    debug!(
        width = canvas.width(),
        height = canvas.height(),
        subject_width = placement.width,
        subject_height = placement.height,
        "Composited cutout"
    );
    Ok(canvas)
}

/// Encode a raster as PNG
///
/// # Errors
/// - PNG encoder failures
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buffer = std::io::Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

/// Source of decoded rasters addressed by URL or path
#[async_trait]
pub trait ImageLoader: Send + Sync {
    /// Fetch and decode the image at `source`
    ///
    /// # Errors
    /// - `StudioError::ImageLoad` for fetch, permission or decode failures
    async fn load(&self, source: &str) -> Result<DynamicImage>;
}

/// Loads `http(s)://` URLs over HTTP and anything else from the filesystem
pub struct HttpImageLoader {
    client: Client,
}

impl HttpImageLoader {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn fetch_bytes(&self, source: &str) -> Result<Vec<u8>> {
        if source.starts_with("http://") || source.starts_with("https://") {
            let response = self
                .client
                .get(source)
                .send()
                .await
                .map_err(|e| StudioError::image_load_from(source, e))?;
            let status = response.status();
            if !status.is_success() {
                return Err(StudioError::image_load_from(
                    source,
                    format!("HTTP {}", status.as_u16()),
                ));
            }
            let bytes = response
                .bytes()
                .await
                .map_err(|e| StudioError::image_load_from(source, e))?;
            Ok(bytes.to_vec())
        } else {
            let path = source.strip_prefix("file://").unwrap_or(source);
            tokio::fs::read(path)
                .await
                .map_err(|e| StudioError::image_load_from(source, e))
        }
    }
}

#[async_trait]
impl ImageLoader for HttpImageLoader {
    async fn load(&self, source: &str) -> Result<DynamicImage> {
        let bytes = self.fetch_bytes(source).await?;
        image::load_from_memory(&bytes).map_err(|e| StudioError::image_load_from(source, e))
    }
}

/// Composites cutouts over candidate backgrounds fetched through a loader
#[derive(Clone)]
pub struct Compositor {
    loader: Arc<dyn ImageLoader>,
}

impl Compositor {
    #[must_use]
    pub fn new(loader: Arc<dyn ImageLoader>) -> Self {
        Self { loader }
    }

    /// Load the candidate's full image and draw the cutout over it
    ///
    /// Every call recomputes the composite, even for a pair seen before.
    ///
    /// # Errors
    /// - `StudioError::ImageLoad` when the background cannot be fetched or decoded
    #[instrument(skip(self, cutout), fields(upload = %cutout.source()))]
    pub async fn composite(
        &self,
        cutout: &CutoutImage,
        background: &BackgroundCandidate,
    ) -> Result<CompositeResult> {
        let backdrop = self.loader.load(&background.full_url).await?;
        let canvas = composite_images(cutout.image(), &backdrop)?;
        drop(backdrop);

        let png = encode_png(&canvas)?;
        Ok(CompositeResult {
            upload_id: cutout.source(),
            background_id: background.id.clone(),
            image: DynamicImage::ImageRgba8(canvas),
            png,
        })
    }
}
