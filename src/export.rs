//! Rendering the final image for a social-media layout
//!
//! Export applies the chosen effect, cover-fits the raster to the layout's
//! pixel size and encodes it as PNG under a brand/platform/date file name.

use crate::{
    compositor::encode_png,
    effects::Effect,
    error::{Result, StudioError},
    layout::{fit_cover, PreviewLayout},
};
use chrono::NaiveDate;
use image::RgbaImage;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Lowercase `brand_name` with every whitespace run replaced by `-`
#[must_use]
pub fn brand_slug(brand_name: &str) -> String {
    join_whitespace_runs(&brand_name.to_lowercase(), '-')
}

/// `@` followed by the lowercased brand with whitespace runs replaced by `_`
#[must_use]
pub fn brand_handle(brand_name: &str) -> String {
    format!("@{}", join_whitespace_runs(&brand_name.to_lowercase(), '_'))
}

fn join_whitespace_runs(text: &str, separator: char) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_run = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_run {
                out.push(separator);
                in_run = true;
            }
        } else {
            out.push(ch);
            in_run = false;
        }
    }
    out
}

/// `{brand-slug}-{platform}-{YYYY-MM-DD}.png`
#[must_use]
pub fn export_file_name(brand_name: &str, platform: &str, date: NaiveDate) -> String {
    format!(
        "{}-{}-{}.png",
        brand_slug(brand_name),
        platform,
        date.format("%Y-%m-%d")
    )
}

/// Everything needed to render one export
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub brand_name: String,
    pub layout: &'static PreviewLayout,
    pub effect: Effect,
    pub date: NaiveDate,
}

impl ExportRequest {
    /// Request dated with today's UTC date
    #[must_use]
    pub fn new(brand_name: impl Into<String>, layout: &'static PreviewLayout, effect: Effect) -> Self {
        Self {
            brand_name: brand_name.into(),
            layout,
            effect,
            date: chrono::Utc::now().date_naive(),
        }
    }

    #[must_use]
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    #[must_use]
    pub fn file_name(&self) -> String {
        export_file_name(&self.brand_name, self.layout.platform.slug(), self.date)
    }
}

/// An encoded export ready to be written
#[derive(Debug, Clone)]
pub struct ExportedImage {
    pub file_name: String,
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl ExportedImage {
    /// Write the PNG into `dir` under its export file name
    ///
    /// # Errors
    /// - Directory creation or write failures
    pub async fn save_to<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(&self.file_name);
        tokio::fs::write(&path, &self.png).await?;
        log::debug!("Wrote {} bytes to {}", self.png.len(), path.display());
        Ok(path)
    }
}

/// Render `source` for `request`: effect, cover fit, PNG
///
/// # Errors
/// - `StudioError::Export` when the brand name is blank
/// - PNG encoding failures
#[instrument(skip(source), fields(layout = request.layout.id, effect = %request.effect))]
pub fn render_export(source: &RgbaImage, request: &ExportRequest) -> Result<ExportedImage> {
    if request.brand_name.trim().is_empty() {
        return Err(StudioError::export("brand name must not be empty"));
    }

    let mut working = source.clone();
    request.effect.apply(&mut working);
    let fitted = fit_cover(&working, request.layout.width, request.layout.height);
    drop(working);

    let png = encode_png(&fitted)?;
    let exported = ExportedImage {
        file_name: request.file_name(),
        png,
        width: fitted.width(),
        height: fitted.height(),
    };
    info!(file = %exported.file_name, bytes = exported.png.len(), "Rendered export");
    Ok(exported)
}
