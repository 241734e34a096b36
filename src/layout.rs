//! Social-media preview layouts and cover fitting

use crate::error::{Result, StudioError};
use image::{imageops, imageops::FilterType, RgbaImage};
use serde::Serialize;

/// Platform a layout is exported for, used in export file names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Instagram,
    Facebook,
    Whatsapp,
}

impl Platform {
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Self::Instagram => "instagram",
            Self::Facebook => "facebook",
            Self::Whatsapp => "whatsapp",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.slug())
    }
}

/// A named export target with fixed pixel dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PreviewLayout {
    pub id: &'static str,
    pub name: &'static str,
    pub platform: Platform,
    pub width: u32,
    pub height: u32,
}

impl PreviewLayout {
    /// Width-to-height ratio label such as `9:16`
    #[must_use]
    pub fn aspect_label(&self) -> String {
        let divisor = gcd(self.width, self.height).max(1);
        format!("{}:{}", self.width / divisor, self.height / divisor)
    }
}

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

pub const LAYOUTS: [PreviewLayout; 5] = [
    PreviewLayout {
        id: "instagram-post",
        name: "Instagram Post",
        platform: Platform::Instagram,
        width: 1080,
        height: 1080,
    },
    PreviewLayout {
        id: "instagram-story",
        name: "Instagram Story",
        platform: Platform::Instagram,
        width: 1080,
        height: 1920,
    },
    PreviewLayout {
        id: "whatsapp-status",
        name: "WhatsApp Status",
        platform: Platform::Whatsapp,
        width: 1080,
        height: 1920,
    },
    PreviewLayout {
        id: "facebook-post",
        name: "Facebook Post",
        platform: Platform::Facebook,
        width: 1200,
        height: 630,
    },
    PreviewLayout {
        id: "facebook-reel",
        name: "Facebook Reel",
        platform: Platform::Facebook,
        width: 1080,
        height: 1920,
    },
];

/// Look up a layout by id
///
/// # Errors
/// - `StudioError::InvalidConfig` for unknown ids
pub fn find(id: &str) -> Result<&'static PreviewLayout> {
    LAYOUTS.iter().find(|layout| layout.id == id).ok_or_else(|| {
        let known: Vec<&str> = LAYOUTS.iter().map(|l| l.id).collect();
        StudioError::invalid_config(format!(
            "Unknown layout '{}'. Available: {}",
            id,
            known.join(", ")
        ))
    })
}

/// Scale `image` to cover `width`x`height` and crop the overflow evenly
///
/// The result always has exactly the requested dimensions.
#[must_use]
pub fn fit_cover(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let (src_w, src_h) = image.dimensions();
    if src_w == 0 || src_h == 0 || width == 0 || height == 0 {
        return RgbaImage::new(width, height);
    }
    if (src_w, src_h) == (width, height) {
        return image.clone();
    }

    let scale = (f64::from(width) / f64::from(src_w)).max(f64::from(height) / f64::from(src_h));
    let scaled_w = ((f64::from(src_w) * scale).ceil() as u32).max(width);
    let scaled_h = ((f64::from(src_h) * scale).ceil() as u32).max(height);

    let scaled = imageops::resize(image, scaled_w, scaled_h, FilterType::Triangle);
    let x = (scaled_w - width) / 2;
    let y = (scaled_h - height) / 2;
    imageops::crop_imm(&scaled, x, y, width, height).to_image()
}
