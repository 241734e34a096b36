//! Colour effects with CSS filter semantics
//!
//! Each effect is a chain of filter primitives applied in order, matching how
//! a browser evaluates `filter: sepia(0.5) contrast(1.1)`. Alpha is untouched.

use crate::error::{Result, StudioError};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One CSS filter function
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterOp {
    /// `brightness(amount)`: linear multiplier
    Brightness(f32),
    /// `contrast(amount)`: scale around mid-grey
    Contrast(f32),
    /// `sepia(amount)`: 0 = unchanged, 1 = full sepia
    Sepia(f32),
    /// `hue-rotate(deg)`
    HueRotate(f32),
}

impl FilterOp {
    /// 3x3 colour matrix for the matrix-based filters
    fn matrix(self) -> Option<[[f32; 3]; 3]> {
        match self {
            Self::Sepia(amount) => {
                let inv = 1.0 - amount.clamp(0.0, 1.0);
                Some([
                    [0.393 + 0.607 * inv, 0.769 - 0.769 * inv, 0.189 - 0.189 * inv],
                    [0.349 - 0.349 * inv, 0.686 + 0.314 * inv, 0.168 - 0.168 * inv],
                    [0.272 - 0.272 * inv, 0.534 - 0.534 * inv, 0.131 + 0.869 * inv],
                ])
            },
            Self::HueRotate(degrees) => {
                let (sin, cos) = degrees.to_radians().sin_cos();
                Some([
                    [
                        0.213 + cos * 0.787 - sin * 0.213,
                        0.715 - cos * 0.715 - sin * 0.715,
                        0.072 - cos * 0.072 + sin * 0.928,
                    ],
                    [
                        0.213 - cos * 0.213 + sin * 0.143,
                        0.715 + cos * 0.285 + sin * 0.140,
                        0.072 - cos * 0.072 - sin * 0.283,
                    ],
                    [
                        0.213 - cos * 0.213 - sin * 0.787,
                        0.715 - cos * 0.715 + sin * 0.715,
                        0.072 + cos * 0.928 + sin * 0.072,
                    ],
                ])
            },
            Self::Brightness(_) | Self::Contrast(_) => None,
        }
    }

    /// Apply to one RGB triple in the 0-1 range
    fn apply_rgb(self, rgb: [f32; 3]) -> [f32; 3] {
        match self {
            Self::Brightness(amount) => rgb.map(|c| c * amount),
            Self::Contrast(amount) => rgb.map(|c| (c - 0.5) * amount + 0.5),
            Self::Sepia(_) | Self::HueRotate(_) => match self.matrix() {
                Some(m) => {
                    let [r, g, b] = rgb;
                    [
                        m[0][0] * r + m[0][1] * g + m[0][2] * b,
                        m[1][0] * r + m[1][1] * g + m[1][2] * b,
                        m[2][0] * r + m[2][1] * g + m[2][2] * b,
                    ]
                },
                None => rgb,
            },
        }
        .map(|c| c.clamp(0.0, 1.0))
    }

    fn css(self) -> String {
        match self {
            Self::Brightness(a) => format!("brightness({})", a),
            Self::Contrast(a) => format!("contrast({})", a),
            Self::Sepia(a) => format!("sepia({})", a),
            Self::HueRotate(d) => format!("hue-rotate({}deg)", d),
        }
    }
}

/// Preset effects offered in the preview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    #[default]
    None,
    Brightness,
    Contrast,
    Warm,
    Cool,
    Vintage,
}

impl Effect {
    pub const ALL: [Effect; 6] = [
        Effect::None,
        Effect::Brightness,
        Effect::Contrast,
        Effect::Warm,
        Effect::Cool,
        Effect::Vintage,
    ];

    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Brightness => "brightness",
            Self::Contrast => "contrast",
            Self::Warm => "warm",
            Self::Cool => "cool",
            Self::Vintage => "vintage",
        }
    }

    /// Label shown next to the effect swatch
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Brightness => "Bright",
            Self::Contrast => "Contrast",
            Self::Warm => "Warm",
            Self::Cool => "Cool",
            Self::Vintage => "Vintage",
        }
    }

    #[must_use]
    pub fn filters(self) -> &'static [FilterOp] {
        match self {
            Self::None => &[],
            Self::Brightness => &[FilterOp::Brightness(1.2)],
            Self::Contrast => &[FilterOp::Contrast(1.2)],
            Self::Warm => &[FilterOp::Sepia(0.3)],
            Self::Cool => &[FilterOp::HueRotate(30.0)],
            Self::Vintage => &[FilterOp::Sepia(0.5), FilterOp::Contrast(1.1)],
        }
    }

    /// Equivalent CSS `filter` value, `"none"` for the identity
    #[must_use]
    pub fn css_filter(self) -> String {
        let filters = self.filters();
        if filters.is_empty() {
            return "none".to_string();
        }
        filters
            .iter()
            .map(|f| f.css())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Apply the effect in place
    pub fn apply(self, image: &mut RgbaImage) {
        let filters = self.filters();
        if filters.is_empty() {
            return;
        }

        for pixel in image.pixels_mut() {
            let mut rgb = [
                f32::from(pixel[0]) / 255.0,
                f32::from(pixel[1]) / 255.0,
                f32::from(pixel[2]) / 255.0,
            ];
            for filter in filters {
                rgb = filter.apply_rgb(rgb);
            }
            for (channel, value) in pixel.0.iter_mut().zip(rgb) {
                *channel = (value * 255.0).round() as u8;
            }
        }
    }
}

impl std::fmt::Display for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for Effect {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|effect| effect.id() == needle)
            .ok_or_else(|| {
                StudioError::invalid_config(format!(
                    "Unknown effect '{}'. Available: {}",
                    s,
                    Self::ALL.map(Effect::id).join(", ")
                ))
            })
    }
}
