//! Background-to-alpha post-processing for transparent requests.
//!
//! The WebUI rarely returns a real alpha channel unless an extension such as
//! LayerDiffuse is installed, so the writer falls back to one of these
//! heuristics. None of them is exact; they are chosen by configuration.

use crate::{Result, config::BackgroundRemoval};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use serde::Serialize;
use std::io::Cursor;
use std::sync::Arc;

/// A ratio of transparent pixels above this counts as a usable cut-out.
pub const EFFECTIVE_TRANSPARENCY_PERCENT: f64 = 5.0;

pub trait BackgroundRemover: Send + Sync {
    fn name(&self) -> &'static str;

    /// Clears the alpha of background pixels in place and returns how many
    /// pixels were made transparent.
    fn remove_background(&self, image: &mut RgbaImage) -> u64;
}

/// Treats white and very light grey pixels as background.
#[derive(Debug, Clone)]
pub struct NearWhiteBackground {
    pub min_channel: u8,
    pub grey_spread: u8,
    pub grey_floor: u8,
}

impl Default for NearWhiteBackground {
    fn default() -> Self {
        Self {
            min_channel: 245,
            grey_spread: 15,
            grey_floor: 235,
        }
    }
}

impl NearWhiteBackground {
    fn is_background(&self, pixel: &Rgba<u8>) -> bool {
        let [r, g, b, _] = pixel.0;
        if r > self.min_channel && g > self.min_channel && b > self.min_channel {
            return true;
        }
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        max - min < self.grey_spread && max > self.grey_floor
    }
}

impl BackgroundRemover for NearWhiteBackground {
    fn name(&self) -> &'static str {
        "near_white"
    }

    fn remove_background(&self, image: &mut RgbaImage) -> u64 {
        let mut cleared = 0;
        for pixel in image.pixels_mut() {
            if self.is_background(pixel) {
                pixel.0[3] = 0;
                cleared += 1;
            }
        }
        cleared
    }
}

/// Samples the four corners and, when they agree, clears every pixel close
/// to their average color.
#[derive(Debug, Clone)]
pub struct CornerColorBackground {
    pub tolerance: u8,
}

impl Default for CornerColorBackground {
    fn default() -> Self {
        Self { tolerance: 24 }
    }
}

impl CornerColorBackground {
    fn within(&self, a: [u8; 3], b: [u8; 3]) -> bool {
        a.iter()
            .zip(b.iter())
            .all(|(x, y)| x.abs_diff(*y) <= self.tolerance)
    }
}

impl BackgroundRemover for CornerColorBackground {
    fn name(&self) -> &'static str {
        "corner_color"
    }

    fn remove_background(&self, image: &mut RgbaImage) -> u64 {
        let (w, h) = image.dimensions();
        if w == 0 || h == 0 {
            return 0;
        }
        let corners = [(0, 0), (w - 1, 0), (0, h - 1), (w - 1, h - 1)]
            .map(|(x, y)| {
                let [r, g, b, _] = image.get_pixel(x, y).0;
                [r, g, b]
            });

        let mut sum = [0u32; 3];
        for corner in &corners {
            for (acc, channel) in sum.iter_mut().zip(corner) {
                *acc += u32::from(*channel);
            }
        }
        let mean = sum.map(|total| (total / 4) as u8);

        if !corners.iter().all(|corner| self.within(*corner, mean)) {
            return 0;
        }

        let mut cleared = 0;
        for pixel in image.pixels_mut() {
            let [r, g, b, _] = pixel.0;
            if self.within([r, g, b], mean) {
                pixel.0[3] = 0;
                cleared += 1;
            }
        }
        cleared
    }
}

/// Leaves every pixel opaque. The output is still re-encoded as PNG.
#[derive(Debug, Clone, Default)]
pub struct KeepBackground;

impl BackgroundRemover for KeepBackground {
    fn name(&self) -> &'static str {
        "none"
    }

    fn remove_background(&self, _image: &mut RgbaImage) -> u64 {
        0
    }
}

pub fn remover_for(kind: BackgroundRemoval) -> Arc<dyn BackgroundRemover> {
    match kind {
        BackgroundRemoval::NearWhite => Arc::new(NearWhiteBackground::default()),
        BackgroundRemoval::CornerColor => Arc::new(CornerColorBackground::default()),
        BackgroundRemoval::None => Arc::new(KeepBackground),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransparencyReport {
    /// The WebUI already returned transparent pixels.
    pub native_alpha: bool,
    /// Percentage of pixels that are at least partly transparent.
    pub transparent_percent: f64,
    pub strategy: String,
}

impl TransparencyReport {
    pub fn is_effective(&self) -> bool {
        self.transparent_percent > EFFECTIVE_TRANSPARENCY_PERCENT
    }
}

/// Returns PNG bytes with a transparent background, plus a report.
///
/// Images that already carry transparent pixels are passed through
/// untouched; everything else goes through `remover`.
pub fn apply_transparency(bytes: &[u8], remover: &dyn BackgroundRemover) -> Result<(Vec<u8>, TransparencyReport)> {
    let decoded = image::load_from_memory(bytes)?;
    let total = u64::from(decoded.width()) * u64::from(decoded.height());
    let percent = |count: u64| {
        if total == 0 {
            0.0
        } else {
            count as f64 / total as f64 * 100.0
        }
    };

    if decoded.color().has_alpha() {
        let rgba = decoded.to_rgba8();
        let see_through = rgba.pixels().filter(|p| p.0[3] < u8::MAX).count() as u64;
        if see_through > 0 {
            return Ok((
                bytes.to_vec(),
                TransparencyReport {
                    native_alpha: true,
                    transparent_percent: percent(see_through),
                    strategy: "native".to_string(),
                },
            ));
        }
    }

    let mut rgba = decoded.to_rgba8();
    let cleared = remover.remove_background(&mut rgba);

    let mut encoded = Vec::new();
    DynamicImage::ImageRgba8(rgba).write_to(&mut Cursor::new(&mut encoded), ImageFormat::Png)?;

    Ok((
        encoded,
        TransparencyReport {
            native_alpha: false,
            transparent_percent: percent(cleared),
            strategy: remover.name().to_string(),
        },
    ))
}
