//! Font sizing and centered text drawing.

use std::path::Path;

use image::{Rgba, RgbaImage};
use rusttype::{Font, Scale, point};
use tracing::debug;

use crate::error::LingoError;

/// Size decrement between ladder rungs
pub const SIZE_STEP: f32 = 2.0;

/// Weights at or above this use the bold face when one is loaded
pub const BOLD_THRESHOLD: u16 = 600;

/// Measures how wide a run of text renders.
pub trait TextMeasure {
    /// Advance width of `text` at `size` pixels and `weight`.
    fn measure(&self, text: &str, size: f32, weight: u16) -> f32;
}

/// Measures and draws text onto a canvas.
pub trait TextRenderer: TextMeasure + Send + Sync {
    /// Draws `text` centered on `(center_x, center_y)`.
    #[allow(clippy::too_many_arguments)]
    fn draw_centered(
        &self,
        canvas: &mut RgbaImage,
        text: &str,
        size: f32,
        weight: u16,
        center_x: f32,
        center_y: f32,
        color: Rgba<u8>,
    );
}

/// Largest size on the ladder `initial_size, initial_size - 2, ...` whose width fits.
///
/// Never returns less than `min_size`; text that still overflows at `min_size` is
/// drawn at `min_size` and clipped.
pub fn fit_text<M: TextMeasure + ?Sized>(
    measure: &M,
    text: &str,
    max_width: f32,
    initial_size: f32,
    min_size: f32,
    weight: u16,
) -> f32 {
    let mut size = initial_size.max(min_size);
    while size > min_size {
        if measure.measure(text, size, weight) <= max_width {
            break;
        }
        size = (size - SIZE_STEP).max(min_size);
    }
    size
}

/// Alpha-blends `color` over `dst` with coverage `alpha` (0..=1).
pub(crate) fn blend_pixel(dst: &mut Rgba<u8>, color: Rgba<u8>, alpha: f32) {
    let alpha = alpha.clamp(0.0, 1.0);
    let inv = 1.0 - alpha;
    for channel in 0..3 {
        let mixed = f32::from(color.0[channel]) * alpha + f32::from(dst.0[channel]) * inv;
        dst.0[channel] = mixed.round().clamp(0.0, 255.0) as u8;
    }
    dst.0[3] = 255;
}

/// Regular and optional bold TrueType faces.
pub struct FontSet {
    regular: Font<'static>,
    bold: Option<Font<'static>>,
}

impl std::fmt::Debug for FontSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontSet")
            .field("has_bold", &self.bold.is_some())
            .finish()
    }
}

fn parse_font(bytes: Vec<u8>, label: &str) -> Result<Font<'static>, LingoError> {
    Font::try_from_vec(bytes).ok_or_else(|| LingoError::Font(format!("{label} is not a valid font")))
}

impl FontSet {
    /// Builds a font set from raw TTF/OTF bytes.
    pub fn from_bytes(regular: Vec<u8>, bold: Option<Vec<u8>>) -> Result<Self, LingoError> {
        let regular = parse_font(regular, "regular font")?;
        let bold = bold.map(|bytes| parse_font(bytes, "bold font")).transpose()?;
        Ok(Self { regular, bold })
    }

    /// Reads font files from disk.
    pub fn load(regular: &Path, bold: Option<&Path>) -> Result<Self, LingoError> {
        debug!("Loading regular font from {}", regular.display());
        let regular_bytes = std::fs::read(regular).map_err(|err| {
            LingoError::Font(format!("failed to read {}: {err}", regular.display()))
        })?;
        let bold_bytes = match bold {
            Some(path) => {
                debug!("Loading bold font from {}", path.display());
                Some(std::fs::read(path).map_err(|err| {
                    LingoError::Font(format!("failed to read {}: {err}", path.display()))
                })?)
            }
            None => None,
        };
        Self::from_bytes(regular_bytes, bold_bytes)
    }

    fn face(&self, weight: u16) -> &Font<'static> {
        match &self.bold {
            Some(bold) if weight >= BOLD_THRESHOLD => bold,
            _ => &self.regular,
        }
    }
}

impl TextMeasure for FontSet {
    fn measure(&self, text: &str, size: f32, weight: u16) -> f32 {
        let font = self.face(weight);
        font.layout(text, Scale::uniform(size), point(0.0, 0.0))
            .last()
            .map(|glyph| glyph.position().x + glyph.unpositioned().h_metrics().advance_width)
            .unwrap_or(0.0)
    }
}

impl TextRenderer for FontSet {
    fn draw_centered(
        &self,
        canvas: &mut RgbaImage,
        text: &str,
        size: f32,
        weight: u16,
        center_x: f32,
        center_y: f32,
        color: Rgba<u8>,
    ) {
        let font = self.face(weight);
        let scale = Scale::uniform(size);
        let v_metrics = font.v_metrics(scale);
        let width = self.measure(text, size, weight);
        let origin_x = center_x - width / 2.0;
        // middle of the em box sits on center_y
        let baseline_y = center_y + (v_metrics.ascent + v_metrics.descent) / 2.0;

        let (canvas_width, canvas_height) = canvas.dimensions();
        for glyph in font.layout(text, scale, point(origin_x, baseline_y)) {
            let Some(bounds) = glyph.pixel_bounding_box() else {
                continue;
            };
            glyph.draw(|gx, gy, coverage| {
                let px = gx as i32 + bounds.min.x;
                let py = gy as i32 + bounds.min.y;
                if px < 0 || py < 0 {
                    return;
                }
                let (px, py) = (px as u32, py as u32);
                if px >= canvas_width || py >= canvas_height || coverage <= 0.0 {
                    return;
                }
                blend_pixel(canvas.get_pixel_mut(px, py), color, coverage);
            });
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::BoxRenderer;
    use super::*;

    #[test]
    fn keeps_initial_size_when_text_fits() {
        let measure = BoxRenderer::default();
        assert_eq!(fit_text(&measure, "sol", 740.0, 78.0, 54.0, 800), 78.0);
    }

    #[test]
    fn shrinks_to_largest_fitting_rung() {
        let measure = BoxRenderer::default();
        // 20 chars * size * 0.5 <= 600 => size <= 60
        let size = fit_text(&measure, "abcdefghijklmnopqrst", 600.0, 78.0, 54.0, 800);
        assert_eq!(size, 60.0);
        assert!(measure.measure("abcdefghijklmnopqrst", size + SIZE_STEP, 800) > 600.0);
    }

    #[test]
    fn never_goes_below_minimum() {
        let measure = BoxRenderer::default();
        let long = "x".repeat(200);
        assert_eq!(fit_text(&measure, &long, 740.0, 50.0, 32.0, 500), 32.0);
        // odd distance between bounds still lands on the floor
        assert_eq!(fit_text(&measure, &long, 740.0, 51.0, 32.0, 500), 32.0);
        // initial below the floor is raised to it
        assert_eq!(fit_text(&measure, "a", 740.0, 20.0, 32.0, 500), 32.0);
    }

    #[test]
    fn result_is_largest_fitting_size_on_ladder() {
        let measure = BoxRenderer::default();
        for len in 1..60 {
            let text = "w".repeat(len);
            let size = fit_text(&measure, &text, 740.0, 78.0, 54.0, 800);
            assert!((54.0..=78.0).contains(&size));
            if size > 54.0 {
                assert!(measure.measure(&text, size, 800) <= 740.0);
            }
            if size < 78.0 {
                assert!(measure.measure(&text, size + SIZE_STEP, 800) > 740.0);
            }
            assert_eq!(size, fit_text(&measure, &text, 740.0, 78.0, 54.0, 800));
        }
    }

    #[test]
    fn blend_mixes_channels() {
        let mut pixel = Rgba([200, 100, 0, 255]);
        blend_pixel(&mut pixel, Rgba([0, 0, 0, 255]), 0.5);
        assert_eq!(pixel, Rgba([100, 50, 0, 255]));
    }

    #[test]
    fn invalid_font_bytes_are_rejected() {
        let err = FontSet::from_bytes(b"not a font".to_vec(), None).expect_err("bad font");
        assert!(matches!(err, LingoError::Font(_)));
    }
}
