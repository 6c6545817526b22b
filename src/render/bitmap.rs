//! # Monochrome Rasterizer
//!
//! Shared bitmap drawing used by the Brother QL backend (whole-label
//! rasterization) and by the line-protocol backends for inline image fields.
//!
//! Everything here is a fixed deterministic function of its input:
//!
//! - Text uses the Spleen 12x24 PSF2 bitmap font, integer-scaled.
//! - Barcodes come from the barcoders Code 128 encoder (character set B).
//! - Images are decoded, nearest-neighbour scaled, grayscale-converted and
//!   binarized at a fixed luma threshold of 128. No dithering, no
//!   randomness: the same asset bytes always produce the same dots.

use crate::error::RenderError;
use crate::layout::PlacedElement;
use crate::profile::{ElementKind, LabelProfile};
use crate::render::RenderOptions;
use barcoders::sym::code128::Code128;
use spleen_font::{FONT_12X24, PSF2Font};

/// Fixed binarization threshold: luma below this prints black.
pub const LUMA_THRESHOLD: u8 = 128;

/// Spleen base glyph cell, dots.
const GLYPH_W: usize = 12;
const GLYPH_H: usize = 24;

/// A 1-bit-per-pixel canvas, one byte per pixel internally (0 = white,
/// 1 = black), packed on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    pub width: usize,
    pub height: usize,
    pixels: Vec<u8>,
}

impl Bitmap {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, pixels: vec![0; width * height] }
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize) {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = 1;
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.pixels[y * self.width + x] == 1
    }

    pub fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize) {
        for yy in y..(y + h).min(self.height) {
            for xx in x..(x + w).min(self.width) {
                self.pixels[yy * self.width + xx] = 1;
            }
        }
    }

    /// Draw text with its cap at `(x, y)`, scaled so a line of text is
    /// `px_height` dots tall (integer multiples of the 24-dot base cell).
    pub fn draw_text(&mut self, x: usize, y: usize, text: &str, px_height: usize) {
        let scale = (px_height / GLYPH_H).max(1);
        let mut font = PSF2Font::new(FONT_12X24).unwrap();
        let mut pen = x;

        for ch in text.chars() {
            let utf8 = ch.to_string();
            if let Some(glyph) = font.glyph_for_utf8(utf8.as_bytes()) {
                for (gy, row) in glyph.enumerate() {
                    for (gx, on) in row.enumerate() {
                        if on {
                            self.fill_rect(pen + gx * scale, y + gy * scale, scale, scale);
                        }
                    }
                }
            }
            // Unknown glyphs still advance the pen
            pen += GLYPH_W * scale;
        }
    }

    /// Draw a Code 128 barcode filling `w` x `h` dots at `(x, y)`, bars
    /// centered horizontally at the widest whole module width that fits.
    pub fn draw_barcode(&mut self, x: usize, y: usize, w: usize, h: usize, data: &str) -> Result<(), String> {
        let modules = code128_modules(data)?;
        let module_w = (w / modules.len()).max(1);
        let used = module_w * modules.len();
        let start = x + w.saturating_sub(used) / 2;

        for (i, &bar) in modules.iter().enumerate() {
            if bar {
                self.fill_rect(start + i * module_w, y, module_w, h);
            }
        }
        Ok(())
    }

    /// Decode an image asset and draw it into `w` x `h` dots at `(x, y)`.
    pub fn draw_image(&mut self, x: usize, y: usize, w: usize, h: usize, bytes: &[u8]) -> Result<(), String> {
        let decoded = image::load_from_memory(bytes).map_err(|e| e.to_string())?;
        let luma = decoded.to_luma8();
        let (src_w, src_h) = (luma.width() as usize, luma.height() as usize);
        if src_w == 0 || src_h == 0 {
            return Err("empty image".into());
        }

        for dy in 0..h {
            for dx in 0..w {
                let sx = (dx * src_w / w).min(src_w - 1);
                let sy = (dy * src_h / h).min(src_h - 1);
                if luma.get_pixel(sx as u32, sy as u32)[0] < LUMA_THRESHOLD {
                    self.set(x + dx, y + dy);
                }
            }
        }
        Ok(())
    }

    /// Pack into rows of bytes, MSB = leftmost pixel. `invert` flips bit
    /// polarity for protocols where 0 means "print".
    pub fn packed_rows(&self, invert: bool) -> Vec<Vec<u8>> {
        let bytes_per_row = self.width.div_ceil(8);
        let mut rows = Vec::with_capacity(self.height);
        for y in 0..self.height {
            let mut row = vec![0u8; bytes_per_row];
            for x in 0..self.width {
                if self.get(x, y) {
                    row[x / 8] |= 0x80 >> (x % 8);
                }
            }
            if invert {
                for b in &mut row {
                    *b = !*b;
                }
            }
            rows.push(row);
        }
        rows
    }

    /// Count of black pixels. Handy for tests and density checks.
    pub fn ink(&self) -> usize {
        self.pixels.iter().filter(|&&p| p == 1).count()
    }
}

/// Code 128 module pattern for `data`, true = bar. Uses character set B,
/// which covers the full printable ASCII range.
pub fn code128_modules(data: &str) -> Result<Vec<bool>, String> {
    let prefixed = format!("\u{0181}{data}");
    let barcode = Code128::new(&prefixed).map_err(|e| format!("code128: {e}"))?;
    Ok(barcode.encode().iter().map(|&m| m == 1).collect())
}

/// Rasterize the whole placed-element set into one label-sized bitmap at the
/// profile's resolution.
pub fn rasterize(
    placed: &[PlacedElement],
    profile: &LabelProfile,
    opts: &RenderOptions,
) -> Result<Bitmap, RenderError> {
    let width = profile.dpi.dots(profile.media_width_in) as usize;
    let height = profile.dpi.dots(profile.media_height_in) as usize;
    let mut bitmap = Bitmap::new(width, height);

    for el in placed {
        let (x, y) = (el.rect.x.max(0) as usize, el.rect.y.max(0) as usize);
        let (w, h) = (el.rect.w.max(0) as usize, el.rect.h.max(0) as usize);
        let fail = |reason: String| RenderError::RenderFailure {
            element: el.name().to_string(),
            reason,
        };

        match el.kind() {
            ElementKind::Text | ElementKind::Date | ElementKind::StaticNote => {
                bitmap.draw_text(x, y, &el.value, h);
            }
            ElementKind::Barcode => {
                bitmap.draw_barcode(x, y, w, h, &el.value).map_err(fail)?;
            }
            ElementKind::Image => {
                let bytes = opts
                    .assets
                    .get(&el.value)
                    .ok_or_else(|| fail(format!("missing image asset '{}'", el.value)))?;
                bitmap.draw_image(x, y, w, h, bytes).map_err(fail)?;
            }
        }
    }

    Ok(bitmap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_rect_clamps() {
        let mut b = Bitmap::new(10, 10);
        b.fill_rect(8, 8, 10, 10);
        assert_eq!(b.ink(), 4);
        assert!(b.get(9, 9));
        assert!(!b.get(7, 9));
    }

    #[test]
    fn test_draw_text_marks_pixels() {
        let mut b = Bitmap::new(200, 48);
        b.draw_text(0, 0, "SKU", 24);
        assert!(b.ink() > 0);
    }

    #[test]
    fn test_draw_text_scales() {
        let mut small = Bitmap::new(400, 100);
        small.draw_text(0, 0, "A", 24);
        let mut big = Bitmap::new(400, 100);
        big.draw_text(0, 0, "A", 48);
        // Double scale quadruples the inked area
        assert_eq!(big.ink(), small.ink() * 4);
    }

    #[test]
    fn test_code128_modules() {
        let modules = code128_modules("SKU-1001").unwrap();
        assert!(!modules.is_empty());
        assert!(modules.iter().any(|&m| m));
        assert!(modules.iter().any(|&m| !m));
        // Determinism
        assert_eq!(modules, code128_modules("SKU-1001").unwrap());
    }

    #[test]
    fn test_draw_barcode_fills_height() {
        let mut b = Bitmap::new(600, 100);
        b.draw_barcode(0, 0, 600, 100, "SKU-1001").unwrap();
        // First bar of a Code 128 start character spans the full height
        let first_bar_x = (0..600).find(|&x| b.get(x, 0)).unwrap();
        for y in 0..100 {
            assert!(b.get(first_bar_x, y));
        }
    }

    #[test]
    fn test_packed_rows_msb_first() {
        let mut b = Bitmap::new(10, 1);
        b.set(0, 0);
        b.set(9, 0);
        let rows = b.packed_rows(false);
        assert_eq!(rows[0], vec![0b1000_0000, 0b0100_0000]);
        let inverted = b.packed_rows(true);
        assert_eq!(inverted[0], vec![0b0111_1111, 0b1011_1111]);
    }

    #[test]
    fn test_image_threshold_deterministic() {
        // 2x1 PNG: one black pixel, one white pixel
        let mut png = Vec::new();
        let img = image::GrayImage::from_fn(2, 1, |x, _| {
            if x == 0 { image::Luma([0u8]) } else { image::Luma([255u8]) }
        });
        image::DynamicImage::ImageLuma8(img)
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let mut b = Bitmap::new(4, 2);
        b.draw_image(0, 0, 4, 2, &png).unwrap();
        // Left half black, right half white, at every scaled pixel
        assert!(b.get(0, 0) && b.get(1, 0) && b.get(1, 1));
        assert!(!b.get(2, 0) && !b.get(3, 1));
    }
}
