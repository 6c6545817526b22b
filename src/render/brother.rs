//! # Brother QL Raster Backend
//!
//! Rasterizes the whole placed-element set into one monochrome bitmap at the
//! profile's resolution, then frames it with the Brother QL raster transfer
//! protocol: invalidate, initialize, raster-mode switch, print-information,
//! margin and compression setup, one `g` command per raster row, and a final
//! print command. Copies repeat the raster pages with a form-feed between
//! them and print-with-feed at the end.
//!
//! Binarization policy lives in [`crate::render::bitmap`] and is a fixed
//! deterministic function — no dithering.

use crate::error::RenderError;
use crate::layout::PlacedElement;
use crate::profile::{LabelProfile, MediaType};
use crate::render::{OutputFormat, RenderBackend, RenderOptions, bitmap};

pub struct BrotherQlBackend;

const MM_PER_INCH: f64 = 25.4;

impl RenderBackend for BrotherQlBackend {
    fn format(&self) -> OutputFormat {
        OutputFormat::BrotherRaster
    }

    fn render(
        &self,
        placed: &[PlacedElement],
        profile: &LabelProfile,
        opts: &RenderOptions,
    ) -> Result<Vec<u8>, RenderError> {
        let bm = bitmap::rasterize(placed, profile, opts)?;
        let rows = bm.packed_rows(false);
        let bytes_per_row = bm.width.div_ceil(8);
        if bytes_per_row > 255 {
            return Err(RenderError::RenderFailure {
                element: "label".into(),
                reason: format!("raster row of {bytes_per_row} bytes exceeds protocol limit"),
            });
        }

        let mut out: Vec<u8> = Vec::new();

        // Invalidate: flush any half-received command in the printer
        out.extend(std::iter::repeat_n(0x00, 200));
        // ESC @ initialize
        out.extend_from_slice(&[0x1B, 0x40]);
        // ESC i a 01 — switch to raster mode
        out.extend_from_slice(&[0x1B, 0x69, 0x61, 0x01]);

        out.extend(print_information(profile, rows.len() as u32));
        // ESC i d — margin (feed) amount in dots
        out.extend_from_slice(&[0x1B, 0x69, 0x64, 0x00, 0x00]);
        // M 00 — no compression
        out.extend_from_slice(&[0x4D, 0x00]);

        for copy in 0..profile.copies_per_unit {
            for row in &rows {
                out.extend_from_slice(&[0x67, 0x00, bytes_per_row as u8]);
                out.extend_from_slice(row);
            }
            if copy + 1 < profile.copies_per_unit {
                out.push(0x0C); // print page, more to come
            }
        }
        out.push(0x1A); // print last page with feeding

        Ok(out)
    }
}

/// ESC i z — print information: media kind, width and length in mm, and the
/// raster line count.
fn print_information(profile: &LabelProfile, raster_lines: u32) -> Vec<u8> {
    // Valid-field flags: kind | width | length | recovery-on
    let flags: u8 = 0x02 | 0x04 | 0x08 | 0x80;
    let kind: u8 = match profile.media {
        Some(MediaType::Continuous) => 0x0A,
        // Round die-cut stock is still die-cut media to the printer
        Some(MediaType::DieCut) | Some(MediaType::Round) | None => 0x0B,
    };
    let width_mm = (profile.media_width_in * MM_PER_INCH).round() as u8;
    let length_mm = (profile.media_height_in * MM_PER_INCH).round() as u8;

    let mut cmd = vec![0x1B, 0x69, 0x7A, flags, kind, width_mm, length_mm];
    cmd.extend_from_slice(&raster_lines.to_le_bytes());
    cmd.push(0x00); // first page
    cmd.push(0x00); // reserved
    cmd
}
