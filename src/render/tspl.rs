//! # TSPL Backend
//!
//! Emits a TSPL2 command stream. The header sets the media size in inches
//! and clears the image buffer; each placed element becomes a `TEXT`,
//! `BARCODE` or `BITMAP` command in dots; the trailer issues one `PRINT`
//! with the profile's copy count.
//!
//! `BITMAP` data is binary, so the stream is built as bytes even though most
//! of it is ASCII.

use crate::error::RenderError;
use crate::layout::PlacedElement;
use crate::profile::{ElementKind, LabelProfile};
use crate::render::{OutputFormat, RenderBackend, RenderOptions, bitmap};

pub struct TsplBackend;

impl RenderBackend for TsplBackend {
    fn format(&self) -> OutputFormat {
        OutputFormat::Tspl
    }

    fn render(
        &self,
        placed: &[PlacedElement],
        profile: &LabelProfile,
        opts: &RenderOptions,
    ) -> Result<Vec<u8>, RenderError> {
        let mut out: Vec<u8> = Vec::new();

        // Bare numbers in SIZE/GAP are inches per the TSPL2 reference
        push_line(
            &mut out,
            &format!("SIZE {:.2},{:.2}", profile.media_width_in, profile.media_height_in),
        );
        push_line(&mut out, "GAP 0,0");
        push_line(&mut out, "DENSITY 8");
        push_line(&mut out, "DIRECTION 1");
        push_line(&mut out, "REFERENCE 0,0");
        push_line(&mut out, "CLS");

        for el in placed {
            match el.kind() {
                ElementKind::Text | ElementKind::Date | ElementKind::StaticNote => {
                    // Vector font "0": the multipliers are glyph width and
                    // height in dots
                    push_line(
                        &mut out,
                        &format!(
                            "TEXT {},{},\"0\",0,{},{},\"{}\"",
                            el.rect.x,
                            el.rect.y,
                            el.rect.h / 2,
                            el.rect.h,
                            sanitize(&el.value),
                        ),
                    );
                }
                ElementKind::Barcode => {
                    let symbols = el.value.chars().count() as i64 + 3;
                    let module = (el.rect.w / (symbols * 11 + 2)).max(1);
                    push_line(
                        &mut out,
                        &format!(
                            "BARCODE {},{},\"128\",{},0,0,{},{},\"{}\"",
                            el.rect.x,
                            el.rect.y,
                            el.rect.h,
                            module,
                            module * 2,
                            sanitize(&el.value),
                        ),
                    );
                }
                ElementKind::Image => {
                    emit_bitmap(&mut out, el, opts)?;
                }
            }
        }

        push_line(&mut out, &format!("PRINT 1,{}", profile.copies_per_unit));
        Ok(out)
    }
}

fn push_line(out: &mut Vec<u8>, line: &str) {
    out.extend_from_slice(line.as_bytes());
    out.extend_from_slice(b"\r\n");
}

/// TSPL quotes field data; embedded quotes would truncate it.
fn sanitize(value: &str) -> String {
    value.replace('"', "'")
}

/// `BITMAP x,y,width_bytes,height,mode,data` with mode 0 (overwrite).
/// TSPL bit polarity is inverted: a 0 bit prints black.
fn emit_bitmap(out: &mut Vec<u8>, el: &PlacedElement, opts: &RenderOptions) -> Result<(), RenderError> {
    let fail = |reason: String| RenderError::RenderFailure {
        element: el.name().to_string(),
        reason,
    };
    let bytes = opts
        .assets
        .get(&el.value)
        .ok_or_else(|| fail(format!("missing image asset '{}'", el.value)))?;

    let (w, h) = (el.rect.w.max(0) as usize, el.rect.h.max(0) as usize);
    let mut bm = bitmap::Bitmap::new(w, h);
    bm.draw_image(0, 0, w, h, bytes).map_err(fail)?;

    let bytes_per_row = w.div_ceil(8);
    out.extend_from_slice(
        format!("BITMAP {},{},{},{},0,", el.rect.x, el.rect.y, bytes_per_row, h).as_bytes(),
    );
    for row in bm.packed_rows(true) {
        out.extend_from_slice(&row);
    }
    out.extend_from_slice(b"\r\n");
    Ok(())
}
