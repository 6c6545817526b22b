//! # ZPL Backend
//!
//! Emits a ZPL II command stream. One `^XA`...`^XZ` block per label: a
//! header carrying the media size in dots, one field block per placed
//! element, and a `^PQ` print-count trailer equal to the profile's copies.
//!
//! Dot coordinates come straight from the layout engine; nothing here
//! touches DPI.

use crate::error::RenderError;
use crate::layout::PlacedElement;
use crate::profile::{ElementKind, LabelProfile};
use crate::render::{OutputFormat, RenderBackend, RenderOptions, bitmap};

pub struct ZplBackend;

impl RenderBackend for ZplBackend {
    fn format(&self) -> OutputFormat {
        OutputFormat::Zpl
    }

    fn render(
        &self,
        placed: &[PlacedElement],
        profile: &LabelProfile,
        opts: &RenderOptions,
    ) -> Result<Vec<u8>, RenderError> {
        let width_dots = profile.dpi.dots(profile.media_width_in);
        let height_dots = profile.dpi.dots(profile.media_height_in);

        let mut out = String::new();
        out.push_str("^XA\n");
        out.push_str(&format!("^PW{width_dots}\n"));
        out.push_str(&format!("^LL{height_dots}\n"));

        if profile.corner_radius_in > 0.0 {
            out.push_str(&border_box(profile, width_dots, height_dots));
        }

        for el in placed {
            match el.kind() {
                ElementKind::Text | ElementKind::Date | ElementKind::StaticNote => {
                    out.push_str(&text_field(el));
                }
                ElementKind::Barcode => {
                    out.push_str(&barcode_field(el));
                }
                ElementKind::Image => {
                    out.push_str(&graphic_field(el, opts)?);
                }
            }
        }

        out.push_str(&format!("^PQ{}\n", profile.copies_per_unit));
        out.push_str("^XZ\n");
        Ok(out.into_bytes())
    }
}

/// `^GB` border box with the rounding degree scaled from the corner radius.
fn border_box(profile: &LabelProfile, width_dots: i64, height_dots: i64) -> String {
    let half_min = profile.media_width_in.min(profile.media_height_in) / 2.0;
    // ZPL rounding degree: 0 (square) to 8 (fully rounded)
    let rounding = ((profile.corner_radius_in / half_min) * 8.0).round().clamp(0.0, 8.0) as u8;
    format!("^FO0,0^GB{width_dots},{height_dots},2,B,{rounding}^FS\n")
}

fn text_field(el: &PlacedElement) -> String {
    format!(
        "^FO{},{}^A0N,{},{}^FD{}^FS\n",
        el.rect.x,
        el.rect.y,
        el.rect.h,
        // ZPL font width tracks the layout engine's glyph aspect
        el.rect.h / 2,
        sanitize(&el.value),
    )
}

/// `^BC` Code 128 with the module width derived from the element's box.
fn barcode_field(el: &PlacedElement) -> String {
    // Code 128 set B: start + check + stop cost 3 symbols at 11 modules,
    // plus the 2-module stop extension
    let symbols = el.value.chars().count() as i64 + 3;
    let total_modules = symbols * 11 + 2;
    let module = (el.rect.w / total_modules).max(1);
    format!(
        "^FO{},{}^BY{}^BCN,{},N,N,N^FD{}^FS\n",
        el.rect.x,
        el.rect.y,
        module,
        el.rect.h,
        sanitize(&el.value),
    )
}

/// `^GF` inline graphic, hex encoded, rasterized through the shared bitmap
/// module.
fn graphic_field(el: &PlacedElement, opts: &RenderOptions) -> Result<String, RenderError> {
    let fail = |reason: String| RenderError::RenderFailure {
        element: el.name().to_string(),
        reason,
    };
    let bytes = opts
        .assets
        .get(&el.value)
        .ok_or_else(|| fail(format!("missing image asset '{}'", el.value)))?;

    let (w, h) = (el.rect.w.max(0) as usize, el.rect.h.max(0) as usize);
    let mut bitmap = bitmap::Bitmap::new(w, h);
    bitmap.draw_image(0, 0, w, h, bytes).map_err(fail)?;

    let rows = bitmap.packed_rows(false);
    let bytes_per_row = w.div_ceil(8);
    let total = bytes_per_row * h;
    let mut hex = String::with_capacity(total * 2);
    for row in &rows {
        for b in row {
            hex.push_str(&format!("{b:02X}"));
        }
    }

    Ok(format!(
        "^FO{},{}^GFA,{total},{total},{bytes_per_row},{hex}^FS\n",
        el.rect.x, el.rect.y,
    ))
}

/// ZPL control characters cannot appear in field data.
fn sanitize(value: &str) -> String {
    value.replace(['^', '~'], " ")
}
