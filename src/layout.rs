//! # Layout Engine
//!
//! Places resolved elements into device-space rectangles inside the
//! safe-drawable rect, and enforces the two hard design rules: nothing may
//! cross into the bleed/margin zone, and text/barcode elements may not
//! overlap each other. Both are validation failures, never auto-corrected —
//! silently shifting or clipping content risks an unreadable safety label.
//!
//! Backends consume the [`PlacedElement`] list as-is; all DPI math happens
//! here, once.

use crate::binding::ResolvedElement;
use crate::error::RenderError;
use crate::geometry::{DotRect, RectIn};
use crate::profile::{ElementKind, LabelProfile};

/// Implicit line height for text-like elements that declare no size.
pub const DEFAULT_TEXT_HEIGHT_IN: f64 = 0.25;

/// Glyph advance as a fraction of line height (Spleen 12x24 aspect).
pub const TEXT_ASPECT: f64 = 0.5;

/// A resolved element with its final device-space rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedElement {
    pub element: crate::profile::Element,
    pub value: String,
    /// Absolute rectangle in device dots from the label's top-left corner.
    pub rect: DotRect,
}

impl PlacedElement {
    pub fn kind(&self) -> ElementKind {
        self.element.kind
    }

    pub fn name(&self) -> &str {
        &self.element.name
    }
}

/// The size an element occupies, in inches. Text-like elements without an
/// explicit box get a deterministic implicit one from their content length.
fn element_size(resolved: &ResolvedElement) -> (f64, f64) {
    if let Some(size) = resolved.element.size {
        return (size.w, size.h);
    }
    let h = DEFAULT_TEXT_HEIGHT_IN;
    let w = resolved.value.chars().count() as f64 * h * TEXT_ASPECT;
    (w, h)
}

/// Position every resolved element inside the safe-drawable rectangle.
///
/// Element positions are relative to the safe rect's origin; the returned
/// rects are absolute label coordinates in dots. Fails with
/// [`RenderError::OutOfSafeArea`] for any rect not fully contained, and with
/// [`RenderError::OverlapDetected`] when two text/barcode rects intersect.
pub fn layout(
    profile: &LabelProfile,
    resolved: &[ResolvedElement],
) -> Result<Vec<PlacedElement>, RenderError> {
    let safe = profile.safe_rect();
    let dpi = profile.dpi.value();
    let mut placed: Vec<PlacedElement> = Vec::with_capacity(resolved.len());

    for item in resolved {
        let (w, h) = element_size(item);
        let abs = RectIn::new(
            safe.x + item.element.position.x,
            safe.y + item.element.position.y,
            w,
            h,
        );

        if !safe.contains(&abs) {
            return Err(RenderError::OutOfSafeArea(item.element.name.clone()));
        }

        let rect = abs.to_dots(dpi);

        if collides(item.element.kind) {
            for earlier in placed.iter().filter(|p| collides(p.kind())) {
                if earlier.rect.intersects(&rect) {
                    return Err(RenderError::OverlapDetected(
                        earlier.name().to_string(),
                        item.element.name.clone(),
                    ));
                }
            }
        }

        placed.push(PlacedElement {
            element: item.element.clone(),
            value: item.value.clone(),
            rect,
        });
    }

    log::trace!("placed {} elements inside {:?}", placed.len(), safe);
    Ok(placed)
}

/// Only text and barcode rects participate in the overlap check.
fn collides(kind: ElementKind) -> bool {
    matches!(kind, ElementKind::Text | ElementKind::Barcode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{Element, PositionIn, SizeIn};
    use pretty_assertions::assert_eq;

    fn profile() -> LabelProfile {
        serde_json::from_str(
            r#"{"mediaWidthIn": 4.0, "mediaHeightIn": 6.0, "dpi": 300, "engine": "ZPL"}"#,
        )
        .unwrap()
    }

    fn resolved(name: &str, kind: ElementKind, x: f64, y: f64, size: Option<SizeIn>, value: &str) -> ResolvedElement {
        ResolvedElement {
            element: Element {
                name: name.into(),
                kind,
                position: PositionIn { x, y },
                size,
                binding_key: None,
            },
            value: value.into(),
        }
    }

    #[test]
    fn test_example_scenario_dot_offsets() {
        // 4"x6" @ 300dpi, no bleed/margin: (0.1, 0.1) -> (30, 30), (0.1, 0.5) -> (30, 150)
        let p = profile();
        let items = vec![
            resolved("productName", ElementKind::Text, 0.1, 0.1, None, "Sourdough Loaf"),
            resolved("sku", ElementKind::Text, 0.1, 0.5, None, "SKU-1001"),
        ];
        let placed = layout(&p, &items).unwrap();
        assert_eq!((placed[0].rect.x, placed[0].rect.y), (30, 30));
        assert_eq!((placed[1].rect.x, placed[1].rect.y), (30, 150));
    }

    #[test]
    fn test_safe_rect_origin_offsets_placement() {
        let mut p = profile();
        p.bleed_in = 0.1;
        p.safe_margin_in = 0.1;
        let items = vec![resolved("name", ElementKind::Text, 0.0, 0.0, None, "Rye")];
        let placed = layout(&p, &items).unwrap();
        // 0.2" inset at 300 dpi
        assert_eq!((placed[0].rect.x, placed[0].rect.y), (60, 60));
    }

    #[test]
    fn test_dpi_doubling_doubles_coordinates() {
        let mut p = profile();
        let items = vec![resolved(
            "sku",
            ElementKind::Barcode,
            0.5,
            1.0,
            Some(SizeIn { w: 2.0, h: 1.0 }),
            "SKU-1001",
        )];
        let at_300 = layout(&p, &items).unwrap();
        p.dpi = crate::profile::Dpi::D600;
        let at_600 = layout(&p, &items).unwrap();
        assert_eq!(at_600[0].rect.x, 2 * at_300[0].rect.x);
        assert_eq!(at_600[0].rect.y, 2 * at_300[0].rect.y);
        assert_eq!(at_600[0].rect.w, 2 * at_300[0].rect.w);
        assert_eq!(at_600[0].rect.h, 2 * at_300[0].rect.h);
    }

    #[test]
    fn test_out_of_safe_area_rejected() {
        let p = profile();
        // 2" wide box starting 3" in on a 4" label
        let items = vec![resolved(
            "logo",
            ElementKind::Image,
            3.0,
            0.5,
            Some(SizeIn { w: 2.0, h: 1.0 }),
            "logo",
        )];
        let err = layout(&p, &items).unwrap_err();
        assert!(matches!(err, RenderError::OutOfSafeArea(ref n) if n == "logo"));
    }

    #[test]
    fn test_margin_shrinks_legal_area() {
        let mut p = profile();
        p.safe_margin_in = 0.5;
        // Fits on the raw media but crosses the margin zone
        let items = vec![resolved(
            "note",
            ElementKind::Text,
            2.6,
            0.1,
            Some(SizeIn { w: 0.5, h: 0.2 }),
            "x",
        )];
        let err = layout(&p, &items).unwrap_err();
        assert_eq!(err.kind(), "OutOfSafeArea");
    }

    #[test]
    fn test_text_overlap_detected() {
        let p = profile();
        let items = vec![
            resolved("allergens", ElementKind::Text, 0.1, 0.1, Some(SizeIn { w: 2.0, h: 0.5 }), "CONTAINS NUTS"),
            resolved("notes", ElementKind::Text, 1.0, 0.3, Some(SizeIn { w: 2.0, h: 0.5 }), "gift wrap"),
        ];
        let err = layout(&p, &items).unwrap_err();
        assert!(matches!(
            err,
            RenderError::OverlapDetected(ref a, ref b) if a == "allergens" && b == "notes"
        ));
    }

    #[test]
    fn test_image_overlap_permitted() {
        // Background image under text is legal; only text/barcode pairs collide
        let p = profile();
        let items = vec![
            resolved("logo", ElementKind::Image, 0.1, 0.1, Some(SizeIn { w: 3.0, h: 3.0 }), "logo"),
            resolved("name", ElementKind::Text, 0.5, 0.5, None, "Rye"),
        ];
        let placed = layout(&p, &items).unwrap();
        assert_eq!(placed.len(), 2);
    }

    #[test]
    fn test_adjacent_elements_do_not_overlap() {
        let p = profile();
        let items = vec![
            resolved("name", ElementKind::Text, 0.1, 0.1, Some(SizeIn { w: 1.0, h: 0.25 }), "a"),
            resolved("sku", ElementKind::Text, 0.1, 0.35, Some(SizeIn { w: 1.0, h: 0.25 }), "b"),
        ];
        let placed = layout(&p, &items).unwrap();
        assert_eq!(placed.len(), 2);
    }

    #[test]
    fn test_containment_holds_for_all_placed() {
        let p = profile();
        let items = vec![
            resolved("name", ElementKind::Text, 0.1, 0.1, None, "Sourdough Loaf"),
            resolved("sku", ElementKind::Barcode, 0.5, 4.0, Some(SizeIn { w: 2.0, h: 1.0 }), "SKU-1001"),
        ];
        let placed = layout(&p, &items).unwrap();
        let safe_dots = p.safe_rect().to_dots(p.dpi.value());
        for el in &placed {
            assert!(el.rect.x >= safe_dots.x);
            assert!(el.rect.y >= safe_dots.y);
            assert!(el.rect.right() <= safe_dots.right());
            assert!(el.rect.bottom() <= safe_dots.bottom());
        }
    }
}
