//! # PDF Backend
//!
//! Emits a single-page vector PDF at the label's exact media size
//! (72 points per inch): absolute-positioned text runs, a rounded border
//! rect when the profile has a corner radius, vector bar rectangles for
//! barcodes, and embedded grayscale XObjects for images.
//!
//! Output is deterministic: object numbering follows insertion order, the
//! content stream is uncompressed, and no timestamp is embedded unless the
//! caller supplies one through [`RenderOptions`].

use crate::error::RenderError;
use crate::geometry::{in_to_pt, POINTS_PER_INCH};
use crate::layout::PlacedElement;
use crate::profile::{ElementKind, LabelProfile};
use crate::render::{OutputFormat, RenderBackend, RenderOptions, bitmap};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, dictionary};

pub struct PdfBackend;

/// Cubic Bézier circle-quadrant constant for rounded corners.
const KAPPA: f64 = 0.552_284_749_831;

impl RenderBackend for PdfBackend {
    fn format(&self) -> OutputFormat {
        OutputFormat::Pdf
    }

    fn render(
        &self,
        placed: &[PlacedElement],
        profile: &LabelProfile,
        opts: &RenderOptions,
    ) -> Result<Vec<u8>, RenderError> {
        let page_w = in_to_pt(profile.media_width_in);
        let page_h = in_to_pt(profile.media_height_in);
        // Placed rects are device dots; points are a pure unit change.
        let dot_to_pt = POINTS_PER_INCH / profile.dpi.value() as f64;

        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });

        // Embed image assets first so the resources dictionary is complete
        // before the content stream references it.
        let mut xobjects = Dictionary::new();
        let mut ops: Vec<Operation> = Vec::new();

        if profile.corner_radius_in > 0.0 {
            border_ops(&mut ops, profile, page_w, page_h);
        }

        for (i, el) in placed.iter().enumerate() {
            let x = el.rect.x as f64 * dot_to_pt;
            let y = el.rect.y as f64 * dot_to_pt;
            let w = el.rect.w as f64 * dot_to_pt;
            let h = el.rect.h as f64 * dot_to_pt;
            let fail = |reason: String| RenderError::RenderFailure {
                element: el.name().to_string(),
                reason,
            };

            match el.kind() {
                ElementKind::Text | ElementKind::Date | ElementKind::StaticNote => {
                    text_ops(&mut ops, el, x, page_h - y - h, h);
                }
                ElementKind::Barcode => {
                    barcode_ops(&mut ops, el, x, page_h - y - h, w, h)?;
                }
                ElementKind::Image => {
                    let bytes = opts
                        .assets
                        .get(&el.value)
                        .ok_or_else(|| fail(format!("missing image asset '{}'", el.value)))?;
                    let luma = image::load_from_memory(bytes)
                        .map_err(|e| fail(e.to_string()))?
                        .to_luma8();
                    let name = format!("Im{i}");
                    let stream = Stream::new(
                        dictionary! {
                            "Type" => "XObject",
                            "Subtype" => "Image",
                            "Width" => luma.width() as i64,
                            "Height" => luma.height() as i64,
                            "ColorSpace" => "DeviceGray",
                            "BitsPerComponent" => 8,
                        },
                        luma.into_raw(),
                    );
                    let id = doc.add_object(stream);
                    xobjects.set(name.as_bytes(), id);
                    image_ops(&mut ops, &name, x, page_h - y - h, w, h);
                }
            }
        }

        let mut resources = dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        };
        if !xobjects.is_empty() {
            resources.set("XObject", Object::Dictionary(xobjects));
        }
        let resources_id = doc.add_object(resources);

        let content = Content { operations: ops };
        let encoded = content.encode().map_err(|e| RenderError::RenderFailure {
            element: "document".into(),
            reason: format!("content stream: {e}"),
        })?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                (page_w as f32).into(),
                (page_h as f32).into(),
            ],
            "Contents" => content_id,
            "Resources" => resources_id,
        });

        let kids: Vec<Object> = vec![page_id.into()];
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => 1,
            }),
        );

        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);

        let mut info = dictionary! { "Producer" => Object::string_literal("etiqueta") };
        if let Some(ts) = opts.timestamp {
            info.set(
                "CreationDate",
                Object::string_literal(format!("D:{}Z", ts.format("%Y%m%d%H%M%S"))),
            );
        }
        let info_id = doc.add_object(Object::Dictionary(info));
        doc.trailer.set("Info", info_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).map_err(|e| RenderError::RenderFailure {
            element: "document".into(),
            reason: format!("pdf save: {e}"),
        })?;
        Ok(buf)
    }
}

fn op(name: &str, operands: Vec<Object>) -> Operation {
    Operation::new(name, operands)
}

fn real(v: f64) -> Object {
    (v as f32).into()
}

/// Stroke the label outline as a rounded rect inset by the bleed.
fn border_ops(ops: &mut Vec<Operation>, profile: &LabelProfile, page_w: f64, page_h: f64) {
    let r = (profile.corner_radius_in * POINTS_PER_INCH)
        .min(page_w / 2.0)
        .min(page_h / 2.0);
    let inset = profile.bleed_in * POINTS_PER_INCH;
    let (x0, y0) = (inset, inset);
    let (x1, y1) = (page_w - inset, page_h - inset);
    let k = r * KAPPA;

    ops.push(op("w", vec![real(1.0)]));
    ops.push(op("RG", vec![real(0.0), real(0.0), real(0.0)]));
    ops.push(op("m", vec![real(x0 + r), real(y0)]));
    ops.push(op("l", vec![real(x1 - r), real(y0)]));
    ops.push(op("c", vec![real(x1 - r + k), real(y0), real(x1), real(y0 + r - k), real(x1), real(y0 + r)]));
    ops.push(op("l", vec![real(x1), real(y1 - r)]));
    ops.push(op("c", vec![real(x1), real(y1 - r + k), real(x1 - r + k), real(y1), real(x1 - r), real(y1)]));
    ops.push(op("l", vec![real(x0 + r), real(y1)]));
    ops.push(op("c", vec![real(x0 + r - k), real(y1), real(x0), real(y1 - r + k), real(x0), real(y1 - r)]));
    ops.push(op("l", vec![real(x0), real(y0 + r)]));
    ops.push(op("c", vec![real(x0), real(y0 + r - k), real(x0 + r - k), real(y0), real(x0 + r), real(y0)]));
    ops.push(op("S", vec![]));
}

/// A text run at absolute position; font size equals the element height.
fn text_ops(ops: &mut Vec<Operation>, el: &PlacedElement, x: f64, baseline_y: f64, size: f64) {
    ops.push(op("BT", vec![]));
    ops.push(op("Tf", vec![Object::Name(b"F1".to_vec()), real(size)]));
    // Lift the baseline off the box bottom by the typical descender depth
    ops.push(op("Td", vec![real(x), real(baseline_y + size * 0.2)]));
    ops.push(op("Tj", vec![Object::string_literal(el.value.clone())]));
    ops.push(op("ET", vec![]));
}

/// Vector bars: one filled rect per run of black modules.
fn barcode_ops(
    ops: &mut Vec<Operation>,
    el: &PlacedElement,
    x: f64,
    y: f64,
    w: f64,
    h: f64,
) -> Result<(), RenderError> {
    let modules = bitmap::code128_modules(&el.value).map_err(|reason| RenderError::RenderFailure {
        element: el.name().to_string(),
        reason,
    })?;
    let module_w = w / modules.len() as f64;

    ops.push(op("rg", vec![real(0.0), real(0.0), real(0.0)]));
    let mut i = 0;
    while i < modules.len() {
        if modules[i] {
            let start = i;
            while i < modules.len() && modules[i] {
                i += 1;
            }
            ops.push(op(
                "re",
                vec![
                    real(x + start as f64 * module_w),
                    real(y),
                    real((i - start) as f64 * module_w),
                    real(h),
                ],
            ));
            ops.push(op("f", vec![]));
        } else {
            i += 1;
        }
    }
    Ok(())
}

fn image_ops(ops: &mut Vec<Operation>, name: &str, x: f64, y: f64, w: f64, h: f64) {
    ops.push(op("q", vec![]));
    ops.push(op(
        "cm",
        vec![real(w), real(0.0), real(0.0), real(h), real(x), real(y)],
    ));
    ops.push(op("Do", vec![Object::Name(name.as_bytes().to_vec())]));
    ops.push(op("Q", vec![]));
}
