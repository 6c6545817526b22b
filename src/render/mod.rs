//! # Render Orchestrator and Backends
//!
//! The pipeline entry point: validate → resolve → layout → encode. Every
//! backend consumes the same [`PlacedElement`] list, so layout decisions are
//! made once and only the final serialization differs per engine.
//!
//! | Backend | Engine | Output |
//! |---------|--------|--------|
//! | [`pdf`] | `PDF` | vector page, 72 pt/in |
//! | [`zpl`] | `ZPL` | ZPL II command stream |
//! | [`tspl`] | `TSPL` | TSPL2 command stream |
//! | [`brother`] | `BrotherQL` | raster transfer protocol |
//!
//! Rendering is a pure computation: a failure is never transient, so nothing
//! here retries.

pub mod bitmap;
pub mod brother;
pub mod pdf;
pub mod tspl;
pub mod zpl;

use crate::binding;
use crate::error::RenderError;
use crate::layout::{self, PlacedElement};
use crate::profile::{Engine, LabelProfile, PrinterProfile};
use crate::record::ProductRecord;
use crate::validate;
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::collections::HashMap;

/// Output container format per engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Pdf,
    Zpl,
    Tspl,
    BrotherRaster,
}

impl OutputFormat {
    /// MIME (or closest conventional) type for the boundary response.
    pub fn mime(&self) -> &'static str {
        match self {
            OutputFormat::Pdf => "application/pdf",
            OutputFormat::Zpl => "text/x-zpl",
            OutputFormat::Tspl => "text/x-tspl",
            OutputFormat::BrotherRaster => "application/octet-stream",
        }
    }
}

/// Per-call rendering knobs and side inputs.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Embedded PDF creation timestamp. `None` omits it entirely, which
    /// keeps output byte-identical across runs.
    pub timestamp: Option<DateTime<Utc>>,
    /// Binary assets referenced by image elements, keyed by binding key.
    pub assets: HashMap<String, Vec<u8>>,
}

/// A successful render: the engine-native bytes plus their format tag.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
}

/// One encoder per target engine. Backends never re-derive DPI math; dot
/// coordinates arrive fully computed in the placed elements.
pub trait RenderBackend {
    fn format(&self) -> OutputFormat;

    /// Serialize the placed elements. All-or-nothing: on error no partial
    /// output escapes (the buffer is dropped with the call frame).
    fn render(
        &self,
        placed: &[PlacedElement],
        profile: &LabelProfile,
        opts: &RenderOptions,
    ) -> Result<Vec<u8>, RenderError>;
}

/// The backend for an engine. Exhaustive by construction — adding an engine
/// variant forces a decision here.
pub fn backend_for(engine: Engine) -> Box<dyn RenderBackend + Send + Sync> {
    match engine {
        Engine::Pdf => Box::new(pdf::PdfBackend),
        Engine::Zpl => Box::new(zpl::ZplBackend),
        Engine::Tspl => Box::new(tspl::TsplBackend),
        Engine::BrotherQl => Box::new(brother::BrotherQlBackend),
    }
}

/// Run the full pipeline for one product record.
///
/// Short-circuits on the first failure; no bytes are produced unless every
/// stage succeeds.
pub fn render(
    profile: &LabelProfile,
    printer: &PrinterProfile,
    record: &ProductRecord,
    opts: &RenderOptions,
) -> Result<RenderOutput, RenderError> {
    profile.validate_design()?;
    validate::validate(profile, printer)?;
    log::debug!("validated {} label against {} printer", profile.engine, printer.driver);

    let resolved = binding::resolve(profile, record)?;
    let placed = layout::layout(profile, &resolved)?;
    log::debug!("placed {} of {} elements", placed.len(), profile.elements.len());

    let backend = backend_for(profile.engine);
    let bytes = backend.render(&placed, profile, opts)?;
    Ok(RenderOutput { bytes, format: backend.format() })
}

/// Render a batch of independent records in parallel.
///
/// Each render is pure and shares nothing mutable, so records simply fan out
/// across the rayon pool. Results keep the input order; failures are
/// per-record, never batch-wide.
pub fn render_batch(
    profile: &LabelProfile,
    printer: &PrinterProfile,
    records: &[ProductRecord],
    opts: &RenderOptions,
) -> Vec<Result<RenderOutput, RenderError>> {
    records
        .par_iter()
        .map(|record| render(profile, printer, record, opts))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (LabelProfile, PrinterProfile, ProductRecord) {
        let profile: LabelProfile = serde_json::from_str(
            r#"{
                "mediaWidthIn": 4.0, "mediaHeightIn": 6.0, "dpi": 300, "engine": "ZPL",
                "elements": [
                    {"name": "name", "kind": "text", "position": {"x": 0.1, "y": 0.1}},
                    {"name": "sku", "kind": "text", "position": {"x": 0.1, "y": 0.5}}
                ]
            }"#,
        )
        .unwrap();
        let printer: PrinterProfile = serde_json::from_str(
            r#"{"driver": "ZPL", "dpi": 300, "maxWidthIn": 4.0, "maxHeightIn": 6.0}"#,
        )
        .unwrap();
        let record: ProductRecord =
            [("name", "Sourdough Loaf"), ("sku", "SKU-1001")].into_iter().collect();
        (profile, printer, record)
    }

    #[test]
    fn test_render_succeeds() {
        let (profile, printer, record) = fixture();
        let out = render(&profile, &printer, &record, &RenderOptions::default()).unwrap();
        assert_eq!(out.format, OutputFormat::Zpl);
        assert!(!out.bytes.is_empty());
    }

    #[test]
    fn test_incompatible_pairing_produces_no_bytes() {
        let (profile, mut printer, record) = fixture();
        printer.driver = Engine::Tspl;
        let err = render(&profile, &printer, &record, &RenderOptions::default()).unwrap_err();
        assert_eq!(err.kind(), "IncompatibleEngine");
    }

    #[test]
    fn test_design_validation_runs_first() {
        let (mut profile, printer, record) = fixture();
        profile.copies_per_unit = 0;
        let err = render(&profile, &printer, &record, &RenderOptions::default()).unwrap_err();
        assert_eq!(err.kind(), "InvalidProfile");
    }

    #[test]
    fn test_batch_preserves_order_and_isolates_failures() {
        let (profile, printer, record) = fixture();
        let missing = ProductRecord::new();
        let results = render_batch(
            &profile,
            &printer,
            &[record.clone(), missing, record],
            &RenderOptions::default(),
        );
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1].as_ref().unwrap_err(),
            RenderError::MissingRequiredField(_)
        ));
        assert!(results[2].is_ok());
    }

    #[test]
    fn test_mime_tags() {
        assert_eq!(OutputFormat::Pdf.mime(), "application/pdf");
        assert_eq!(backend_for(Engine::BrotherQl).format(), OutputFormat::BrotherRaster);
    }
}
