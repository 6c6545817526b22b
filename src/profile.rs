//! # Label and Printer Profiles
//!
//! The two descriptor types every render call starts from, plus the element
//! and binding tables that make up a label design. Profiles are exchanged as
//! JSON and treated as immutable snapshots per render call — the engine never
//! mutates them.
//!
//! ```ignore
//! use etiqueta::profile::*;
//!
//! let profile: LabelProfile = serde_json::from_str(r#"{
//!     "mediaWidthIn": 4.0, "mediaHeightIn": 6.0,
//!     "dpi": 300, "engine": "ZPL",
//!     "elements": [{"name": "sku", "kind": "barcode",
//!                   "position": {"x": 0.5, "y": 3.0},
//!                   "size": {"w": 2.0, "h": 1.0}}]
//! }"#)?;
//! profile.validate_design()?;
//! ```
//!
//! Unknown JSON fields are ignored; missing required fields fail at
//! deserialization time, not at render time.

use crate::geometry::{self, RectIn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::error::RenderError;

// ============================================================================
// CLOSED VOCABULARIES
// ============================================================================

/// Target printer command language. A closed set — every backend dispatch is
/// an exhaustive match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Engine {
    #[serde(rename = "PDF")]
    Pdf,
    #[serde(rename = "ZPL")]
    Zpl,
    #[serde(rename = "TSPL")]
    Tspl,
    #[serde(rename = "BrotherQL")]
    BrotherQl,
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Engine::Pdf => "PDF",
            Engine::Zpl => "ZPL",
            Engine::Tspl => "TSPL",
            Engine::BrotherQl => "BrotherQL",
        };
        f.write_str(s)
    }
}

/// Supported print resolutions, dots per inch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Dpi {
    D203,
    D300,
    D600,
    D1200,
}

impl Dpi {
    /// The numeric resolution.
    pub fn value(self) -> u32 {
        match self {
            Dpi::D203 => 203,
            Dpi::D300 => 300,
            Dpi::D600 => 600,
            Dpi::D1200 => 1200,
        }
    }

    /// Convert inches to dots at this resolution.
    #[inline]
    pub fn dots(self, inches: f64) -> i64 {
        geometry::in_to_dots(inches, self.value())
    }
}

impl TryFrom<u32> for Dpi {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            203 => Ok(Dpi::D203),
            300 => Ok(Dpi::D300),
            600 => Ok(Dpi::D600),
            1200 => Ok(Dpi::D1200),
            other => Err(format!("unsupported dpi {other} (expected 203, 300, 600 or 1200)")),
        }
    }
}

impl From<Dpi> for u32 {
    fn from(dpi: Dpi) -> u32 {
        dpi.value()
    }
}

impl fmt::Display for Dpi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Label orientation. Landscape swaps the media dimensions when checking
/// against a printer's printable area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Media stock tags a printer may support. Wire names are camelCase like
/// the rest of the exchange format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MediaType {
    DieCut,
    Continuous,
    Round,
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MediaType::DieCut => "dieCut",
            MediaType::Continuous => "continuous",
            MediaType::Round => "round",
        };
        f.write_str(s)
    }
}

// ============================================================================
// ELEMENTS
// ============================================================================

/// What a positioned field renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Text,
    Barcode,
    Date,
    Image,
    StaticNote,
}

/// Position in inches from the safe-drawable rectangle's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionIn {
    pub x: f64,
    pub y: f64,
}

/// Bounding box in inches. Required for `Image` and `Barcode` elements.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeIn {
    pub w: f64,
    pub h: f64,
}

/// One positioned field on the label canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    /// Logical field name, unique within a profile.
    pub name: String,
    pub kind: ElementKind,
    pub position: PositionIn,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<SizeIn>,
    /// Record field (text/date/barcode) or asset key (image) to resolve at
    /// render time. Defaults to the element name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding_key: Option<String>,
}

impl Element {
    /// The key this element resolves against: `binding_key` if present,
    /// otherwise the element name.
    pub fn resolution_key(&self) -> &str {
        self.binding_key.as_deref().unwrap_or(&self.name)
    }
}

/// Include/exclude flag plus optional static fallback for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataBinding {
    #[serde(default = "default_true")]
    pub include: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
}

impl Default for DataBinding {
    fn default() -> Self {
        Self { include: true, fallback: None }
    }
}

fn default_true() -> bool {
    true
}

fn default_copies() -> u32 {
    1
}

// ============================================================================
// LABEL PROFILE
// ============================================================================

/// A label design: media geometry, target engine, positioned elements and
/// their data bindings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelProfile {
    pub media_width_in: f64,
    pub media_height_in: f64,
    pub dpi: Dpi,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub corner_radius_in: f64,
    #[serde(default)]
    pub bleed_in: f64,
    #[serde(default)]
    pub safe_margin_in: f64,
    pub engine: Engine,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaType>,
    #[serde(default = "default_copies")]
    pub copies_per_unit: u32,
    #[serde(default)]
    pub elements: Vec<Element>,
    /// Field name → binding. Elements without an entry are included with no
    /// fallback. A `BTreeMap` keeps serialization order deterministic.
    #[serde(default)]
    pub data_bindings: BTreeMap<String, DataBinding>,
}

impl LabelProfile {
    /// Media dimensions after applying the orientation swap. Used when
    /// checking against a printer's printable area.
    pub fn oriented_media_size(&self) -> (f64, f64) {
        match self.orientation {
            Orientation::Portrait => (self.media_width_in, self.media_height_in),
            Orientation::Landscape => (self.media_height_in, self.media_width_in),
        }
    }

    /// The safe-drawable rectangle in label coordinates.
    pub fn safe_rect(&self) -> RectIn {
        geometry::safe_rect(
            self.media_width_in,
            self.media_height_in,
            self.bleed_in,
            self.safe_margin_in,
        )
    }

    /// The binding entry for an element name, or the default (included, no
    /// fallback) when absent.
    pub fn binding_for(&self, name: &str) -> DataBinding {
        self.data_bindings.get(name).cloned().unwrap_or_default()
    }

    /// Structural validation of the design itself, independent of any
    /// printer or record. Runs at load time and again by the orchestrator so
    /// hand-constructed profiles get the same checks as deserialized ones.
    pub fn validate_design(&self) -> Result<(), RenderError> {
        let bad = |msg: String| Err(RenderError::InvalidProfile(msg));

        for (label, v) in [
            ("mediaWidthIn", self.media_width_in),
            ("mediaHeightIn", self.media_height_in),
        ] {
            if !v.is_finite() || v <= 0.0 {
                return bad(format!("{label} must be a positive number, got {v}"));
            }
        }
        for (label, v) in [
            ("cornerRadiusIn", self.corner_radius_in),
            ("bleedIn", self.bleed_in),
            ("safeMarginIn", self.safe_margin_in),
        ] {
            if !v.is_finite() || v < 0.0 {
                return bad(format!("{label} must be non-negative, got {v}"));
            }
        }
        let half_min = self.media_width_in.min(self.media_height_in) / 2.0;
        if self.safe_margin_in >= half_min {
            return bad(format!(
                "safeMarginIn {} must be less than half the smaller media dimension ({half_min})",
                self.safe_margin_in
            ));
        }
        if self.copies_per_unit == 0 {
            return bad("copiesPerUnit must be at least 1".into());
        }

        let mut seen = HashSet::new();
        for el in &self.elements {
            if el.name.is_empty() {
                return bad("element with empty name".into());
            }
            if !seen.insert(el.name.as_str()) {
                return bad(format!("duplicate element name '{}'", el.name));
            }
            if matches!(el.kind, ElementKind::Image | ElementKind::Barcode) && el.size.is_none() {
                return bad(format!(
                    "element '{}' of kind {:?} requires a size",
                    el.name, el.kind
                ));
            }
            if let Some(size) = &el.size {
                if !size.w.is_finite() || !size.h.is_finite() || size.w <= 0.0 || size.h <= 0.0 {
                    return bad(format!("element '{}' has a non-positive size", el.name));
                }
            }
            if !el.position.x.is_finite() || !el.position.y.is_finite() {
                return bad(format!("element '{}' has a non-finite position", el.name));
            }
        }

        for (name, binding) in &self.data_bindings {
            if !seen.contains(name.as_str()) {
                return bad(format!("binding '{name}' references no element"));
            }
            if binding.include {
                let el = self
                    .elements
                    .iter()
                    .find(|e| &e.name == name)
                    .expect("checked above");
                let has_path = !el.resolution_key().is_empty();
                let has_fallback = binding.fallback.as_deref().is_some_and(|f| !f.is_empty());
                if !has_path && !has_fallback {
                    return bad(format!(
                        "enabled binding '{name}' has neither a resolution path nor a fallback"
                    ));
                }
            }
        }

        Ok(())
    }
}

// ============================================================================
// PRINTER PROFILE
// ============================================================================

/// A physical printer's capability descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrinterProfile {
    pub driver: Engine,
    /// Primary resolution.
    pub dpi: Dpi,
    /// Additional supported resolutions beyond the primary.
    #[serde(default)]
    pub supported_dpis: Vec<Dpi>,
    pub max_width_in: f64,
    pub max_height_in: f64,
    #[serde(default)]
    pub is_color: bool,
    #[serde(default)]
    pub is_thermal: bool,
    #[serde(default)]
    pub media_supported: Vec<MediaType>,
}

impl PrinterProfile {
    pub fn supports_dpi(&self, dpi: Dpi) -> bool {
        self.dpi == dpi || self.supported_dpis.contains(&dpi)
    }

    pub fn supports_media(&self, media: MediaType) -> bool {
        self.media_supported.contains(&media)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn minimal_profile() -> LabelProfile {
        serde_json::from_str(
            r#"{"mediaWidthIn": 4.0, "mediaHeightIn": 6.0, "dpi": 300, "engine": "ZPL"}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_minimal_profile_defaults() {
        let p = minimal_profile();
        assert_eq!(p.orientation, Orientation::Portrait);
        assert_eq!(p.copies_per_unit, 1);
        assert_eq!(p.bleed_in, 0.0);
        assert!(p.elements.is_empty());
        p.validate_design().unwrap();
    }

    #[test]
    fn test_engine_tags() {
        assert_eq!(serde_json::to_string(&Engine::BrotherQl).unwrap(), r#""BrotherQL""#);
        let e: Engine = serde_json::from_str(r#""TSPL""#).unwrap();
        assert_eq!(e, Engine::Tspl);
    }

    #[test]
    fn test_dpi_closed_set() {
        let dpi: Dpi = serde_json::from_str("300").unwrap();
        assert_eq!(dpi, Dpi::D300);
        assert!(serde_json::from_str::<Dpi>("250").is_err());
        assert_eq!(serde_json::to_string(&Dpi::D203).unwrap(), "203");
    }

    #[test]
    fn test_dpi_dots() {
        assert_eq!(Dpi::D300.dots(4.0), 1200);
        assert_eq!(Dpi::D600.dots(4.0), 2400);
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let p: LabelProfile = serde_json::from_str(
            r#"{"mediaWidthIn": 2.0, "mediaHeightIn": 1.0, "dpi": 203,
                "engine": "TSPL", "someFutureField": 42}"#,
        )
        .unwrap();
        assert_eq!(p.engine, Engine::Tspl);
    }

    #[test]
    fn test_missing_required_field_is_load_error() {
        // no engine
        let res = serde_json::from_str::<LabelProfile>(
            r#"{"mediaWidthIn": 2.0, "mediaHeightIn": 1.0, "dpi": 203}"#,
        );
        assert!(res.is_err());
    }

    #[test]
    fn test_duplicate_element_names_rejected() {
        let mut p = minimal_profile();
        let el = Element {
            name: "sku".into(),
            kind: ElementKind::Text,
            position: PositionIn { x: 0.1, y: 0.1 },
            size: None,
            binding_key: None,
        };
        p.elements.push(el.clone());
        p.elements.push(el);
        let err = p.validate_design().unwrap_err();
        assert_eq!(err.kind(), "InvalidProfile");
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_barcode_requires_size() {
        let mut p = minimal_profile();
        p.elements.push(Element {
            name: "sku".into(),
            kind: ElementKind::Barcode,
            position: PositionIn { x: 0.1, y: 0.1 },
            size: None,
            binding_key: None,
        });
        assert!(p.validate_design().is_err());
    }

    #[test]
    fn test_binding_must_reference_element() {
        let mut p = minimal_profile();
        p.data_bindings.insert("ghost".into(), DataBinding::default());
        let err = p.validate_design().unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn test_safe_margin_bound() {
        let mut p = minimal_profile();
        p.safe_margin_in = 2.0; // half of min(4, 6) is 2.0; must be strictly less
        assert!(p.validate_design().is_err());
        p.safe_margin_in = 1.9;
        p.validate_design().unwrap();
    }

    #[test]
    fn test_oriented_media_size() {
        let mut p = minimal_profile();
        assert_eq!(p.oriented_media_size(), (4.0, 6.0));
        p.orientation = Orientation::Landscape;
        assert_eq!(p.oriented_media_size(), (6.0, 4.0));
    }

    #[test]
    fn test_printer_profile_dpi_set() {
        let printer: PrinterProfile = serde_json::from_str(
            r#"{"driver": "ZPL", "dpi": 300, "supportedDpis": [203],
                "maxWidthIn": 4.0, "maxHeightIn": 6.0}"#,
        )
        .unwrap();
        assert!(printer.supports_dpi(Dpi::D300));
        assert!(printer.supports_dpi(Dpi::D203));
        assert!(!printer.supports_dpi(Dpi::D600));
    }

    #[test]
    fn test_media_tags_are_camel_case() {
        let p: LabelProfile = serde_json::from_str(
            r#"{"mediaWidthIn": 4.0, "mediaHeightIn": 6.0, "dpi": 300,
                "engine": "ZPL", "media": "dieCut"}"#,
        )
        .unwrap();
        assert_eq!(p.media, Some(MediaType::DieCut));
        assert_eq!(serde_json::to_string(&MediaType::DieCut).unwrap(), r#""dieCut""#);

        let printer: PrinterProfile = serde_json::from_str(
            r#"{"driver": "ZPL", "dpi": 300, "maxWidthIn": 4.0, "maxHeightIn": 6.0,
                "mediaSupported": ["dieCut", "continuous"]}"#,
        )
        .unwrap();
        assert!(printer.supports_media(MediaType::DieCut));
        assert_eq!(MediaType::DieCut.to_string(), "dieCut");
    }

    #[test]
    fn test_profile_roundtrip() {
        let mut p = minimal_profile();
        p.elements.push(Element {
            name: "logo".into(),
            kind: ElementKind::Image,
            position: PositionIn { x: 0.2, y: 0.2 },
            size: Some(SizeIn { w: 1.0, h: 1.0 }),
            binding_key: Some("logo_asset".into()),
        });
        let json = serde_json::to_string(&p).unwrap();
        let p2: LabelProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(p, p2);
    }
}
