//! # Error Types
//!
//! One error enum for the whole render pipeline. The taxonomy follows the
//! three caller-facing groups: configuration errors (wrong printer pairing),
//! design errors (the label profile itself is invalid), and encoding errors
//! (an element could not be serialized by a backend). Nothing here is
//! transient — the same inputs always produce the same error.

use crate::profile::{Dpi, Engine, MediaType};
use thiserror::Error;

/// Main error type for rendering operations.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The label targets a different command language than the printer speaks.
    #[error("label targets {label} but printer driver is {printer}")]
    IncompatibleEngine { label: Engine, printer: Engine },

    /// The printer does not support the label's resolution.
    #[error("printer does not support {0} dpi")]
    UnsupportedDpi(Dpi),

    /// The label is larger than the printer's printable area.
    #[error(
        "label {width_in}\"x{height_in}\" exceeds printable area {max_width_in}\"x{max_height_in}\""
    )]
    ExceedsPrintableArea {
        width_in: f64,
        height_in: f64,
        max_width_in: f64,
        max_height_in: f64,
    },

    /// The label requires a media type the printer cannot load.
    #[error("printer does not support {0} media")]
    UnsupportedMedia(MediaType),

    /// A required binding has no value in the record and no fallback.
    #[error("required field '{0}' is missing from the product record and has no fallback")]
    MissingRequiredField(String),

    /// An element's rectangle crosses the bleed/safe-margin zone.
    #[error("element '{0}' falls outside the safe-drawable area")]
    OutOfSafeArea(String),

    /// Two text/barcode elements occupy intersecting rectangles.
    #[error("elements '{0}' and '{1}' overlap")]
    OverlapDetected(String, String),

    /// A backend could not encode an element (bad asset, bad value).
    #[error("element '{element}' failed to encode: {reason}")]
    RenderFailure { element: String, reason: String },

    /// The profile failed structural validation at load time.
    #[error("invalid profile: {0}")]
    InvalidProfile(String),

    /// I/O error wrapper (CLI paths only; the pipeline itself never does I/O).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    /// Stable kind tag for the JSON error envelope at the boundary.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::IncompatibleEngine { .. } => "IncompatibleEngine",
            Self::UnsupportedDpi(_) => "UnsupportedDpi",
            Self::ExceedsPrintableArea { .. } => "ExceedsPrintableArea",
            Self::UnsupportedMedia(_) => "UnsupportedMedia",
            Self::MissingRequiredField(_) => "MissingRequiredField",
            Self::OutOfSafeArea(_) => "OutOfSafeArea",
            Self::OverlapDetected(_, _) => "OverlapDetected",
            Self::RenderFailure { .. } => "RenderFailure",
            Self::InvalidProfile(_) => "InvalidProfile",
            Self::Io(_) => "Io",
        }
    }
}
