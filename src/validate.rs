//! # Compatibility Validator
//!
//! Checks a label profile against a printer profile before any rendering
//! happens. Rendering is never attempted against an incompatible pairing —
//! the orchestrator calls this first and short-circuits on failure.

use crate::error::RenderError;
use crate::profile::{LabelProfile, PrinterProfile};

/// Validate that `printer` can physically print `profile`.
///
/// Checks, in order: driver/engine match, resolution support, printable-area
/// fit (with the orientation swap applied), and media type support. Media is
/// only enforced when the label declares a media tag.
pub fn validate(profile: &LabelProfile, printer: &PrinterProfile) -> Result<(), RenderError> {
    if profile.engine != printer.driver {
        return Err(RenderError::IncompatibleEngine {
            label: profile.engine,
            printer: printer.driver,
        });
    }

    if !printer.supports_dpi(profile.dpi) {
        return Err(RenderError::UnsupportedDpi(profile.dpi));
    }

    let (width_in, height_in) = profile.oriented_media_size();
    if width_in > printer.max_width_in || height_in > printer.max_height_in {
        return Err(RenderError::ExceedsPrintableArea {
            width_in,
            height_in,
            max_width_in: printer.max_width_in,
            max_height_in: printer.max_height_in,
        });
    }

    if let Some(media) = profile.media {
        if !printer.supports_media(media) {
            return Err(RenderError::UnsupportedMedia(media));
        }
    }

    Ok(())
}
