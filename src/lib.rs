//! # etiqueta
//!
//! Label template rendering for retail product labels. A [`LabelProfile`]
//! describes the template, a [`PrinterProfile`] describes the target device,
//! and a [`ProductRecord`] carries the data; [`render`] turns the three into
//! printer-native bytes for one of four engines.
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`profile`] | label and printer profile types, design validation |
//! | [`record`] | product field values and the record map |
//! | [`validate`] | label/printer compatibility gate |
//! | [`binding`] | element → record resolution and canonicalization |
//! | [`geometry`] | inch/dot/point conversions, rects, safe area |
//! | [`layout`] | dot placement, safe-area and overlap enforcement |
//! | [`render`] | pipeline orchestration and the four backends |
//! | [`error`] | the single error type the whole pipeline returns |
//!
//! ```no_run
//! use etiqueta::{render, LabelProfile, PrinterProfile, ProductRecord, RenderOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let label: LabelProfile = serde_json::from_str(include_str!("../demos/shelf_label.json"))?;
//! let printer: PrinterProfile = serde_json::from_str(include_str!("../demos/zebra_zd421.json"))?;
//! let record: ProductRecord =
//!     [("name", "Sourdough Loaf"), ("sku", "SKU-1001"), ("price", "7.50")]
//!         .into_iter()
//!         .collect();
//! let output = render(&label, &printer, &record, &RenderOptions::default())?;
//! std::fs::write("label.zpl", &output.bytes)?;
//! # Ok(())
//! # }
//! ```

pub mod binding;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod profile;
pub mod record;
pub mod render;
pub mod validate;

pub use error::RenderError;
pub use profile::{Engine, LabelProfile, PrinterProfile};
pub use record::{FieldValue, ProductRecord};
pub use render::{render, render_batch, OutputFormat, RenderOptions, RenderOutput};
