//! # etiqueta CLI
//!
//! Command-line front end for the label rendering pipeline.
//!
//! ## Usage
//!
//! ```bash
//! # Render one label to printer-native bytes
//! etiqueta render --label demos/shelf_label.json \
//!     --printer demos/zebra_zd421.json \
//!     --record demos/record.json \
//!     --out label.zpl
//!
//! # Render from a combined request envelope
//! etiqueta render --request request.json --out label.zpl
//!
//! # Render a batch (record file holds a JSON array) into a directory
//! etiqueta render --label demos/shelf_label.json \
//!     --printer demos/zebra_zd421.json \
//!     --record records.json \
//!     --out out/
//! ```
//!
//! Failures print a JSON error envelope on stderr so callers can match on
//! the stable `kind` tag:
//!
//! ```json
//! {"error": {"kind": "MissingRequiredField", "detail": "missing required field \"sku\""}}
//! ```

use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use etiqueta::{
    render, render_batch, LabelProfile, OutputFormat, PrinterProfile, ProductRecord, RenderError,
    RenderOptions,
};

/// Combined request envelope, the same shape the boundary exchanges.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderRequest {
    label_profile: LabelProfile,
    printer_profile: PrinterProfile,
    product_record: ProductRecord,
}

/// etiqueta - product label rendering for thermal and PDF output
#[derive(Parser, Debug)]
#[command(name = "etiqueta")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render label(s) for a product record or an array of records
    Render {
        /// Combined request JSON file ({labelProfile, printerProfile, productRecord})
        #[arg(long, conflicts_with_all = ["label", "printer", "record"])]
        request: Option<PathBuf>,

        /// Label profile JSON file
        #[arg(long, required_unless_present = "request")]
        label: Option<PathBuf>,

        /// Printer profile JSON file
        #[arg(long, required_unless_present = "request")]
        printer: Option<PathBuf>,

        /// Product record JSON file (object, or array for a batch)
        #[arg(long, required_unless_present = "request")]
        record: Option<PathBuf>,

        /// Output file, or directory when rendering a batch
        #[arg(long)]
        out: PathBuf,

        /// Image asset as key=path, repeatable
        #[arg(long, value_name = "KEY=PATH")]
        asset: Vec<String>,

        /// Embed the current time as the PDF creation date
        #[arg(long)]
        timestamp: bool,
    },

    /// Check a label/printer pairing without rendering
    Check {
        /// Label profile JSON file
        #[arg(long)]
        label: PathBuf,

        /// Printer profile JSON file
        #[arg(long)]
        printer: PathBuf,
    },
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("{}", error_envelope(&e));
        std::process::exit(1);
    }
}

fn run() -> Result<(), RenderError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Render { request, label, printer, record, out, asset, timestamp } => {
            let opts = RenderOptions {
                timestamp: timestamp.then(chrono::Utc::now),
                assets: load_assets(&asset)?,
            };

            let (label, printer, records) = if let Some(path) = request {
                let req: RenderRequest = read_json(&path)?;
                (req.label_profile, req.printer_profile, vec![req.product_record])
            } else {
                // clap requires all three paths when --request is absent
                let label: LabelProfile = read_json(&label.unwrap())?;
                let printer: PrinterProfile = read_json(&printer.unwrap())?;
                let record = record.unwrap();

                // An array of records means a batch; anything else is one record.
                let raw = fs::read_to_string(&record)?;
                let records: Vec<ProductRecord> = match serde_json::from_str(&raw) {
                    Ok(batch) => batch,
                    Err(_) => vec![parse_json(&raw, &record)?],
                };
                (label, printer, records)
            };

            if records.len() == 1 {
                let output = render(&label, &printer, &records[0], &opts)?;
                fs::write(&out, &output.bytes)?;
                println!("wrote {} ({} bytes)", out.display(), output.bytes.len());
            } else {
                fs::create_dir_all(&out)?;
                let results = render_batch(&label, &printer, &records, &opts);
                let ext = extension(label.engine);
                let mut failures = 0;
                for (i, result) in results.iter().enumerate() {
                    match result {
                        Ok(output) => {
                            let path = out.join(format!("label_{i:04}.{ext}"));
                            fs::write(&path, &output.bytes)?;
                        }
                        Err(e) => {
                            failures += 1;
                            eprintln!("record {i}: {}", error_envelope(e));
                        }
                    }
                }
                println!("wrote {} of {} labels to {}", results.len() - failures, results.len(), out.display());
                if failures > 0 {
                    std::process::exit(2);
                }
            }
        }

        Commands::Check { label, printer } => {
            let label: LabelProfile = read_json(&label)?;
            let printer: PrinterProfile = read_json(&printer)?;
            label.validate_design()?;
            etiqueta::validate::validate(&label, &printer)?;
            println!("ok: {} label is compatible with {} printer", label.engine, printer.driver);
        }
    }

    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, RenderError> {
    let raw = fs::read_to_string(path)?;
    parse_json(&raw, path)
}

fn parse_json<T: serde::de::DeserializeOwned>(raw: &str, path: &Path) -> Result<T, RenderError> {
    serde_json::from_str(raw)
        .map_err(|e| RenderError::InvalidProfile(format!("{}: {e}", path.display())))
}

fn load_assets(specs: &[String]) -> Result<HashMap<String, Vec<u8>>, RenderError> {
    let mut assets = HashMap::new();
    for spec in specs {
        let (key, path) = spec.split_once('=').ok_or_else(|| {
            RenderError::InvalidProfile(format!("asset '{spec}' is not key=path"))
        })?;
        assets.insert(key.to_string(), fs::read(path)?);
    }
    Ok(assets)
}

fn extension(engine: etiqueta::Engine) -> &'static str {
    match etiqueta::render::backend_for(engine).format() {
        OutputFormat::Pdf => "pdf",
        OutputFormat::Zpl => "zpl",
        OutputFormat::Tspl => "tspl",
        OutputFormat::BrotherRaster => "bin",
    }
}

fn error_envelope(e: &RenderError) -> String {
    serde_json::json!({ "error": { "kind": e.kind(), "detail": e.to_string() } }).to_string()
}
