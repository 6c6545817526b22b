//! # Data Binding Resolver
//!
//! Maps each element's binding key to a concrete value from the product
//! record, applying the include flags, static fallbacks and the
//! required-field convention. Output preserves the element declaration order
//! so the layout engine and backends never reorder content.
//!
//! Canonicalization happens here, not in backends: dates become `YYYY-MM-DD`
//! and price values become fixed two-decimal strings (currency symbols
//! belong to the template's static text, never to this layer).

use crate::error::RenderError;
use crate::profile::{Element, ElementKind, LabelProfile};
use crate::record::{FieldValue, ProductRecord};
use chrono::NaiveDate;

/// Binding keys that must resolve (value or fallback) on text and barcode
/// elements. Everything else is optional and silently omitted when absent.
const REQUIRED_KEYS: &[&str] = &["name", "sku", "price"];

/// An element paired with its resolved value.
///
/// For text-like kinds the value is the final string to draw; for `Image`
/// it is the asset key a backend resolves against the render options.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedElement {
    pub element: Element,
    pub value: String,
}

/// Resolve every enabled element of `profile` against `record`.
///
/// Elements whose binding is disabled, or whose optional value is absent,
/// are omitted without error. A required key with neither a record value nor
/// a fallback fails with [`RenderError::MissingRequiredField`].
pub fn resolve(
    profile: &LabelProfile,
    record: &ProductRecord,
) -> Result<Vec<ResolvedElement>, RenderError> {
    let mut resolved = Vec::with_capacity(profile.elements.len());

    for element in &profile.elements {
        let binding = profile.binding_for(&element.name);
        if !binding.include {
            continue;
        }

        let key = element.resolution_key();

        let value = match element.kind {
            // Static notes never consult the record; the fallback is the text.
            ElementKind::StaticNote => match binding.fallback {
                Some(text) if !text.is_empty() => Some(text),
                _ => None,
            },
            // Images resolve to their asset key; the backend dereferences it.
            ElementKind::Image => Some(key.to_string()),
            ElementKind::Text | ElementKind::Barcode | ElementKind::Date => {
                match record.get(key) {
                    Some(raw) => Some(canonicalize(element, key, raw)?),
                    None => binding.fallback.filter(|f| !f.is_empty()),
                }
            }
        };

        match value {
            Some(value) => resolved.push(ResolvedElement {
                element: element.clone(),
                value,
            }),
            None => {
                if is_required(element, key) {
                    return Err(RenderError::MissingRequiredField(key.to_string()));
                }
                log::debug!("omitting optional element '{}' (no value for '{key}')", element.name);
            }
        }
    }

    Ok(resolved)
}

fn is_required(element: &Element, key: &str) -> bool {
    matches!(element.kind, ElementKind::Text | ElementKind::Barcode)
        && REQUIRED_KEYS.contains(&key)
}

/// Apply kind- and key-specific canonicalization to a raw record value.
fn canonicalize(element: &Element, key: &str, raw: &FieldValue) -> Result<String, RenderError> {
    match element.kind {
        ElementKind::Date => {
            let text = raw.as_text();
            canonical_date(&text).ok_or_else(|| RenderError::RenderFailure {
                element: element.name.clone(),
                reason: format!("unparseable date value '{text}'"),
            })
        }
        ElementKind::Text | ElementKind::Barcode if key == "price" => Ok(money(raw)),
        _ => Ok(raw.as_text()),
    }
}

/// Parse the date shapes callers actually send and emit `YYYY-MM-DD`.
fn canonical_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    for fmt in ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(date.format("%Y-%m-%d").to_string());
        }
    }
    // RFC 3339 timestamps keep only their date part
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive().format("%Y-%m-%d").to_string());
    }
    None
}

/// Fixed two-decimal rendering, no currency symbol.
fn money(raw: &FieldValue) -> String {
    match raw {
        FieldValue::Number(n) => format!("{n:.2}"),
        FieldValue::Text(s) => match s.trim().parse::<f64>() {
            Ok(n) => format!("{n:.2}"),
            Err(_) => s.clone(),
        },
    }
}
