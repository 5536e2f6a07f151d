//! Conversion of return values into protocol content.
//!
//! The policy is applied in a fixed order:
//!
//! 1. protocol-native content passes through unchanged
//! 2. images become image content with an inferred mime type
//! 3. primitives become text in their canonical form
//! 4. sequences and mappings become canonical JSON text
//! 5. no value becomes empty text
//! 6. anything else becomes its `Display` text
//!
//! # Canonical forms
//!
//! - Integers: decimal, no separators.
//! - Booleans: `true` / `false`.
//! - Floats: shortest decimal that round-trips, with `.0` kept for integral
//!   values (`3.14`, `5.0`, `1e21`). Non-finite values are `NaN`, `inf`, `-inf`.
//! - Collections: compact JSON with object keys sorted by byte order at every
//!   depth, so structurally equal inputs give byte-identical text. JSON has no
//!   non-finite numbers, so `NaN` and infinities inside a collection are
//!   written as `null`; only a bare float returns `NaN`, `inf` or `-inf`.

use serde_json::{Number, Value};

use crate::tool::content::InvocationResult;
use crate::tool::value::{Image, ReturnValue};

/// Fallback when nothing identifies the image format.
const DEFAULT_IMAGE_MIME: &str = "image/png";

/// Converts a wrapped function's return value into exactly one content variant.
#[must_use]
pub fn normalize(value: ReturnValue) -> InvocationResult {
    match value {
        ReturnValue::Content(content) => content,
        ReturnValue::Image(image) => {
            let mime_type = image_mime_type(&image);
            InvocationResult::Image {
                data: image.into_data(),
                mime_type,
            }
        }
        ReturnValue::Integer(n) => InvocationResult::Text(n.to_string()),
        ReturnValue::Float(f) => InvocationResult::Text(canonical_float(f)),
        ReturnValue::String(s) | ReturnValue::Display(s) => InvocationResult::Text(s),
        ReturnValue::Boolean(b) => InvocationResult::Text(b.to_string()),
        ReturnValue::Sequence(items) => {
            InvocationResult::Text(canonical_json(&Value::Array(items)))
        }
        ReturnValue::Mapping(map) => InvocationResult::Text(canonical_json(&Value::Object(map))),
        ReturnValue::None => InvocationResult::Text(String::new()),
    }
}

/// Formats a float in its canonical, locale-independent form.
#[must_use]
pub fn canonical_float(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    Number::from_f64(value).map_or_else(|| value.to_string(), |n| n.to_string())
}

/// Serialises a JSON value compactly with sorted object keys.
#[must_use]
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_unstable_by(|a, b| a.0.cmp(b.0));

            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                // Value's Display escapes strings exactly as serde_json does
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(item, out);
            }
            out.push('}');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Works out the mime type of an image.
///
/// Explicit format first, then the source path extension, then magic bytes.
#[must_use]
pub fn image_mime_type(image: &Image) -> String {
    if let Some(format) = image.format() {
        return mime_for_format(format);
    }

    let from_extension = image
        .path()
        .and_then(|p| p.extension())
        .and_then(|e| e.to_str())
        .and_then(mime_for_extension);
    if let Some(mime) = from_extension {
        return mime.to_string();
    }

    sniff_mime(image.data())
        .unwrap_or(DEFAULT_IMAGE_MIME)
        .to_string()
}

fn mime_for_format(format: &str) -> String {
    let format = format.trim_start_matches('.').to_ascii_lowercase();
    match format.as_str() {
        "jpg" | "jpeg" => "image/jpeg".to_string(),
        "svg" => "image/svg+xml".to_string(),
        _ => format!("image/{format}"),
    }
}

fn mime_for_extension(extension: &str) -> Option<&'static str> {
    match extension.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

fn sniff_mime(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        Some("image/webp")
    } else if data.starts_with(b"BM") {
        Some("image/bmp")
    } else {
        None
    }
}
