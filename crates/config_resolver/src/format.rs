//! Document format detection and parsing.
//!
//! Turns raw fetched bytes plus a format hint (file extension or HTTP
//! `Content-Type`) into a structured section map. Local fetches infer
//! the format from the file extension; remote fetches prefer the
//! response `Content-Type` header and fall back to the URL's path
//! extension.

use serde_json::Value;

use crate::errors::{ResolutionError, ResolutionResult};
use crate::fragment::SectionMap;

#[cfg(test)]
#[path = "format_tests.rs"]
mod tests;

/// Serialization format of a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
    Toml,
}

impl DocumentFormat {
    /// Infers the format from a path's file extension.
    ///
    /// Recognizes `.json`, `.yaml`, `.yml`, and `.toml` (case
    /// insensitive). Returns `None` for anything else.
    ///
    /// # Examples
    ///
    /// ```
    /// use config_resolver::DocumentFormat;
    ///
    /// assert_eq!(
    ///     DocumentFormat::from_path("shared/common.yaml"),
    ///     Some(DocumentFormat::Yaml)
    /// );
    /// assert_eq!(DocumentFormat::from_path("notes.txt"), None);
    /// ```
    pub fn from_path(path: &str) -> Option<Self> {
        let extension = path.rsplit('.').next()?;
        match extension.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }

    /// Infers the format from an HTTP `Content-Type` header value.
    ///
    /// Any parameters (`; charset=...`) are ignored. Returns `None` for
    /// media types that do not name a supported format.
    pub fn from_content_type(value: &str) -> Option<Self> {
        let media_type = value.split(';').next().unwrap_or("").trim();
        match media_type.to_ascii_lowercase().as_str() {
            "application/json" => Some(Self::Json),
            "application/yaml" | "application/x-yaml" | "text/yaml" | "text/x-yaml" => {
                Some(Self::Yaml)
            }
            "application/toml" | "text/toml" => Some(Self::Toml),
            _ => None,
        }
    }

    /// Human-readable format name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Json => "JSON",
            Self::Yaml => "YAML",
            Self::Toml => "TOML",
        }
    }
}

/// Parses raw document bytes under the given format.
///
/// The document's top level must be a map; a scalar or list top level is
/// a parse error because there would be no sections to merge.
///
/// # Errors
///
/// Returns `ResolutionError::Parse` when the bytes cannot be decoded
/// under `format` or the decoded top level is not a map. The locator is
/// carried for diagnostics.
pub fn parse_document(
    bytes: &[u8],
    format: DocumentFormat,
    locator: &str,
) -> ResolutionResult<SectionMap> {
    let parse_error = |reason: String| ResolutionError::Parse {
        locator: locator.to_string(),
        format: format.name().to_string(),
        reason,
    };

    let value: Value = match format {
        DocumentFormat::Json => {
            serde_json::from_slice(bytes).map_err(|err| parse_error(err.to_string()))?
        }
        DocumentFormat::Yaml => {
            serde_yaml::from_slice(bytes).map_err(|err| parse_error(err.to_string()))?
        }
        DocumentFormat::Toml => {
            let text =
                std::str::from_utf8(bytes).map_err(|err| parse_error(err.to_string()))?;
            toml::from_str(text).map_err(|err| parse_error(err.to_string()))?
        }
    };

    match value {
        Value::Object(sections) => Ok(sections),
        other => Err(parse_error(format!(
            "expected a map at the top level, found {}",
            value_kind(&other)
        ))),
    }
}

/// Short description of a JSON value's kind for error messages.
fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a map",
    }
}
