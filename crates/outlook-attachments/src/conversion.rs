//! Attachment-to-text converter registry (§4.5.4), grounded on the
//! teacher's pluggable-backend strategy (a trait plus a small registry of
//! implementations selected by capability) and on
//! `mail_attachment_converter.py`'s encoding fallback chain.

use outlook_core::error::CoreError;

use crate::html::{html_to_text, truncate_to_token_budget};

pub const DEFAULT_TOKEN_LIMIT: usize = 50_000;

/// A single file-type converter, addressable by extension.
pub trait Converter: Send + Sync {
    fn supported_extensions(&self) -> &[&str];

    fn supports(&self, ext: &str) -> bool {
        let ext = ext.trim_start_matches('.').to_lowercase();
        self.supported_extensions().iter().any(|e| *e == ext)
    }

    /// Converts `bytes` (the contents of `filename`) to plain text.
    fn convert(&self, bytes: &[u8], filename: &str) -> Result<String, CoreError>;
}

/// Decodes plain-text-ish formats (`.txt`, `.csv`, `.md`) and HTML
/// (`.html`, `.htm`), trying UTF-8 first and falling back to a lossy
/// replacement decode, mirroring the original's UTF-8 -> local-encoding ->
/// UTF-8-lossy chain (local/legacy encodings are not carried forward here;
/// lossy UTF-8 is the terminal fallback).
pub struct TextConverter;

const TEXT_EXTENSIONS: &[&str] = &["txt", "csv", "md", "html", "htm"];

impl Converter for TextConverter {
    fn supported_extensions(&self) -> &[&str] {
        TEXT_EXTENSIONS
    }

    fn convert(&self, bytes: &[u8], filename: &str) -> Result<String, CoreError> {
        let decoded = match std::str::from_utf8(bytes) {
            Ok(s) => s.to_string(),
            Err(_) => String::from_utf8_lossy(bytes).into_owned(),
        };

        let ext = filename.rsplit('.').next().unwrap_or("").to_lowercase();
        if ext == "html" || ext == "htm" {
            Ok(html_to_text(&decoded))
        } else {
            Ok(decoded)
        }
    }
}

/// A converter that always refuses, used for formats whose conversion
/// libraries are not part of this service's dependency stack. `refusal`
/// distinguishes a declared-but-unavailable library (`ImportError` in the
/// original) from an explicitly unsupported legacy format
/// (`NotImplementedError`), both surfaced identically to callers as
/// [`CoreError::ConversionError`].
pub struct UnavailableConverter {
    extensions: Vec<&'static str>,
    reason: &'static str,
}

impl UnavailableConverter {
    pub fn new(extensions: Vec<&'static str>, reason: &'static str) -> Self {
        Self { extensions, reason }
    }
}

impl Converter for UnavailableConverter {
    fn supported_extensions(&self) -> &[&str] {
        &self.extensions
    }

    fn convert(&self, _bytes: &[u8], filename: &str) -> Result<String, CoreError> {
        Err(CoreError::ConversionError {
            filename: filename.to_string(),
            reason: self.reason.to_string(),
        })
    }
}

/// Finds the first converter able to handle a given extension and applies
/// the post-conversion token-budget truncation.
pub struct ConversionRegistry {
    converters: Vec<Box<dyn Converter>>,
    token_limit: usize,
}

impl Default for ConversionRegistry {
    /// Registers the plain-text/CSV/HTML/Markdown converter plus declared
    /// stubs for the legacy/rich-document formats named in §4.5.4's
    /// inventory, none of which have a converter library in this service's
    /// dependency stack.
    fn default() -> Self {
        Self {
            converters: vec![
                Box::new(TextConverter),
                Box::new(UnavailableConverter::new(
                    vec!["pdf"],
                    "PDF conversion library is not available in this deployment",
                )),
                Box::new(UnavailableConverter::new(
                    vec!["docx"],
                    "Word document conversion library is not available in this deployment",
                )),
                Box::new(UnavailableConverter::new(
                    vec!["hwp", "hwpx"],
                    "HWP conversion library is not available in this deployment",
                )),
                Box::new(UnavailableConverter::new(
                    vec!["xlsx"],
                    "Excel conversion library is not available in this deployment",
                )),
                Box::new(UnavailableConverter::new(
                    vec!["pptx"],
                    "PowerPoint conversion library is not available in this deployment",
                )),
                Box::new(UnavailableConverter::new(
                    vec!["doc", "xls", "ppt"],
                    "legacy Office binary formats are not supported",
                )),
            ],
            token_limit: DEFAULT_TOKEN_LIMIT,
        }
    }
}

impl ConversionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token_limit(mut self, limit: usize) -> Self {
        self.token_limit = limit;
        self
    }

    pub fn can_convert(&self, filename: &str) -> bool {
        let ext = filename.rsplit('.').next().unwrap_or("");
        self.converters.iter().any(|c| c.supports(ext))
    }

    /// Converts `bytes` and truncates the result to the configured token
    /// budget. Returns an error if no converter matches the extension or
    /// the matched converter refuses.
    pub fn convert(&self, bytes: &[u8], filename: &str) -> Result<String, CoreError> {
        let ext = filename.rsplit('.').next().unwrap_or("");
        let converter = self
            .converters
            .iter()
            .find(|c| c.supports(ext))
            .ok_or_else(|| CoreError::ConversionError {
                filename: filename.to_string(),
                reason: "no converter registered for this extension".to_string(),
            })?;
        let text = converter.convert(bytes, filename)?;
        Ok(truncate_to_token_budget(&text, self.token_limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_converter_decodes_utf8() {
        let registry = ConversionRegistry::new();
        let text = registry.convert(b"hello world", "notes.txt").unwrap();
        assert_eq!(text, "hello world");
    }

    #[test]
    fn text_converter_strips_html_tags() {
        let registry = ConversionRegistry::new();
        let text = registry.convert(b"<p>Hi</p>", "page.html").unwrap();
        assert_eq!(text, "Hi");
    }

    #[test]
    fn text_converter_falls_back_to_lossy_on_invalid_utf8() {
        let registry = ConversionRegistry::new();
        let bytes: &[u8] = &[0x68, 0x69, 0xff, 0xfe];
        let text = registry.convert(bytes, "weird.txt").unwrap();
        assert!(text.starts_with("hi"));
    }

    #[test]
    fn unregistered_extension_errors() {
        let registry = ConversionRegistry::new();
        assert!(registry.convert(b"data", "archive.zip").is_err());
    }

    #[test]
    fn unavailable_converter_errors_for_pdf() {
        let registry = ConversionRegistry::new();
        assert!(registry.can_convert("report.pdf"));
        assert!(registry.convert(b"%PDF-1.4", "report.pdf").is_err());
    }

    #[test]
    fn can_convert_is_case_insensitive() {
        let registry = ConversionRegistry::new();
        assert!(registry.can_convert("NOTES.TXT"));
    }
}
