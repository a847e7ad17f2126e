//! Raw documents handed to the engine by OCR and fetch collaborators.

use serde::{Deserialize, Serialize};

/// Where the text of a document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceHint {
    /// Plain multi-line text produced by OCR on a screenshot or photo.
    Ocr,
    /// Raw HTML of a product page.
    Html,
}

impl Default for SourceHint {
    fn default() -> Self {
        Self::Ocr
    }
}

impl SourceHint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ocr => "ocr",
            Self::Html => "html",
        }
    }
}

/// Unstructured input text plus what little is known about its origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDocument {
    /// Full document text (OCR output or HTML source).
    pub text: String,

    /// Kind of text.
    #[serde(default)]
    pub source_hint: SourceHint,

    /// URL the document was fetched from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_url: Option<String>,
}

impl RawDocument {
    /// Create a document from OCR text.
    pub fn ocr(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_hint: SourceHint::Ocr,
            origin_url: None,
        }
    }

    /// Create a document from HTML source.
    pub fn html(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_hint: SourceHint::Html,
            origin_url: None,
        }
    }

    /// Attach the URL the document came from.
    pub fn with_origin(mut self, url: impl Into<String>) -> Self {
        self.origin_url = Some(url.into());
        self
    }

    /// Whether the document has any non-whitespace content.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let doc = RawDocument::html("<html></html>").with_origin("https://www.amazon.co.jp/dp/X");
        assert_eq!(doc.source_hint, SourceHint::Html);
        assert_eq!(doc.origin_url.as_deref(), Some("https://www.amazon.co.jp/dp/X"));

        let doc = RawDocument::ocr("  \n\t ");
        assert_eq!(doc.source_hint, SourceHint::Ocr);
        assert!(doc.is_blank());
    }

    #[test]
    fn test_deserialize_defaults_to_ocr() {
        let doc: RawDocument = serde_json::from_str(r#"{"text": "¥1,000"}"#).unwrap();
        assert_eq!(doc.source_hint, SourceHint::Ocr);
        assert!(doc.origin_url.is_none());
    }
}
