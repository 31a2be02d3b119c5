//! Documents handed over by the extraction layer.
//!
//! Content is opaque text. The only thing done to it here is truncation to
//! the excerpt forwarded to the model.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::defaults;

/// Source format of an uploaded document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// CSV or plain text, read as UTF-8
    #[default]
    Text,
    Word,
    Excel,
    Pdf,
}

impl DocumentKind {
    /// Infer the kind from a file extension; unknown extensions count as text.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "doc" | "docx" => DocumentKind::Word,
            "xls" | "xlsx" => DocumentKind::Excel,
            "pdf" => DocumentKind::Pdf,
            _ => DocumentKind::Text,
        }
    }
}

/// One extracted document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub name: String,
    pub content: String,
    #[serde(default)]
    pub kind: DocumentKind,
}

impl Document {
    pub fn new(name: impl Into<String>, content: impl Into<String>, kind: DocumentKind) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            kind,
        }
    }

    /// Read a UTF-8 text file; the kind follows the extension.
    pub fn read_text_file(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        Ok(Self::new(name, content, DocumentKind::from_path(path)))
    }

    /// The first [`defaults::DOCUMENT_EXCERPT_CHARS`] characters of the content.
    pub fn excerpt(&self) -> &str {
        truncate_chars(&self.content, defaults::DOCUMENT_EXCERPT_CHARS)
    }
}

/// Longest prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
