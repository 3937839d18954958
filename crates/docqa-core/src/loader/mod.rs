//! Document loading: turns a file into ordered `(locator, text)` blocks.
//!
//! The format is resolved once from the file extension into a [`TextFormat`]
//! and each variant owns its parser. Plain text yields a single `document`
//! block, PDFs one block per non-empty page and HTML one block per heading
//! section.

mod html;
mod pdf;

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::DEFAULT_MAX_FILE_BYTES;
use crate::error::{Error, Result};
use crate::types::Block;

pub use html::{parse_html, HTML_FALLBACK_MAX_CHARS};

/// Locator used for plain-text files.
pub const DOCUMENT_LOCATOR: &str = "document";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    Plain,
    Pdf,
    Html,
}

impl TextFormat {
    /// Anything not recognised as PDF or HTML is read as plain text.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => Self::Pdf,
            "html" | "htm" => Self::Html,
            _ => Self::Plain,
        }
    }

    fn parse(self, path: &Path) -> Result<Vec<Block>> {
        match self {
            Self::Plain => parse_plain(path),
            Self::Pdf => pdf::parse_pdf(path),
            Self::Html => {
                let raw = read_lossy(path)?;
                html::parse_html(&raw).ok_or_else(|| Error::NoExtractableText { path: path.to_path_buf() })
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct DocumentLoader {
    max_file_bytes: u64,
}

impl Default for DocumentLoader {
    fn default() -> Self {
        Self { max_file_bytes: DEFAULT_MAX_FILE_BYTES }
    }
}

impl DocumentLoader {
    pub fn new(max_file_bytes: u64) -> Self {
        Self { max_file_bytes }
    }

    pub fn load(&self, path: &Path) -> Result<Vec<Block>> {
        let meta = match fs::metadata(path) {
            Ok(meta) if meta.is_file() => meta,
            Ok(_) => return Err(Error::NotFound { path: path.to_path_buf() }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NotFound { path: path.to_path_buf() })
            }
            Err(e) => return Err(Error::io(path, e)),
        };
        let size = meta.len();
        if size == 0 {
            return Err(Error::EmptyInput { path: path.to_path_buf() });
        }
        if size > self.max_file_bytes {
            return Err(Error::TooLarge { path: path.to_path_buf(), size, limit: self.max_file_bytes });
        }

        let format = TextFormat::from_path(path);
        let blocks = format.parse(path)?;
        debug!(path = %path.display(), ?format, blocks = blocks.len(), "loaded document");
        Ok(blocks)
    }
}

/// Load with the default 50 MB size cap.
pub fn load_document(path: &Path) -> Result<Vec<Block>> {
    DocumentLoader::default().load(path)
}

fn parse_plain(path: &Path) -> Result<Vec<Block>> {
    let text = read_lossy(path)?;
    if text.trim().is_empty() {
        return Err(Error::EmptyInput { path: path.to_path_buf() });
    }
    Ok(vec![Block::new(DOCUMENT_LOCATOR, text)])
}

fn read_lossy(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}
