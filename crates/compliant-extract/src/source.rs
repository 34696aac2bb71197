//! Plain-text sources for the recognisers.
//!
//! PDF and OCR extraction are external services. Whatever produces the text,
//! a failure is an empty string: the recognisers then simply find nothing.

use std::path::Path;

use tracing::{error, info};

/// Turns a stored document into plain text.
pub trait TextSource {
    /// Extracted text, or `""` if the document could not be read.
    fn extract_text(&self, location: &Path) -> String;
}

/// Reads a document that is already plain text (UTF-8, lossy).
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextFile;

impl TextSource for PlainTextFile {
    fn extract_text(&self, location: &Path) -> String {
        match std::fs::read(location) {
            Ok(bytes) => {
                let text = String::from_utf8_lossy(&bytes).replace("\r\n", "\n");
                info!(path = %location.display(), chars = text.len(), "extracted document text");
                text
            }
            Err(e) => {
                error!(path = %location.display(), error = %e, "document text extraction failed");
                String::new()
            }
        }
    }
}
