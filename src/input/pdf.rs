//! PDF text layer extraction.

use crate::error::InputError;
use lopdf::Document;
use std::io::Cursor;
use tracing::warn;

/// Extract the text layer of every page, one page per line block.
pub fn extract_pdf_text(data: &[u8]) -> Result<String, InputError> {
    let doc = Document::load_from(Cursor::new(data))
        .map_err(|e| InputError::Pdf(format!("failed to load PDF: {}", e)))?;

    let mut text = String::new();
    for (page_num, _) in doc.get_pages() {
        match doc.extract_text(&[page_num]) {
            Ok(content) => {
                text.push_str(&content);
                text.push('\n');
            }
            Err(e) => warn!("Skipping unreadable PDF page {}: {}", page_num, e),
        }
    }

    Ok(text)
}
