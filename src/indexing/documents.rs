//! Per-page text extraction for long paginated documents.

use std::path::Path;

use lopdf::Document;

use super::chunking::PageText;
use super::types::DocumentError;

/// Extract text from every page of a PDF document, in page order.
///
/// Pages that fail to decode are skipped with a warning; the document only
/// fails as a whole when it cannot be opened or no page yields text.
pub fn extract_pages(path: &Path) -> Result<Vec<PageText>, DocumentError> {
    let document = Document::load(path)?;
    let mut pages = Vec::new();

    for (number, _) in document.get_pages() {
        match document.extract_text(&[number]) {
            Ok(text) => {
                if !text.trim().is_empty() {
                    pages.push(PageText { number, text });
                }
            }
            Err(error) => {
                tracing::warn!(
                    path = %path.display(),
                    page = number,
                    error = %error,
                    "Skipping unreadable page"
                );
            }
        }
    }

    if pages.is_empty() {
        return Err(DocumentError::Empty);
    }

    tracing::debug!(
        path = %path.display(),
        pages = pages.len(),
        "Extracted document text"
    );
    Ok(pages)
}
