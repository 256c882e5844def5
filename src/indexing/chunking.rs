//! Character-window chunking for long documents.
//!
//! Boundaries are a pure function of `(chunk_size, overlap, text)`: re-running
//! the indexer over an unchanged document reproduces the same chunks and the
//! same ordinals, which the idempotent-upsert contract depends on. Page spans
//! are tracked through the concatenated text so each chunk records the pages
//! it covers.

use super::types::ChunkingError;

/// Text extracted from one page of a paginated document.
#[derive(Debug, Clone)]
pub struct PageText {
    /// 1-based page number.
    pub number: u32,
    /// Extracted text content.
    pub text: String,
}

/// One chunk produced from a document, with its page span.
#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    /// Chunk text content.
    pub text: String,
    /// 0-based position of the chunk within its document.
    pub ordinal: u32,
    /// First page covered by the chunk.
    pub page_start: u32,
    /// Last page covered by the chunk.
    pub page_end: u32,
}

/// Split page texts into overlapping character windows.
///
/// Every chunk except the final one spans exactly `chunk_size` characters; the
/// final chunk may be shorter. Adjacent chunks share `overlap` characters.
/// Whitespace-only windows are dropped without consuming an ordinal.
pub fn chunk_pages(
    pages: &[PageText],
    chunk_size: usize,
    overlap: usize,
) -> Result<Vec<TextChunk>, ChunkingError> {
    if chunk_size == 0 {
        return Err(ChunkingError::InvalidChunkSize);
    }
    if overlap >= chunk_size {
        return Err(ChunkingError::OverlapTooLarge {
            overlap,
            chunk_size,
        });
    }

    // Concatenate pages with a newline seam, remembering where each page
    // starts in character coordinates.
    let mut chars: Vec<char> = Vec::new();
    let mut page_offsets: Vec<(usize, u32)> = Vec::new();
    for (idx, page) in pages.iter().enumerate() {
        if idx > 0 {
            chars.push('\n');
        }
        page_offsets.push((chars.len(), page.number));
        chars.extend(page.text.chars());
    }

    if chars.iter().all(|c| c.is_whitespace()) {
        return Ok(Vec::new());
    }

    let stride = chunk_size - overlap;
    let mut chunks = Vec::new();
    let mut ordinal = 0u32;
    let mut start = 0usize;

    loop {
        let end = (start + chunk_size).min(chars.len());
        let window: String = chars[start..end].iter().collect();
        if !window.trim().is_empty() {
            chunks.push(TextChunk {
                text: window,
                ordinal,
                page_start: page_at(&page_offsets, start),
                page_end: page_at(&page_offsets, end.saturating_sub(1)),
            });
            ordinal += 1;
        }

        if end == chars.len() {
            break;
        }
        start += stride;
    }

    Ok(chunks)
}

fn page_at(page_offsets: &[(usize, u32)], position: usize) -> u32 {
    let mut page = page_offsets.first().map(|(_, n)| *n).unwrap_or(1);
    for (offset, number) in page_offsets {
        if *offset <= position {
            page = *number;
        } else {
            break;
        }
    }
    page
}
