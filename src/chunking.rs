//! Fixed-size overlapping chunker.
//!
//! Documents are split on raw character offsets: segment `i` starts at
//! `i * (chunk_size - overlap)` and spans up to `chunk_size` characters, with the
//! final segment ending exactly at the end of the text. Offsets count Unicode
//! scalar values, never bytes, so multi-byte text cannot be split mid-character.
//! Retrieval treats each chunk as an atomic unit, so boundary quality is traded
//! for determinism; a sentence-aware splitter could be substituted later as long
//! as chunk order and overlap semantics are preserved.

use thiserror::Error;

/// Errors produced while splitting a document into chunks.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// The document text was empty.
    #[error("cannot chunk empty input text")]
    EmptyInput,
    /// The configured chunk size cannot produce any chunk.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
    /// The configured overlap leaves no forward progress between chunks.
    #[error("chunk overlap ({overlap}) must be smaller than chunk size ({chunk_size})")]
    InvalidOverlap {
        /// Configured maximum chunk length.
        chunk_size: usize,
        /// Configured overlap length.
        overlap: usize,
    },
}

/// Split `text` into overlapping segments of at most `chunk_size` characters.
///
/// Adjacent chunks share exactly `overlap` characters; the final chunk may be
/// shorter and always ends at the end of the text. The function is pure and
/// deterministic: the same input always yields the same segments.
pub fn chunk_text(
    text: &str,
    chunk_size: usize,
    overlap: usize,
) -> Result<Vec<String>, ChunkingError> {
    if chunk_size == 0 {
        return Err(ChunkingError::InvalidChunkSize);
    }
    if overlap >= chunk_size {
        return Err(ChunkingError::InvalidOverlap {
            chunk_size,
            overlap,
        });
    }
    if text.is_empty() {
        return Err(ChunkingError::EmptyInput);
    }

    // Byte offset of every character boundary, plus the end of the text, so
    // chunks can be sliced without re-walking the string per segment.
    let mut boundaries: Vec<usize> = text.char_indices().map(|(offset, _)| offset).collect();
    boundaries.push(text.len());
    let total_chars = boundaries.len() - 1;

    let stride = chunk_size - overlap;
    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let end = (start + chunk_size).min(total_chars);
        chunks.push(text[boundaries[start]..boundaries[end]].to_string());
        if end == total_chars {
            break;
        }
        start += stride;
    }

    Ok(chunks)
}

/// Number of chunks [`chunk_text`] produces for a text of `total_chars` characters.
pub fn expected_chunk_count(total_chars: usize, chunk_size: usize, overlap: usize) -> usize {
    if total_chars <= chunk_size {
        1
    } else {
        let stride = chunk_size - overlap;
        (total_chars - overlap).div_ceil(stride)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_text_with_expected_offsets() {
        let text = "a".repeat(1200);
        let chunks = chunk_text(&text, 500, 100).expect("chunking succeeded");
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 500);
        assert_eq!(chunks[1].len(), 500);
        assert_eq!(chunks[2].len(), 400);
    }

    #[test]
    fn short_text_yields_single_chunk() {
        let chunks = chunk_text("short", 500, 100).expect("chunking succeeded");
        assert_eq!(chunks, vec!["short".to_string()]);
    }

    #[test]
    fn text_of_exactly_chunk_size_yields_single_chunk() {
        let text = "x".repeat(500);
        let chunks = chunk_text(&text, 500, 100).expect("chunking succeeded");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], text);
    }

    #[test]
    fn adjacent_chunks_share_exactly_the_overlap() {
        let text: String = ('a'..='z').cycle().take(1000).collect();
        let chunk_size = 300;
        let overlap = 50;
        let chunks = chunk_text(&text, chunk_size, overlap).expect("chunking succeeded");

        for pair in chunks.windows(2) {
            let previous: Vec<char> = pair[0].chars().collect();
            let next: Vec<char> = pair[1].chars().collect();
            if previous.len() == chunk_size {
                let tail: String = previous[previous.len() - overlap..].iter().collect();
                let head: String = next[..overlap].iter().collect();
                assert_eq!(tail, head);
            }
        }
    }

    #[test]
    fn dropping_overlaps_reconstructs_the_original() {
        let text: String = "The quick brown fox jumps over the lazy dog. ".repeat(40);
        let overlap = 30;
        let chunks = chunk_text(&text, 128, overlap).expect("chunking succeeded");

        let mut rebuilt = String::new();
        for (index, chunk) in chunks.iter().enumerate() {
            if index == 0 {
                rebuilt.push_str(chunk);
            } else {
                let stripped: String = chunk.chars().skip(overlap).collect();
                rebuilt.push_str(&stripped);
            }
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn chunk_count_matches_closed_form() {
        for (total, chunk_size, overlap) in [
            (1200, 500, 100),
            (1000, 300, 50),
            (501, 500, 100),
            (499, 500, 100),
            (2048, 256, 0),
        ] {
            let text = "y".repeat(total);
            let chunks = chunk_text(&text, chunk_size, overlap).expect("chunking succeeded");
            assert_eq!(
                chunks.len(),
                expected_chunk_count(total, chunk_size, overlap),
                "total={total} chunk_size={chunk_size} overlap={overlap}"
            );
        }
    }

    #[test]
    fn counts_characters_not_bytes() {
        let text = "héllo wörld ünïcode".repeat(30);
        let total_chars = text.chars().count();
        let chunks = chunk_text(&text, 100, 20).expect("chunking succeeded");
        assert_eq!(chunks.len(), expected_chunk_count(total_chars, 100, 20));
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 100);
        }
    }

    #[test]
    fn rejects_empty_input() {
        let error = chunk_text("", 500, 100).unwrap_err();
        assert!(matches!(error, ChunkingError::EmptyInput));
    }

    #[test]
    fn rejects_zero_chunk_size() {
        let error = chunk_text("hello", 0, 0).unwrap_err();
        assert!(matches!(error, ChunkingError::InvalidChunkSize));
    }

    #[test]
    fn rejects_overlap_not_smaller_than_chunk_size() {
        let error = chunk_text("hello", 10, 10).unwrap_err();
        assert!(matches!(
            error,
            ChunkingError::InvalidOverlap {
                chunk_size: 10,
                overlap: 10
            }
        ));
    }
}
