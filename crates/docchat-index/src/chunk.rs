//! Document chunking
//!
//! Splits document text into overlapping windows measured in characters,
//! preferring paragraph, sentence and line breaks near each window's end.

use crate::loader::Document;

/// Configuration for document chunking
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,

    /// Overlap between chunks in characters
    pub overlap: usize,
}

impl ChunkConfig {
    /// Create a config, clamping the overlap below the chunk size
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size / 2),
        }
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self::new(1024, 200)
    }
}

/// A chunk of text from a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// Chunk content
    pub content: String,

    /// Chunk index within the document
    pub index: u32,

    /// Starting character offset in original document
    pub start_offset: usize,

    /// Ending character offset (exclusive)
    pub end_offset: usize,
}

/// Chunk a loaded document
pub fn chunk_document(doc: &Document, config: &ChunkConfig) -> Vec<TextChunk> {
    chunk_text(&doc.content, config)
}

/// Chunk a text string. Whitespace-only windows are dropped.
pub fn chunk_text(text: &str, config: &ChunkConfig) -> Vec<TextChunk> {
    let chars: Vec<char> = text.chars().collect();
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut index = 0u32;

    while start < chars.len() {
        let end = (start + config.chunk_size).min(chars.len());
        let actual_end = if end < chars.len() {
            find_break_point(&chars, start, end)
        } else {
            end
        };

        let content: String = chars[start..actual_end].iter().collect();
        if !content.trim().is_empty() {
            chunks.push(TextChunk {
                content,
                index,
                start_offset: start,
                end_offset: actual_end,
            });
            index += 1;
        }

        if actual_end >= chars.len() {
            break;
        }

        // Step back by the overlap, but always make progress
        let next = actual_end.saturating_sub(config.overlap);
        start = if next > start { next } else { actual_end };
    }

    chunks
}

/// Find a break point in the back half of `[start, target)`.
///
/// Falls back to `target` when no natural boundary exists.
fn find_break_point(chars: &[char], start: usize, target: usize) -> usize {
    let floor = start + (target - start) / 2;
    let window = &chars[floor..target];

    for pattern in ["\n\n", ". ", "! ", "? ", "。", "\n"] {
        let pattern: Vec<char> = pattern.chars().collect();
        if let Some(pos) = rfind(window, &pattern) {
            let end = floor + pos + pattern.len();
            if end > start {
                return end;
            }
        }
    }

    if let Some(pos) = window.iter().rposition(|c| c.is_whitespace()) {
        let end = floor + pos + 1;
        if end > start {
            return end;
        }
    }

    target
}

fn rfind(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    (0..=haystack.len() - needle.len())
        .rev()
        .find(|&i| haystack[i..i + needle.len()] == *needle)
}
