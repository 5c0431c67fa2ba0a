//! Text chunking for large documents
//!
//! Documents longer than the chunk size are cut into overlapping segments.
//! Each cut prefers a paragraph break, then a sentence end, and only falls
//! back to a hard cut at the size limit when neither lies in the back half
//! of the window. Offsets are in characters, not bytes.

use lector_domain::Chunk;
use std::iter::FusedIterator;

const PARAGRAPH_BREAK: [char; 2] = ['\n', '\n'];
const SENTENCE_END: [char; 2] = ['.', ' '];

/// Splits text into bounded, overlapping chunks
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    max_chunk_size: usize,
    overlap_size: usize,
}

impl TextChunker {
    /// Create a new text chunker
    ///
    /// A `max_chunk_size` of zero is treated as one character.
    pub fn new(max_chunk_size: usize, overlap_size: usize) -> Self {
        Self {
            max_chunk_size: max_chunk_size.max(1),
            overlap_size,
        }
    }

    /// Lazily chunk the given text
    pub fn iter(&self, text: &str) -> ChunkIter {
        ChunkIter {
            chars: text.chars().collect(),
            max_chunk_size: self.max_chunk_size,
            overlap_size: self.overlap_size,
            start: 0,
            index: 0,
            done: false,
        }
    }

    /// Chunk the given text into a fully materialized list
    pub fn split(&self, text: &str) -> Vec<Chunk> {
        self.iter(text).collect()
    }
}

/// Chunk `text` with the given size and overlap
pub fn split(text: &str, max_chunk_size: usize, overlap_size: usize) -> Vec<Chunk> {
    TextChunker::new(max_chunk_size, overlap_size).split(text)
}

/// Lazy chunk sequence produced by [`TextChunker::iter`]
#[derive(Debug)]
pub struct ChunkIter {
    chars: Vec<char>,
    max_chunk_size: usize,
    overlap_size: usize,
    start: usize,
    index: usize,
    done: bool,
}

impl ChunkIter {
    /// Pick the end of the chunk starting at `start` when `hard` < len
    fn find_cut(&self, start: usize, hard: usize) -> usize {
        let floor = hard.saturating_sub(self.max_chunk_size / 2);
        self.rfind_break(&PARAGRAPH_BREAK, start, floor, hard)
            .or_else(|| self.rfind_break(&SENTENCE_END, start, floor, hard))
            .unwrap_or(hard)
    }

    /// Nearest cut point right after `pattern`, within `(start, hard]` and `>= floor`
    fn rfind_break(&self, pattern: &[char; 2], start: usize, floor: usize, hard: usize) -> Option<usize> {
        let mut cut = hard;
        while cut >= 2 && cut > start && cut >= floor {
            if self.chars[cut - 2..cut] == pattern[..] {
                return Some(cut);
            }
            cut -= 1;
        }
        None
    }
}

impl Iterator for ChunkIter {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        let len = self.chars.len();
        if self.done || len == 0 {
            self.done = true;
            return None;
        }

        let start = self.start;
        let hard = (start + self.max_chunk_size).min(len);
        let end = if hard == len { len } else { self.find_cut(start, hard) };

        let chunk = Chunk {
            index: self.index,
            start,
            end,
            text: self.chars[start..end].iter().collect(),
        };
        self.index += 1;

        if end >= len {
            self.done = true;
        } else {
            let next = end.saturating_sub(self.overlap_size).max(start);
            // Overlap as large as the chunk would stall; resume at the cut
            self.start = if next > start { next } else { end };
        }

        Some(chunk)
    }
}

impl FusedIterator for ChunkIter {}
