//! Line offset index over a mapped file

use std::ops::Range;
use memchr::memchr_iter;

/// Byte offset of the first byte of every logical line.
///
/// Only `\n` terminates a line; a `\r` directly before it is excluded from
/// the line's content when the line is read. A final line without a
/// terminator is still indexed. Built once and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineIndex {
    offsets: Vec<usize>,
    len: usize,
    /// The buffer ends with `\n`
    terminated: bool,
}

impl LineIndex {
    /// Build the index with a single linear scan of `bytes`
    pub fn build(bytes: &[u8]) -> Self {
        let len = bytes.len();
        let mut offsets = Vec::new();

        if len > 0 {
            offsets.push(0);
            for newline in memchr_iter(b'\n', bytes) {
                let next = newline + 1;
                if next < len {
                    offsets.push(next);
                }
            }
        }

        Self {
            offsets,
            len,
            terminated: bytes.last() == Some(&b'\n'),
        }
    }

    /// Number of indexed lines
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Length in bytes of the indexed buffer
    pub fn byte_len(&self) -> usize {
        self.len
    }

    /// Start offsets, one per line
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Byte range of a line including any trailing `\r`, excluding `\n`
    pub fn raw_span(&self, row: usize) -> Option<Range<usize>> {
        let start = *self.offsets.get(row)?;
        let end = match self.offsets.get(row + 1) {
            Some(&next) => next - 1,
            None if self.terminated => self.len - 1,
            None => self.len,
        };
        Some(start..end)
    }

    /// Content of a line in `bytes`, without its terminator
    pub fn line<'a>(&self, bytes: &'a [u8], row: usize) -> Option<&'a [u8]> {
        let span = self.raw_span(row)?;
        let mut end = span.end;
        if end > span.start && bytes.get(end - 1) == Some(&b'\r') {
            end -= 1;
        }
        bytes.get(span.start..end)
    }
}
