//! Source Buffer
//!
//! Owns the mutable text being tokenized. Macro expansion rewrites the
//! buffer in place and the tokenizer retokenizes from the patch point,
//! rather than layering a separate pushback stream on top.
//!
//! All cursors into the buffer are plain `usize` byte offsets, never
//! pointers, so `expand_at` growing or shrinking the backing `Vec<u8>`
//! can never invalidate a live cursor. Callers just adjust the offset by
//! the returned delta.

use std::path::Path;

use crate::error::{Result, XmkErrorKind};

/// A trailing marker byte callers can rely on being present at
/// `bytes()[len()]`, even though Rust's length-checked slices don't
/// strictly need one.
const SENTINEL: u8 = 0;

pub struct SourceBuffer {
    bytes: Vec<u8>,
}

impl SourceBuffer {
    #[track_caller]
    pub fn load(path: &Path) -> Result<Self> {
        let mut bytes = std::fs::read(path).map_err(|source| {
            crate::fatal!(XmkErrorKind::Io { path: path.display().to_string(), source })
        })?;
        bytes.push(SENTINEL);
        Ok(Self { bytes })
    }

    pub fn from_text(text: &str) -> Self {
        let mut bytes = text.as_bytes().to_vec();
        bytes.push(SENTINEL);
        Self { bytes }
    }

    /// Length of the live text, excluding the trailing sentinel.
    pub fn len(&self) -> usize {
        self.bytes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len()]
    }

    pub fn byte_at(&self, offset: usize) -> Option<u8> {
        self.as_bytes().get(offset).copied()
    }

    /// Splice `replacement` in place of the `replaced_len` bytes starting at
    /// `offset`. Returns the signed length delta so the caller can re-derive
    /// any cursor positioned at or after `offset`.
    pub fn expand_at(&mut self, offset: usize, replaced_len: usize, replacement: &str) -> isize {
        let end = offset + replaced_len;
        self.bytes.splice(offset..end, replacement.bytes());
        // re-append the sentinel if the splice touched the tail region and
        // clipped it off (splice on a range that reaches `len()` removes it).
        if self.bytes.last().copied() != Some(SENTINEL) {
            self.bytes.push(SENTINEL);
        }
        replacement.len() as isize - replaced_len as isize
    }
}
