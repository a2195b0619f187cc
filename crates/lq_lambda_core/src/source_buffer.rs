//! Sentinel-terminated source buffer.

use crate::Cursor;

/// Zero bytes appended after the source. One is the sentinel; the rest
/// keep `peek`/`peek2` in bounds at the end of input.
const PADDING: usize = 4;

/// Owned copy of the lambda text followed by `0x00` padding.
///
/// ```text
/// [source_bytes..., 0x00, 0x00, 0x00, 0x00]
///                   ^
///                   len() (sentinel)
/// ```
#[derive(Clone, Debug)]
pub struct SourceBuffer {
    buf: Vec<u8>,
    source_len: u32,
}

impl SourceBuffer {
    /// Copy `source` into a new buffer.
    ///
    /// Lambda text longer than `u32::MAX` bytes is truncated to that length.
    pub fn new(source: &str) -> Self {
        let bytes = source.as_bytes();
        let source_len = u32::try_from(bytes.len()).unwrap_or(u32::MAX);
        let kept = &bytes[..source_len as usize];
        let mut buf = Vec::with_capacity(kept.len() + PADDING);
        buf.extend_from_slice(kept);
        buf.resize(kept.len() + PADDING, 0);
        SourceBuffer { buf, source_len }
    }

    /// Source bytes without the padding.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.source_len as usize]
    }

    /// Cursor positioned at byte 0.
    pub fn cursor(&self) -> Cursor<'_> {
        Cursor::new(&self.buf, self.source_len)
    }

    pub fn len(&self) -> u32 {
        self.source_len
    }

    pub fn is_empty(&self) -> bool {
        self.source_len == 0
    }
}
