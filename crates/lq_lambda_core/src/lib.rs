//! Low-level scanner for micro-lambda text.
//!
//! Produces `(RawTag, len)` pairs over a sentinel-terminated buffer. Tokens
//! carry no values: keyword resolution, escape processing and numeric
//! parsing happen in the cooking layer (`lq_lambda::lexer`).
//!
//! The lengths of all tokens up to `Eof` always sum to the source length,
//! so token offsets can be recovered by a running sum.

mod cursor;
mod raw_scanner;
mod source_buffer;
mod tag;

pub use cursor::Cursor;
pub use raw_scanner::{tokenize, RawScanner};
pub use source_buffer::SourceBuffer;
pub use tag::{RawTag, RawToken};
