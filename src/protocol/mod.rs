//! Protocol Layer: string encodings dan message framing
//!
//! Prinsip desain:
//! - Fixed-width fields di-pin ke little-endian
//! - Semua read dari bytes peer fallible: Incomplete vs Invalid
//! - Filter hanya memakai primitive read/write milik `Buffer`

mod codec;
mod error;
mod filter;

pub use codec::{DEFAULT_MAX_STRING_LENGTH, LENGTH_FIELD_SIZE, TERMINATOR};
pub use error::FrameError;
pub use filter::{
    Framing, LengthPrefixedFilter, MessageFilter, NullTerminatedFilter, DEFAULT_MAX_FRAME_LENGTH,
};
