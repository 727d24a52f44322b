//! Frame errors untuk data yang datang dari peer
//!
//! Dua kelas outcome:
//! - Incomplete: frame belum lengkap, tunggu bytes berikutnya
//! - Invalid: frame rusak, koneksi sebaiknya ditutup

use thiserror::Error;

/// Recoverable outcome of decoding peer-supplied bytes.
///
/// No variant consumes anything from the buffer: after an error the
/// readable region is exactly what it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Not enough bytes yet.
    #[error("incomplete frame: need {needed} bytes, {available} readable")]
    Incomplete { needed: usize, available: usize },

    /// Declared length is larger than the configured maximum.
    #[error("frame length {declared} exceeds limit {limit}")]
    TooLong { declared: usize, limit: usize },

    /// String payload is not UTF-8.
    #[error("frame payload is not valid UTF-8")]
    InvalidUtf8,

    /// Payload for a null-terminated frame contains a zero byte.
    #[error("payload contains a zero byte at offset {position}")]
    InteriorNul { position: usize },
}

impl FrameError {
    /// `true` when waiting for more bytes may resolve the error.
    #[inline(always)]
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Self::Incomplete { .. })
    }

    /// `true` when the frame is malformed and will never decode.
    #[inline(always)]
    pub fn is_invalid(&self) -> bool {
        !self.is_incomplete()
    }
}
