//! Message filters: kapan sebuah frame lengkap, dan bagaimana meng-encode-nya
//!
//! Filter bekerja hanya lewat primitive read/write milik `Buffer`.
//! Satu filter per session (filter boleh menyimpan state).

use super::codec::LENGTH_FIELD_SIZE;
use super::error::FrameError;
use crate::core::Buffer;

/// Default cap on a single frame (1MB)
pub const DEFAULT_MAX_FRAME_LENGTH: usize = 1024 * 1024;

/// Frame boundary policy for one session.
pub trait MessageFilter: Send {
    /// Decode every complete frame in `inbound` into `messages`.
    ///
    /// Stops quietly at an incomplete tail and returns how many frames were
    /// decoded. Frames decoded before an invalid one are still pushed to
    /// `messages` when `Err` is returned.
    fn read(&mut self, inbound: &mut Buffer, messages: &mut Vec<Vec<u8>>)
        -> Result<usize, FrameError>;

    /// Encode one frame into `outbound`.
    fn write(&mut self, outbound: &mut Buffer, message: &[u8]) -> Result<(), FrameError>;
}

/// Selectable framing, e.g. from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Framing {
    /// `[u32 LE length][payload]`
    #[default]
    LengthPrefixed,
    /// `[payload tanpa byte 0][0x00]`
    NullTerminated,
}

impl Framing {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "length" | "length-prefixed" => Some(Self::LengthPrefixed),
            "null" | "null-terminated" => Some(Self::NullTerminated),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::LengthPrefixed => "length-prefixed",
            Self::NullTerminated => "null-terminated",
        }
    }

    /// Fresh filter for a new session.
    pub fn build(self, max_frame_length: usize) -> Box<dyn MessageFilter> {
        match self {
            Self::LengthPrefixed => Box::new(LengthPrefixedFilter::new(max_frame_length)),
            Self::NullTerminated => Box::new(NullTerminatedFilter::new(max_frame_length)),
        }
    }
}

/// `[u32 LE length][payload]` frames, binary-safe.
#[derive(Debug, Clone)]
pub struct LengthPrefixedFilter {
    max_frame_length: usize,
}

impl LengthPrefixedFilter {
    pub fn new(max_frame_length: usize) -> Self {
        Self { max_frame_length }
    }
}

impl Default for LengthPrefixedFilter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_LENGTH)
    }
}

impl MessageFilter for LengthPrefixedFilter {
    fn read(
        &mut self,
        inbound: &mut Buffer,
        messages: &mut Vec<Vec<u8>>,
    ) -> Result<usize, FrameError> {
        let mut decoded = 0;
        loop {
            match inbound.read_length_and_bytes_limited(self.max_frame_length) {
                Ok(message) => {
                    messages.push(message);
                    decoded += 1;
                }
                Err(FrameError::Incomplete { needed, available }) => {
                    // Siapkan ruang untuk sisa frame supaya read socket
                    // berikutnya tidak grow berkali-kali
                    if needed > LENGTH_FIELD_SIZE {
                        inbound.reserve(needed - available);
                    }
                    return Ok(decoded);
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn write(&mut self, outbound: &mut Buffer, message: &[u8]) -> Result<(), FrameError> {
        if message.len() > self.max_frame_length {
            return Err(FrameError::TooLong {
                declared: message.len(),
                limit: self.max_frame_length,
            });
        }
        outbound.write_length_and_bytes(message);
        Ok(())
    }
}

/// `[payload][0x00]` frames.
///
/// Payloads may hold any byte except zero.
#[derive(Debug, Clone)]
pub struct NullTerminatedFilter {
    max_frame_length: usize,
}

impl NullTerminatedFilter {
    pub fn new(max_frame_length: usize) -> Self {
        Self { max_frame_length }
    }
}

impl Default for NullTerminatedFilter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_LENGTH)
    }
}

impl MessageFilter for NullTerminatedFilter {
    fn read(
        &mut self,
        inbound: &mut Buffer,
        messages: &mut Vec<Vec<u8>>,
    ) -> Result<usize, FrameError> {
        let mut decoded = 0;
        loop {
            match inbound.read_terminated_bytes_limited(self.max_frame_length) {
                Ok(message) => {
                    // Terminator tidak ikut di-consume
                    inbound.retrieve(1);
                    messages.push(message);
                    decoded += 1;
                }
                Err(FrameError::Incomplete { .. }) => return Ok(decoded),
                Err(e) => return Err(e),
            }
        }
    }

    fn write(&mut self, outbound: &mut Buffer, message: &[u8]) -> Result<(), FrameError> {
        if let Some(position) = message.iter().position(|&b| b == 0) {
            return Err(FrameError::InteriorNul { position });
        }
        if message.len() > self.max_frame_length {
            return Err(FrameError::TooLong {
                declared: message.len(),
                limit: self.max_frame_length,
            });
        }

        outbound.write(message);
        outbound.write_u8(0);
        Ok(())
    }
}
