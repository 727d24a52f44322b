//! String encodings di atas staging buffer
//!
//! Wire format:
//! ```text
//! Length-prefixed: [u32 length, little-endian][length bytes payload]
//! Null-terminated: [payload, tanpa byte 0][0x00]
//! ```
//!
//! Length field di-pin ke little-endian. Di host little-endian (x86, ARM)
//! hasilnya bit-identik dengan layout native.
//!
//! Semua read yang ukurannya berasal dari bytes peer bersifat fallible dan
//! atomic: kalau error, tidak ada byte yang di-consume.

use std::str;

use super::error::FrameError;
use crate::core::StagingBuffer;

/// Width of the length field in a length-prefixed frame
pub const LENGTH_FIELD_SIZE: usize = 4;

/// Default cap on a declared length (16MB)
pub const DEFAULT_MAX_STRING_LENGTH: usize = 16 * 1024 * 1024;

/// Terminator byte of a null-terminated frame
pub const TERMINATOR: u8 = 0;

impl<const N: usize> StagingBuffer<N> {
    /// Append the raw bytes of `value`.
    ///
    /// No terminator is written. Pair with `write_u8(0)` when the reader
    /// expects a null-terminated string.
    pub fn write_string(&mut self, value: &str) {
        if !value.is_empty() {
            self.write(value.as_bytes());
        }
    }

    /// Append `[u32 length][bytes]`.
    ///
    /// # Panics
    /// Panic jika payload lebih dari `u32::MAX` bytes.
    pub fn write_length_and_bytes(&mut self, value: &[u8]) {
        assert!(
            value.len() <= u32::MAX as usize,
            "payload of {} bytes does not fit a u32 length field",
            value.len()
        );
        self.write_u32(value.len() as u32);
        self.write(value);
    }

    /// Append `[u32 length][utf-8 bytes]`.
    pub fn write_length_and_string(&mut self, value: &str) {
        self.write_length_and_bytes(value.as_bytes());
    }

    /// Read a null-terminated string.
    ///
    /// **Careful:** only the bytes *before* the terminator are consumed. The
    /// zero byte stays in the buffer as the next readable byte, so a caller
    /// reading consecutive strings must `retrieve(1)` between them. An empty
    /// string consumes nothing at all.
    ///
    /// Returns [`FrameError::Incomplete`] when the buffer is empty or holds
    /// no terminator yet.
    pub fn read_string(&mut self) -> Result<String, FrameError> {
        let mut value = String::new();
        self.read_string_into(&mut value)?;
        Ok(value)
    }

    /// Like [`read_string`](Self::read_string), reusing `out`.
    ///
    /// `out` is left untouched on error.
    pub fn read_string_into(&mut self, out: &mut String) -> Result<(), FrameError> {
        let text = str::from_utf8(self.terminated_payload(usize::MAX)?)
            .map_err(|_| FrameError::InvalidUtf8)?;

        out.clear();
        out.push_str(text);
        let length = out.len();
        self.retrieve_terminated(length);
        Ok(())
    }

    /// Read a null-terminated payload as raw bytes.
    ///
    /// Same consumption rule as [`read_string`](Self::read_string): the
    /// terminator stays readable. Any non-zero byte is accepted.
    ///
    /// Payloads longer than `limit` are [`FrameError::TooLong`], whether the
    /// terminator has arrived or not.
    pub fn read_terminated_bytes_limited(&mut self, limit: usize) -> Result<Vec<u8>, FrameError> {
        let value = self.terminated_payload(limit)?.to_vec();
        self.retrieve_terminated(value.len());
        Ok(value)
    }

    /// Read `[u32 length][payload]` as a string, capped at
    /// [`DEFAULT_MAX_STRING_LENGTH`].
    pub fn read_length_and_string(&mut self) -> Result<String, FrameError> {
        self.read_length_and_string_limited(DEFAULT_MAX_STRING_LENGTH)
    }

    pub fn read_length_and_string_into(&mut self, out: &mut String) -> Result<(), FrameError> {
        let declared = self.length_prefixed_frame(DEFAULT_MAX_STRING_LENGTH)?;
        let payload = &self.readable_slice()[LENGTH_FIELD_SIZE..LENGTH_FIELD_SIZE + declared];
        let text = str::from_utf8(payload).map_err(|_| FrameError::InvalidUtf8)?;

        out.clear();
        out.push_str(text);
        self.consume_length_prefixed(declared);
        Ok(())
    }

    /// Read `[u32 length][payload]` as a string, rejecting declared lengths
    /// above `limit` with [`FrameError::TooLong`].
    pub fn read_length_and_string_limited(&mut self, limit: usize) -> Result<String, FrameError> {
        let declared = self.length_prefixed_frame(limit)?;
        let payload = &self.readable_slice()[LENGTH_FIELD_SIZE..LENGTH_FIELD_SIZE + declared];
        let value = str::from_utf8(payload)
            .map_err(|_| FrameError::InvalidUtf8)?
            .to_owned();

        self.consume_length_prefixed(declared);
        Ok(value)
    }

    /// Read `[u32 length][payload]` as raw bytes.
    pub fn read_length_and_bytes_limited(&mut self, limit: usize) -> Result<Vec<u8>, FrameError> {
        let declared = self.length_prefixed_frame(limit)?;
        let value =
            self.readable_slice()[LENGTH_FIELD_SIZE..LENGTH_FIELD_SIZE + declared].to_vec();

        self.consume_length_prefixed(declared);
        Ok(value)
    }

    pub fn peek_u8(&self) -> Result<u8, FrameError> {
        self.peek_array::<1>().map(|b| b[0])
    }

    pub fn peek_u16(&self) -> Result<u16, FrameError> {
        self.peek_array().map(u16::from_le_bytes)
    }

    pub fn peek_u32(&self) -> Result<u32, FrameError> {
        self.peek_array().map(u32::from_le_bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8, FrameError> {
        let value = self.peek_u8()?;
        self.retrieve(1);
        Ok(value)
    }

    pub fn read_u16(&mut self) -> Result<u16, FrameError> {
        let value = self.peek_u16()?;
        self.retrieve(2);
        Ok(value)
    }

    pub fn read_u32(&mut self) -> Result<u32, FrameError> {
        let value = self.peek_u32()?;
        self.retrieve(4);
        Ok(value)
    }

    fn peek_array<const W: usize>(&self) -> Result<[u8; W], FrameError> {
        let data = self.readable_slice();
        if data.len() < W {
            return Err(FrameError::Incomplete {
                needed: W,
                available: data.len(),
            });
        }
        let mut out = [0u8; W];
        out.copy_from_slice(&data[..W]);
        Ok(out)
    }

    // Scan dibatasi ke writer_pos, tidak pernah baca di luar readable region.
    // Tidak consume apapun.
    fn terminated_payload(&self, limit: usize) -> Result<&[u8], FrameError> {
        let data = self.readable_slice();
        match data.iter().position(|&b| b == TERMINATOR) {
            Some(length) if length > limit => Err(FrameError::TooLong {
                declared: length,
                limit,
            }),
            Some(length) => Ok(&data[..length]),
            // Tail tanpa terminator yang sudah lewat limit tidak akan valid
            None if data.len() > limit => Err(FrameError::TooLong {
                declared: data.len(),
                limit,
            }),
            None => Err(FrameError::Incomplete {
                needed: data.len() + 1,
                available: data.len(),
            }),
        }
    }

    #[inline]
    fn retrieve_terminated(&mut self, length: usize) {
        if length > 0 {
            self.retrieve(length);
        }
    }

    // Validasi header + payload tanpa consume apapun
    fn length_prefixed_frame(&self, limit: usize) -> Result<usize, FrameError> {
        let declared = self.peek_u32()? as usize;
        if declared > limit {
            return Err(FrameError::TooLong { declared, limit });
        }

        let needed = LENGTH_FIELD_SIZE + declared;
        if self.readable() < needed {
            return Err(FrameError::Incomplete {
                needed,
                available: self.readable(),
            });
        }
        Ok(declared)
    }

    fn consume_length_prefixed(&mut self, declared: usize) {
        self.retrieve(LENGTH_FIELD_SIZE);
        if declared > 0 {
            self.retrieve(declared);
        }
    }
}
