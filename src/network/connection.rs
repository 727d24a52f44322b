//! Connection handling dengan staging buffers
//!
//! Satu `Buffer` inbound dan satu `Buffer` outbound per koneksi.
//! Socket read langsung mengisi writable region inbound (tanpa buffer
//! perantara), socket write langsung dari readable region outbound.

use std::io::{self, Read, Write};

use super::config::DEFAULT_READ_CHUNK;
use super::error::NetError;
use crate::core::Buffer;
use crate::protocol::{FrameError, MessageFilter};

/// Socket driver for one connection.
///
/// Generic over the stream so it works with mio, std, or an in-memory
/// stream in tests.
pub struct Connection<S> {
    stream: S,
    inbound: Buffer,
    outbound: Buffer,
    read_chunk: usize,
}

impl<S: Read + Write> Connection<S> {
    pub fn new(stream: S) -> Self {
        Self::with_read_chunk(stream, DEFAULT_READ_CHUNK)
    }

    pub fn with_read_chunk(stream: S, read_chunk: usize) -> Self {
        Self {
            stream,
            inbound: Buffer::new(),
            outbound: Buffer::new(),
            read_chunk: read_chunk.max(1),
        }
    }

    /// Read once from the stream into the inbound buffer.
    ///
    /// Returns bytes read, `Ok(0)` on WouldBlock. EOF becomes a
    /// `ConnectionReset` error.
    pub fn fill_read_buffer(&mut self) -> io::Result<usize> {
        // Pakai sisa ruang inline dulu, grow hanya kalau penuh
        if self.inbound.writable() == 0 {
            self.inbound.ensure_writable_bytes(self.read_chunk);
        }

        loop {
            match self.stream.read(self.inbound.writable_slice_mut()) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::ConnectionReset,
                        "Connection closed",
                    ));
                }
                Ok(n) => {
                    self.inbound.has_written(n);
                    return Ok(n);
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(0),
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Run `filter` over the inbound buffer.
    #[inline]
    pub fn decode(
        &mut self,
        filter: &mut dyn MessageFilter,
        messages: &mut Vec<Vec<u8>>,
    ) -> Result<usize, FrameError> {
        filter.read(&mut self.inbound, messages)
    }

    /// Read until WouldBlock, decoding after every fill.
    ///
    /// Decode per fill menjaga inbound tetap terbatas: frame yang terlalu
    /// besar ditolak filter sebelum read berikutnya, jadi inbound tidak
    /// pernah lebih dari satu frame valid plus satu read chunk.
    ///
    /// Returns total bytes read. Frames decoded before an error are still
    /// pushed to `messages`.
    pub fn receive(
        &mut self,
        filter: &mut dyn MessageFilter,
        messages: &mut Vec<Vec<u8>>,
    ) -> Result<usize, NetError> {
        let mut total = 0;
        loop {
            match self.fill_read_buffer()? {
                0 => return Ok(total),
                n => total += n,
            }
            self.decode(filter, messages)?;
        }
    }

    /// Encode one frame into the outbound buffer.
    #[inline]
    pub fn queue_message(
        &mut self,
        filter: &mut dyn MessageFilter,
        message: &[u8],
    ) -> Result<(), FrameError> {
        filter.write(&mut self.outbound, message)
    }

    /// Queue raw bytes
    #[inline]
    pub fn queue_write(&mut self, data: &[u8]) {
        self.outbound.write(data);
    }

    /// Write as much of the outbound buffer as the stream accepts.
    ///
    /// Partial write atau WouldBlock: sisa tetap di outbound buffer.
    pub fn flush_write_buffer(&mut self) -> io::Result<()> {
        while !self.outbound.is_empty() {
            match self.stream.write(self.outbound.readable_slice()) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "Failed to write to socket",
                    ));
                }
                Ok(n) => self.outbound.retrieve(n),
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Bytes pending in write buffer
    #[inline(always)]
    pub fn write_pending(&self) -> usize {
        self.outbound.readable()
    }

    pub fn inbound(&self) -> &Buffer {
        &self.inbound
    }

    pub fn outbound(&self) -> &Buffer {
        &self.outbound
    }

    pub fn stream(&self) -> &S {
        &self.stream
    }

    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }
}

/// Set SO_SNDBUF / SO_RCVBUF. Errors are ignored, not every platform
/// honours this.
#[cfg(unix)]
pub fn set_socket_buffers<T: std::os::unix::io::AsRawFd>(socket: &T, size: usize) {
    if size == 0 {
        return;
    }
    let fd = socket.as_raw_fd();
    let optval: libc::c_int = size.min(libc::c_int::MAX as usize) as libc::c_int;
    // SAFETY: fd valid selama `socket` hidup, optval pointer ke c_int lokal
    unsafe {
        libc::setsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_SNDBUF,
            &optval as *const _ as *const libc::c_void,
            std::mem::size_of::<libc::c_int>() as libc::socklen_t,
        );
        libc::setsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_RCVBUF,
            &optval as *const _ as *const libc::c_void,
            std::mem::size_of::<libc::c_int>() as libc::socklen_t,
        );
    }
}

#[cfg(not(unix))]
pub fn set_socket_buffers<T>(_socket: &T, _size: usize) {}
