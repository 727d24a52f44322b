//! Staging Buffer: sliding window di atas storage linear
//!
//! Layout:
//! ```text
//! +-------------------+------------------+------------------+
//! | prependable bytes |  readable bytes  |  writable bytes  |
//! |                   |     (CONTENT)    |                  |
//! +-------------------+------------------+------------------+
//! 0       <=      reader_pos   <=   writer_pos    <=    capacity
//! ```
//!
//! Prinsip desain:
//! - Inline-first: pesan kecil (<= `N` bytes) tidak pernah alokasi heap
//! - Promosi satu arah: sekali Dynamic, selamanya Dynamic
//! - Bukan circular queue: data yang belum dibaca di-compact ke offset 0,
//!   tidak pernah wrap

use std::fmt;
use std::io;
use std::mem;

use super::storage::Storage;

/// Compile-time threshold: inline capacity of [`Buffer`].
pub const DYNAMIC_THRESHOLD: usize = 64;

/// Staging buffer with the default inline threshold.
pub type Buffer = StagingBuffer<DYNAMIC_THRESHOLD>;

/// Growable byte buffer with separate read and write cursors.
///
/// Starts with `N` bytes of inline storage and promotes itself to an owned
/// heap vector the first time a write cannot fit, even after compaction.
/// The promotion is permanent: `clear()` and full retrieval keep the buffer
/// dynamic.
///
/// # Invariants
///
/// `reader_pos <= writer_pos <= capacity()` after every operation, and the
/// bytes in `[reader_pos, writer_pos)` are exactly the unread content.
///
/// Not synchronized. One buffer belongs to one connection context at a time.
#[derive(Clone)]
pub struct StagingBuffer<const N: usize> {
    storage: Storage<N>,
    reader_pos: usize,
    writer_pos: usize,
}

impl<const N: usize> Default for StagingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> StagingBuffer<N> {
    /// Empty inline buffer, tidak ada alokasi.
    pub const fn new() -> Self {
        Self {
            storage: Storage::inline(),
            reader_pos: 0,
            writer_pos: 0,
        }
    }

    /// Buffer with at least `size` writable bytes.
    ///
    /// Promotes immediately when `size > N`.
    pub fn with_capacity(size: usize) -> Self {
        let mut buffer = Self::new();
        buffer.ensure_writable_bytes(size);
        buffer
    }

    /// Buffer pre-filled with a copy of `data`.
    pub fn from_slice(data: &[u8]) -> Self {
        let mut buffer = Self::new();
        buffer.write(data);
        buffer
    }

    /// Unread bytes
    #[inline(always)]
    pub fn readable(&self) -> usize {
        self.writer_pos - self.reader_pos
    }

    /// Bytes that can be appended without compaction or growth
    #[inline(always)]
    pub fn writable(&self) -> usize {
        self.storage.capacity() - self.writer_pos
    }

    /// Consumed bytes in front of the read cursor, reclaimable by compaction
    #[inline(always)]
    pub fn prependable(&self) -> usize {
        self.reader_pos
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.readable() == 0
    }

    #[inline(always)]
    pub fn is_dynamic(&self) -> bool {
        self.storage.is_dynamic()
    }

    /// Readable region (zero-copy view).
    ///
    /// Socket drivers copy outbound bytes onto the wire from here, then
    /// [`retrieve`](Self::retrieve) what the socket accepted.
    #[inline(always)]
    pub fn readable_slice(&self) -> &[u8] {
        &self.storage.as_slice()[self.reader_pos..self.writer_pos]
    }

    /// Alias of [`readable_slice`](Self::readable_slice).
    #[inline(always)]
    pub fn peek(&self) -> &[u8] {
        self.readable_slice()
    }

    /// Writable region, for filling straight from a socket.
    ///
    /// Call [`has_written`](Self::has_written) with the number of bytes
    /// actually filled.
    #[inline(always)]
    pub fn writable_slice_mut(&mut self) -> &mut [u8] {
        let start = self.writer_pos;
        &mut self.storage.as_mut_slice()[start..]
    }

    /// Promote inline storage to a heap vector.
    ///
    /// The readable content moves to offset 0 of a vector sized exactly to
    /// it. Called lazily by the space manager; calling it on a dynamic
    /// buffer is a bug.
    ///
    /// # Panics
    /// Panic jika buffer sudah Dynamic.
    pub fn set_dynamic(&mut self) {
        assert!(!self.is_dynamic(), "staging buffer is already dynamic");

        let content = self.readable_slice().to_vec();
        let content_size = content.len();
        self.storage = Storage::Dynamic(content);
        self.reader_pos = 0;
        self.writer_pos = content_size;
    }

    /// Reserve heap room so that `size` more bytes fit without reallocating.
    ///
    /// Advisory: an inline buffer asking for at most `N` bytes is left alone,
    /// and `capacity()` does not change. Larger requests promote.
    pub fn reserve(&mut self, size: usize) {
        if !self.is_dynamic() {
            if size <= N {
                return;
            }
            self.set_dynamic();
        }

        if let Storage::Dynamic(data) = &mut self.storage {
            let target = self.writer_pos + size;
            data.reserve(target.saturating_sub(data.len()));
        }
    }

    /// Make sure at least `size` bytes can be appended.
    #[inline]
    pub fn ensure_writable_bytes(&mut self, size: usize) {
        if self.writable() < size {
            self.make_space(size);
        }
        debug_assert!(self.writable() >= size);
    }

    // Compact kalau total free space cukup, grow kalau tidak.
    // Hanya cabang grow yang alokasi.
    fn make_space(&mut self, size: usize) {
        if self.writable() + self.prependable() < size {
            if !self.is_dynamic() {
                self.set_dynamic();
            }
            if let Storage::Dynamic(data) = &mut self.storage {
                data.resize(self.writer_pos + size, 0);
            }
        } else {
            let readable = self.readable();
            self.storage
                .as_mut_slice()
                .copy_within(self.reader_pos..self.writer_pos, 0);
            self.reader_pos = 0;
            self.writer_pos = readable;
        }
    }

    /// Consume `size` readable bytes.
    ///
    /// Draining everything resets both cursors to zero, which gives back
    /// the whole capacity without a compaction.
    ///
    /// # Panics
    /// Panic jika `size > readable()`.
    #[inline]
    pub fn retrieve(&mut self, size: usize) {
        assert!(
            size <= self.readable(),
            "retrieve({}) exceeds readable bytes ({})",
            size,
            self.readable()
        );
        if size < self.readable() {
            self.reader_pos += size;
        } else {
            self.retrieve_all();
        }
    }

    #[inline(always)]
    pub fn retrieve_all(&mut self) {
        self.reader_pos = 0;
        self.writer_pos = 0;
    }

    /// Commit `size` bytes filled through [`writable_slice_mut`](Self::writable_slice_mut).
    ///
    /// # Panics
    /// Panic jika `size > writable()`.
    #[inline]
    pub fn has_written(&mut self, size: usize) {
        assert!(
            size <= self.writable(),
            "has_written({}) exceeds writable bytes ({})",
            size,
            self.writable()
        );
        self.writer_pos += size;
    }

    /// Append raw bytes. Never short-writes; returns `data.len()`.
    pub fn write(&mut self, data: &[u8]) -> usize {
        let size = data.len();
        self.ensure_writable_bytes(size);

        let start = self.writer_pos;
        self.storage.as_mut_slice()[start..start + size].copy_from_slice(data);
        self.has_written(size);
        size
    }

    /// Fixed-width writes, little-endian.
    #[inline]
    pub fn write_u8(&mut self, value: u8) {
        self.write(&[value]);
    }

    #[inline]
    pub fn write_u16(&mut self, value: u16) {
        self.write(&value.to_le_bytes());
    }

    #[inline]
    pub fn write_u32(&mut self, value: u32) {
        self.write(&value.to_le_bytes());
    }

    #[inline]
    pub fn write_u64(&mut self, value: u64) {
        self.write(&value.to_le_bytes());
    }

    /// Drop all content.
    ///
    /// A dynamic buffer stays dynamic; its vector is truncated to zero
    /// length (keeping the allocation), so `capacity()` reads 0 until the
    /// next write regrows it in place.
    pub fn clear(&mut self) {
        self.reader_pos = 0;
        self.writer_pos = 0;
        if let Storage::Dynamic(data) = &mut self.storage {
            data.clear();
        }
    }

    /// Exchange the full state of two buffers in constant time.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Move storage and cursors out, leaving `self` empty and inline.
    pub fn transfer(&mut self) -> Self {
        mem::take(self)
    }
}

impl<const N: usize> fmt::Debug for StagingBuffer<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StagingBuffer")
            .field("mode", &if self.is_dynamic() { "dynamic" } else { "inline" })
            .field("reader_pos", &self.reader_pos)
            .field("writer_pos", &self.writer_pos)
            .field("capacity", &self.capacity())
            .finish()
    }
}

/// Two buffers are equal when their unread content is equal.
impl<const N: usize> PartialEq for StagingBuffer<N> {
    fn eq(&self, other: &Self) -> bool {
        self.readable_slice() == other.readable_slice()
    }
}

impl<const N: usize> Eq for StagingBuffer<N> {}

impl<const N: usize> io::Write for StagingBuffer<N> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(StagingBuffer::write(self, buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<const N: usize> io::Read for StagingBuffer<N> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.readable());
        buf[..n].copy_from_slice(&self.readable_slice()[..n]);
        self.retrieve(n);
        Ok(n)
    }
}

impl<const N: usize> bytes::Buf for StagingBuffer<N> {
    fn remaining(&self) -> usize {
        self.readable()
    }

    fn chunk(&self) -> &[u8] {
        self.readable_slice()
    }

    fn advance(&mut self, cnt: usize) {
        self.retrieve(cnt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    fn assert_cursors<const N: usize>(buffer: &StagingBuffer<N>) {
        assert!(buffer.reader_pos <= buffer.writer_pos);
        assert!(buffer.writer_pos <= buffer.capacity());
    }

    #[test]
    fn test_new_is_inline_and_empty() {
        let buffer = Buffer::new();
        assert!(!buffer.is_dynamic());
        assert_eq!(buffer.readable(), 0);
        assert_eq!(buffer.writable(), DYNAMIC_THRESHOLD);
        assert_eq!(buffer.prependable(), 0);
    }

    #[test]
    fn test_promotion_at_threshold() {
        let mut buffer = Buffer::new();

        buffer.write(&[0xAB; 64]);
        assert!(!buffer.is_dynamic());
        assert_eq!(buffer.readable(), 64);

        buffer.write(&[0xCD]);
        assert!(buffer.is_dynamic());
        assert_eq!(buffer.readable(), 65);
        assert_eq!(&buffer.readable_slice()[..64], &[0xAB; 64][..]);
        assert_eq!(buffer.readable_slice()[64], 0xCD);
    }

    #[test]
    fn test_with_capacity() {
        let small = Buffer::with_capacity(32);
        assert!(!small.is_dynamic());

        let large = Buffer::with_capacity(1000);
        assert!(large.is_dynamic());
        assert!(large.writable() >= 1000);
        assert_eq!(large.readable(), 0);
    }

    #[test]
    fn test_from_slice() {
        let buffer = Buffer::from_slice(b"hello");
        assert_eq!(buffer.readable_slice(), b"hello");
        assert!(!buffer.is_dynamic());
    }

    #[test]
    fn test_retrieve_partial_and_full() {
        let mut buffer = Buffer::from_slice(b"abcdef");

        buffer.retrieve(2);
        assert_eq!(buffer.readable_slice(), b"cdef");
        assert_eq!(buffer.prependable(), 2);

        buffer.retrieve(4);
        assert_eq!(buffer.readable(), 0);
        assert_eq!(buffer.prependable(), 0);
        assert_eq!(buffer.writable(), DYNAMIC_THRESHOLD);
    }

    #[test]
    #[should_panic(expected = "exceeds readable")]
    fn test_retrieve_past_readable_panics() {
        let mut buffer = Buffer::from_slice(b"abc");
        buffer.retrieve(4);
    }

    #[test]
    #[should_panic(expected = "already dynamic")]
    fn test_double_promotion_panics() {
        let mut buffer = Buffer::new();
        buffer.set_dynamic();
        buffer.set_dynamic();
    }

    #[test]
    fn test_set_dynamic_moves_content_to_front() {
        let mut buffer = Buffer::from_slice(b"xxhello");
        buffer.retrieve(2);
        buffer.set_dynamic();

        assert!(buffer.is_dynamic());
        assert_eq!(buffer.prependable(), 0);
        assert_eq!(buffer.capacity(), 5);
        assert_eq!(buffer.readable_slice(), b"hello");
    }

    #[test]
    fn test_make_space_compacts_without_allocating() {
        let mut buffer = Buffer::new();
        buffer.write(&[1u8; 60]);
        buffer.retrieve(50);
        assert_eq!(buffer.writable(), 4);

        // 4 writable + 50 prependable >= 20
        buffer.make_space(20);

        assert!(!buffer.is_dynamic());
        assert_eq!(buffer.capacity(), DYNAMIC_THRESHOLD);
        assert_eq!(buffer.prependable(), 0);
        assert_eq!(buffer.readable_slice(), &[1u8; 10][..]);
        assert!(buffer.writable() >= 20);
        assert_cursors(&buffer);
    }

    #[test]
    fn test_make_space_compacts_dynamic_in_place() {
        let mut buffer = Buffer::new();
        buffer.write(&[2u8; 200]);
        let capacity = buffer.capacity();
        buffer.retrieve(150);

        buffer.make_space(100);

        assert_eq!(buffer.capacity(), capacity);
        assert_eq!(buffer.readable_slice(), &[2u8; 50][..]);
        assert!(buffer.writable() >= 100);
    }

    #[test]
    fn test_make_space_grows() {
        let mut buffer = Buffer::from_slice(b"keep me");
        buffer.retrieve(5);

        buffer.make_space(500);

        assert!(buffer.is_dynamic());
        assert!(buffer.writable() >= 500);
        assert_eq!(buffer.readable_slice(), b"me");
        assert_cursors(&buffer);
    }

    #[test]
    fn test_reserve_small_is_noop() {
        let mut buffer = Buffer::new();
        buffer.reserve(DYNAMIC_THRESHOLD);
        assert!(!buffer.is_dynamic());
    }

    #[test]
    fn test_reserve_large_promotes_without_changing_cursors() {
        let mut buffer = Buffer::from_slice(b"abc");
        buffer.reserve(4096);

        assert!(buffer.is_dynamic());
        assert_eq!(buffer.readable_slice(), b"abc");
        assert_eq!(buffer.capacity(), 3);
    }

    #[test]
    fn test_clear_keeps_dynamic() {
        let mut buffer = Buffer::from_slice(&[9u8; 100]);
        assert!(buffer.is_dynamic());

        buffer.clear();
        assert!(buffer.is_dynamic());
        assert_eq!(buffer.readable(), 0);
        assert_cursors(&buffer);

        buffer.write(b"again");
        assert!(buffer.is_dynamic());
        assert_eq!(buffer.readable_slice(), b"again");
    }

    #[test]
    fn test_full_retrieve_keeps_dynamic() {
        let mut buffer = Buffer::from_slice(&[9u8; 100]);
        buffer.retrieve(100);
        assert!(buffer.is_dynamic());
    }

    #[test]
    fn test_has_written_after_external_fill() {
        let mut buffer = Buffer::new();
        buffer.writable_slice_mut()[..3].copy_from_slice(b"abc");
        buffer.has_written(3);
        assert_eq!(buffer.readable_slice(), b"abc");
    }

    #[test]
    #[should_panic(expected = "exceeds writable")]
    fn test_has_written_past_writable_panics() {
        let mut buffer = Buffer::new();
        buffer.has_written(DYNAMIC_THRESHOLD + 1);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut a = Buffer::from_slice(&[1u8; 100]);
        let mut b = a.clone();

        b.retrieve(10);
        b.write(b"tail");
        a.write(b"other");

        assert_eq!(&a.readable_slice()[..100], &[1u8; 100][..]);
        assert_eq!(&a.readable_slice()[100..], b"other");
        assert_eq!(&b.readable_slice()[90..], b"tail");
    }

    #[test]
    fn test_transfer_leaves_empty_inline_source() {
        let mut a = Buffer::from_slice(&[5u8; 100]);
        let b = a.transfer();

        assert_eq!(b.readable(), 100);
        assert!(b.is_dynamic());

        assert_eq!(a.readable(), 0);
        assert!(!a.is_dynamic());
        assert!(a.writable() >= DYNAMIC_THRESHOLD);
    }

    #[test]
    fn test_swap_exchanges_everything() {
        let mut a = Buffer::from_slice(b"inline");
        let mut b = Buffer::from_slice(&[3u8; 80]);

        a.swap(&mut b);

        assert!(a.is_dynamic());
        assert_eq!(a.readable(), 80);
        assert!(!b.is_dynamic());
        assert_eq!(b.readable_slice(), b"inline");
    }

    #[test]
    fn test_fixed_width_writes_are_little_endian() {
        let mut buffer = Buffer::new();
        buffer.write_u8(0x01);
        buffer.write_u16(0x0302);
        buffer.write_u32(0x0706_0504);
        buffer.write_u64(0x0F0E_0D0C_0B0A_0908);

        let expected: Vec<u8> = (1..=15).collect();
        assert_eq!(buffer.readable_slice(), expected.as_slice());
    }

    #[test]
    fn test_io_traits() {
        let mut buffer = Buffer::new();
        buffer.write_all(b"stream bytes").unwrap();

        let mut out = [0u8; 6];
        assert_eq!(Read::read(&mut buffer, &mut out).unwrap(), 6);
        assert_eq!(&out, b"stream");
        assert_eq!(buffer.readable_slice(), b" bytes");
    }

    #[test]
    fn test_buf_impl() {
        use bytes::Buf;

        let mut buffer = Buffer::new();
        buffer.write_u32(42);
        buffer.write(b"!");

        assert_eq!(buffer.remaining(), 5);
        assert_eq!(buffer.get_u32_le(), 42);
        assert_eq!(buffer.get_u8(), b'!');
        assert!(!buffer.has_remaining());
    }

    #[test]
    fn test_equality_ignores_cursor_offset() {
        let mut a = Buffer::from_slice(b"..data");
        a.retrieve(2);
        let b = Buffer::from_slice(b"data");
        assert_eq!(a, b);
    }

    #[test]
    fn test_custom_threshold() {
        let mut buffer: StagingBuffer<8> = StagingBuffer::new();
        buffer.write(&[0u8; 8]);
        assert!(!buffer.is_dynamic());
        buffer.write(&[0u8; 1]);
        assert!(buffer.is_dynamic());
    }
}
