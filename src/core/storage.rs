//! Storage backing untuk staging buffer
//!
//! Dua mode:
//! - Inline: array fixed-size di dalam value buffer itu sendiri (tanpa alokasi)
//! - Dynamic: `Vec<u8>` milik eksklusif buffer, bisa tumbuh
//!
//! Transisi hanya satu arah (Inline -> Dynamic), diatur oleh `StagingBuffer`.

/// Active storage region of a staging buffer.
///
/// Capacity of the dynamic variant is the vector's *length*, not its
/// allocation; cursor math never looks past `len()`.
#[derive(Clone)]
pub(crate) enum Storage<const N: usize> {
    Inline([u8; N]),
    Dynamic(Vec<u8>),
}

impl<const N: usize> Storage<N> {
    /// Empty inline region
    pub(crate) const fn inline() -> Self {
        Self::Inline([0u8; N])
    }

    #[inline(always)]
    pub(crate) fn is_dynamic(&self) -> bool {
        matches!(self, Self::Dynamic(_))
    }

    #[inline(always)]
    pub(crate) fn capacity(&self) -> usize {
        match self {
            Self::Inline(_) => N,
            Self::Dynamic(data) => data.len(),
        }
    }

    #[inline(always)]
    pub(crate) fn as_slice(&self) -> &[u8] {
        match self {
            Self::Inline(data) => data.as_slice(),
            Self::Dynamic(data) => data.as_slice(),
        }
    }

    #[inline(always)]
    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        match self {
            Self::Inline(data) => data.as_mut_slice(),
            Self::Dynamic(data) => data.as_mut_slice(),
        }
    }
}
