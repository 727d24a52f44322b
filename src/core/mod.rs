//! Core module: inline-first staging buffer
//!
//! Prinsip desain:
//! - No-Allocation untuk pesan kecil: storage inline di dalam value
//! - Compaction sebelum growth: ruang yang sudah dibaca dipakai ulang dulu
//! - Leaf component: tidak ada logging, config, atau I/O di sini

mod buffer;
mod storage;

pub use buffer::{Buffer, StagingBuffer, DYNAMIC_THRESHOLD};
