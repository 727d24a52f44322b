//! Eddy - TCP server/client framework
//!
//! Arsitektur:
//! - Core: inline-first staging buffer (sliding window, compaction sebelum growth)
//! - Protocol: length-prefixed dan null-terminated framing di atas buffer
//! - Network: mio event loop, satu inbound + satu outbound buffer per session

pub mod core;
pub mod network;
pub mod protocol;

pub use crate::core::{Buffer, StagingBuffer, DYNAMIC_THRESHOLD};
pub use crate::protocol::FrameError;
