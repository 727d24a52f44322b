//! Server configuration

use crate::protocol::{Framing, DEFAULT_MAX_FRAME_LENGTH};

/// Default bytes requested from the inbound buffer per socket read (16KB)
pub const DEFAULT_READ_CHUNK: usize = 16 * 1024;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub max_connections: usize,
    pub framing: Framing,
    pub max_frame_length: usize,
    /// Growth step of an inbound buffer that ran out of room
    pub read_chunk: usize,
    /// SO_SNDBUF / SO_RCVBUF, 0 keeps the OS default
    pub socket_buffer_size: usize,
    pub verbose: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:7171".to_string(),
            max_connections: 1024,
            framing: Framing::LengthPrefixed,
            max_frame_length: DEFAULT_MAX_FRAME_LENGTH,
            read_chunk: DEFAULT_READ_CHUNK,
            socket_buffer_size: 256 * 1024,
            verbose: false,
        }
    }
}
