//! Network Layer: socket driver, event loop, dan client
//!
//! Menggunakan mio untuk cross-platform async I/O.
//!
//! Fitur:
//! - Non-blocking I/O dengan epoll/kqueue/IOCP
//! - Socket read/write langsung ke/dari staging buffer
//! - Framing per session lewat `MessageFilter`

mod client;
mod config;
mod connection;
mod error;
mod server;

pub use client::Client;
pub use config::{ServerConfig, DEFAULT_READ_CHUNK};
pub use connection::{set_socket_buffers, Connection};
pub use error::NetError;
pub use server::{Server, SessionHandler};

pub use mio::Token;
