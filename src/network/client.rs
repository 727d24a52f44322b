//! Blocking client
//!
//! Dipakai oleh `eddy_client` dan integration test. Satu request, satu
//! response, tanpa event loop.

use std::collections::VecDeque;
use std::io;
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use super::connection::Connection;
use super::error::NetError;
use crate::protocol::{Framing, MessageFilter};

/// Blocking framed client over std `TcpStream`.
pub struct Client {
    connection: Connection<TcpStream>,
    filter: Box<dyn MessageFilter>,
    pending: VecDeque<Vec<u8>>,
}

impl Client {
    pub fn connect(addr: &str, framing: Framing, max_frame_length: usize) -> Result<Self, NetError> {
        let addr: SocketAddr = addr.parse().map_err(|source| NetError::InvalidAddress {
            addr: addr.to_string(),
            source,
        })?;
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;

        Ok(Self {
            connection: Connection::new(stream),
            filter: framing.build(max_frame_length),
            pending: VecDeque::new(),
        })
    }

    /// `None` blocks forever (default).
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.connection.stream().set_read_timeout(timeout)
    }

    /// Frame and send one message.
    pub fn send(&mut self, message: &[u8]) -> Result<(), NetError> {
        self.connection
            .queue_message(self.filter.as_mut(), message)?;
        self.connection.flush_write_buffer()?;
        Ok(())
    }

    /// Block until one message is decoded.
    pub fn recv(&mut self) -> Result<Vec<u8>, NetError> {
        loop {
            if let Some(message) = self.pending.pop_front() {
                return Ok(message);
            }

            // Blocking socket: 0 berarti read timeout habis
            if self.connection.fill_read_buffer()? == 0 {
                return Err(io::Error::new(io::ErrorKind::TimedOut, "read timed out").into());
            }

            let mut messages = Vec::new();
            self.connection
                .decode(self.filter.as_mut(), &mut messages)?;
            self.pending.extend(messages);
        }
    }

    /// Send then wait for the reply.
    pub fn request(&mut self, message: &[u8]) -> Result<Vec<u8>, NetError> {
        self.send(message)?;
        self.recv()
    }
}
