//! Eddy Server dengan event-driven I/O
//!
//! Menggunakan mio untuk non-blocking I/O multiplexing.
//! Satu session = satu `Connection` (inbound + outbound buffer) + satu
//! `MessageFilter`. Session id adalah mio `Token` yang naik terus.

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use mio::net::{TcpListener, TcpStream};
use mio::{Events, Interest, Poll, Token};
use tracing::{debug, info, warn};

use super::config::ServerConfig;
use super::connection::{set_socket_buffers, Connection};
use super::error::NetError;
use crate::protocol::MessageFilter;

const SERVER_TOKEN: Token = Token(0);
const EVENTS_CAPACITY: usize = 1024;
const RUN_POLL_TIMEOUT: Duration = Duration::from_millis(10);

/// Callbacks for session lifecycle and decoded messages.
pub trait SessionHandler {
    fn on_connected(&mut self, _token: Token, _peer: SocketAddr) {}

    /// Handle one decoded frame. A returned reply is framed and queued on
    /// the same session.
    fn on_message(&mut self, token: Token, message: Vec<u8>) -> Option<Vec<u8>>;

    fn on_disconnected(&mut self, _token: Token) {}
}

struct Session {
    connection: Connection<TcpStream>,
    filter: Box<dyn MessageFilter>,
    peer: SocketAddr,
    messages_received: u64,
    messages_sent: u64,
}

/// Eddy Server
///
/// Event-driven server dengan:
/// - Non-blocking I/O (epoll/kqueue/IOCP)
/// - Staging buffer per session, inline untuk pesan kecil
/// - Framing yang bisa dipilih lewat `ServerConfig`
pub struct Server<H> {
    poll: Poll,
    events: Events,
    listener: TcpListener,
    sessions: HashMap<Token, Session>,
    next_token: usize,
    config: ServerConfig,
    handler: H,
    shutdown: Arc<AtomicBool>,
}

impl<H: SessionHandler> Server<H> {
    /// Bind listener dan register ke poll
    pub fn bind(config: ServerConfig, handler: H) -> Result<Self, NetError> {
        let addr: SocketAddr = config
            .bind_addr
            .parse()
            .map_err(|source| NetError::InvalidAddress {
                addr: config.bind_addr.clone(),
                source,
            })?;

        let poll = Poll::new()?;
        let mut listener = TcpListener::bind(addr)?;
        poll.registry()
            .register(&mut listener, SERVER_TOKEN, Interest::READABLE)?;

        info!(
            addr = %listener.local_addr()?,
            framing = config.framing.name(),
            "server listening"
        );

        Ok(Self {
            poll,
            events: Events::with_capacity(EVENTS_CAPACITY),
            listener,
            sessions: HashMap::with_capacity(config.max_connections.min(EVENTS_CAPACITY)),
            next_token: 1,
            config,
            handler,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Flag that stops [`run`](Self::run) after the current poll.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Run event loop sampai shutdown flag di-set
    pub fn run(&mut self) -> io::Result<()> {
        while !self.shutdown.load(Ordering::Acquire) {
            self.poll_once(Some(RUN_POLL_TIMEOUT))?;
        }
        info!(sessions = self.sessions.len(), "server shutting down");
        Ok(())
    }

    /// One poll round. Returns number of events handled.
    pub fn poll_once(&mut self, timeout: Option<Duration>) -> io::Result<usize> {
        match self.poll.poll(&mut self.events, timeout) {
            Ok(()) => {}
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => return Ok(0),
            Err(e) => return Err(e),
        }

        let ready: Vec<(Token, bool, bool)> = self
            .events
            .iter()
            .map(|event| {
                (
                    event.token(),
                    event.is_readable() || event.is_read_closed(),
                    event.is_writable(),
                )
            })
            .collect();

        for &(token, readable, writable) in &ready {
            if token == SERVER_TOKEN {
                self.accept_connections()?;
                continue;
            }
            if readable {
                self.handle_read(token);
            }
            if writable {
                self.handle_write(token);
            }
        }

        Ok(ready.len())
    }

    /// Accept new connections
    fn accept_connections(&mut self) -> io::Result<()> {
        loop {
            match self.listener.accept() {
                Ok((mut stream, peer)) => {
                    if self.sessions.len() >= self.config.max_connections {
                        warn!(%peer, "max connections reached, rejecting");
                        continue;
                    }

                    if let Err(e) = stream.set_nodelay(true) {
                        debug!(%peer, error = %e, "TCP_NODELAY not applied");
                    }
                    set_socket_buffers(&stream, self.config.socket_buffer_size);

                    let token = Token(self.next_token);
                    self.next_token += 1;

                    self.poll.registry().register(
                        &mut stream,
                        token,
                        Interest::READABLE | Interest::WRITABLE,
                    )?;

                    let session = Session {
                        connection: Connection::with_read_chunk(stream, self.config.read_chunk),
                        filter: self.config.framing.build(self.config.max_frame_length),
                        peer,
                        messages_received: 0,
                        messages_sent: 0,
                    };
                    self.sessions.insert(token, session);
                    self.handler.on_connected(token, peer);
                    info!(session = token.0, %peer, "session connected");
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    warn!(error = %e, "accept error");
                    break;
                }
            }
        }
        Ok(())
    }

    /// Handle readable event
    fn handle_read(&mut self, token: Token) {
        let Some(session) = self.sessions.get_mut(&token) else {
            return;
        };

        // Edge-triggered: baca sampai WouldBlock, decode setiap kali fill
        let mut closed = false;
        let mut messages = Vec::new();
        match session
            .connection
            .receive(session.filter.as_mut(), &mut messages)
        {
            Ok(n) => {
                if self.config.verbose && n > 0 {
                    debug!(session = token.0, bytes = n, "read");
                }
            }
            Err(NetError::Io(ref e)) if e.kind() == io::ErrorKind::ConnectionReset => {
                closed = true;
            }
            Err(NetError::Frame(e)) => {
                warn!(session = token.0, peer = %session.peer, error = %e, "invalid frame, closing session");
                closed = true;
            }
            Err(e) => {
                warn!(session = token.0, error = %e, "read error");
                closed = true;
            }
        }

        // Frame yang lengkap sebelum error tetap di-dispatch
        for message in messages {
            session.messages_received += 1;
            if let Some(reply) = self.handler.on_message(token, message) {
                match session
                    .connection
                    .queue_message(session.filter.as_mut(), &reply)
                {
                    Ok(()) => session.messages_sent += 1,
                    Err(e) => warn!(session = token.0, error = %e, "reply dropped"),
                }
            }
        }

        if let Err(e) = session.connection.flush_write_buffer() {
            warn!(session = token.0, error = %e, "write error");
            closed = true;
        }

        if closed {
            self.close_session(token);
        }
    }

    /// Handle writable event
    fn handle_write(&mut self, token: Token) {
        let Some(session) = self.sessions.get_mut(&token) else {
            return;
        };
        if let Err(e) = session.connection.flush_write_buffer() {
            warn!(session = token.0, error = %e, "write error");
            self.close_session(token);
        }
    }

    fn close_session(&mut self, token: Token) {
        if let Some(mut session) = self.sessions.remove(&token) {
            if let Err(e) = self
                .poll
                .registry()
                .deregister(session.connection.stream_mut())
            {
                debug!(session = token.0, error = %e, "deregister failed");
            }
            self.handler.on_disconnected(token);
            info!(
                session = token.0,
                peer = %session.peer,
                recv = session.messages_received,
                sent = session.messages_sent,
                "session disconnected"
            );
        }
    }
}
