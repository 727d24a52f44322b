use std::io;
use std::net::AddrParseError;

use thiserror::Error;

use crate::protocol::FrameError;

/// Errors surfaced by the server and client.
#[derive(Debug, Error)]
pub enum NetError {
    #[error("invalid address `{addr}`: {source}")]
    InvalidAddress {
        addr: String,
        #[source]
        source: AddrParseError,
    },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Frame(#[from] FrameError),
}
