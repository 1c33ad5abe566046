//! Error types for the connection manager and its transports.
//!
//! Every failure a session can observe is folded into [`Error`]. The type is
//! cheap to clone: a single failure is often both returned to a caller of
//! `send` and delivered to [`Handler::disconnected`](crate::Handler::disconnected).

use std::io;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio_rustls::rustls;
use tokio_tungstenite::tungstenite;

/// Convenience type alias for Results using [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised while configuring, dialing, or talking to an IRC server.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum Error {
    /// The server address could not be parsed as a URL.
    #[error("invalid server url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The URL scheme does not name a supported transport.
    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),

    /// A plaintext transport was requested.
    #[error("unencrypted transport is not supported: {0}")]
    Unencrypted(String),

    /// The URL has no host to connect to.
    #[error("server url has no host: {0}")]
    MissingHost(String),

    /// The reconnect backoff has a zero lower bound.
    #[error("min_delay must be greater than zero")]
    ZeroMinDelay,

    /// The host is not usable as a TLS server name.
    #[error("invalid tls server name: {0}")]
    InvalidServerName(String),

    /// Establishing the connection took longer than the connect timeout.
    #[error("connect timed out after {0:?}")]
    ConnectTimeout(Duration),

    /// No traffic within the I/O deadline.
    #[error("no traffic for {0:?}")]
    Timeout(Duration),

    /// I/O error on the underlying socket.
    #[error("io error: {0}")]
    Io(#[source] Arc<io::Error>),

    /// TLS configuration error.
    #[error("tls error: {0}")]
    Tls(#[source] Arc<rustls::Error>),

    /// Websocket protocol or handshake error.
    #[error("websocket error: {0}")]
    WebSocket(#[source] Arc<tungstenite::Error>),

    /// The peer sent more than the line limit without a terminator.
    #[error("line exceeds {0} bytes")]
    LineTooLong(usize),

    /// The peer closed the connection.
    #[error("connection closed by peer")]
    ConnectionClosed,

    /// The connection was closed locally.
    #[error("connection closed")]
    Closed,

    /// `send` was called while no session was active.
    #[error("not connected")]
    NotConnected,

    /// The manager was cancelled.
    #[error("cancelled")]
    Cancelled,

    /// Reading from an active session failed.
    #[error("read failed: {0}")]
    Read(#[source] Box<Error>),

    /// Writing to an active session failed.
    #[error("send failed: {0}")]
    Send(#[source] Box<Error>),

    /// The login sequence could not be sent.
    #[error("handshake failed: {0}")]
    Handshake(#[source] Box<Error>),
}

impl Error {
    /// Returns true for errors caused by configuration rather than the network.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Error::InvalidUrl(_)
                | Error::UnsupportedScheme(_)
                | Error::Unencrypted(_)
                | Error::MissingHost(_)
                | Error::InvalidServerName(_)
                | Error::ZeroMinDelay
        )
    }

    /// Strips `Read`, `Send` and `Handshake` context and returns the root error.
    pub fn root(&self) -> &Error {
        match self {
            Error::Read(e) | Error::Send(e) | Error::Handshake(e) => e.root(),
            e => e,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}

impl From<rustls::Error> for Error {
    fn from(err: rustls::Error) -> Self {
        Self::Tls(Arc::new(err))
    }
}

impl From<tungstenite::Error> for Error {
    fn from(err: tungstenite::Error) -> Self {
        match err {
            tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
                Self::ConnectionClosed
            }
            tungstenite::Error::Io(e) => Self::Io(Arc::new(e)),
            e => Self::WebSocket(Arc::new(e)),
        }
    }
}
