//! Transports that carry protocol lines to and from a server.
//!
//! A [`Dialer`] establishes a [`Conn`]; a `Conn` reads one [`Message`] at a
//! time, sends one line at a time and can be closed from any task to unblock
//! a pending read. Two variants exist, selected by URL scheme in
//! [`ServerDialer::from_url`]:
//!
//! - `ircs://host[:port]`: raw TLS socket, framed by [`LineBuffer`](crate::line::LineBuffer)
//! - `ws://` / `wss://`: websocket text frames, still run through the line buffer
//!   because one frame may hold several lines
//!
//! Plain `irc://` is rejected.

mod sanitize;
mod tls;
mod websocket;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_rustls::rustls::{self, ClientConfig, RootCertStore};
use url::Url;

use crate::error::{Error, Result};
use crate::Message;

pub use self::sanitize::{sanitize, LINE_TERMINATOR};
pub use self::tls::{StreamConn, TlsConn, TlsDialer};
pub use self::websocket::{WebSocketConn, WebSocketDialer};

/// Upper bound for TCP connect plus TLS or websocket handshake.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum silence tolerated on a working link.
///
/// The server pings roughly every four to five minutes, so six minutes
/// without any traffic means the peer is gone.
pub const IO_DEADLINE: Duration = Duration::from_secs(6 * 60);

/// Size of a single socket read.
pub const READ_CHUNK_SIZE: usize = 4096;

/// Port used for `ircs://` URLs that do not name one.
pub const DEFAULT_TLS_PORT: u16 = 6697;

/// Something that accepts outgoing protocol lines.
pub trait Sender: Send + Sync {
    /// Send one line. The line is sanitized and terminated by the implementation.
    fn send(&self, line: &str) -> impl Future<Output = Result<()>> + Send;
}

/// An established connection to a server.
///
/// All methods take `&self`: one task reads while others send, and any task
/// may call [`close`](Conn::close) to make a pending `read` return.
pub trait Conn: Sender + 'static {
    /// Wait for the next complete line.
    fn read(&self) -> impl Future<Output = Result<Message>> + Send;

    /// Close the connection. Pending and later reads and sends fail with
    /// [`Error::Closed`]. Calling it more than once is harmless.
    fn close(&self) -> impl Future<Output = ()> + Send;
}

/// A preconfigured connector.
pub trait Dialer: Send + Sync + 'static {
    /// The connection type produced.
    type Conn: Conn;

    /// Connect and complete the transport-level handshake.
    fn dial(&self) -> impl Future<Output = Result<Self::Conn>> + Send;
}

/// Dialer chosen by URL scheme.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum ServerDialer {
    /// Raw TLS socket (`ircs`).
    Tls(TlsDialer),
    /// Websocket (`ws` or `wss`).
    WebSocket(WebSocketDialer),
}

impl ServerDialer {
    /// Select a transport for `addr`.
    ///
    /// ```
    /// use tmi_ircon::transport::ServerDialer;
    ///
    /// assert!(matches!(
    ///     ServerDialer::from_url("ircs://irc.chat.twitch.tv").unwrap(),
    ///     ServerDialer::Tls(_)
    /// ));
    /// assert!(ServerDialer::from_url("irc://irc.chat.twitch.tv").is_err());
    /// ```
    pub fn from_url(addr: &str) -> Result<Self> {
        let url = Url::parse(addr)?;
        match url.scheme() {
            "ws" | "wss" => Ok(Self::WebSocket(WebSocketDialer::from_url(&url)?)),
            "ircs" => Ok(Self::Tls(TlsDialer::from_url(&url)?)),
            "irc" => Err(Error::Unencrypted(addr.to_owned())),
            other => Err(Error::UnsupportedScheme(other.to_owned())),
        }
    }

    /// Use caller-supplied TLS settings instead of the built-in root store.
    pub fn with_tls_config(self, config: Arc<ClientConfig>) -> Self {
        match self {
            Self::Tls(d) => Self::Tls(d.with_config(config)),
            Self::WebSocket(d) => Self::WebSocket(d.with_config(config)),
        }
    }
}

impl Default for ServerDialer {
    fn default() -> Self {
        Self::WebSocket(WebSocketDialer::default())
    }
}

impl Dialer for ServerDialer {
    type Conn = Transport;

    async fn dial(&self) -> Result<Transport> {
        match self {
            Self::Tls(d) => d.dial().await.map(Transport::Tls),
            Self::WebSocket(d) => d.dial().await.map(Transport::WebSocket),
        }
    }
}

/// Connection produced by [`ServerDialer`].
#[allow(clippy::large_enum_variant)]
#[non_exhaustive]
pub enum Transport {
    /// Raw TLS socket.
    Tls(TlsConn),
    /// Websocket.
    WebSocket(WebSocketConn),
}

impl Transport {
    pub fn is_tls(&self) -> bool {
        matches!(self, Self::Tls(_))
    }

    pub fn is_websocket(&self) -> bool {
        matches!(self, Self::WebSocket(_))
    }
}

impl Sender for Transport {
    async fn send(&self, line: &str) -> Result<()> {
        match self {
            Self::Tls(c) => c.send(line).await,
            Self::WebSocket(c) => c.send(line).await,
        }
    }
}

impl Conn for Transport {
    async fn read(&self) -> Result<Message> {
        match self {
            Self::Tls(c) => c.read().await,
            Self::WebSocket(c) => c.read().await,
        }
    }

    async fn close(&self) {
        match self {
            Self::Tls(c) => c.close().await,
            Self::WebSocket(c) => c.close().await,
        }
    }
}

/// Client TLS settings trusting the webpki root store.
pub fn default_tls_config() -> Result<Arc<ClientConfig>> {
    let roots = RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let config = ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()?
    .with_root_certificates(roots)
    .with_no_client_auth();
    Ok(Arc::new(config))
}

/// Host part of `url` as a bare name or IP literal, without IPv6 brackets.
fn url_host(url: &Url) -> Result<String> {
    match url.host() {
        Some(url::Host::Domain(d)) if !d.is_empty() => Ok(d.to_owned()),
        Some(url::Host::Ipv4(ip)) => Ok(ip.to_string()),
        Some(url::Host::Ipv6(ip)) => Ok(ip.to_string()),
        _ => Err(Error::MissingHost(url.as_str().to_owned())),
    }
}
