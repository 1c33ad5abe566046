//! Websocket transport.
//!
//! Inbound text and binary frames are fed into a [`LineBuffer`]; each
//! outbound line is written as one text frame.

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::{timeout, timeout_at, Instant};
use tokio_rustls::rustls::ClientConfig;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async_tls_with_config, Connector, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use url::Url;

use super::{default_tls_config, sanitize, url_host, Conn, Dialer, Sender, CONNECT_TIMEOUT, IO_DEADLINE};
use crate::config::DEFAULT_WEB_CHAT;
use crate::error::{Error, Result};
use crate::line::LineBuffer;
use crate::Message;

const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Dialer for `ws://` and `wss://` servers.
#[derive(Clone, Debug)]
pub struct WebSocketDialer {
    addr: String,
    config: Option<Arc<ClientConfig>>,
}

impl WebSocketDialer {
    /// Dialer for a `ws` or `wss` URL.
    pub fn new(addr: &str) -> Result<Self> {
        Self::from_url(&Url::parse(addr)?)
    }

    pub(crate) fn from_url(url: &Url) -> Result<Self> {
        match url.scheme() {
            "ws" | "wss" => {}
            other => return Err(Error::UnsupportedScheme(other.to_owned())),
        }
        url_host(url)?;
        Ok(Self {
            addr: url.as_str().to_owned(),
            config: None,
        })
    }

    /// Use caller-supplied TLS settings for `wss`.
    pub fn with_config(mut self, config: Arc<ClientConfig>) -> Self {
        self.config = Some(config);
        self
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    async fn connect(&self) -> Result<WebSocketConn> {
        let config = match &self.config {
            Some(config) => config.clone(),
            None => default_tls_config()?,
        };

        debug!("connecting to {}", self.addr);
        let (stream, _response) = connect_async_tls_with_config(
            self.addr.as_str(),
            None,
            true,
            Some(Connector::Rustls(config)),
        )
        .await?;
        debug!("websocket handshake with {} complete", self.addr);
        Ok(WebSocketConn::new(stream))
    }
}

impl Default for WebSocketDialer {
    fn default() -> Self {
        Self {
            addr: DEFAULT_WEB_CHAT.to_owned(),
            config: None,
        }
    }
}

impl Dialer for WebSocketDialer {
    type Conn = WebSocketConn;

    async fn dial(&self) -> Result<WebSocketConn> {
        timeout(CONNECT_TIMEOUT, self.connect())
            .await
            .map_err(|_| Error::ConnectTimeout(CONNECT_TIMEOUT))?
    }
}

struct Reader<S> {
    frames: SplitStream<WebSocketStream<S>>,
    lines: LineBuffer,
}

/// Connection over a websocket.
pub struct WebSocketConn<S = MaybeTlsStream<TcpStream>> {
    reader: Mutex<Reader<S>>,
    writer: Mutex<SplitSink<WebSocketStream<S>, WsMessage>>,
    closed: CancellationToken,
}

impl<S: AsyncRead + AsyncWrite + Unpin> WebSocketConn<S> {
    /// Wrap an established websocket.
    pub fn new(stream: WebSocketStream<S>) -> Self {
        let (writer, frames) = stream.split();
        Self {
            reader: Mutex::new(Reader {
                frames,
                lines: LineBuffer::new(),
            }),
            writer: Mutex::new(writer),
            closed: CancellationToken::new(),
        }
    }

    /// Returns true once [`close`](Conn::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }
}

impl<S> Sender for WebSocketConn<S>
where
    S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    async fn send(&self, line: &str) -> Result<()> {
        let frame = WsMessage::Text(sanitize(line));
        tokio::select! {
            biased;
            _ = self.closed.cancelled() => Err(Error::Closed),
            r = async {
                let mut writer = self.writer.lock().await;
                timeout(IO_DEADLINE, writer.send(frame))
                    .await
                    .map_err(|_| Error::Timeout(IO_DEADLINE))?
                    .map_err(Error::from)
            } => r,
        }
    }
}

impl<S> Conn for WebSocketConn<S>
where
    S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    async fn read(&self) -> Result<Message> {
        let mut reader = self.reader.lock().await;
        let reader = &mut *reader;
        let mut deadline = None;
        loop {
            if let Some(msg) = reader.lines.try_read() {
                return Ok(msg);
            }
            if reader.lines.is_overlong() {
                return Err(Error::LineTooLong(reader.lines.max_line_len()));
            }

            let until = *deadline.get_or_insert_with(|| Instant::now() + IO_DEADLINE);
            let frame = tokio::select! {
                biased;
                _ = self.closed.cancelled() => return Err(Error::Closed),
                r = timeout_at(until, reader.frames.next()) => {
                    match r.map_err(|_| Error::Timeout(IO_DEADLINE))? {
                        Some(frame) => frame?,
                        None => return Err(Error::ConnectionClosed),
                    }
                }
            };

            match frame {
                WsMessage::Text(text) => reader.lines.feed(text.as_bytes()),
                WsMessage::Binary(data) => reader.lines.feed(&data),
                WsMessage::Close(frame) => {
                    debug!("websocket closed by peer: {:?}", frame);
                    return Err(Error::ConnectionClosed);
                }
                WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_) => {
                    trace!("ignoring websocket control frame");
                }
            }
        }
    }

    async fn close(&self) {
        self.closed.cancel();
        if let Ok(mut writer) = self.writer.try_lock() {
            let _ = timeout(CLOSE_TIMEOUT, writer.close()).await;
        }
    }
}
