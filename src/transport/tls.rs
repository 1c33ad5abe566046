//! Raw TLS socket transport.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::{timeout, timeout_at, Instant};
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::ClientConfig;
use tokio_rustls::TlsConnector;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use super::{
    default_tls_config, sanitize, url_host, Conn, Dialer, Sender, CONNECT_TIMEOUT,
    DEFAULT_TLS_PORT, IO_DEADLINE, READ_CHUNK_SIZE,
};
use crate::error::{Error, Result};
use crate::line::{LineBuffer, MAX_LINE_LEN};
use crate::Message;

/// How long `close` waits for a graceful shutdown of the write side.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection over a TLS socket.
pub type TlsConn = StreamConn<TlsStream<TcpStream>>;

/// Dialer for `ircs://` servers.
#[derive(Clone, Debug)]
pub struct TlsDialer {
    host: String,
    port: u16,
    config: Option<Arc<ClientConfig>>,
}

impl TlsDialer {
    /// Dialer for `host`, using [`DEFAULT_TLS_PORT`] when `port` is `None`.
    pub fn new(host: impl Into<String>, port: Option<u16>) -> Self {
        Self {
            host: host.into(),
            port: port.unwrap_or(DEFAULT_TLS_PORT),
            config: None,
        }
    }

    pub(crate) fn from_url(url: &Url) -> Result<Self> {
        Ok(Self::new(url_host(url)?, url.port()))
    }

    /// Use caller-supplied TLS settings.
    pub fn with_config(mut self, config: Arc<ClientConfig>) -> Self {
        self.config = Some(config);
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    async fn connect(&self) -> Result<TlsConn> {
        let config = match &self.config {
            Some(config) => config.clone(),
            None => default_tls_config()?,
        };
        let server_name = ServerName::try_from(self.host.clone())
            .map_err(|_| Error::InvalidServerName(self.host.clone()))?;

        debug!("connecting to {}:{}", self.host, self.port);
        let tcp = TcpStream::connect((self.host.as_str(), self.port)).await?;
        if let Err(e) = enable_keepalive(&tcp) {
            warn!("failed to enable TCP keepalive: {}", e);
        }

        let stream = TlsConnector::from(config).connect(server_name, tcp).await?;
        debug!("tls handshake with {} complete", self.host);
        Ok(StreamConn::new(stream))
    }
}

impl Dialer for TlsDialer {
    type Conn = TlsConn;

    async fn dial(&self) -> Result<TlsConn> {
        timeout(CONNECT_TIMEOUT, self.connect())
            .await
            .map_err(|_| Error::ConnectTimeout(CONNECT_TIMEOUT))?
    }
}

fn enable_keepalive(stream: &TcpStream) -> std::io::Result<()> {
    use socket2::{SockRef, TcpKeepalive};

    let sock = SockRef::from(stream);
    let keepalive = TcpKeepalive::new()
        .with_time(Duration::from_secs(120))
        .with_interval(Duration::from_secs(30));

    sock.set_tcp_keepalive(&keepalive)
}

struct Reader<S> {
    half: ReadHalf<S>,
    lines: LineBuffer,
    chunk: Box<[u8]>,
}

/// Line-oriented connection over any byte stream.
///
/// Bytes are read in [`READ_CHUNK_SIZE`] chunks and framed by a
/// [`LineBuffer`]. Every call to `read` or `send` is bounded by
/// [`IO_DEADLINE`].
pub struct StreamConn<S> {
    reader: Mutex<Reader<S>>,
    writer: Mutex<WriteHalf<S>>,
    closed: CancellationToken,
}

impl<S: AsyncRead + AsyncWrite> StreamConn<S> {
    /// Wrap an established stream.
    pub fn new(stream: S) -> Self {
        Self::with_max_line_len(stream, MAX_LINE_LEN)
    }

    /// Wrap an established stream with a custom line limit.
    pub fn with_max_line_len(stream: S, max_line_len: usize) -> Self {
        let (half, writer) = tokio::io::split(stream);
        Self {
            reader: Mutex::new(Reader {
                half,
                lines: LineBuffer::with_max_line_len(max_line_len),
                chunk: vec![0; READ_CHUNK_SIZE].into_boxed_slice(),
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

impl<S> Sender for StreamConn<S>
where
    S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    async fn send(&self, line: &str) -> Result<()> {
        let buf = sanitize(line);
        tokio::select! {
            biased;
            _ = self.closed.cancelled() => Err(Error::Closed),
            r = async {
                let mut writer = self.writer.lock().await;
                timeout(IO_DEADLINE, async {
                    writer.write_all(buf.as_bytes()).await?;
                    writer.flush().await
                })
                .await
                .map_err(|_| Error::Timeout(IO_DEADLINE))?
                .map_err(Error::from)
            } => r,
        }
    }
}

impl<S> Conn for StreamConn<S>
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
            let n = tokio::select! {
                biased;
                _ = self.closed.cancelled() => return Err(Error::Closed),
                r = timeout_at(until, reader.half.read(&mut reader.chunk)) => {
                    r.map_err(|_| Error::Timeout(IO_DEADLINE))??
                }
            };
            if n == 0 {
                return Err(Error::ConnectionClosed);
            }
            reader.lines.feed(&reader.chunk[..n]);
        }
    }

    async fn close(&self) {
        self.closed.cancel();
        if let Ok(mut writer) = self.writer.try_lock() {
            let _ = timeout(SHUTDOWN_TIMEOUT, writer.shutdown()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[tokio::test]
    async fn test_reads_lines_across_chunks() {
        let (client, mut server) = duplex(64);
        let conn = StreamConn::new(client);

        server.write_all(b"PING :tmi.twitch.tv\r\nPRIVMSG #a").await.unwrap();
        let msg = conn.read().await.unwrap();
        assert_eq!(msg.command, "PING");
        assert_eq!(msg.args, vec!["tmi.twitch.tv"]);

        server.write_all(b" :hi\r\n").await.unwrap();
        let msg = conn.read().await.unwrap();
        assert_eq!(msg.args, vec!["#a", "hi"]);
    }

    #[tokio::test]
    async fn test_send_is_sanitized() {
        let (client, mut server) = duplex(64);
        let conn = StreamConn::new(client);

        conn.send("PRIVMSG #c :a\nb").await.unwrap();
        let mut buf = [0; 17];
        server.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"PRIVMSG #c :a b\r\n");
    }

    #[tokio::test]
    async fn test_peer_eof() {
        let (client, server) = duplex(64);
        let conn = StreamConn::new(client);
        drop(server);

        assert!(matches!(conn.read().await, Err(Error::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_close_unblocks_read() {
        let (client, _server) = duplex(64);
        let conn = Arc::new(StreamConn::new(client));

        let reader = tokio::spawn({
            let conn = conn.clone();
            async move { conn.read().await }
        });
        tokio::task::yield_now().await;
        conn.close().await;

        assert!(matches!(reader.await.unwrap(), Err(Error::Closed)));
        assert!(conn.is_closed());
        assert!(matches!(conn.send("PING").await, Err(Error::Closed)));
    }

    #[tokio::test]
    async fn test_unterminated_flood_fails_read() {
        let (client, mut server) = duplex(64);
        let conn = StreamConn::with_max_line_len(client, 32);

        let flood = tokio::spawn(async move { server.write_all(&[b'a'; 256]).await });

        assert!(matches!(conn.read().await, Err(Error::LineTooLong(32))));
        drop(conn);
        let _ = flood.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_peer_times_out() {
        let (client, _server) = duplex(64);
        let conn = StreamConn::new(client);

        assert!(matches!(conn.read().await, Err(Error::Timeout(d)) if d == IO_DEADLINE));
    }

    #[test]
    fn test_dialer_defaults_port() {
        let url = Url::parse("ircs://irc.chat.twitch.tv/").unwrap();
        let dialer = TlsDialer::from_url(&url).unwrap();
        assert_eq!(dialer.host(), "irc.chat.twitch.tv");
        assert_eq!(dialer.port(), 6697);

        let url = Url::parse("ircs://irc.example.net:7000").unwrap();
        assert_eq!(TlsDialer::from_url(&url).unwrap().port(), 7000);
    }

    #[test]
    fn test_dialer_requires_host() {
        let url = Url::parse("ircs:nohost").unwrap();
        assert!(matches!(
            TlsDialer::from_url(&url).unwrap_err(),
            Error::MissingHost(_)
        ));
    }
}
