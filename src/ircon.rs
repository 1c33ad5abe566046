//! Self-healing connection manager.
//!
//! [`IrCon`] dials the configured server, sends the login sequence and
//! dispatches incoming messages to a [`Handler`] until the connection fails.
//! It then waits according to its [`Backoff`] and dials again, forever,
//! until the [`CancellationToken`] passed to [`IrCon::run`] is cancelled.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use tmi_ircon::{Event, IrCon, IrcHandshake};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() -> tmi_ircon::Result<()> {
//! let irc = Arc::new(IrCon::new(IrcHandshake::anonymous()));
//! let (tx, mut events) = tokio::sync::mpsc::unbounded_channel();
//! let cancel = CancellationToken::new();
//! let task = irc.background(cancel.clone(), tx);
//!
//! while let Some(event) = events.recv().await {
//!     if let Event::Connected = event {
//!         irc.send("JOIN #twitch").await?;
//!     }
//! }
//! cancel.cancel();
//! let _ = task.await;
//! # Ok(())
//! # }
//! ```

mod session;

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use self::session::Session;
use crate::backoff::Backoff;
use crate::config::{Config, DEFAULT_MAX_DELAY, DEFAULT_MIN_DELAY};
use crate::error::{Error, Result};
use crate::handler::Handler;
use crate::handshake::{Handshaker, IrcHandshake};
use crate::transport::{Dialer, Sender, ServerDialer};

/// An automatically reconnecting IRC connection.
///
/// `K` is the login strategy and `D` the connector. The defaults select a
/// transport from the server URL and log in with [`IrcHandshake`].
pub struct IrCon<K = IrcHandshake, D: Dialer = ServerDialer> {
    dialer: D,
    handshaker: K,
    min_delay: Duration,
    max_delay: Duration,
    active: Mutex<Option<Arc<Session<D::Conn>>>>,
}

impl IrCon {
    /// Manager for [`DEFAULT_SERVER`](crate::config::DEFAULT_SERVER).
    pub fn new(handshaker: IrcHandshake) -> Self {
        Self::with_dialer(ServerDialer::default(), handshaker)
    }

    /// Manager for `config`. Fails if the server URL is unusable or
    /// `min_delay` is zero.
    pub fn with_config(config: Config, handshaker: IrcHandshake) -> Result<Self> {
        config.validate()?;
        let dialer = ServerDialer::from_url(&config.server)?;
        Ok(Self::with_dialer(dialer, handshaker).backoff(config.min_delay, config.max_delay))
    }
}

impl Default for IrCon {
    fn default() -> Self {
        Self::new(IrcHandshake::anonymous())
    }
}

impl<K: Handshaker, D: Dialer> IrCon<K, D> {
    /// Manager with a custom connector and login strategy.
    pub fn with_dialer(dialer: D, handshaker: K) -> Self {
        Self {
            dialer,
            handshaker,
            min_delay: DEFAULT_MIN_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            active: Mutex::new(None),
        }
    }

    /// Set the reconnect delay bounds.
    ///
    /// Unlike [`IrCon::with_config`] this does not validate: a zero
    /// `min_delay` redials immediately after every failure.
    pub fn backoff(mut self, min_delay: Duration, max_delay: Duration) -> Self {
        self.min_delay = min_delay;
        self.max_delay = max_delay;
        self
    }

    pub fn dialer(&self) -> &D {
        &self.dialer
    }

    /// Returns true while a session is installed.
    pub fn is_connected(&self) -> bool {
        self.current().is_some()
    }

    /// Send a line on the current session.
    ///
    /// Fails with [`Error::NotConnected`] when there is none; the line is
    /// dropped, not queued. A write error ends the session and is returned
    /// wrapped in [`Error::Send`].
    pub async fn send(&self, line: &str) -> Result<()> {
        let session = self.current().ok_or(Error::NotConnected)?;
        session.send(line).await
    }

    /// Keep a connection alive until `cancel` fires.
    ///
    /// The first attempt starts immediately. When cancelled, the active
    /// session is closed and its `disconnected` delivered before this returns.
    pub async fn run<H: Handler>(&self, cancel: CancellationToken, handler: H) {
        let handler: Arc<dyn Handler> = Arc::new(handler);
        let mut backoff = Backoff::new(self.min_delay, self.max_delay);
        let mut delay = Duration::ZERO;
        loop {
            self.set_active(None);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }

            backoff.attempt();
            self.session(&cancel, &handler).await;
            delay = backoff.next_delay();
            debug!("next connection attempt in {:?}", delay);
        }
        debug!("connection manager stopped");
    }

    /// Spawn [`run`](Self::run) on the tokio runtime.
    pub fn background<H: Handler>(
        self: &Arc<Self>,
        cancel: CancellationToken,
        handler: H,
    ) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move { this.run(cancel, handler).await })
    }

    async fn session(&self, cancel: &CancellationToken, handler: &Arc<dyn Handler>) {
        debug!("dialing");
        let conn = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                handler.disconnected(Error::Cancelled);
                return;
            }
            r = self.dialer.dial() => match r {
                Ok(conn) => conn,
                Err(e) => {
                    debug!("dial failed: {}", e);
                    handler.disconnected(e);
                    return;
                }
            },
        };

        let session = Arc::new(Session::new(conn, Arc::clone(handler)));
        self.set_active(Some(Arc::clone(&session)));
        let mut reader = tokio::spawn(Arc::clone(&session).read_loop());

        let handshake = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            r = self.handshaker.handshake(session.conn()) => {
                r.map_err(|e| Error::Handshake(Box::new(e)))
            }
        };
        match handshake {
            Ok(()) => {
                debug!("handshake sent");
                session.connected();
            }
            Err(e) => session.close_with_err(e).await,
        }

        let finished = tokio::select! {
            biased;
            r = &mut reader => Some(r),
            _ = cancel.cancelled() => None,
        };
        let result = match finished {
            Some(r) => r,
            None => {
                session.close_with_err(Error::Cancelled).await;
                reader.await
            }
        };
        if let Err(e) = result {
            warn!("session task failed: {}", e);
        }
        self.set_active(None);
    }

    fn current(&self) -> Option<Arc<Session<D::Conn>>> {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_active(&self, session: Option<Arc<Session<D::Conn>>>) {
        *self.active.lock().unwrap_or_else(PoisonError::into_inner) = session;
    }
}

impl<K: Handshaker, D: Dialer> Sender for IrCon<K, D> {
    async fn send(&self, line: &str) -> Result<()> {
        IrCon::send(self, line).await
    }
}
