//! One dial-to-disconnect cycle.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::handler::Handler;
use crate::transport::Conn;
use crate::Message;

/// An established connection plus the state shared by its read task and
/// every concurrent `send`.
pub(crate) struct Session<C> {
    conn: C,
    handler: Arc<dyn Handler>,
    /// First failure observed on this session. Later ones are dropped.
    failure: Mutex<Option<Error>>,
    /// Dispatch gate: false once `disconnected` has been delivered. Every
    /// callback runs under it, so callbacks for one session never overlap.
    open: Mutex<bool>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<C: Conn> Session<C> {
    pub(crate) fn new(conn: C, handler: Arc<dyn Handler>) -> Self {
        Self {
            conn,
            handler,
            failure: Mutex::new(None),
            open: Mutex::new(true),
        }
    }

    pub(crate) fn conn(&self) -> &C {
        &self.conn
    }

    /// Send a line. A write failure ends the session.
    pub(crate) async fn send(&self, line: &str) -> Result<()> {
        match self.conn.send(line).await {
            Ok(()) => Ok(()),
            Err(Error::Closed) => Err(Error::NotConnected),
            Err(e) => {
                let err = Error::Send(Box::new(e));
                self.close_with_err(err.clone()).await;
                Err(err)
            }
        }
    }

    /// Record `err` as the reason this session ended, unless another failure
    /// got there first, and close the transport so the read task stops.
    pub(crate) async fn close_with_err(&self, err: Error) {
        {
            let mut failure = lock(&self.failure);
            if failure.is_none() {
                debug!("session failed: {}", err);
                *failure = Some(err);
            }
        }
        self.conn.close().await;
    }

    /// Deliver `connected` unless the session has already ended.
    pub(crate) fn connected(&self) {
        let open = lock(&self.open);
        if *open {
            self.handler.connected();
        }
    }

    fn message(&self, msg: Message) {
        let open = lock(&self.open);
        if *open {
            self.handler.message(msg);
        }
    }

    fn disconnected(&self) {
        let err = lock(&self.failure).take().unwrap_or(Error::Closed);
        let mut open = lock(&self.open);
        if *open {
            *open = false;
            self.handler.disconnected(err);
        }
    }

    /// Read until the connection fails, answering PINGs and forwarding every
    /// message, then deliver `disconnected`.
    pub(crate) async fn read_loop(self: Arc<Self>) {
        loop {
            match self.conn.read().await {
                Ok(msg) => {
                    if msg.command == "PING" {
                        trace!("answering ping");
                        let _ = self.send(&format!("PONG :{}", msg.trailer(0))).await;
                    }
                    self.message(msg);
                }
                Err(e) => {
                    self.close_with_err(Error::Read(Box::new(e))).await;
                    break;
                }
            }
        }
        self.disconnected();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Sender;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    #[derive(Default)]
    struct Counter {
        connected: AtomicUsize,
        disconnected: AtomicUsize,
        messages: AtomicUsize,
    }

    impl Handler for Counter {
        fn connected(&self) {
            self.connected.fetch_add(1, Ordering::SeqCst);
        }
        fn disconnected(&self, _err: Error) {
            self.disconnected.fetch_add(1, Ordering::SeqCst);
        }
        fn message(&self, _msg: Message) {
            self.messages.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Blocks reads until closed; every send fails.
    #[derive(Default)]
    struct Broken {
        closed: Notify,
        is_closed: std::sync::atomic::AtomicBool,
    }

    impl Sender for Broken {
        async fn send(&self, _line: &str) -> Result<()> {
            if self.is_closed.load(Ordering::SeqCst) {
                return Err(Error::Closed);
            }
            Err(Error::ConnectionClosed)
        }
    }

    impl Conn for Broken {
        async fn read(&self) -> Result<Message> {
            let notified = self.closed.notified();
            if self.is_closed.load(Ordering::SeqCst) {
                return Err(Error::Closed);
            }
            notified.await;
            Err(Error::Closed)
        }

        async fn close(&self) {
            self.is_closed.store(true, Ordering::SeqCst);
            self.closed.notify_waiters();
        }
    }

    #[tokio::test]
    async fn test_send_failure_ends_session_once() {
        let counter = Arc::new(Counter::default());
        let session = Arc::new(Session::new(Broken::default(), counter.clone()));
        let reader = tokio::spawn(session.clone().read_loop());

        let err = session.send("PRIVMSG #a :x").await.unwrap_err();
        assert!(matches!(err, Error::Send(_)));
        assert!(matches!(session.send("PRIVMSG #a :y").await, Err(Error::NotConnected)));

        reader.await.unwrap();
        assert_eq!(counter.disconnected.load(Ordering::SeqCst), 1);

        session.connected();
        assert_eq!(counter.connected.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_first_failure_wins() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let session = Arc::new(Session::new(Broken::default(), Arc::new(tx)));

        session.close_with_err(Error::Cancelled).await;
        session.close_with_err(Error::Timeout(crate::transport::IO_DEADLINE)).await;
        session.clone().read_loop().await;

        match rx.recv().await {
            Some(crate::Event::Disconnected(Error::Cancelled)) => {}
            other => panic!("Expected Disconnected(Cancelled), got {other:?}"),
        }
        assert!(rx.try_recv().is_err());
    }
}
